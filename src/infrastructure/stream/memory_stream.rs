//! In-process [`EventStream`] with consumer-group semantics.
//!
//! Mirrors the parts of Redis Streams the service relies on: ordered entries,
//! per-group delivery cursor, pending entries list with delivery counters,
//! acknowledgement and idle claiming. Used by tests and local tooling.

use super::service::{EventStream, StartOffset, StreamEntry, StreamError, StreamResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

#[derive(Default)]
struct Log {
    next_seq: u64,
    entries: BTreeMap<u64, HashMap<String, String>>,
    groups: HashMap<String, Group>,
}

struct Group {
    last_delivered: u64,
    pending: BTreeMap<u64, Pending>,
}

struct Pending {
    delivered_at: Instant,
    deliveries: u64,
}

impl Log {
    fn entry(&self, seq: u64, deliveries: u64) -> Option<StreamEntry> {
        self.entries.get(&seq).map(|fields| StreamEntry {
            id: format_id(seq),
            fields: fields.clone(),
            deliveries,
        })
    }
}

/// Event stream held entirely in memory.
#[derive(Default)]
pub struct MemoryStream {
    logs: Mutex<HashMap<String, Log>>,
    appended: Notify,
    unavailable: AtomicBool,
}

impl MemoryStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with [`StreamError::Unavailable`]
    /// until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of entries in `stream`.
    pub fn len(&self, stream: &str) -> usize {
        self.lock().get(stream).map_or(0, |log| log.entries.len())
    }

    /// Whether `stream` holds no entries.
    pub fn is_empty(&self, stream: &str) -> bool {
        self.len(stream) == 0
    }

    /// All entries of `stream` in append order.
    pub fn entries(&self, stream: &str) -> Vec<StreamEntry> {
        let logs = self.lock();
        let Some(log) = logs.get(stream) else {
            return Vec::new();
        };

        log.entries
            .keys()
            .filter_map(|seq| log.entry(*seq, 0))
            .collect()
    }

    /// Number of entries delivered to `group` and not yet acknowledged.
    pub fn pending_count(&self, stream: &str, group: &str) -> usize {
        self.lock()
            .get(stream)
            .and_then(|log| log.groups.get(group))
            .map_or(0, |g| g.pending.len())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Log>> {
        self.logs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(&self) -> StreamResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StreamError::Unavailable(
                "memory stream switched off".to_string(),
            ));
        }
        Ok(())
    }

    fn deliver_new(&self, stream: &str, group: &str, count: usize) -> StreamResult<Vec<StreamEntry>> {
        let mut logs = self.lock();
        let log = logs.get_mut(stream).ok_or_else(|| no_group(stream, group))?;
        let cursor = log
            .groups
            .get(group)
            .ok_or_else(|| no_group(stream, group))?
            .last_delivered;

        let seqs: Vec<u64> = log
            .entries
            .range(cursor + 1..)
            .take(count)
            .map(|(seq, _)| *seq)
            .collect();

        let batch: Vec<StreamEntry> = seqs.iter().filter_map(|seq| log.entry(*seq, 1)).collect();

        if let Some(g) = log.groups.get_mut(group) {
            let now = Instant::now();
            for seq in &seqs {
                g.last_delivered = *seq;
                g.pending.insert(
                    *seq,
                    Pending {
                        delivered_at: now,
                        deliveries: 1,
                    },
                );
            }
        }

        Ok(batch)
    }
}

#[async_trait]
impl EventStream for MemoryStream {
    async fn publish(&self, stream: &str, fields: &[(&str, &str)]) -> StreamResult<String> {
        self.check_available()?;

        let id = {
            let mut logs = self.lock();
            let log = logs.entry(stream.to_string()).or_default();
            log.next_seq += 1;
            let seq = log.next_seq;
            log.entries.insert(
                seq,
                fields
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            );
            format_id(seq)
        };

        self.appended.notify_waiters();
        Ok(id)
    }

    async fn ensure_group(
        &self,
        stream: &str,
        group: &str,
        start: StartOffset,
    ) -> StreamResult<()> {
        self.check_available()?;

        let mut logs = self.lock();
        let log = logs.entry(stream.to_string()).or_default();
        let last_delivered = match start {
            StartOffset::Beginning => 0,
            StartOffset::Latest => log.next_seq,
        };

        log.groups.entry(group.to_string()).or_insert(Group {
            last_delivered,
            pending: BTreeMap::new(),
        });

        Ok(())
    }

    async fn read_group(
        &self,
        stream: &str,
        group: &str,
        _consumer: &str,
        count: usize,
        block: Option<Duration>,
    ) -> StreamResult<Vec<StreamEntry>> {
        let deadline = block.map(|d| Instant::now() + d);

        loop {
            // Register interest before checking so an append in between is not missed
            let appended = self.appended.notified();
            tokio::pin!(appended);
            appended.as_mut().enable();

            self.check_available()?;
            let batch = self.deliver_new(stream, group, count)?;
            if !batch.is_empty() {
                return Ok(batch);
            }

            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, appended).await.is_err() {
                        return Ok(Vec::new());
                    }
                }
                None => appended.await,
            }
        }
    }

    async fn ack(&self, stream: &str, group: &str, ids: &[String]) -> StreamResult<usize> {
        self.check_available()?;

        let mut logs = self.lock();
        let Some(g) = logs.get_mut(stream).and_then(|log| log.groups.get_mut(group)) else {
            return Ok(0);
        };

        Ok(ids
            .iter()
            .filter_map(|id| parse_id(id))
            .filter(|seq| g.pending.remove(seq).is_some())
            .count())
    }

    async fn claim_idle(
        &self,
        stream: &str,
        group: &str,
        _consumer: &str,
        min_idle: Duration,
        count: usize,
    ) -> StreamResult<Vec<StreamEntry>> {
        self.check_available()?;

        let mut logs = self.lock();
        let log = logs.get_mut(stream).ok_or_else(|| no_group(stream, group))?;
        let Log {
            entries, groups, ..
        } = log;
        let g = groups.get_mut(group).ok_or_else(|| no_group(stream, group))?;

        let now = Instant::now();
        let idle: Vec<u64> = g
            .pending
            .iter()
            .filter(|(_, p)| now.duration_since(p.delivered_at) >= min_idle)
            .take(count)
            .map(|(seq, _)| *seq)
            .collect();

        let mut claimed = Vec::new();
        for seq in idle {
            let Some(fields) = entries.get(&seq) else {
                // Data deleted from the stream: drop the dangling pending entry
                g.pending.remove(&seq);
                continue;
            };

            if let Some(p) = g.pending.get_mut(&seq) {
                p.delivered_at = now;
                p.deliveries += 1;

                claimed.push(StreamEntry {
                    id: format_id(seq),
                    fields: fields.clone(),
                    deliveries: p.deliveries,
                });
            }
        }

        Ok(claimed)
    }

    async fn health_check(&self) -> bool {
        self.check_available().is_ok()
    }
}

fn format_id(seq: u64) -> String {
    format!("{}-0", seq)
}

fn parse_id(id: &str) -> Option<u64> {
    id.split_once('-').and_then(|(seq, _)| seq.parse().ok())
}

fn no_group(stream: &str, group: &str) -> StreamError {
    StreamError::NoGroup {
        stream: stream.to_string(),
        group: group.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &str = "clicks_stream";
    const GROUP: &str = "clicks_group";

    async fn stream_with_group() -> MemoryStream {
        let stream = MemoryStream::new();
        stream
            .ensure_group(STREAM, GROUP, StartOffset::Beginning)
            .await
            .unwrap();
        stream
    }

    #[tokio::test]
    async fn test_read_delivers_each_entry_once_per_group() {
        let stream = stream_with_group().await;
        stream.publish(STREAM, &[("event", "a")]).await.unwrap();
        stream.publish(STREAM, &[("event", "b")]).await.unwrap();

        let first = stream
            .read_group(STREAM, GROUP, "consumer-1", 10, Some(Duration::ZERO))
            .await
            .unwrap();
        let second = stream
            .read_group(STREAM, GROUP, "consumer-2", 10, Some(Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first[0].field("event"), Some("a"));
        assert_eq!(first[0].deliveries, 1);
        assert!(second.is_empty());
        assert_eq!(stream.pending_count(STREAM, GROUP), 2);
    }

    #[tokio::test]
    async fn test_read_respects_count() {
        let stream = stream_with_group().await;
        for payload in ["a", "b", "c"] {
            stream.publish(STREAM, &[("event", payload)]).await.unwrap();
        }

        let batch = stream
            .read_group(STREAM, GROUP, "consumer-1", 2, Some(Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1].field("event"), Some("b"));
    }

    #[tokio::test]
    async fn test_group_created_at_latest_skips_existing_entries() {
        let stream = MemoryStream::new();
        stream.publish(STREAM, &[("event", "old")]).await.unwrap();
        stream
            .ensure_group(STREAM, GROUP, StartOffset::Latest)
            .await
            .unwrap();
        stream.publish(STREAM, &[("event", "new")]).await.unwrap();

        let batch = stream
            .read_group(STREAM, GROUP, "consumer-1", 10, Some(Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].field("event"), Some("new"));
    }

    #[tokio::test]
    async fn test_ensure_group_is_idempotent() {
        let stream = stream_with_group().await;
        stream.publish(STREAM, &[("event", "a")]).await.unwrap();
        stream
            .read_group(STREAM, GROUP, "consumer-1", 10, Some(Duration::ZERO))
            .await
            .unwrap();

        stream
            .ensure_group(STREAM, GROUP, StartOffset::Beginning)
            .await
            .unwrap();

        assert_eq!(stream.pending_count(STREAM, GROUP), 1);
    }

    #[tokio::test]
    async fn test_read_without_group_fails() {
        let stream = MemoryStream::new();

        let result = stream
            .read_group(STREAM, GROUP, "consumer-1", 1, Some(Duration::ZERO))
            .await;

        assert!(matches!(result, Err(StreamError::NoGroup { .. })));
    }

    #[tokio::test]
    async fn test_blocking_read_wakes_on_publish() {
        let stream = std::sync::Arc::new(stream_with_group().await);

        let reader = {
            let stream = stream.clone();
            tokio::spawn(async move {
                stream
                    .read_group(STREAM, GROUP, "consumer-1", 1, None)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        stream.publish(STREAM, &[("event", "late")]).await.unwrap();

        let batch = tokio::time::timeout(Duration::from_secs(2), reader)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(batch[0].field("event"), Some("late"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocking_read_times_out_empty() {
        let stream = stream_with_group().await;

        let batch = stream
            .read_group(STREAM, GROUP, "consumer-1", 1, Some(Duration::from_secs(5)))
            .await
            .unwrap();

        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_ack_removes_from_pending() {
        let stream = stream_with_group().await;
        stream.publish(STREAM, &[("event", "a")]).await.unwrap();
        let batch = stream
            .read_group(STREAM, GROUP, "consumer-1", 1, Some(Duration::ZERO))
            .await
            .unwrap();

        let acked = stream
            .ack(STREAM, GROUP, &[batch[0].id.clone()])
            .await
            .unwrap();
        let again = stream
            .ack(STREAM, GROUP, &[batch[0].id.clone()])
            .await
            .unwrap();

        assert_eq!(acked, 1);
        assert_eq!(again, 0);
        assert_eq!(stream.pending_count(STREAM, GROUP), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_claim_only_idle_entries_and_counts_deliveries() {
        let stream = stream_with_group().await;
        stream.publish(STREAM, &[("event", "a")]).await.unwrap();
        stream
            .read_group(STREAM, GROUP, "consumer-1", 1, Some(Duration::ZERO))
            .await
            .unwrap();

        let too_early = stream
            .claim_idle(STREAM, GROUP, "consumer-2", Duration::from_secs(60), 10)
            .await
            .unwrap();
        assert!(too_early.is_empty());

        tokio::time::advance(Duration::from_secs(61)).await;

        let claimed = stream
            .claim_idle(STREAM, GROUP, "consumer-2", Duration::from_secs(60), 10)
            .await
            .unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].deliveries, 2);

        let reclaimed = stream
            .claim_idle(STREAM, GROUP, "consumer-1", Duration::ZERO, 10)
            .await
            .unwrap();
        assert_eq!(reclaimed[0].deliveries, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_claim_count_applies_to_idle_entries_only() {
        let stream = stream_with_group().await;
        for event in ["a", "b", "c"] {
            stream.publish(STREAM, &[("event", event)]).await.unwrap();
        }
        stream
            .read_group(STREAM, GROUP, "consumer-1", 3, Some(Duration::ZERO))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;

        // The two oldest entries are busy again with consumer-2
        let busy = stream
            .claim_idle(STREAM, GROUP, "consumer-2", Duration::from_secs(60), 2)
            .await
            .unwrap();
        assert_eq!(busy.len(), 2);

        let claimed = stream
            .claim_idle(STREAM, GROUP, "consumer-3", Duration::from_secs(60), 2)
            .await
            .unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].id, "3-0");
        assert_eq!(claimed[0].field("event"), Some("c"));
    }

    #[tokio::test]
    async fn test_unavailable_stream_fails_every_operation() {
        let stream = stream_with_group().await;
        stream.set_unavailable(true);

        assert!(stream.publish(STREAM, &[("event", "a")]).await.is_err());
        assert!(!stream.health_check().await);

        stream.set_unavailable(false);
        assert!(stream.publish(STREAM, &[("event", "a")]).await.is_ok());
        assert_eq!(stream.len(STREAM), 1);
    }
}
