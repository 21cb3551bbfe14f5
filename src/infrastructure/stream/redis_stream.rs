//! Redis Streams implementation of [`EventStream`].

use super::service::{EventStream, StartOffset, StreamEntry, StreamError, StreamResult};
use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::streams::{
    StreamClaimReply, StreamId, StreamInfoGroupsReply, StreamPendingCountReply, StreamRangeReply,
    StreamReadOptions, StreamReadReply,
};
use redis::{AsyncCommands, Client, RedisError};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Consumer group state as reported by `XINFO GROUPS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub name: String,
    pub consumers: usize,
    pub pending: usize,
    pub last_delivered_id: String,
    pub lag: Option<usize>,
}

/// Event stream backed by Redis Streams and consumer groups.
pub struct RedisStream {
    conn: ConnectionManager,
}

impl RedisStream {
    /// Connects for publishing and inspection.
    ///
    /// Commands keep the connection manager's default response timeout, so this
    /// connection must not be used for blocking reads.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Unavailable`] if the connection cannot be established
    /// or the PING check fails.
    pub async fn connect(redis_url: &str) -> StreamResult<Self> {
        Self::open(redis_url, ConnectionManagerConfig::new()).await
    }

    /// Connects for consuming.
    ///
    /// Disables the response timeout so a blocking read can wait for its whole
    /// block window.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Unavailable`] if the connection cannot be established
    /// or the PING check fails.
    pub async fn connect_for_consumer(redis_url: &str) -> StreamResult<Self> {
        let config = ConnectionManagerConfig::new().set_response_timeout(None);
        Self::open(redis_url, config).await
    }

    async fn open(redis_url: &str, config: ConnectionManagerConfig) -> StreamResult<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            StreamError::Unavailable(format!("Failed to create Redis client: {}", e))
        })?;

        let conn = ConnectionManager::new_with_config(client, config)
            .await
            .map_err(|e| StreamError::Unavailable(format!("Failed to connect to Redis: {}", e)))?;

        let mut test_conn = conn.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| StreamError::Unavailable(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis stream backend");

        Ok(Self { conn })
    }

    /// Returns up to `count` entries from the start of `stream`.
    ///
    /// Entries read this way are not delivered to any group, so `deliveries` is 0.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Unavailable`] if the range query fails.
    pub async fn range(&self, stream: &str, count: usize) -> StreamResult<Vec<StreamEntry>> {
        let mut conn = self.conn.clone();
        let reply: StreamRangeReply = conn
            .xrange_count(stream, "-", "+", count)
            .await
            .map_err(unavailable)?;

        Ok(reply.ids.into_iter().map(|raw| to_entry(raw, 0)).collect())
    }

    /// Looks up a single entry by id.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Unavailable`] if the range query fails.
    pub async fn get(&self, stream: &str, id: &str) -> StreamResult<Option<StreamEntry>> {
        let mut conn = self.conn.clone();
        let reply: StreamRangeReply = conn
            .xrange_count(stream, id, id, 1)
            .await
            .map_err(unavailable)?;

        Ok(reply.ids.into_iter().next().map(|raw| to_entry(raw, 0)))
    }

    /// Deletes an entry. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Unavailable`] if the delete fails.
    pub async fn delete(&self, stream: &str, id: &str) -> StreamResult<bool> {
        let mut conn = self.conn.clone();
        let deleted: usize = conn.xdel(stream, &[id]).await.map_err(unavailable)?;
        Ok(deleted > 0)
    }

    /// Number of entries in `stream`; 0 when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Unavailable`] if the query fails.
    pub async fn len(&self, stream: &str) -> StreamResult<usize> {
        let mut conn = self.conn.clone();
        conn.xlen(stream).await.map_err(unavailable)
    }

    /// Lists the consumer groups of an existing stream.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Unavailable`] if the stream does not exist or the
    /// query fails.
    pub async fn groups(&self, stream: &str) -> StreamResult<Vec<GroupSummary>> {
        let mut conn = self.conn.clone();
        let reply: StreamInfoGroupsReply = conn.xinfo_groups(stream).await.map_err(unavailable)?;

        Ok(reply
            .groups
            .into_iter()
            .map(|g| GroupSummary {
                name: g.name,
                consumers: g.consumers,
                pending: g.pending,
                last_delivered_id: g.last_delivered_id,
                lag: g.lag,
            })
            .collect())
    }
}

#[async_trait]
impl EventStream for RedisStream {
    async fn publish(&self, stream: &str, fields: &[(&str, &str)]) -> StreamResult<String> {
        let mut conn = self.conn.clone();
        let id: Option<String> = conn.xadd(stream, "*", fields).await.map_err(unavailable)?;

        id.ok_or_else(|| StreamError::Unavailable("XADD returned no entry id".to_string()))
    }

    async fn ensure_group(
        &self,
        stream: &str,
        group: &str,
        start: StartOffset,
    ) -> StreamResult<()> {
        let mut conn = self.conn.clone();
        let created: Result<(), RedisError> = conn
            .xgroup_create_mkstream(stream, group, start.as_id())
            .await;

        match created {
            Ok(()) => {
                info!(stream, group, "Created consumer group");
                Ok(())
            }
            Err(e) if e.code() == Some("BUSYGROUP") => {
                debug!(stream, group, "Consumer group already exists");
                Ok(())
            }
            Err(e) => Err(unavailable(e)),
        }
    }

    async fn read_group(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        count: usize,
        block: Option<Duration>,
    ) -> StreamResult<Vec<StreamEntry>> {
        // BLOCK 0 waits forever
        let block_ms = block.map_or(0, |d| (d.as_millis() as usize).max(1));
        let options = StreamReadOptions::default()
            .group(group, consumer)
            .count(count)
            .block(block_ms);

        let mut conn = self.conn.clone();
        let reply: Option<StreamReadReply> = conn
            .xread_options(&[stream], &[">"], &options)
            .await
            .map_err(|e| classify(e, stream, group))?;

        Ok(reply
            .into_iter()
            .flat_map(|r| r.keys)
            .flat_map(|k| k.ids)
            .map(|raw| to_entry(raw, 1))
            .collect())
    }

    async fn ack(&self, stream: &str, group: &str, ids: &[String]) -> StreamResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.clone();
        conn.xack(stream, group, ids).await.map_err(unavailable)
    }

    async fn claim_idle(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        min_idle: Duration,
        count: usize,
    ) -> StreamResult<Vec<StreamEntry>> {
        let min_idle_ms = min_idle.as_millis() as usize;
        let mut conn = self.conn.clone();

        // IDLE filters server-side, so fresh in-flight entries cannot fill the window
        let pending: StreamPendingCountReply = redis::cmd("XPENDING")
            .arg(stream)
            .arg(group)
            .arg("IDLE")
            .arg(min_idle_ms)
            .arg("-")
            .arg("+")
            .arg(count)
            .query_async(&mut conn)
            .await
            .map_err(|e| classify(e, stream, group))?;

        let delivered: HashMap<String, usize> = pending
            .ids
            .into_iter()
            .map(|p| (p.id, p.times_delivered))
            .collect();

        if delivered.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<&str> = delivered.keys().map(String::as_str).collect();
        let claimed: StreamClaimReply = conn
            .xclaim(stream, group, consumer, min_idle_ms, &ids)
            .await
            .map_err(|e| classify(e, stream, group))?;

        // XCLAIM bumps the delivery counter of every entry it transfers
        let mut entries: Vec<StreamEntry> = claimed
            .ids
            .into_iter()
            .map(|raw| {
                let before = delivered.get(&raw.id).copied().unwrap_or(0);
                to_entry(raw, before as u64 + 1)
            })
            .collect();
        entries.sort_by(|a, b| compare_ids(&a.id, &b.id));

        Ok(entries)
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.conn.clone();
        conn.ping::<()>().await.is_ok()
    }
}

fn to_entry(raw: StreamId, deliveries: u64) -> StreamEntry {
    let fields = raw
        .map
        .keys()
        .filter_map(|k| raw.get::<String>(k).map(|v| (k.clone(), v)))
        .collect();

    StreamEntry {
        id: raw.id,
        fields,
        deliveries,
    }
}

/// Orders entry ids (`<ms>-<seq>`) numerically.
fn compare_ids(a: &str, b: &str) -> std::cmp::Ordering {
    fn parts(id: &str) -> (u64, u64) {
        let (ms, seq) = id.split_once('-').unwrap_or((id, "0"));
        (ms.parse().unwrap_or(0), seq.parse().unwrap_or(0))
    }
    parts(a).cmp(&parts(b))
}

fn unavailable(e: RedisError) -> StreamError {
    StreamError::Unavailable(e.to_string())
}

fn classify(e: RedisError, stream: &str, group: &str) -> StreamError {
    if e.code() == Some("NOGROUP") {
        StreamError::NoGroup {
            stream: stream.to_string(),
            group: group.to_string(),
        }
    } else {
        unavailable(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn test_compare_ids_is_numeric() {
        assert_eq!(compare_ids("9-0", "10-0"), Ordering::Less);
        assert_eq!(compare_ids("10-2", "10-10"), Ordering::Less);
        assert_eq!(compare_ids("10-1", "10-1"), Ordering::Equal);
    }

    #[test]
    fn test_to_entry_keeps_string_fields() {
        let raw = StreamId {
            id: "1700000000000-0".to_string(),
            map: HashMap::from([(
                "event".to_string(),
                redis::Value::BulkString(b"{\"link_id\":1}".to_vec()),
            )]),
            ..Default::default()
        };

        let entry = to_entry(raw, 3);

        assert_eq!(entry.id, "1700000000000-0");
        assert_eq!(entry.field("event"), Some("{\"link_id\":1}"));
        assert_eq!(entry.deliveries, 3);
    }
}
