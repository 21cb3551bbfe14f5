//! Stream consumer that persists click events.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, error, info, warn};

use crate::domain::click_event::{ClickEvent, EVENT_FIELD};
use crate::domain::repositories::ClickRepository;
use crate::infrastructure::stream::{EventStream, StartOffset, StreamEntry, StreamError};

/// Field added to dead-lettered entries with the reason they were given up on.
pub const REASON_FIELD: &str = "reason";
/// Field added to dead-lettered entries with the id they had in the source stream.
pub const SOURCE_ID_FIELD: &str = "source_id";
/// Field added to dead-lettered entries with their delivery count.
pub const DELIVERIES_FIELD: &str = "deliveries";

/// Tuning for a [`ClickWorker`].
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerSettings {
    pub stream: String,
    pub group: String,
    pub consumer: String,
    pub dead_letter_stream: String,
    pub batch_size: usize,
    /// Longest wait for new entries; `None` waits until the next reclaim sweep.
    pub block: Option<Duration>,
    pub claim_min_idle: Duration,
    /// Deliveries after which an entry is dead-lettered; 0 retries forever.
    pub max_deliveries: u64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            stream: "clicks_stream".to_string(),
            group: "clicks_group".to_string(),
            consumer: "consumer-1".to_string(),
            dead_letter_stream: "clicks_dead_letter".to_string(),
            batch_size: 1,
            block: Some(Duration::from_millis(5000)),
            claim_min_idle: Duration::from_millis(60_000),
            max_deliveries: 5,
        }
    }
}

/// What happened to the entries of one poll.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub persisted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub dead_lettered: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.persisted + self.skipped + self.failed + self.dead_lettered
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Persisted => self.persisted += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::DeadLettered => self.dead_lettered += 1,
        }
    }

    fn merge(&mut self, other: BatchReport) {
        self.persisted += other.persisted;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.dead_lettered += other.dead_lettered;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Persisted,
    Skipped,
    Failed,
    DeadLettered,
}

/// Consumes click events from a consumer group and writes click records.
///
/// # Delivery
///
/// At-least-once. An entry is acknowledged only after its record is written;
/// a crash in between redelivers it and yields a duplicate row. Entries left
/// pending (malformed payloads, failed writes, crashed consumers) are claimed
/// again once idle for `claim_min_idle`, and moved to the dead-letter stream
/// after `max_deliveries`.
///
/// # Shutdown
///
/// [`ClickWorker::run`] stops when the watch channel flips to `true` or its
/// sender is dropped. A batch already being processed is finished first.
pub struct ClickWorker {
    stream: Arc<dyn EventStream>,
    clicks: Arc<dyn ClickRepository>,
    settings: WorkerSettings,
}

impl ClickWorker {
    pub fn new(
        stream: Arc<dyn EventStream>,
        clicks: Arc<dyn ClickRepository>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            stream,
            clicks,
            settings,
        }
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    /// Creates the consumer group at the start of the stream if it is missing.
    ///
    /// # Errors
    ///
    /// Returns the stream error if the group cannot be created.
    pub async fn ensure_group(&self) -> Result<(), StreamError> {
        self.stream
            .ensure_group(
                &self.settings.stream,
                &self.settings.group,
                StartOffset::Beginning,
            )
            .await
    }

    /// Runs the consume loop until shutdown.
    ///
    /// Reads never wait past the next reclaim sweep, so entries left by a
    /// crashed consumer are picked up even when no new traffic arrives.
    ///
    /// Read failures never end the loop; they are logged and retried with a
    /// capped exponential backoff that resets after the next successful read.
    ///
    /// # Errors
    ///
    /// Returns an error only if the consumer group cannot be ensured at startup.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), StreamError> {
        self.ensure_group().await?;

        info!(
            stream = %self.settings.stream,
            group = %self.settings.group,
            consumer = %self.settings.consumer,
            "Click worker started"
        );

        let mut backoff = read_backoff();
        let mut next_sweep = Instant::now();

        loop {
            if *shutdown.borrow() {
                break;
            }

            if Instant::now() >= next_sweep {
                self.reclaim_idle().await;
                next_sweep =
                    Instant::now() + self.settings.claim_min_idle.max(MIN_SWEEP_INTERVAL);
            }

            let read = tokio::select! {
                _ = shutdown.changed() => break,
                read = self.read_new(self.read_window(next_sweep)) => read,
            };

            let delay = match read {
                Ok(entries) => {
                    backoff = read_backoff();
                    self.process_batch(entries).await;
                    continue;
                }
                Err(StreamError::NoGroup { .. }) => {
                    warn!(group = %self.settings.group, "Consumer group missing, recreating");
                    if let Err(e) = self.ensure_group().await {
                        error!(error = %e, "Failed to recreate consumer group");
                    }
                    backoff.next()
                }
                Err(e) => {
                    error!(error = %e, "Stream read failed");
                    backoff.next()
                }
            };

            let delay = delay.unwrap_or(MAX_READ_BACKOFF);
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!(consumer = %self.settings.consumer, "Click worker stopped");
        Ok(())
    }

    /// Runs one reclaim sweep and one read, processing whatever they return.
    ///
    /// # Errors
    ///
    /// Returns the stream error if the read fails.
    pub async fn poll_once(&self) -> Result<BatchReport, StreamError> {
        let mut report = self.reclaim_idle().await;
        let entries = self.read_new(self.settings.block).await?;
        report.merge(self.process_batch(entries).await);
        Ok(report)
    }

    async fn read_new(&self, block: Option<Duration>) -> Result<Vec<StreamEntry>, StreamError> {
        self.stream
            .read_group(
                &self.settings.stream,
                &self.settings.group,
                &self.settings.consumer,
                self.settings.batch_size,
                block,
            )
            .await
    }

    /// The configured block window, cut short at the next reclaim sweep.
    fn read_window(&self, next_sweep: Instant) -> Option<Duration> {
        let until_sweep = next_sweep.saturating_duration_since(Instant::now());
        Some(match self.settings.block {
            Some(block) => block.min(until_sweep),
            None => until_sweep,
        })
    }

    /// Claims pending entries idle for too long and processes them.
    async fn reclaim_idle(&self) -> BatchReport {
        let claimed = self
            .stream
            .claim_idle(
                &self.settings.stream,
                &self.settings.group,
                &self.settings.consumer,
                self.settings.claim_min_idle,
                self.settings.batch_size.max(CLAIM_BATCH),
            )
            .await;

        match claimed {
            Ok(entries) => {
                if !entries.is_empty() {
                    info!(count = entries.len(), "Reclaimed idle click events");
                }
                self.process_batch(entries).await
            }
            Err(e) => {
                warn!(error = %e, "Reclaim sweep failed");
                BatchReport::default()
            }
        }
    }

    async fn process_batch(&self, entries: Vec<StreamEntry>) -> BatchReport {
        let mut report = BatchReport::default();
        for entry in entries {
            report.record(self.process_entry(entry).await);
        }
        report
    }

    async fn process_entry(&self, entry: StreamEntry) -> Outcome {
        let max = self.settings.max_deliveries;
        if max > 0 && entry.deliveries > max {
            return self.dead_letter(&entry, "max deliveries exceeded").await;
        }

        let event = match ClickEvent::from_payload(entry.field(EVENT_FIELD)) {
            Ok(event) => event,
            Err(e) => {
                warn!(entry_id = %entry.id, deliveries = entry.deliveries, error = %e, "Skipping malformed click event");
                return Outcome::Skipped;
            }
        };

        let link_id = event.link_id;
        if let Err(e) = self.clicks.record_click(event.into_new_click()).await {
            error!(entry_id = %entry.id, link_id, error = %e, "Failed to persist click");
            return Outcome::Failed;
        }

        if let Err(e) = self.ack(&entry.id).await {
            // Record is written; a redelivery produces a duplicate row
            warn!(entry_id = %entry.id, error = %e, "Failed to acknowledge click event");
        } else {
            debug!(entry_id = %entry.id, link_id, "Click persisted");
        }

        Outcome::Persisted
    }

    async fn dead_letter(&self, entry: &StreamEntry, reason: &str) -> Outcome {
        let deliveries = entry.deliveries.to_string();
        let mut fields: Vec<(&str, &str)> = entry
            .fields
            .iter()
            .filter(|(k, _)| !is_dead_letter_field(k))
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        fields.sort_unstable();
        fields.push((REASON_FIELD, reason));
        fields.push((SOURCE_ID_FIELD, entry.id.as_str()));
        fields.push((DELIVERIES_FIELD, deliveries.as_str()));

        if let Err(e) = self
            .stream
            .publish(&self.settings.dead_letter_stream, &fields)
            .await
        {
            error!(entry_id = %entry.id, error = %e, "Failed to dead-letter click event");
            return Outcome::Failed;
        }

        if let Err(e) = self.ack(&entry.id).await {
            warn!(entry_id = %entry.id, error = %e, "Failed to acknowledge dead-lettered event");
        }

        warn!(
            entry_id = %entry.id,
            deliveries = entry.deliveries,
            dead_letter_stream = %self.settings.dead_letter_stream,
            "Click event dead-lettered"
        );
        Outcome::DeadLettered
    }

    async fn ack(&self, id: &str) -> Result<usize, StreamError> {
        self.stream
            .ack(&self.settings.stream, &self.settings.group, &[id.to_string()])
            .await
    }
}

/// Smallest claim batch, so a sweep catches up even with `batch_size = 1`.
const CLAIM_BATCH: usize = 100;

/// Floor between reclaim sweeps in [`ClickWorker::run`].
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

const MAX_READ_BACKOFF: Duration = Duration::from_secs(5);

fn read_backoff() -> ExponentialBackoff {
    // 100ms, 200ms, 400ms, ... capped at 5s
    ExponentialBackoff::from_millis(2)
        .factor(50)
        .max_delay(MAX_READ_BACKOFF)
}

fn is_dead_letter_field(name: &str) -> bool {
    matches!(name, REASON_FIELD | SOURCE_ID_FIELD | DELIVERIES_FIELD)
}
