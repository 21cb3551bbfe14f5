//! Event stream trait and shared types.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Errors that can occur during stream operations.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("stream unavailable: {0}")]
    Unavailable(String),

    #[error("consumer group '{group}' does not exist on stream '{stream}'")]
    NoGroup { stream: String, group: String },
}

/// Result type for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// Where a newly created consumer group starts reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOffset {
    /// Deliver every entry already in the stream.
    Beginning,
    /// Deliver only entries appended after the group is created.
    Latest,
}

impl StartOffset {
    pub fn as_id(self) -> &'static str {
        match self {
            Self::Beginning => "0",
            Self::Latest => "$",
        }
    }
}

/// An entry delivered to a consumer.
///
/// `deliveries` counts how many times the entry has been handed to a consumer
/// of the group, this delivery included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    pub id: String,
    pub fields: HashMap<String, String>,
    pub deliveries: u64,
}

impl StreamEntry {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Append-only log with consumer groups and per-entry acknowledgement.
///
/// Delivery is at-least-once: an entry handed to a consumer stays pending in the
/// group until acknowledged and can be claimed by another consumer once idle.
///
/// # Implementations
///
/// - [`crate::infrastructure::stream::RedisStream`] - Redis Streams
/// - [`crate::infrastructure::stream::MemoryStream`] - In-process stream for tests
#[async_trait]
pub trait EventStream: Send + Sync {
    /// Appends an entry and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Unavailable`] if the append fails.
    async fn publish(&self, stream: &str, fields: &[(&str, &str)]) -> StreamResult<String>;

    /// Creates `group` on `stream`, creating the stream too if it is missing.
    ///
    /// Succeeds without changes when the group already exists.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Unavailable`] on any other failure.
    async fn ensure_group(&self, stream: &str, group: &str, start: StartOffset)
    -> StreamResult<()>;

    /// Reads up to `count` entries never delivered to the group before.
    ///
    /// Waits up to `block` for entries to arrive, or indefinitely when `block`
    /// is `None`. Returns an empty batch when the window elapses.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::NoGroup`] if the group is missing and
    /// [`StreamError::Unavailable`] on any other failure.
    async fn read_group(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        count: usize,
        block: Option<Duration>,
    ) -> StreamResult<Vec<StreamEntry>>;

    /// Acknowledges entries, removing them from the group's pending list.
    /// Returns how many were actually pending.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Unavailable`] if the acknowledgement fails.
    async fn ack(&self, stream: &str, group: &str, ids: &[String]) -> StreamResult<usize>;

    /// Transfers up to `count` pending entries idle for at least `min_idle` to
    /// `consumer` and returns them with their updated delivery counts.
    ///
    /// Entries whose data was deleted from the stream are not returned.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::NoGroup`] if the group is missing and
    /// [`StreamError::Unavailable`] on any other failure.
    async fn claim_idle(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        min_idle: Duration,
        count: usize,
    ) -> StreamResult<Vec<StreamEntry>>;

    /// Checks if the stream backend is reachable.
    async fn health_check(&self) -> bool;
}
