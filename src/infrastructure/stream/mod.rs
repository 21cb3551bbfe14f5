//! Event stream used to hand click events from the redirect path to the worker.
//!
//! Provides an [`EventStream`] trait with two implementations:
//! - [`RedisStream`] - Redis Streams with consumer groups
//! - [`MemoryStream`] - In-process stream with the same group semantics

mod memory_stream;
mod redis_stream;
mod service;

pub use memory_stream::MemoryStream;
pub use redis_stream::{GroupSummary, RedisStream};
pub use service::{EventStream, StartOffset, StreamEntry, StreamError, StreamResult};
