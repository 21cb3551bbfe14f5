//! Core domain entities representing the business data model.
//!
//! Entities are plain data structures without business logic.
//!
//! # Entity Types
//!
//! - [`Link`] - An alias mapped to its destination URL
//! - [`LinkTarget`] - The cached `{url, link_id}` pair used on the redirect path
//! - [`ClickRecord`] - A persisted click on a link
//!
//! Separate `New*` structs are used for creation, following the "New Type" pattern.

pub mod click;
pub mod link;

pub use click::{ClickRecord, NewClick};
pub use link::{Link, LinkTarget, NewLink};
