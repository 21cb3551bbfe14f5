//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod analytics;
pub mod health;
pub mod links;
pub mod owner;
pub mod redirect;

#[cfg(test)]
pub(crate) mod test_support;

pub use analytics::analytics_handler;
pub use health::health_handler;
pub use links::create_link_handler;
pub use redirect::redirect_handler;
