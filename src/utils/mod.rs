//! Utility functions for alias handling and request inspection.
//!
//! - [`alias`] - Alias generation and validation
//! - [`client_ip`] - Client address and header extraction for click attribution
//! - [`target_url`] - Destination URL checks

pub mod alias;
pub mod client_ip;
pub mod target_url;
