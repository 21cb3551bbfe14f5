//! Destination URL checks for link creation.

use url::Url;

/// Longest destination URL accepted.
pub const MAX_URL_LENGTH: usize = 2048;

/// Errors raised for destination URLs that cannot be shortened.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TargetUrlError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL has no host")]
    MissingHost,

    #[error("URL exceeds {MAX_URL_LENGTH} characters")]
    TooLong,
}

/// Checks that `input` is an absolute HTTP(S) URL with a host.
///
/// The URL is stored exactly as given, so a resolved alias returns the same
/// string it was created with.
///
/// # Security
///
/// Rejects potentially dangerous protocols like `javascript:`, `data:`, `file:`, etc.
///
/// # Errors
///
/// Returns the first [`TargetUrlError`] that applies.
pub fn validate_target_url(input: &str) -> Result<(), TargetUrlError> {
    if input.len() > MAX_URL_LENGTH {
        return Err(TargetUrlError::TooLong);
    }

    let url = Url::parse(input).map_err(|e| TargetUrlError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(TargetUrlError::UnsupportedProtocol),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(TargetUrlError::MissingHost);
    }

    Ok(())
}
