//! DTOs for link creation.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::Validate;

use crate::domain::entities::Link;

/// Characters allowed in a custom alias. Empty means "generate one".
static ALIAS_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]*$").unwrap());

/// Request to create a link.
///
/// The URL itself is checked by [`crate::utils::target_url::validate_target_url`];
/// alias characters are checked by the link service.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    #[validate(length(min = 1, max = 2048, message = "URL is empty or too long"))]
    pub url: String,

    /// Custom alias; empty or absent means one is generated.
    #[validate(length(max = 32, message = "Alias is too long"))]
    #[validate(regex(path = "*ALIAS_CHARS", message = "Alias can only contain letters, digits, '-' and '_'"))]
    pub alias: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LinkResponse {
    pub id: i64,
    pub alias: String,
    pub original_url: String,
    pub owner_user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<Link> for LinkResponse {
    fn from(link: Link) -> Self {
        Self {
            id: link.id,
            alias: link.alias,
            original_url: link.original_url,
            owner_user_id: link.owner_user_id,
            created_at: link.created_at,
        }
    }
}
