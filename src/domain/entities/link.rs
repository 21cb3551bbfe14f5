//! Link entity representing an alias to URL mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short alias mapped to its destination URL.
///
/// Links are immutable once created: the URL an alias points to never changes,
/// which is what allows cached lookups to be served without invalidation.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: i64,
    pub alias: String,
    pub original_url: String,
    pub owner_user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Link {
    /// Creates a new Link instance.
    pub fn new(
        id: i64,
        alias: String,
        original_url: String,
        owner_user_id: Option<i64>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            alias,
            original_url,
            owner_user_id,
            created_at,
        }
    }

    /// Returns the part of the link needed to redirect and attribute a click.
    pub fn target(&self) -> LinkTarget {
        LinkTarget {
            link_id: self.id,
            url: self.original_url.clone(),
        }
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLink {
    pub alias: String,
    pub original_url: String,
    pub owner_user_id: Option<i64>,
}

/// Resolved destination of an alias, as stored in the fast-path cache.
///
/// Carries the link id next to the URL so a cache hit can attribute the click
/// without a second trip to the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTarget {
    pub url: String,
    pub link_id: i64,
}
