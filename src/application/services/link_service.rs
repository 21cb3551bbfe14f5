//! Link creation and resolution service.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::click_event::{ClickEvent, EVENT_FIELD};
use crate::domain::entities::{Link, LinkTarget, NewLink};
use crate::domain::repositories::{LinkRepository, StoreError};
use crate::infrastructure::cache::CacheService;
use crate::infrastructure::stream::EventStream;
use crate::utils::alias::{AliasGenerator, validate_alias};

/// Attempts made by [`LinkService::shorten`] when a generated alias collides.
pub const MAX_GENERATED_ALIAS_ATTEMPTS: usize = 5;

/// Errors produced by link operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("alias '{alias}' is already taken")]
    AliasExists { alias: String },

    #[error("no link for alias '{alias}'")]
    LinkNotFound { alias: String },

    #[error("invalid alias '{alias}': {reason}")]
    InvalidAlias { alias: String, reason: &'static str },

    #[error("persistence failure: {0}")]
    Persistence(#[source] StoreError),
}

/// Request attributes recorded with a click.
///
/// Missing headers are carried as empty strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClickContext {
    pub ip_address: String,
    pub user_agent: String,
    pub referrer: String,
}

/// Service for creating aliases and resolving them on the redirect path.
///
/// Reads go through the cache first and fall back to the store; every
/// successful resolution emits a click event to the stream without waiting
/// for it to be written.
pub struct LinkService {
    links: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
    stream: Arc<dyn EventStream>,
    click_stream: String,
    cache_ttl: Duration,
    aliases: AliasGenerator,
}

impl LinkService {
    /// Creates a new link service.
    pub fn new(
        links: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheService>,
        stream: Arc<dyn EventStream>,
        click_stream: impl Into<String>,
        cache_ttl: Duration,
        aliases: AliasGenerator,
    ) -> Self {
        Self {
            links,
            cache,
            stream,
            click_stream: click_stream.into(),
            cache_ttl,
            aliases,
        }
    }

    /// Creates a link under a custom or generated alias.
    ///
    /// An empty or absent `custom_alias` means a 6-character alias is generated.
    /// The store's unique constraint decides collisions; nothing is pre-checked
    /// and nothing is retried here. The cache and stream are not touched.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::InvalidAlias`] if the custom alias breaks the alias rules.
    /// Returns [`LinkError::AliasExists`] if the alias is taken.
    /// Returns [`LinkError::Persistence`] on any other store failure.
    pub async fn create_alias(
        &self,
        original_url: &str,
        custom_alias: Option<&str>,
        owner_user_id: Option<i64>,
    ) -> Result<Link, LinkError> {
        let alias = match custom_alias.filter(|a| !a.is_empty()) {
            Some(custom) => {
                validate_alias(custom).map_err(|reason| LinkError::InvalidAlias {
                    alias: custom.to_string(),
                    reason,
                })?;
                custom.to_string()
            }
            None => self.aliases.generate(),
        };

        let new_link = NewLink {
            alias: alias.clone(),
            original_url: original_url.to_string(),
            owner_user_id,
        };

        match self.links.create(new_link).await {
            Ok(link) => {
                debug!(alias = %link.alias, link_id = link.id, "Link created");
                Ok(link)
            }
            Err(StoreError::UniqueViolation { .. }) => Err(LinkError::AliasExists { alias }),
            Err(e) => Err(LinkError::Persistence(e)),
        }
    }

    /// Creates a link, retrying generated aliases on collision.
    ///
    /// Custom aliases are attempted once and surface [`LinkError::AliasExists`].
    /// Generated aliases are redrawn up to [`MAX_GENERATED_ALIAS_ATTEMPTS`] times.
    ///
    /// # Errors
    ///
    /// See [`Self::create_alias`]. After the last collision of a generated alias
    /// the final [`LinkError::AliasExists`] is returned.
    pub async fn shorten(
        &self,
        original_url: &str,
        custom_alias: Option<&str>,
        owner_user_id: Option<i64>,
    ) -> Result<Link, LinkError> {
        if custom_alias.is_some_and(|a| !a.is_empty()) {
            return self
                .create_alias(original_url, custom_alias, owner_user_id)
                .await;
        }

        let mut attempt = 1;
        loop {
            match self.create_alias(original_url, None, owner_user_id).await {
                Err(LinkError::AliasExists { alias }) if attempt < MAX_GENERATED_ALIAS_ATTEMPTS => {
                    warn!(%alias, attempt, "Generated alias collided, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Resolves an alias to its URL and emits a click event.
    ///
    /// # Request Flow
    ///
    /// 1. Cache lookup; a cache error is logged and treated as a miss
    /// 2. On miss, store lookup
    /// 3. Cache write with the configured TTL; failure is logged only
    /// 4. Click event published on a detached task; failure is logged only
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::LinkNotFound`] if the alias does not exist.
    /// Returns [`LinkError::Persistence`] if the store lookup fails.
    pub async fn resolve_and_track(
        &self,
        alias: &str,
        context: ClickContext,
    ) -> Result<String, LinkError> {
        let target = match self.cached_target(alias).await {
            Some(target) => target,
            None => self.load_and_cache(alias).await?,
        };

        self.emit_click(&target, context);

        Ok(target.url)
    }

    async fn cached_target(&self, alias: &str) -> Option<LinkTarget> {
        match self.cache.get_link(alias).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(%alias, error = %e, "Cache read failed, falling back to store");
                None
            }
        }
    }

    async fn load_and_cache(&self, alias: &str) -> Result<LinkTarget, LinkError> {
        let link = self
            .links
            .find_by_alias(alias)
            .await
            .map_err(LinkError::Persistence)?
            .ok_or_else(|| LinkError::LinkNotFound {
                alias: alias.to_string(),
            })?;

        let target = link.target();

        if let Err(e) = self.cache.set_link(alias, &target, self.cache_ttl).await {
            warn!(%alias, error = %e, "Cache write failed");
        }

        Ok(target)
    }

    fn emit_click(&self, target: &LinkTarget, context: ClickContext) {
        let event = ClickEvent::new(
            target.link_id,
            context.ip_address,
            context.user_agent,
            context.referrer,
        );

        let payload = match event.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(link_id = target.link_id, error = %e, "Failed to encode click event");
                return;
            }
        };

        let stream = self.stream.clone();
        let click_stream = self.click_stream.clone();
        let link_id = target.link_id;

        tokio::spawn(async move {
            match stream
                .publish(&click_stream, &[(EVENT_FIELD, payload.as_str())])
                .await
            {
                Ok(id) => debug!(link_id, entry_id = %id, "Click event published"),
                Err(e) => warn!(link_id, error = %e, "Failed to publish click event"),
            }
        });
    }
}
