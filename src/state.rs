use std::sync::Arc;

use crate::application::services::{AnalyticsService, LinkService};
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::CacheService;
use crate::infrastructure::stream::EventStream;

/// Shared handler state. Every field is a cheap clone of a pooled handle.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub links: Arc<dyn LinkRepository>,
    pub cache: Arc<dyn CacheService>,
    pub stream: Arc<dyn EventStream>,
    /// Read the client IP from `X-Forwarded-For` instead of the peer address.
    pub behind_proxy: bool,
}

impl AppState {
    pub fn new(
        link_service: Arc<LinkService>,
        analytics_service: Arc<AnalyticsService>,
        links: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheService>,
        stream: Arc<dyn EventStream>,
        behind_proxy: bool,
    ) -> Self {
        Self {
            link_service,
            analytics_service,
            links,
            cache,
            stream,
            behind_proxy,
        }
    }
}
