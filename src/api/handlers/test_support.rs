//! Mocked collaborators for handler tests.

use axum::Router;
use axum::extract::connect_info::MockConnectInfo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::application::services::{AnalyticsService, LinkService};
use crate::domain::repositories::{MockClickRepository, MockLinkRepository};
use crate::infrastructure::cache::MockCacheService;
use crate::infrastructure::stream::MemoryStream;
use crate::state::AppState;
use crate::utils::alias::AliasGenerator;

pub struct Collaborators {
    pub links: MockLinkRepository,
    pub clicks: MockClickRepository,
    pub cache: MockCacheService,
    pub stream: Arc<MemoryStream>,
    pub behind_proxy: bool,
}

impl Collaborators {
    pub fn new() -> Self {
        Self {
            links: MockLinkRepository::new(),
            clicks: MockClickRepository::new(),
            cache: MockCacheService::new(),
            stream: Arc::new(MemoryStream::new()),
            behind_proxy: false,
        }
    }

    pub fn into_state(self) -> AppState {
        let links = Arc::new(self.links);
        let cache = Arc::new(self.cache);

        let link_service = LinkService::new(
            links.clone(),
            cache.clone(),
            self.stream.clone(),
            "clicks_stream",
            Duration::from_secs(3600),
            AliasGenerator::from_seed(7),
        );
        let analytics_service = AnalyticsService::new(Arc::new(self.clicks));

        AppState::new(
            Arc::new(link_service),
            Arc::new(analytics_service),
            links,
            cache,
            self.stream,
            self.behind_proxy,
        )
    }
}

/// Attaches state and a fixed peer address of `127.0.0.1:12345`.
pub fn router(app: Router<AppState>, collaborators: Collaborators) -> Router {
    let peer: SocketAddr = ([127, 0, 0, 1], 12345).into();

    app.with_state(collaborators.into_state())
        .layer(MockConnectInfo(peer))
}
