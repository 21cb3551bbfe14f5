#![allow(dead_code)]

use axum::extract::ConnectInfo;
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::Layer;

use shorty::application::services::{AnalyticsService, LinkService};
use shorty::infrastructure::cache::NullCache;
use shorty::infrastructure::persistence::{PgClickRepository, PgLinkRepository};
use shorty::infrastructure::stream::MemoryStream;
use shorty::state::AppState;
use shorty::utils::alias::AliasGenerator;

pub const CLICK_STREAM: &str = "clicks_stream";

pub async fn create_test_link(
    pool: &PgPool,
    alias: &str,
    url: &str,
    owner_user_id: Option<i64>,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO links (alias, original_url, owner_user_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(alias)
    .bind(url)
    .bind(owner_user_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_test_click(pool: &PgPool, link_id: i64, ip: &str) {
    sqlx::query("INSERT INTO click_records (link_id, ip_address) VALUES ($1, $2)")
        .bind(link_id)
        .bind(ip)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn count_clicks(pool: &PgPool, link_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM click_records WHERE link_id = $1")
        .bind(link_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// State backed by the test database, no cache and an in-memory stream.
pub fn create_test_state(pool: PgPool) -> (AppState, Arc<MemoryStream>) {
    let pool = Arc::new(pool);
    let stream = Arc::new(MemoryStream::new());
    let cache = Arc::new(NullCache::new());

    let link_repo = Arc::new(PgLinkRepository::new(pool.clone()));
    let click_repo = Arc::new(PgClickRepository::new(pool));

    let link_service = Arc::new(LinkService::new(
        link_repo.clone(),
        cache.clone(),
        stream.clone(),
        CLICK_STREAM,
        Duration::from_secs(3600),
        AliasGenerator::from_seed(42),
    ));
    let analytics_service = Arc::new(AnalyticsService::new(click_repo));

    let state = AppState::new(
        link_service,
        analytics_service,
        link_repo,
        cache,
        stream.clone(),
        false,
    );

    (state, stream)
}

/// Waits for the background publish of a redirect to land on the stream.
pub async fn wait_for_entries(stream: &MemoryStream, expected: usize) {
    for _ in 0..200 {
        if stream.len(CLICK_STREAM) >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "expected {} stream entries, found {}",
        expected,
        stream.len(CLICK_STREAM)
    );
}

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = ([1, 2, 3, 4], 40000).into();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
