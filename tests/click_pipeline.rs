//! Redirect to persisted click record, end to end over the test database.

mod common;

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shorty::application::services::{ClickContext, LinkError, LinkService};
use shorty::domain::click_worker::{ClickWorker, WorkerSettings};
use shorty::domain::entities::LinkTarget;
use shorty::infrastructure::cache::{CacheResult, CacheService};
use shorty::infrastructure::persistence::{PgClickRepository, PgLinkRepository};
use shorty::infrastructure::stream::MemoryStream;
use shorty::utils::alias::AliasGenerator;

#[derive(Default)]
struct MapCache {
    entries: Mutex<HashMap<String, LinkTarget>>,
}

impl MapCache {
    fn get(&self, alias: &str) -> Option<LinkTarget> {
        self.entries.lock().unwrap().get(alias).cloned()
    }
}

#[async_trait]
impl CacheService for MapCache {
    async fn get_link(&self, alias: &str) -> CacheResult<Option<LinkTarget>> {
        Ok(self.get(alias))
    }

    async fn set_link(&self, alias: &str, target: &LinkTarget, _ttl: Duration) -> CacheResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(alias.to_string(), target.clone());
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

struct Pipeline {
    service: LinkService,
    worker: ClickWorker,
    cache: Arc<MapCache>,
    stream: Arc<MemoryStream>,
}

async fn pipeline(pool: PgPool) -> Pipeline {
    let pool = Arc::new(pool);
    let cache = Arc::new(MapCache::default());
    let stream = Arc::new(MemoryStream::new());

    let service = LinkService::new(
        Arc::new(PgLinkRepository::new(pool.clone())),
        cache.clone(),
        stream.clone(),
        common::CLICK_STREAM,
        Duration::from_secs(3600),
        AliasGenerator::from_seed(1),
    );

    let worker = ClickWorker::new(
        stream.clone(),
        Arc::new(PgClickRepository::new(pool)),
        WorkerSettings {
            block: Some(Duration::from_millis(50)),
            ..WorkerSettings::default()
        },
    );
    worker.ensure_group().await.unwrap();

    Pipeline {
        service,
        worker,
        cache,
        stream,
    }
}

#[sqlx::test]
async fn test_resolved_click_is_persisted_once(pool: PgPool) {
    let p = pipeline(pool.clone()).await;

    let link = p
        .service
        .create_alias("https://example.com", Some("abc123"), None)
        .await
        .unwrap();

    let url = p
        .service
        .resolve_and_track(
            "abc123",
            ClickContext {
                ip_address: "1.2.3.4".to_string(),
                user_agent: "test".to_string(),
                referrer: String::new(),
            },
        )
        .await
        .unwrap();

    assert_eq!(url, "https://example.com");
    assert_eq!(
        p.cache.get("abc123"),
        Some(LinkTarget {
            url: "https://example.com".to_string(),
            link_id: link.id,
        })
    );

    common::wait_for_entries(&p.stream, 1).await;

    let report = p.worker.poll_once().await.unwrap();
    assert_eq!(report.persisted, 1);

    let again = p.worker.poll_once().await.unwrap();
    assert_eq!(again.total(), 0);

    assert_eq!(common::count_clicks(&pool, link.id).await, 1);
    assert_eq!(p.stream.pending_count(common::CLICK_STREAM, "clicks_group"), 0);

    let (ip, ua, referrer): (String, String, String) = sqlx::query_as(
        "SELECT ip_address, user_agent, referrer FROM click_records WHERE link_id = $1",
    )
    .bind(link.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(ip, "1.2.3.4");
    assert_eq!(ua, "test");
    assert_eq!(referrer, "");
}

#[sqlx::test]
async fn test_unknown_alias_leaves_no_trace(pool: PgPool) {
    let p = pipeline(pool).await;

    let result = p
        .service
        .resolve_and_track("doesnotexist", ClickContext::default())
        .await;

    assert!(matches!(result, Err(LinkError::LinkNotFound { .. })));
    assert!(p.cache.get("doesnotexist").is_none());
    assert!(p.stream.is_empty(common::CLICK_STREAM));
}

#[sqlx::test]
async fn test_warm_cache_resolves_without_database_row(pool: PgPool) {
    let p = pipeline(pool.clone()).await;

    p.service
        .create_alias("https://example.com/warm", Some("warm01"), None)
        .await
        .unwrap();

    let first = p
        .service
        .resolve_and_track("warm01", ClickContext::default())
        .await
        .unwrap();

    // Links are immutable; a cached alias keeps resolving from the cache
    sqlx::query("DELETE FROM links WHERE alias = 'warm01'")
        .execute(&pool)
        .await
        .unwrap();

    let second = p
        .service
        .resolve_and_track("warm01", ClickContext::default())
        .await
        .unwrap();

    assert_eq!(first, second);
    common::wait_for_entries(&p.stream, 2).await;
}
