//! Handler for alias redirects.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use std::net::SocketAddr;

use crate::application::services::ClickContext;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::{client_ip, header_or_empty};

/// Redirects an alias to its original URL.
///
/// # Endpoint
///
/// `GET /{alias}`
///
/// # Request Flow
///
/// 1. Collect the click context: client IP, `User-Agent`, `Referer`
/// 2. Resolve through the link service (cache first, then database)
/// 3. Return 302 Found with the original URL in `Location`; the click event
///    is published in the background
///
/// # Errors
///
/// Returns 404 Not Found if the alias doesn't exist.
/// Returns 500 Internal Server Error if the database lookup fails.
pub async fn redirect_handler(
    Path(alias): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<impl IntoResponse, AppError> {
    let context = ClickContext {
        ip_address: client_ip(&headers, addr, state.behind_proxy),
        user_agent: header_or_empty(&headers, header::USER_AGENT),
        referrer: header_or_empty(&headers, header::REFERER),
    };

    let url = state.link_service.resolve_and_track(&alias, context).await?;

    Ok((StatusCode::FOUND, [(header::LOCATION, url)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::test_support::{Collaborators, router};
    use crate::domain::click_event::{ClickEvent, EVENT_FIELD};
    use crate::domain::entities::{Link, LinkTarget};
    use crate::infrastructure::stream::MemoryStream;
    use axum::Router;
    use axum::routing::get;
    use axum_test::TestServer;
    use chrono::Utc;
    use std::time::Duration;

    fn app(collaborators: Collaborators) -> TestServer {
        let app: Router<AppState> = Router::new().route("/{alias}", get(redirect_handler));
        TestServer::new(router(app, collaborators)).unwrap()
    }

    async fn published_event(stream: &MemoryStream) -> ClickEvent {
        for _ in 0..100 {
            if let Some(entry) = stream.entries("clicks_stream").into_iter().next() {
                return ClickEvent::from_payload(entry.field(EVENT_FIELD)).unwrap();
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no click event published");
    }

    #[tokio::test]
    async fn test_redirect_from_cache() {
        let mut c = Collaborators::new();
        c.cache
            .expect_get_link()
            .withf(|alias| alias == "abc123")
            .times(1)
            .returning(|_| {
                Ok(Some(LinkTarget {
                    url: "https://example.com".into(),
                    link_id: 7,
                }))
            });
        c.links.expect_find_by_alias().never();
        let stream = c.stream.clone();

        let server = app(c);
        let response = server
            .get("/abc123")
            .add_header("user-agent", "test")
            .await;

        assert_eq!(response.status_code(), 302);
        assert_eq!(response.header("location"), "https://example.com");

        let event = published_event(&stream).await;
        assert_eq!(event.link_id, 7);
        assert_eq!(event.ip_address, "127.0.0.1");
        assert_eq!(event.user_agent, "test");
        assert_eq!(event.referrer, "");
    }

    #[tokio::test]
    async fn test_redirect_cache_miss_hits_database() {
        let mut c = Collaborators::new();
        c.cache.expect_get_link().returning(|_| Ok(None));
        c.cache.expect_set_link().times(1).returning(|_, _, _| Ok(()));
        c.links
            .expect_find_by_alias()
            .withf(|alias| alias == "abc123")
            .times(1)
            .returning(|_| {
                Ok(Some(Link::new(
                    3,
                    "abc123".into(),
                    "https://example.com/page".into(),
                    None,
                    Utc::now(),
                )))
            });

        let server = app(c);
        let response = server
            .get("/abc123")
            .add_header("referer", "https://news.example")
            .await;

        assert_eq!(response.status_code(), 302);
        assert_eq!(response.header("location"), "https://example.com/page");
    }

    #[tokio::test]
    async fn test_redirect_unknown_alias() {
        let mut c = Collaborators::new();
        c.cache.expect_get_link().returning(|_| Ok(None));
        c.cache.expect_set_link().never();
        c.links.expect_find_by_alias().returning(|_| Ok(None));
        let stream = c.stream.clone();

        let server = app(c);
        let response = server.get("/doesnotexist").await;

        assert_eq!(response.status_code(), 404);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"]["code"], "not_found");

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(stream.is_empty("clicks_stream"));
    }

    #[tokio::test]
    async fn test_redirect_uses_forwarded_ip_behind_proxy() {
        let mut c = Collaborators::new();
        c.behind_proxy = true;
        c.cache.expect_get_link().returning(|_| {
            Ok(Some(LinkTarget {
                url: "https://example.com".into(),
                link_id: 1,
            }))
        });
        let stream = c.stream.clone();

        let server = app(c);
        let response = server
            .get("/abc123")
            .add_header("x-forwarded-for", "1.2.3.4, 10.0.0.1")
            .await;

        assert_eq!(response.status_code(), 302);
        assert_eq!(published_event(&stream).await.ip_address, "1.2.3.4");
    }
}
