//! PostgreSQL implementation of click repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{ClickRecord, NewClick};
use crate::domain::repositories::{ClickRepository, LinkAnalytics, StoreError};

/// PostgreSQL repository for click records and analytics.
pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ClickRow {
    id: i64,
    link_id: i64,
    clicked_at: DateTime<Utc>,
    ip_address: String,
    user_agent: String,
    referrer: String,
}

#[derive(sqlx::FromRow)]
struct AnalyticsRow {
    id: i64,
    alias: String,
    original_url: String,
    total_clicks: i64,
}

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn record_click(&self, new_click: NewClick) -> Result<ClickRecord, StoreError> {
        let row = sqlx::query_as::<_, ClickRow>(
            r#"
            INSERT INTO click_records (link_id, clicked_at, ip_address, user_agent, referrer)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, link_id, clicked_at, ip_address, user_agent, referrer
            "#,
        )
        .bind(new_click.link_id)
        .bind(new_click.clicked_at)
        .bind(&new_click.ip_address)
        .bind(&new_click.user_agent)
        .bind(&new_click.referrer)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(ClickRecord::new(
            row.id,
            row.link_id,
            row.clicked_at,
            row.ip_address,
            row.user_agent,
            row.referrer,
        ))
    }

    async fn count_by_link(&self, link_id: i64) -> Result<i64, StoreError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM click_records WHERE link_id = $1")
                .bind(link_id)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(count)
    }

    async fn analytics_for_owner(
        &self,
        owner_user_id: i64,
    ) -> Result<Vec<LinkAnalytics>, StoreError> {
        let rows = sqlx::query_as::<_, AnalyticsRow>(
            r#"
            SELECT l.id, l.alias, l.original_url, COUNT(c.id) AS total_clicks
            FROM links l
            LEFT JOIN click_records c ON c.link_id = l.id
            WHERE l.owner_user_id = $1
            GROUP BY l.id
            ORDER BY l.created_at DESC, l.id DESC
            "#,
        )
        .bind(owner_user_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| LinkAnalytics {
                link_id: r.id,
                alias: r.alias,
                original_url: r.original_url,
                total_clicks: r.total_clicks,
            })
            .collect())
    }
}
