//! PostgreSQL implementation of SeriesStore.
//!
//! Reads the canonical `economic_series` / `economic_observations` tables.
//! Only enabled series resolve.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::foundation::Timestamp;
use crate::domain::series::{
    Frequency, LookbackWindow, Observation, SeriesDescriptor, SeriesSelector, SeriesSource,
};
use crate::ports::{SeriesStore, SeriesStoreError};

/// PostgreSQL implementation of SeriesStore.
#[derive(Clone)]
pub struct PostgresSeriesStore {
    pool: PgPool,
}

impl PostgresSeriesStore {
    /// Creates a new PostgresSeriesStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn query_error(context: &str, e: sqlx::Error) -> SeriesStoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            SeriesStoreError::Unavailable(format!("{}: {}", context, e))
        }
        other => SeriesStoreError::Query(format!("{}: {}", context, other)),
    }
}

fn row_to_descriptor(row: &PgRow) -> Result<SeriesDescriptor, SeriesStoreError> {
    let source: String = row.get("source");
    let source: SeriesSource = source
        .parse()
        .map_err(|e| SeriesStoreError::Query(format!("Invalid stored source: {}", e)))?;
    let frequency: String = row.get("frequency");
    let ingested_at: Option<DateTime<Utc>> = row.get("ingested_at");

    Ok(SeriesDescriptor {
        slug: row.get("slug"),
        source,
        series_id: row.get("series_id"),
        dataset_id: row.get("dataset_id"),
        name: row.get("name"),
        unit: row.get("unit"),
        frequency: Frequency::from_code(&frequency),
        ingested_at: ingested_at.map(Timestamp::from_datetime),
    })
}

#[async_trait]
impl SeriesStore for PostgresSeriesStore {
    async fn resolve_selector(
        &self,
        selector: &SeriesSelector,
    ) -> Result<Option<SeriesDescriptor>, SeriesStoreError> {
        let row = sqlx::query(
            r#"
            SELECT slug, source, series_id, dataset_id, name, unit, frequency, ingested_at
            FROM economic_series
            WHERE enabled = TRUE
              AND source = $1
              AND (LOWER(series_id) = LOWER($2) OR LOWER(slug) = LOWER($2))
              AND ($3::TEXT IS NULL OR LOWER(dataset_id) = LOWER($3))
            ORDER BY slug
            LIMIT 1
            "#,
        )
        .bind(selector.source.as_str())
        .bind(selector.source_series_id.trim())
        .bind(selector.dataset_id.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("Failed to resolve series", e))?;

        row.as_ref().map(row_to_descriptor).transpose()
    }

    async fn fetch_observations(
        &self,
        series: &SeriesDescriptor,
        window: &LookbackWindow,
    ) -> Result<Vec<Observation>, SeriesStoreError> {
        let rows = match *window {
            LookbackWindow::Periods { count } => {
                sqlx::query(
                    r#"
                    SELECT period, value
                    FROM economic_observations
                    WHERE series_slug = $1
                    ORDER BY period DESC
                    LIMIT $2
                    "#,
                )
                .bind(&series.slug)
                .bind(i64::from(count))
                .fetch_all(&self.pool)
                .await
            }
            LookbackWindow::Range { start, end } => {
                sqlx::query(
                    r#"
                    SELECT period, value
                    FROM economic_observations
                    WHERE series_slug = $1 AND period BETWEEN $2 AND $3
                    ORDER BY period
                    "#,
                )
                .bind(&series.slug)
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| query_error("Failed to fetch observations", e))?;

        Ok(rows
            .iter()
            .map(|row| {
                let period: NaiveDate = row.get("period");
                let value: Option<f64> = row.get("value");
                Observation { period, value }
            })
            .collect())
    }
}
