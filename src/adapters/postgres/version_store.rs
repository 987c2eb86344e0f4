//! PostgreSQL implementation of VersionStore.
//!
//! Each commit runs in one transaction that locks the briefing row
//! (`SELECT ... FOR UPDATE`), reads the current maximum version number,
//! inserts `max + 1` and moves the latest pointer. Concurrent commits to the
//! same briefing queue on the row lock; a unique violation on
//! `(briefing_id, version_number)` is reported as `Conflict`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::domain::briefing::{Briefing, BriefingVersion, NewVersion, QualityBanner, VersionSummary};
use crate::domain::foundation::{BriefingId, Timestamp, UserId, VersionId};
use crate::ports::{VersionStore, VersionStoreError};

const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL implementation of VersionStore.
#[derive(Clone)]
pub struct PostgresVersionStore {
    pool: PgPool,
}

impl PostgresVersionStore {
    /// Creates a new PostgresVersionStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage(context: &str, e: impl std::fmt::Display) -> VersionStoreError {
    VersionStoreError::Storage(format!("{}: {}", context, e))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == UNIQUE_VIOLATION)
        .unwrap_or(false)
}

/// A unique violation while writing a version means another commit took the
/// number first.
fn version_write_error(briefing_id: BriefingId, context: &str, e: sqlx::Error) -> VersionStoreError {
    if is_unique_violation(&e) {
        VersionStoreError::Conflict(briefing_id)
    } else {
        storage(context, e)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, VersionStoreError> {
    serde_json::to_value(value).map_err(|e| storage("Failed to encode column", e))
}

fn decode_json<T: DeserializeOwned>(column: &str, value: serde_json::Value) -> Result<T, VersionStoreError> {
    serde_json::from_value(value).map_err(|e| storage(&format!("Failed to decode {}", column), e))
}

fn from_json<T: DeserializeOwned>(row: &PgRow, column: &str) -> Result<T, VersionStoreError> {
    decode_json(column, row.get(column))
}

fn user_id(row: &PgRow, column: &str) -> Result<UserId, VersionStoreError> {
    let raw: String = row.get(column);
    UserId::new(raw).map_err(|e| storage("Invalid stored user id", e))
}

fn row_to_briefing(row: &PgRow) -> Result<Briefing, VersionStoreError> {
    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");
    let latest: Option<Uuid> = row.get("latest_version_id");

    Ok(Briefing {
        id: BriefingId::from_uuid(row.get("id")),
        title: row.get("title"),
        topic: row.get("topic"),
        created_by: user_id(row, "created_by")?,
        created_at: Timestamp::from_datetime(created_at),
        updated_at: Timestamp::from_datetime(updated_at),
        latest_version_id: latest.map(VersionId::from_uuid),
    })
}

fn row_to_version(row: &PgRow) -> Result<BriefingVersion, VersionStoreError> {
    let number: i32 = row.get("version_number");
    let parent: Option<Uuid> = row.get("parent_version_id");
    let created_at: DateTime<Utc> = row.get("created_at");

    Ok(BriefingVersion {
        id: VersionId::from_uuid(row.get("id")),
        briefing_id: BriefingId::from_uuid(row.get("briefing_id")),
        version_number: number as u32,
        parent_version_id: parent.map(VersionId::from_uuid),
        input_spec: from_json(row, "input_spec")?,
        data_pack: from_json(row, "data_pack")?,
        content: from_json(row, "content_json")?,
        banner: from_json(row, "quality_banner")?,
        change_summary: row.get("change_summary"),
        fallback_used: row.get("fallback_used"),
        created_by: user_id(row, "created_by")?,
        created_at: Timestamp::from_datetime(created_at),
    })
}

fn row_to_summary(row: &PgRow) -> Result<VersionSummary, VersionStoreError> {
    let number: i32 = row.get("version_number");
    let parent: Option<Uuid> = row.get("parent_version_id");
    let created_at: DateTime<Utc> = row.get("created_at");
    let banner: QualityBanner = from_json(row, "quality_banner")?;

    Ok(VersionSummary {
        id: VersionId::from_uuid(row.get("id")),
        briefing_id: BriefingId::from_uuid(row.get("briefing_id")),
        version_number: number as u32,
        parent_version_id: parent.map(VersionId::from_uuid),
        change_summary: row.get("change_summary"),
        banner_status: banner.status,
        fallback_used: row.get("fallback_used"),
        data_pack_hash: row.get("data_pack_hash"),
        created_by: user_id(row, "created_by")?,
        created_at: Timestamp::from_datetime(created_at),
    })
}

/// Numbers, inserts and publishes a version inside an open transaction.
/// The caller must already hold the briefing row lock.
async fn append_version(
    tx: &mut Transaction<'_, Postgres>,
    new: NewVersion,
) -> Result<BriefingVersion, VersionStoreError> {
    let briefing_id = new.briefing_id;

    let (next,): (i32,) = sqlx::query_as(
        "SELECT COALESCE(MAX(version_number), 0) + 1 FROM briefing_versions WHERE briefing_id = $1",
    )
    .bind(briefing_id.as_uuid())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| storage("Failed to read latest version number", e))?;

    let version = BriefingVersion::seal(new, next as u32, Timestamp::now());

    sqlx::query(
        r#"
        INSERT INTO briefing_versions (
            id, briefing_id, version_number, parent_version_id, input_spec,
            data_pack, data_pack_hash, content_json, quality_banner,
            change_summary, fallback_used, created_by, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(version.id.as_uuid())
    .bind(briefing_id.as_uuid())
    .bind(next)
    .bind(version.parent_version_id.map(|id| *id.as_uuid()))
    .bind(to_json(&version.input_spec)?)
    .bind(to_json(&version.data_pack)?)
    .bind(&version.data_pack.data_pack_hash)
    .bind(to_json(&version.content)?)
    .bind(to_json(&version.banner)?)
    .bind(&version.change_summary)
    .bind(version.fallback_used)
    .bind(version.created_by.as_str())
    .bind(version.created_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(|e| version_write_error(briefing_id, "Failed to insert version", e))?;

    sqlx::query("UPDATE briefings SET latest_version_id = $2, updated_at = $3 WHERE id = $1")
        .bind(briefing_id.as_uuid())
        .bind(version.id.as_uuid())
        .bind(version.created_at.as_datetime())
        .execute(&mut **tx)
        .await
        .map_err(|e| storage("Failed to move latest pointer", e))?;

    Ok(version)
}

#[async_trait]
impl VersionStore for PostgresVersionStore {
    async fn create(
        &self,
        briefing: Briefing,
        first: NewVersion,
    ) -> Result<BriefingVersion, VersionStoreError> {
        if first.briefing_id != briefing.id {
            return Err(VersionStoreError::Storage(format!(
                "first version belongs to {}, not {}",
                first.briefing_id, briefing.id
            )));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage("Failed to begin transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO briefings (id, title, topic, created_by, created_at, updated_at, latest_version_id)
            VALUES ($1, $2, $3, $4, $5, $6, NULL)
            "#,
        )
        .bind(briefing.id.as_uuid())
        .bind(&briefing.title)
        .bind(&briefing.topic)
        .bind(briefing.created_by.as_str())
        .bind(briefing.created_at.as_datetime())
        .bind(briefing.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                VersionStoreError::BriefingExists(briefing.id)
            } else {
                storage("Failed to insert briefing", e)
            }
        })?;

        let version = append_version(&mut tx, first).await?;

        tx.commit()
            .await
            .map_err(|e| storage("Failed to commit transaction", e))?;

        Ok(version)
    }

    async fn commit(&self, version: NewVersion) -> Result<BriefingVersion, VersionStoreError> {
        let briefing_id = version.briefing_id;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage("Failed to begin transaction", e))?;

        let locked = sqlx::query("SELECT id FROM briefings WHERE id = $1 FOR UPDATE")
            .bind(briefing_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| storage("Failed to lock briefing", e))?;
        if locked.is_none() {
            return Err(VersionStoreError::BriefingNotFound(briefing_id));
        }

        let committed = append_version(&mut tx, version).await?;

        tx.commit()
            .await
            .map_err(|e| version_write_error(briefing_id, "Failed to commit transaction", e))?;

        Ok(committed)
    }

    async fn get_briefing(&self, id: BriefingId) -> Result<Option<Briefing>, VersionStoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, topic, created_by, created_at, updated_at, latest_version_id
            FROM briefings WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage("Failed to fetch briefing", e))?;

        row.as_ref().map(row_to_briefing).transpose()
    }

    async fn get(
        &self,
        briefing_id: BriefingId,
        version_id: VersionId,
    ) -> Result<Option<BriefingVersion>, VersionStoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, briefing_id, version_number, parent_version_id, input_spec,
                   data_pack, content_json, quality_banner, change_summary,
                   fallback_used, created_by, created_at
            FROM briefing_versions
            WHERE briefing_id = $1 AND id = $2
            "#,
        )
        .bind(briefing_id.as_uuid())
        .bind(version_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage("Failed to fetch version", e))?;

        row.as_ref().map(row_to_version).transpose()
    }

    async fn list(&self, briefing_id: BriefingId) -> Result<Vec<VersionSummary>, VersionStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, briefing_id, version_number, parent_version_id, quality_banner,
                   change_summary, fallback_used, data_pack_hash, created_by, created_at
            FROM briefing_versions
            WHERE briefing_id = $1
            ORDER BY version_number ASC
            "#,
        )
        .bind(briefing_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage("Failed to list versions", e))?;

        rows.iter().map(row_to_summary).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::briefing::BannerStatus;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;

    #[derive(Debug)]
    struct PgCode(&'static str);

    impl std::fmt::Display for PgCode {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "database error {}", self.0)
        }
    }

    impl std::error::Error for PgCode {}

    impl DatabaseError for PgCode {
        fn message(&self) -> &str {
            "database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            if self.0 == UNIQUE_VIOLATION {
                ErrorKind::UniqueViolation
            } else {
                ErrorKind::Other
            }
        }
    }

    fn db_error(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(PgCode(code)))
    }

    #[test]
    fn unique_violation_is_a_conflict() {
        let id = BriefingId::new();

        let err = version_write_error(id, "Failed to insert version", db_error("23505"));

        assert_eq!(err, VersionStoreError::Conflict(id));
        assert!(err.is_transient());
    }

    #[test]
    fn other_database_errors_are_storage_failures() {
        let id = BriefingId::new();

        let fk = version_write_error(id, "Failed to insert version", db_error("23503"));
        let missing = version_write_error(id, "Failed to insert version", sqlx::Error::RowNotFound);

        assert!(matches!(fk, VersionStoreError::Storage(ref m) if m.starts_with("Failed to insert version")));
        assert!(matches!(missing, VersionStoreError::Storage(_)));
    }

    #[test]
    fn stored_banner_decodes_to_its_status() {
        let banner = QualityBanner::from_checks(vec![]);
        let value = to_json(&banner).unwrap();

        let decoded: QualityBanner = decode_json("quality_banner", value).unwrap();

        assert_eq!(decoded.status, BannerStatus::Pass);
    }

    #[test]
    fn malformed_banner_names_the_column() {
        let value = serde_json::json!({"status": "green", "checks": "none"});

        let err = decode_json::<QualityBanner>("quality_banner", value).unwrap_err();

        assert!(matches!(err, VersionStoreError::Storage(ref m) if m.contains("quality_banner")));
    }
}
