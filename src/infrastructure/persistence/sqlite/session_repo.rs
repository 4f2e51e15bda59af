//! SQLite Session Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::DbPool;
use crate::application::ports::{
    RepositoryError, SessionRecord, SessionRepositoryPort, SessionSnapshot,
};

/// SQLite Session Repository
///
/// session_state 表恒有至多一行（id = 1 的 CHECK 约束）
pub struct SqliteSessionRepository {
    pool: DbPool,
}

impl SqliteSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct SessionRow {
    current_directory: Option<String>,
    current_file: Option<String>,
    current_cell: i64,
    last_updated: String,
}

impl TryFrom<SessionRow> for SessionRecord {
    type Error = RepositoryError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(SessionRecord {
            snapshot: SessionSnapshot {
                current_directory: row.current_directory,
                current_file: row.current_file,
                current_cell: row.current_cell,
            },
            last_updated: DateTime::parse_from_rfc3339(&row.last_updated)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?
                .with_timezone(&Utc),
        })
    }
}

#[async_trait]
impl SessionRepositoryPort for SqliteSessionRepository {
    async fn save(&self, snapshot: &SessionSnapshot) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO session_state (id, current_directory, current_file, current_cell, last_updated)
            VALUES (1, ?, ?, ?, ?)
            "#,
        )
        .bind(&snapshot.current_directory)
        .bind(&snapshot.current_file)
        .bind(snapshot.current_cell)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn load(&self) -> Result<Option<SessionRecord>, RepositoryError> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT current_directory, current_file, current_cell, last_updated FROM session_state WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(SessionRecord::try_from).transpose()
    }
}
