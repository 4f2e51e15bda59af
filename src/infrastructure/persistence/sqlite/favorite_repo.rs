//! SQLite Favorite Repository

use async_trait::async_trait;
use chrono::Utc;

use super::DbPool;
use crate::application::ports::{FavoriteRepositoryPort, RepositoryError};

/// SQLite Favorite Repository
pub struct SqliteFavoriteRepository {
    pool: DbPool,
}

impl SqliteFavoriteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoriteRepositoryPort for SqliteFavoriteRepository {
    async fn is_starred(&self, path: &str) -> Result<bool, RepositoryError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM starred WHERE path = ?")
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;
        Ok(row.is_some())
    }

    async fn star(&self, path: &str) -> Result<(), RepositoryError> {
        // 重复收藏被吞掉（幂等）
        sqlx::query("INSERT OR IGNORE INTO starred (path, starred_at) VALUES (?, ?)")
            .bind(path)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    async fn unstar(&self, path: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM starred WHERE path = ?")
            .bind(path)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    async fn list_starred(&self) -> Result<Vec<String>, RepositoryError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT path FROM starred ORDER BY starred_at DESC")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;
        Ok(rows.into_iter().map(|(path,)| path).collect())
    }
}
