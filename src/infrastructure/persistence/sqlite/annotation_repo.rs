//! SQLite Annotation Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::DbPool;
use crate::application::ports::{
    AnnotationRepositoryPort, NewAnnotation, RepositoryError,
};
use crate::domain::{Annotation, MatchConfidence};

/// SQLite Annotation Repository
pub struct SqliteAnnotationRepository {
    pool: DbPool,
}

impl SqliteAnnotationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct AnnotationRow {
    id: i64,
    file_path: String,
    heading_text: String,
    content_hash: String,
    cell_index: Option<i64>,
    comment_text: String,
    created_at: String,
    last_matched_at: String,
    match_confidence: String,
}

impl TryFrom<AnnotationRow> for Annotation {
    type Error = RepositoryError;

    fn try_from(row: AnnotationRow) -> Result<Self, Self::Error> {
        Ok(Annotation {
            id: row.id,
            file_path: row.file_path,
            heading: row.heading_text,
            content_hash: row.content_hash,
            cell_index: row.cell_index.unwrap_or(0),
            text: row.comment_text,
            created_at: parse_timestamp(&row.created_at)?,
            last_matched_at: parse_timestamp(&row.last_matched_at)?,
            confidence: MatchConfidence::from_str(&row.match_confidence)
                .unwrap_or(MatchConfidence::Exact),
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

const SELECT_COLUMNS: &str = "SELECT id, file_path, heading_text, content_hash, cell_index, comment_text, created_at, last_matched_at, match_confidence FROM comments";

#[async_trait]
impl AnnotationRepositoryPort for SqliteAnnotationRepository {
    async fn find_exact(
        &self,
        file_path: &str,
        heading: &str,
        content_hash: &str,
    ) -> Result<Vec<Annotation>, RepositoryError> {
        let rows: Vec<AnnotationRow> = sqlx::query_as(&format!(
            "{} WHERE file_path = ? AND heading_text = ? AND content_hash = ? ORDER BY created_at, id",
            SELECT_COLUMNS
        ))
        .bind(file_path)
        .bind(heading)
        .bind(content_hash)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(Annotation::try_from).collect()
    }

    async fn find_by_heading(
        &self,
        file_path: &str,
        heading: &str,
    ) -> Result<Vec<Annotation>, RepositoryError> {
        let rows: Vec<AnnotationRow> = sqlx::query_as(&format!(
            "{} WHERE file_path = ? AND heading_text = ? ORDER BY created_at, id",
            SELECT_COLUMNS
        ))
        .bind(file_path)
        .bind(heading)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(Annotation::try_from).collect()
    }

    async fn mark_matched(
        &self,
        ids: &[i64],
        confidence: MatchConfidence,
    ) -> Result<(), RepositoryError> {
        let now = Utc::now().to_rfc3339();
        for id in ids {
            sqlx::query(
                "UPDATE comments SET last_matched_at = ?, match_confidence = ? WHERE id = ?",
            )
            .bind(&now)
            .bind(confidence.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;
        }
        Ok(())
    }

    async fn insert(&self, annotation: &NewAnnotation) -> Result<i64, RepositoryError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO comments
                (file_path, heading_text, content_hash, cell_index, comment_text, created_at, last_matched_at, match_confidence)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&annotation.file_path)
        .bind(&annotation.heading)
        .bind(&annotation.content_hash)
        .bind(annotation.cell_index)
        .bind(&annotation.text)
        .bind(&now)
        .bind(&now)
        .bind(MatchConfidence::Exact.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .map(|d| d.is_unique_violation())
                .unwrap_or(false)
            {
                RepositoryError::Duplicate(format!(
                    "annotation for {} / {}",
                    annotation.file_path, annotation.heading
                ))
            } else {
                RepositoryError::DatabaseError(e.to_string())
            }
        })?;

        Ok(result.last_insert_rowid())
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};

    async fn repo() -> SqliteAnnotationRepository {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteAnnotationRepository::new(pool)
    }

    fn new_annotation(text: &str) -> NewAnnotation {
        NewAnnotation {
            file_path: "/doc.md".to_string(),
            heading: "# A".to_string(),
            content_hash: "hash-a".to_string(),
            cell_index: 0,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_exact() {
        let repo = repo().await;
        let id = repo.insert(&new_annotation("note")).await.unwrap();
        assert!(id > 0);

        let found = repo.find_exact("/doc.md", "# A", "hash-a").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "note");
        assert_eq!(found[0].confidence, MatchConfidence::Exact);
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let repo = repo().await;
        repo.insert(&new_annotation("same")).await.unwrap();
        let err = repo.insert(&new_annotation("same")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Duplicate(_)));

        // 不同正文不算重复
        repo.insert(&new_annotation("different")).await.unwrap();
        let found = repo.find_by_heading("/doc.md", "# A").await.unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_find_by_heading_ignores_hash() {
        let repo = repo().await;
        repo.insert(&new_annotation("note")).await.unwrap();

        let exact = repo.find_exact("/doc.md", "# A", "other-hash").await.unwrap();
        assert!(exact.is_empty());

        let by_heading = repo.find_by_heading("/doc.md", "# A").await.unwrap();
        assert_eq!(by_heading.len(), 1);
    }

    #[tokio::test]
    async fn test_ordered_by_creation() {
        let repo = repo().await;
        for n in 0..3 {
            repo.insert(&new_annotation(&format!("note {}", n)))
                .await
                .unwrap();
        }
        let found = repo.find_by_heading("/doc.md", "# A").await.unwrap();
        let texts: Vec<&str> = found.iter().map(|a| a.text.as_str()).collect();
        assert_eq!(texts, vec!["note 0", "note 1", "note 2"]);
    }

    #[tokio::test]
    async fn test_mark_matched_rewrites_confidence() {
        let repo = repo().await;
        let id = repo.insert(&new_annotation("note")).await.unwrap();

        repo.mark_matched(&[id], MatchConfidence::Fuzzy).await.unwrap();
        let found = repo.find_by_heading("/doc.md", "# A").await.unwrap();
        assert_eq!(found[0].confidence, MatchConfidence::Fuzzy);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repo().await;
        let id = repo.insert(&new_annotation("note")).await.unwrap();
        repo.delete(id).await.unwrap();
        let found = repo.find_by_heading("/doc.md", "# A").await.unwrap();
        assert!(found.is_empty());
    }
}
