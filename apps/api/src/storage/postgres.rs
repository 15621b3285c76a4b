use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::resume::ResumeArtifact;
use crate::storage::{MetadataStore, StorageError};

/// Metadata rows in the `resumes` table.
pub struct PgMetadataStore {
    pool: PgPool,
}

impl PgMetadataStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataStore for PgMetadataStore {
    async fn insert(&self, artifact: &ResumeArtifact) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO resumes (id, user_id, template, html_path, pdf_path, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(artifact.id)
        .bind(artifact.user_id)
        .bind(&artifact.template)
        .bind(&artifact.html_path)
        .bind(&artifact.pdf_path)
        .bind(&artifact.metadata)
        .bind(artifact.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn select_by_id(&self, id: Uuid) -> Result<Option<ResumeArtifact>, StorageError> {
        Ok(sqlx::query_as::<_, ResumeArtifact>(
            r#"
            SELECT id, user_id, template, html_path, pdf_path, metadata, created_at
            FROM resumes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn set_pdf_path(&self, id: Uuid, pdf_path: &str) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE resumes SET pdf_path = $1 WHERE id = $2")
            .bind(pdf_path)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::MissingRecord(id));
        }
        Ok(())
    }
}
