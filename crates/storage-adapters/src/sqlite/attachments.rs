use async_trait::async_trait;
use domains::{AttachmentRepository, DomainResult, PostId};

use super::{db_err, SqliteStore};

#[async_trait]
impl AttachmentRepository for SqliteStore {
    async fn upsert(&self, post_id: PostId, name: &str) -> DomainResult<bool> {
        let result = sqlx::query(
            "INSERT INTO attachments (post_id, name) VALUES (?, ?) \
             ON CONFLICT (post_id, name) DO NOTHING",
        )
        .bind(post_id)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, post_id: PostId, name: &str) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM attachments WHERE post_id = ? AND name = ?")
            .bind(post_id)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, post_id: PostId, name: &str) -> DomainResult<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM attachments WHERE post_id = ? AND name = ?")
                .bind(post_id)
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(found.is_some())
    }

    async fn list_names(&self, post_id: PostId) -> DomainResult<Vec<String>> {
        sqlx::query_scalar("SELECT name FROM attachments WHERE post_id = ? ORDER BY name")
            .bind(post_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)
    }
}
