use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{BlobIntent, BlobIntentLog, BlobOp, DomainError, DomainResult, PostId};

use super::{db_err, SqliteStore};

#[derive(sqlx::FromRow)]
struct IntentRow {
    id: i64,
    op: String,
    post_id: i64,
    name: String,
    object_key: String,
    attempts: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<IntentRow> for BlobIntent {
    type Error = DomainError;

    fn try_from(row: IntentRow) -> Result<Self, Self::Error> {
        let op = BlobOp::parse(&row.op)
            .ok_or_else(|| DomainError::Internal(format!("unknown blob op {}", row.op)))?;
        Ok(BlobIntent {
            id: row.id,
            op,
            post_id: row.post_id,
            name: row.name,
            object_key: row.object_key,
            attempts: row.attempts,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl BlobIntentLog for SqliteStore {
    async fn record(
        &self,
        op: BlobOp,
        post_id: PostId,
        name: &str,
        object_key: &str,
    ) -> DomainResult<i64> {
        let result = sqlx::query(
            "INSERT INTO blob_intents (op, post_id, name, object_key, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(op.as_str())
        .bind(post_id)
        .bind(name)
        .bind(object_key)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.last_insert_rowid())
    }

    async fn clear(&self, id: i64) -> DomainResult<()> {
        sqlx::query("DELETE FROM blob_intents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn mark_failed(&self, id: i64, error: &str) -> DomainResult<()> {
        sqlx::query("UPDATE blob_intents SET attempts = attempts + 1, last_error = ? WHERE id = ?")
            .bind(error)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn pending(&self, older_than: DateTime<Utc>, limit: i64) -> DomainResult<Vec<BlobIntent>> {
        let rows: Vec<IntentRow> = sqlx::query_as(
            "SELECT id, op, post_id, name, object_key, attempts, created_at \
             FROM blob_intents WHERE created_at < ? ORDER BY created_at ASC, id ASC LIMIT ?",
        )
        .bind(older_than)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(BlobIntent::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn recorded_intents_become_pending_after_cutoff() {
        let store = fixtures::store().await;
        let id = store
            .record(BlobOp::Delete, 3, "a.png", "prj/board/3/a.png")
            .await
            .unwrap();

        let early = store.pending(Utc::now() - Duration::hours(1), 10).await.unwrap();
        assert!(early.is_empty());

        let later = store.pending(Utc::now() + Duration::seconds(1), 10).await.unwrap();
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].id, id);
        assert_eq!(later[0].op, BlobOp::Delete);
        assert_eq!(later[0].object_key, "prj/board/3/a.png");
    }

    #[tokio::test]
    async fn mark_failed_counts_attempts_and_clear_removes() {
        let store = fixtures::store().await;
        let id = store.record(BlobOp::Put, 1, "b", "k").await.unwrap();
        store.mark_failed(id, "timeout").await.unwrap();
        store.mark_failed(id, "timeout").await.unwrap();

        let cutoff = Utc::now() + Duration::seconds(1);
        assert_eq!(store.pending(cutoff, 10).await.unwrap()[0].attempts, 2);

        store.clear(id).await.unwrap();
        assert!(store.pending(cutoff, 10).await.unwrap().is_empty());
    }
}
