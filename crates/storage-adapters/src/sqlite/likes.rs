use async_trait::async_trait;
use domains::{DomainResult, LikeRepository, PostId};

use super::{db_err, SqliteStore};

#[async_trait]
impl LikeRepository for SqliteStore {
    async fn exists(&self, post_id: PostId, email: &str) -> DomainResult<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM likes WHERE post_id = ? AND author_email = ?")
                .bind(post_id)
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(found.is_some())
    }

    async fn insert(&self, post_id: PostId, email: &str) -> DomainResult<bool> {
        // a concurrent toggle may have inserted the pair already
        let result = sqlx::query(
            "INSERT INTO likes (post_id, author_email) VALUES (?, ?) \
             ON CONFLICT (post_id, author_email) DO NOTHING",
        )
        .bind(post_id)
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, post_id: PostId, email: &str) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM likes WHERE post_id = ? AND author_email = ?")
            .bind(post_id)
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, post_id: PostId) -> DomainResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn delete_by_post(&self, post_id: PostId) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM likes WHERE post_id = ?")
            .bind(post_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use super::*;

    #[tokio::test]
    async fn at_most_one_like_per_member() {
        let store = fixtures::store().await;
        fixtures::member(&store, "a@pets.io", "alice").await;
        let post = fixtures::post(&store, "a@pets.io", "t", "c").await;

        assert!(store.insert(post, "a@pets.io").await.unwrap());
        assert!(!store.insert(post, "a@pets.io").await.unwrap());
        assert_eq!(store.count(post).await.unwrap(), 1);
        assert!(store.exists(post, "a@pets.io").await.unwrap());
    }

    #[tokio::test]
    async fn delete_absent_like_is_noop() {
        let store = fixtures::store().await;
        fixtures::member(&store, "a@pets.io", "alice").await;
        let post = fixtures::post(&store, "a@pets.io", "t", "c").await;

        assert!(!store.delete(post, "a@pets.io").await.unwrap());
        assert_eq!(store.count(post).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_by_post_clears_all_members() {
        let store = fixtures::store().await;
        fixtures::member(&store, "a@pets.io", "alice").await;
        fixtures::member(&store, "b@pets.io", "bob").await;
        let post = fixtures::post(&store, "a@pets.io", "t", "c").await;
        store.insert(post, "a@pets.io").await.unwrap();
        store.insert(post, "b@pets.io").await.unwrap();

        assert_eq!(store.delete_by_post(post).await.unwrap(), 2);
        assert_eq!(store.count(post).await.unwrap(), 0);
    }
}
