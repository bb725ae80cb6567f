use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{DomainResult, NewPost, Post, PostId, PostRepository};

use super::listing::fold;
use super::{db_err, SqliteStore};

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    author_email: String,
    created_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            title: row.title,
            content: row.content,
            author_email: row.author_email,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl PostRepository for SqliteStore {
    async fn insert(&self, post: NewPost) -> DomainResult<PostId> {
        let result = sqlx::query(
            "INSERT INTO posts (title, content, search_title, search_content, author_email, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(fold(&post.title))
        .bind(fold(&post.content))
        .bind(&post.author_email)
        .bind(post.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.last_insert_rowid())
    }

    async fn find_by_id(&self, id: PostId) -> DomainResult<Option<Post>> {
        let row: Option<PostRow> = sqlx::query_as(
            "SELECT id, title, content, author_email, created_at FROM posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(Post::from))
    }

    async fn update_text(&self, id: PostId, title: &str, content: &str) -> DomainResult<()> {
        sqlx::query(
            "UPDATE posts SET title = ?, content = ?, search_title = ?, search_content = ? WHERE id = ?",
        )
        .bind(title)
        .bind(content)
        .bind(fold(title))
        .bind(fold(content))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn delete(&self, id: PostId) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use super::*;

    #[tokio::test]
    async fn insert_then_find() {
        let store = fixtures::store().await;
        fixtures::member(&store, "a@pets.io", "alice").await;

        let id = fixtures::post(&store, "a@pets.io", "Title", "Body").await;
        let post = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(post.title, "Title");
        assert_eq!(post.author_email, "a@pets.io");
    }

    #[tokio::test]
    async fn ids_increase() {
        let store = fixtures::store().await;
        fixtures::member(&store, "a@pets.io", "alice").await;

        let first = fixtures::post(&store, "a@pets.io", "1", "1").await;
        let second = fixtures::post(&store, "a@pets.io", "2", "2").await;
        assert!(second > first);
    }

    #[tokio::test]
    async fn update_keeps_created_at() {
        let store = fixtures::store().await;
        fixtures::member(&store, "a@pets.io", "alice").await;
        let id = fixtures::post(&store, "a@pets.io", "old", "old").await;
        let before = store.find_by_id(id).await.unwrap().unwrap();

        store.update_text(id, "new", "body").await.unwrap();
        let after = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(after.title, "new");
        assert_eq!(after.content, "body");
        assert_eq!(after.created_at, before.created_at);
    }

    #[tokio::test]
    async fn delete_reports_absence() {
        let store = fixtures::store().await;
        fixtures::member(&store, "a@pets.io", "alice").await;
        let id = fixtures::post(&store, "a@pets.io", "t", "c").await;

        assert!(PostRepository::delete(&store, id).await.unwrap());
        assert!(!PostRepository::delete(&store, id).await.unwrap());
        assert!(store.find_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_author_is_rejected_by_foreign_key() {
        let store = fixtures::store().await;
        let result = store
            .insert(NewPost {
                title: "t".into(),
                content: "c".into(),
                author_email: "ghost@pets.io".into(),
                created_at: Utc::now(),
            })
            .await;
        assert!(result.is_err());
    }
}
