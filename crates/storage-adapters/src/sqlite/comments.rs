use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    Comment, CommentId, CommentRepository, CommentView, DomainResult, NewComment, PostId,
};

use super::{db_err, SqliteStore};

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    author_email: String,
    text: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CommentViewRow {
    id: i64,
    post_id: i64,
    author_email: String,
    nick_name: String,
    text: String,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl CommentRepository for SqliteStore {
    async fn insert(&self, comment: NewComment) -> DomainResult<CommentId> {
        let result = sqlx::query(
            "INSERT INTO comments (post_id, author_email, text, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(comment.post_id)
        .bind(&comment.author_email)
        .bind(&comment.text)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.last_insert_rowid())
    }

    async fn find_by_id(&self, id: CommentId) -> DomainResult<Option<Comment>> {
        let row: Option<CommentRow> = sqlx::query_as(
            "SELECT id, post_id, author_email, text, created_at FROM comments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|r| Comment {
            id: r.id,
            post_id: r.post_id,
            author_email: r.author_email,
            text: r.text,
            created_at: r.created_at,
        }))
    }

    async fn update_text(&self, id: CommentId, text: &str) -> DomainResult<()> {
        sqlx::query("UPDATE comments SET text = ? WHERE id = ?")
            .bind(text)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete(&self, id: CommentId) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_by_post(&self, post_id: PostId) -> DomainResult<Vec<CommentView>> {
        let rows: Vec<CommentViewRow> = sqlx::query_as(
            "SELECT c.id, c.post_id, c.author_email, m.nick_name, c.text, c.created_at \
             FROM comments c JOIN members m ON m.email = c.author_email \
             WHERE c.post_id = ? \
             ORDER BY c.created_at ASC, c.id ASC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|r| CommentView {
                id: r.id,
                board_id: r.post_id,
                member_id: r.author_email,
                nick_name: r.nick_name,
                comment: r.text,
                inserted: r.created_at,
            })
            .collect())
    }

    async fn delete_by_post(&self, post_id: PostId) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM comments WHERE post_id = ?")
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
    use chrono::Duration;

    fn new_comment(post_id: PostId, author: &str, text: &str, at: DateTime<Utc>) -> NewComment {
        NewComment {
            post_id,
            author_email: author.into(),
            text: text.into(),
            created_at: at,
        }
    }

    #[tokio::test]
    async fn list_orders_by_creation_time() {
        let store = fixtures::store().await;
        fixtures::member(&store, "a@pets.io", "alice").await;
        fixtures::member(&store, "b@pets.io", "bob").await;
        let post = fixtures::post(&store, "a@pets.io", "t", "c").await;

        let now = Utc::now();
        store
            .insert(new_comment(post, "b@pets.io", "second", now))
            .await
            .unwrap();
        store
            .insert(new_comment(post, "a@pets.io", "first", now - Duration::seconds(5)))
            .await
            .unwrap();

        let views = store.list_by_post(post).await.unwrap();
        let texts: Vec<_> = views.iter().map(|v| v.comment.as_str()).collect();
        assert_eq!(texts, ["first", "second"]);
        assert_eq!(views[1].nick_name, "bob");
    }

    #[tokio::test]
    async fn delete_by_post_only_touches_that_post() {
        let store = fixtures::store().await;
        fixtures::member(&store, "a@pets.io", "alice").await;
        let keep = fixtures::post(&store, "a@pets.io", "t", "c").await;
        let doomed = fixtures::post(&store, "a@pets.io", "t", "c").await;
        let now = Utc::now();
        store.insert(new_comment(keep, "a@pets.io", "x", now)).await.unwrap();
        store.insert(new_comment(doomed, "a@pets.io", "y", now)).await.unwrap();
        store.insert(new_comment(doomed, "a@pets.io", "z", now)).await.unwrap();

        assert_eq!(store.delete_by_post(doomed).await.unwrap(), 2);
        assert!(store.list_by_post(doomed).await.unwrap().is_empty());
        assert_eq!(store.list_by_post(keep).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_and_delete_single_comment() {
        let store = fixtures::store().await;
        fixtures::member(&store, "a@pets.io", "alice").await;
        let post = fixtures::post(&store, "a@pets.io", "t", "c").await;
        let id = store
            .insert(new_comment(post, "a@pets.io", "before", Utc::now()))
            .await
            .unwrap();

        store.update_text(id, "after").await.unwrap();
        let found = CommentRepository::find_by_id(&store, id).await.unwrap().unwrap();
        assert_eq!(found.text, "after");

        assert!(CommentRepository::delete(&store, id).await.unwrap());
        assert!(CommentRepository::find_by_id(&store, id).await.unwrap().is_none());
    }
}
