//! Comment Store.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    CommentId, CommentRepository, CommentView, DomainError, DomainResult, Identity, NewComment,
    PostId, PostRepository,
};

use crate::{ensure_owner, require_identity, required_text};

pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { comments, posts }
    }

    #[tracing::instrument(skip(self, text), fields(identity = ?identity.map(Identity::email)))]
    pub async fn add(
        &self,
        post_id: PostId,
        text: &str,
        identity: Option<&Identity>,
    ) -> DomainResult<CommentId> {
        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(DomainError::not_found("post", post_id));
        }
        let identity = require_identity(identity)?;
        let text = required_text("comment", text)?;

        self.comments
            .insert(NewComment {
                post_id,
                author_email: identity.email().to_string(),
                text,
                created_at: Utc::now(),
            })
            .await
    }

    #[tracing::instrument(skip(self, text), fields(identity = ?identity.map(Identity::email)))]
    pub async fn update(
        &self,
        id: CommentId,
        text: &str,
        identity: Option<&Identity>,
    ) -> DomainResult<()> {
        let comment = self
            .comments
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("comment", id))?;
        ensure_owner(identity, &comment.author_email, "comment")?;
        let text = required_text("comment", text)?;

        self.comments.update_text(id, &text).await
    }

    #[tracing::instrument(skip(self), fields(identity = ?identity.map(Identity::email)))]
    pub async fn delete(&self, id: CommentId, identity: Option<&Identity>) -> DomainResult<()> {
        let comment = self
            .comments
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("comment", id))?;
        ensure_owner(identity, &comment.author_email, "comment")?;

        self.comments.delete(id).await?;
        Ok(())
    }

    /// Oldest first.
    pub async fn list_by_post(&self, post_id: PostId) -> DomainResult<Vec<CommentView>> {
        self.comments.list_by_post(post_id).await
    }
}
