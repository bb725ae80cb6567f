//! Like Ledger.
//!
//! A like is the existence of a `(post, member)` row. Concurrent toggles by
//! the same member converge instead of failing: inserting an existing pair
//! and deleting an absent one are both no-ops, and the returned state is
//! always re-read from the store.

use std::sync::Arc;

use domains::{
    DomainError, DomainResult, Identity, LikeRepository, LikeState, MemberDirectory, PostId,
    PostRepository,
};
use tracing::debug;

use crate::require_identity;

pub struct LikeService {
    likes: Arc<dyn LikeRepository>,
    posts: Arc<dyn PostRepository>,
    members: Arc<dyn MemberDirectory>,
}

impl LikeService {
    pub fn new(
        likes: Arc<dyn LikeRepository>,
        posts: Arc<dyn PostRepository>,
        members: Arc<dyn MemberDirectory>,
    ) -> Self {
        Self {
            likes,
            posts,
            members,
        }
    }

    #[tracing::instrument(skip(self), fields(identity = ?identity.map(Identity::email)))]
    pub async fn toggle(&self, post_id: PostId, identity: Option<&Identity>) -> DomainResult<LikeState> {
        let identity = require_identity(identity)?;
        let email = identity.email();

        if self.likes.exists(post_id, email).await? {
            if !self.likes.delete(post_id, email).await? {
                debug!(post_id, "like already removed by a concurrent toggle");
            }
        } else {
            if self.posts.find_by_id(post_id).await?.is_none() {
                return Err(DomainError::not_found("post", post_id));
            }
            if self.members.find_by_email(email).await?.is_none() {
                return Err(DomainError::not_found("member", email));
            }
            if !self.likes.insert(post_id, email).await? {
                debug!(post_id, "like already added by a concurrent toggle");
            }
        }

        self.get(post_id, Some(identity)).await
    }

    /// `liked` is false without an identity.
    pub async fn get(&self, post_id: PostId, identity: Option<&Identity>) -> DomainResult<LikeState> {
        let count = self.likes.count(post_id).await?;
        let liked = match identity {
            Some(identity) => self.likes.exists(post_id, identity.email()).await?,
            None => false,
        };
        Ok(LikeState { count, liked })
    }
}
