//! # Ports
//!
//! Every adapter must implement these traits to be wired into the binary.
//! Services only ever see `Arc<dyn Port>`.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::DomainResult;
use crate::models::{
    BlobIntent, BlobOp, Comment, CommentId, CommentView, Identity, Member, NewComment, NewPost,
    Post, PostCounts, PostId, PostSummary,
};

/// Relational persistence of posts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert(&self, post: NewPost) -> DomainResult<PostId>;
    async fn find_by_id(&self, id: PostId) -> DomainResult<Option<Post>>;
    /// Overwrites title and content; `created_at` is never touched.
    async fn update_text(&self, id: PostId, title: &str, content: &str) -> DomainResult<()>;
    /// Returns false when no row was removed.
    async fn delete(&self, id: PostId) -> DomainResult<bool>;
}

/// Attachment metadata rows keyed by `(post_id, name)`.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    /// Upserts the row. Returns true when a new row was created,
    /// false when one already existed for the same name.
    async fn upsert(&self, post_id: PostId, name: &str) -> DomainResult<bool>;
    /// Returns false when the row was already absent.
    async fn delete(&self, post_id: PostId, name: &str) -> DomainResult<bool>;
    async fn exists(&self, post_id: PostId, name: &str) -> DomainResult<bool>;
    async fn list_names(&self, post_id: PostId) -> DomainResult<Vec<String>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert(&self, comment: NewComment) -> DomainResult<CommentId>;
    async fn find_by_id(&self, id: CommentId) -> DomainResult<Option<Comment>>;
    async fn update_text(&self, id: CommentId, text: &str) -> DomainResult<()>;
    async fn delete(&self, id: CommentId) -> DomainResult<bool>;
    /// Ordered by creation time, then id, both ascending.
    async fn list_by_post(&self, post_id: PostId) -> DomainResult<Vec<CommentView>>;
    async fn delete_by_post(&self, post_id: PostId) -> DomainResult<u64>;
}

/// Membership relation of (post, member) pairs.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LikeRepository: Send + Sync {
    async fn exists(&self, post_id: PostId, email: &str) -> DomainResult<bool>;
    /// Returns false when the pair was already present.
    async fn insert(&self, post_id: PostId, email: &str) -> DomainResult<bool>;
    /// Returns false when the pair was already absent.
    async fn delete(&self, post_id: PostId, email: &str) -> DomainResult<bool>;
    async fn count(&self, post_id: PostId) -> DomainResult<i64>;
    async fn delete_by_post(&self, post_id: PostId) -> DomainResult<u64>;
}

/// Read-side join of posts, authors and live counts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ListingQuery: Send + Sync {
    /// Case-insensitive substring match on title, content or author nick name.
    /// An empty keyword matches everything. Newest first.
    async fn search(&self, keyword: &str, limit: i64, offset: i64)
        -> DomainResult<Vec<PostSummary>>;
    async fn count_matching(&self, keyword: &str) -> DomainResult<i64>;
    async fn counts(&self, post_id: PostId) -> DomainResult<PostCounts>;
}

/// Lookup into the membership subsystem.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Member>>;
}

/// Durable record of blob operations that have not been confirmed yet.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BlobIntentLog: Send + Sync {
    async fn record(&self, op: BlobOp, post_id: PostId, name: &str, object_key: &str)
        -> DomainResult<i64>;
    async fn clear(&self, id: i64) -> DomainResult<()>;
    async fn mark_failed(&self, id: i64, error: &str) -> DomainResult<()>;
    /// Intents recorded before `older_than`, oldest first.
    async fn pending(&self, older_than: DateTime<Utc>, limit: i64)
        -> DomainResult<Vec<BlobIntent>>;
}

/// External object storage. Keys are full object paths.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores the blob with public-read visibility, replacing any existing object.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> DomainResult<()>;
    /// Deleting a missing object succeeds.
    async fn delete(&self, key: &str) -> DomainResult<()>;
    async fn exists(&self, key: &str) -> DomainResult<bool>;
    /// Public URL the blob is served from.
    fn public_url(&self, key: &str) -> String;
}

/// Resolves the calling principal from a bearer credential.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait IdentityGate: Send + Sync {
    fn resolve(&self, bearer: &str) -> Option<Identity>;
}
