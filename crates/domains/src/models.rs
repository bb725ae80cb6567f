//! # Domain Models
//!
//! Posts, attachments, comments and likes, plus the read-side views built
//! from them. Aggregate counts never live on an entity; they are derived by
//! the listing query at read time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Surrogate key of a post. Generated by the relational store, monotonically increasing.
pub type PostId = i64;
pub type CommentId = i64;

/// Fixed page size for post listings.
pub const PAGE_SIZE: i64 = 10;
/// Number of page links shown per navigation block.
pub const PAGE_BLOCK: i64 = 10;

/// The authenticated principal as resolved by the identity gate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(pub String);

impl Identity {
    pub fn new(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn email(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registered member, owned by the (external) membership subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub email: String,
    pub nick_name: String,
    pub profile_image: Option<String>,
}

/// A user-authored article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub author_email: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a post. Title and content are already trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author_email: String,
    pub created_at: DateTime<Utc>,
}

/// Metadata row of a file owned by a post. `(post_id, name)` is the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub post_id: PostId,
    pub name: String,
}

/// A file submitted with a create/update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: mime::Mime,
    pub data: bytes::Bytes,
}

impl UploadedFile {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_email: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: PostId,
    pub author_email: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Comment joined with its author's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: CommentId,
    pub board_id: PostId,
    pub member_id: String,
    pub nick_name: String,
    pub comment: String,
    pub inserted: DateTime<Utc>,
}

/// Derived counts for a single post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCounts {
    pub comment_count: i64,
    pub like_count: i64,
    pub file_count: i64,
}

/// One row of the list view: post, author, and live counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: PostId,
    pub title: String,
    pub writer: String,
    pub member_id: String,
    pub inserted: DateTime<Utc>,
    #[serde(flatten)]
    pub counts: PostCounts,
    /// Filled by the member-profile lookup, never by the listing join.
    pub profile_href: Option<String>,
}

/// Attachment as presented to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileView {
    pub name: String,
    pub src: String,
}

/// Detail view of a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub member_id: String,
    pub writer: String,
    pub inserted: DateTime<Utc>,
    pub file_list: Vec<FileView>,
    #[serde(flatten)]
    pub counts: PostCounts,
}

/// Result of a like toggle or like lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeState {
    pub count: i64,
    pub liked: bool,
}

/// Page navigation block for list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total_pages: i64,
    pub left_page_number: i64,
    pub right_page_number: i64,
    pub current_page_number: i64,
}

impl PageInfo {
    /// Groups pages into blocks of [`PAGE_BLOCK`] and clamps the block to `[1, total_pages]`.
    ///
    /// Any `i64` page is accepted; the arithmetic never overflows.
    pub fn window(total_pages: i64, page_number: i64) -> Self {
        let page_number = page_number.max(1);
        let left = (page_number - 1) / PAGE_BLOCK * PAGE_BLOCK + 1;
        let right = left.saturating_add(PAGE_BLOCK - 1);

        Self {
            total_pages,
            left_page_number: left,
            right_page_number: right.min(total_pages),
            current_page_number: page_number,
        }
    }

    pub fn total_pages_for(total_rows: i64) -> i64 {
        let total_rows = total_rows.max(0);
        total_rows / PAGE_SIZE + i64::from(total_rows % PAGE_SIZE != 0)
    }

    /// Row offset of the first post on `page_number` (1-based), saturating
    /// for pages far past the end.
    pub fn offset_for(page_number: i64) -> i64 {
        (page_number.max(1) - 1).saturating_mul(PAGE_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub page_info: PageInfo,
    pub board_list: Vec<PostSummary>,
}

/// Blob operation recorded before it is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobOp {
    Put,
    Delete,
}

impl BlobOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlobOp::Put => "put",
            BlobOp::Delete => "delete",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "put" => Some(BlobOp::Put),
            "delete" => Some(BlobOp::Delete),
            _ => None,
        }
    }
}

/// An uncleared blob intent. Its presence means the blob side may disagree
/// with the attachment row for `(post_id, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobIntent {
    pub id: i64,
    pub op: BlobOp,
    pub post_id: PostId,
    pub name: String,
    pub object_key: String,
    pub attempts: i64,
    pub created_at: DateTime<Utc>,
}

/// Outcome of deleting a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReport {
    pub removed_comments: u64,
    pub removed_likes: u64,
    pub removed_files: u64,
    /// Blob deletions that failed and were left for the reconciler.
    pub pending_blob_deletes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_for_middle_block() {
        let info = PageInfo::window(25, 13);
        assert_eq!(info.left_page_number, 11);
        assert_eq!(info.right_page_number, 20);
        assert_eq!(info.current_page_number, 13);
    }

    #[test]
    fn window_for_first_block() {
        let info = PageInfo::window(25, 3);
        assert_eq!(info.left_page_number, 1);
        assert_eq!(info.right_page_number, 10);
    }

    #[test]
    fn window_clamps_last_block() {
        let info = PageInfo::window(25, 21);
        assert_eq!(info.left_page_number, 21);
        assert_eq!(info.right_page_number, 25);

        let info = PageInfo::window(25, 20);
        assert_eq!(info.left_page_number, 11);
        assert_eq!(info.right_page_number, 20);
    }

    #[test]
    fn window_with_no_pages() {
        let info = PageInfo::window(0, 1);
        assert_eq!(info.left_page_number, 1);
        assert_eq!(info.right_page_number, 0);
    }

    #[test]
    fn window_treats_non_positive_page_as_first() {
        let info = PageInfo::window(3, 0);
        assert_eq!(info.current_page_number, 1);
        assert_eq!(info.right_page_number, 3);
    }

    #[test]
    fn window_for_largest_page_does_not_overflow() {
        let info = PageInfo::window(3, i64::MAX);
        assert_eq!(info.current_page_number, i64::MAX);
        assert_eq!(info.left_page_number, (i64::MAX - 1) / PAGE_BLOCK * PAGE_BLOCK + 1);
        assert_eq!(info.right_page_number, 3);

        let info = PageInfo::window(i64::MAX, i64::MAX);
        assert_eq!(info.right_page_number, i64::MAX);
        assert!(info.left_page_number <= info.right_page_number);
    }

    #[test]
    fn offset_saturates() {
        assert_eq!(PageInfo::offset_for(1), 0);
        assert_eq!(PageInfo::offset_for(-4), 0);
        assert_eq!(PageInfo::offset_for(3), 20);
        assert_eq!(PageInfo::offset_for(i64::MAX), i64::MAX);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(PageInfo::total_pages_for(0), 0);
        assert_eq!(PageInfo::total_pages_for(10), 1);
        assert_eq!(PageInfo::total_pages_for(11), 2);
        assert_eq!(PageInfo::total_pages_for(i64::MAX), i64::MAX / PAGE_SIZE + 1);
    }

    #[test]
    fn page_info_serializes_camel_case() {
        let json = serde_json::to_value(PageInfo::window(25, 13)).unwrap();
        assert_eq!(json["leftPageNumber"], 11);
        assert_eq!(json["rightPageNumber"], 20);
        assert_eq!(json["totalPages"], 25);
        assert_eq!(json["currentPageNumber"], 13);
    }

    #[test]
    fn blob_op_round_trips_through_text() {
        assert_eq!(BlobOp::parse(BlobOp::Put.as_str()), Some(BlobOp::Put));
        assert_eq!(BlobOp::parse("rename"), None);
    }
}
