//! Post Store: create, read, update, delete and paginated search of posts.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    CommentRepository, DeleteReport, DomainError, DomainResult, Identity, LikeRepository,
    ListingQuery, MemberDirectory, NewPost, PageInfo, PostId, PostPage, PostRepository, PostView,
    UploadedFile, PAGE_SIZE,
};
use tracing::{info, warn};

use crate::{ensure_owner, require_identity, required_text, AttachmentSynchronizer};

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    likes: Arc<dyn LikeRepository>,
    listing: Arc<dyn ListingQuery>,
    members: Arc<dyn MemberDirectory>,
    attachments: Arc<AttachmentSynchronizer>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        likes: Arc<dyn LikeRepository>,
        listing: Arc<dyn ListingQuery>,
        members: Arc<dyn MemberDirectory>,
        attachments: Arc<AttachmentSynchronizer>,
    ) -> Self {
        Self {
            posts,
            comments,
            likes,
            listing,
            members,
            attachments,
        }
    }

    /// Persists a trimmed post for the calling member, then uploads `files`.
    ///
    /// The post row is committed before any blob is written; a storage failure
    /// leaves the post in place with the attachments processed so far.
    #[tracing::instrument(skip(self, title, content, files), fields(identity = ?identity.map(Identity::email)))]
    pub async fn create(
        &self,
        title: &str,
        content: &str,
        identity: Option<&Identity>,
        files: &[UploadedFile],
    ) -> DomainResult<PostId> {
        let title = required_text("title", title)?;
        let content = required_text("content", content)?;
        let identity = require_identity(identity)?;
        AttachmentSynchronizer::validate_batch(files, &[])?;

        if self.members.find_by_email(identity.email()).await?.is_none() {
            return Err(DomainError::not_found("member", identity));
        }

        let id = self
            .posts
            .insert(NewPost {
                title,
                content,
                author_email: identity.email().to_string(),
                created_at: Utc::now(),
            })
            .await?;
        info!(post_id = id, "post created");

        self.attachments.sync(id, files, &[]).await?;
        Ok(id)
    }

    /// Author-only. Overwrites title/content and applies the attachment delta.
    #[tracing::instrument(skip(self, title, content, files, delete_names), fields(identity = ?identity.map(Identity::email)))]
    pub async fn update(
        &self,
        id: PostId,
        title: &str,
        content: &str,
        identity: Option<&Identity>,
        files: &[UploadedFile],
        delete_names: &[String],
    ) -> DomainResult<()> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))?;
        ensure_owner(identity, &post.author_email, "post")?;

        let title = required_text("title", title)?;
        let content = required_text("content", content)?;
        AttachmentSynchronizer::validate_batch(files, delete_names)?;

        self.posts.update_text(id, &title, &content).await?;
        self.attachments.sync(id, files, delete_names).await
    }

    /// Author-only. Removes, in order: comments, likes, attachments (row and
    /// blob, every one attempted), then the post row. Nothing already removed
    /// is restored when a later step fails.
    #[tracing::instrument(skip(self), fields(identity = ?identity.map(Identity::email)))]
    pub async fn delete(&self, id: PostId, identity: Option<&Identity>) -> DomainResult<DeleteReport> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))?;
        ensure_owner(identity, &post.author_email, "post")?;

        let removed_comments = self.comments.delete_by_post(id).await?;
        let removed_likes = self.likes.delete_by_post(id).await?;
        let files = self.attachments.remove_all(id).await?;
        self.posts.delete(id).await?;

        if files.pending > 0 {
            warn!(post_id = id, pending = files.pending, "post deleted with blob deletions pending");
        }
        info!(post_id = id, "post deleted");

        Ok(DeleteReport {
            removed_comments,
            removed_likes,
            removed_files: files.removed,
            pending_blob_deletes: files.pending,
        })
    }

    /// `None` when the post does not exist.
    pub async fn get(&self, id: PostId) -> DomainResult<Option<PostView>> {
        let Some(post) = self.posts.find_by_id(id).await? else {
            return Ok(None);
        };

        let writer = self
            .members
            .find_by_email(&post.author_email)
            .await?
            .map(|m| m.nick_name)
            .unwrap_or_else(|| post.author_email.clone());
        let file_list = self.attachments.file_views(id).await?;
        let counts = self.listing.counts(id).await?;

        Ok(Some(PostView {
            id: post.id,
            title: post.title,
            content: post.content,
            member_id: post.author_email,
            writer,
            inserted: post.created_at,
            file_list,
            counts,
        }))
    }

    /// Page `page_number` (1-based) of posts matching `keyword`, newest first.
    pub async fn list(&self, keyword: &str, page_number: i64) -> DomainResult<PostPage> {
        let keyword = keyword.trim();
        let page_number = page_number.max(1);
        let offset = PageInfo::offset_for(page_number);

        let total = self.listing.count_matching(keyword).await?;
        let board_list = self.listing.search(keyword, PAGE_SIZE, offset).await?;

        Ok(PostPage {
            page_info: PageInfo::window(PageInfo::total_pages_for(total), page_number),
            board_list,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{
        Member, MockAttachmentRepository, MockBlobIntentLog, MockCommentRepository,
        MockLikeRepository, MockListingQuery, MockMemberDirectory, MockObjectStore,
        MockPostRepository, Post, PostCounts,
    };
    use mockall::predicate::eq;
    use mockall::Sequence;

    struct Mocks {
        posts: MockPostRepository,
        comments: MockCommentRepository,
        likes: MockLikeRepository,
        listing: MockListingQuery,
        members: MockMemberDirectory,
        attachments: MockAttachmentRepository,
        store: MockObjectStore,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                posts: MockPostRepository::new(),
                comments: MockCommentRepository::new(),
                likes: MockLikeRepository::new(),
                listing: MockListingQuery::new(),
                members: MockMemberDirectory::new(),
                attachments: MockAttachmentRepository::new(),
                store: MockObjectStore::new(),
            }
        }

        fn build(self) -> PostService {
            let mut intents = MockBlobIntentLog::new();
            intents.expect_record().returning(|_, _, _, _| Ok(1));
            intents.expect_clear().returning(|_| Ok(()));
            intents.expect_mark_failed().returning(|_, _| Ok(()));

            let sync = AttachmentSynchronizer::new(
                Arc::new(self.attachments),
                Arc::new(intents),
                Arc::new(self.store),
                "prj",
            );
            PostService::new(
                Arc::new(self.posts),
                Arc::new(self.comments),
                Arc::new(self.likes),
                Arc::new(self.listing),
                Arc::new(self.members),
                Arc::new(sync),
            )
        }
    }

    fn alice() -> Identity {
        Identity::new("alice@pets.io")
    }

    fn stored_post(author: &str) -> Post {
        Post {
            id: 1,
            title: "T".into(),
            content: "C".into(),
            author_email: author.into(),
            created_at: Utc::now(),
        }
    }

    fn member(email: &str) -> Member {
        Member {
            email: email.into(),
            nick_name: "alice".into(),
            profile_image: None,
        }
    }

    #[tokio::test]
    async fn create_trims_and_sets_author() {
        let mut m = Mocks::new();
        m.members
            .expect_find_by_email()
            .returning(|email| Ok(Some(member(email))));
        m.posts
            .expect_insert()
            .withf(|p| p.title == "Hello" && p.content == "World" && p.author_email == "alice@pets.io")
            .times(1)
            .returning(|_| Ok(42));

        let id = m
            .build()
            .create("  Hello ", "\tWorld\n", Some(&alice()), &[])
            .await
            .unwrap();
        assert_eq!(id, 42);
    }

    #[tokio::test]
    async fn create_rejects_blank_title() {
        let mut m = Mocks::new();
        m.posts.expect_insert().never();

        let err = m.build().create("   ", "body", Some(&alice()), &[]).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn create_requires_identity() {
        let mut m = Mocks::new();
        m.posts.expect_insert().never();

        let err = m.build().create("t", "c", None, &[]).await.unwrap_err();
        assert!(err.is_missing_identity());
    }

    #[tokio::test]
    async fn create_with_bad_file_name_writes_nothing() {
        let mut m = Mocks::new();
        m.posts.expect_insert().never();
        m.attachments.expect_upsert().never();
        let bad = UploadedFile {
            name: "../escape.png".into(),
            content_type: mime::IMAGE_PNG,
            data: bytes::Bytes::from_static(b"x"),
        };

        let err = m
            .build()
            .create("t", "c", Some(&alice()), &[bad])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn update_by_stranger_is_rejected_without_writes() {
        let mut m = Mocks::new();
        m.posts
            .expect_find_by_id()
            .returning(|_| Ok(Some(stored_post("bob@pets.io"))));
        m.posts.expect_update_text().never();
        m.attachments.expect_upsert().never();

        let err = m
            .build()
            .update(1, "x", "y", Some(&alice()), &[], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn update_missing_post_is_not_found() {
        let mut m = Mocks::new();
        m.posts.expect_find_by_id().returning(|_| Ok(None));

        let err = m
            .build()
            .update(9, "x", "y", Some(&alice()), &[], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "post", .. }));
    }

    #[tokio::test]
    async fn update_overwrites_trimmed_text() {
        let mut m = Mocks::new();
        m.posts
            .expect_find_by_id()
            .returning(|_| Ok(Some(stored_post("alice@pets.io"))));
        m.posts
            .expect_update_text()
            .withf(|id, t, c| *id == 1 && t == "new" && c == "body")
            .times(1)
            .returning(|_, _, _| Ok(()));

        m.build()
            .update(1, " new ", "body ", Some(&alice()), &[], &[])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_runs_in_documented_order() {
        let mut seq = Sequence::new();
        let mut m = Mocks::new();
        m.posts
            .expect_find_by_id()
            .returning(|_| Ok(Some(stored_post("alice@pets.io"))));
        m.comments
            .expect_delete_by_post()
            .with(eq(1))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(2));
        m.likes
            .expect_delete_by_post()
            .with(eq(1))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(1));
        m.attachments
            .expect_list_names()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec!["a.png".into()]));
        m.attachments
            .expect_delete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(true));
        m.store
            .expect_delete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        m.posts
            .expect_delete()
            .with(eq(1))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));

        let report = m.build().delete(1, Some(&alice())).await.unwrap();
        assert_eq!(
            report,
            DeleteReport {
                removed_comments: 2,
                removed_likes: 1,
                removed_files: 1,
                pending_blob_deletes: 0,
            }
        );
    }

    #[tokio::test]
    async fn delete_by_stranger_touches_nothing() {
        let mut m = Mocks::new();
        m.posts
            .expect_find_by_id()
            .returning(|_| Ok(Some(stored_post("bob@pets.io"))));
        m.comments.expect_delete_by_post().never();
        m.likes.expect_delete_by_post().never();
        m.posts.expect_delete().never();

        let err = m.build().delete(1, Some(&alice())).await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn get_absent_post_is_none() {
        let mut m = Mocks::new();
        m.posts.expect_find_by_id().returning(|_| Ok(None));
        assert!(m.build().get(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_assembles_view() {
        let mut m = Mocks::new();
        m.posts
            .expect_find_by_id()
            .returning(|_| Ok(Some(stored_post("alice@pets.io"))));
        m.members
            .expect_find_by_email()
            .returning(|email| Ok(Some(member(email))));
        m.attachments
            .expect_list_names()
            .returning(|_| Ok(vec!["dog.jpg".into()]));
        m.store
            .expect_public_url()
            .returning(|key| format!("https://cdn/{key}"));
        m.listing.expect_counts().returning(|_| {
            Ok(PostCounts {
                comment_count: 1,
                like_count: 2,
                file_count: 1,
            })
        });

        let view = m.build().get(1).await.unwrap().unwrap();
        assert_eq!(view.writer, "alice");
        assert_eq!(view.file_list[0].src, "https://cdn/prj/board/1/dog.jpg");
        assert_eq!(view.counts.like_count, 2);
    }

    #[tokio::test]
    async fn list_computes_offset_and_window() {
        let mut m = Mocks::new();
        m.listing
            .expect_count_matching()
            .with(eq("cat"))
            .returning(|_| Ok(250));
        m.listing
            .expect_search()
            .withf(|kw, limit, offset| kw == "cat" && *limit == 10 && *offset == 120)
            .returning(|_, _, _| Ok(vec![]));

        let page = m.build().list(" cat ", 13).await.unwrap();
        assert_eq!(page.page_info.total_pages, 25);
        assert_eq!(page.page_info.left_page_number, 11);
        assert_eq!(page.page_info.right_page_number, 20);
    }

    #[tokio::test]
    async fn list_far_past_the_end_is_empty() {
        let mut m = Mocks::new();
        m.listing.expect_count_matching().returning(|_| Ok(25));
        m.listing
            .expect_search()
            .withf(|_, limit, offset| *limit == 10 && *offset == i64::MAX)
            .returning(|_, _, _| Ok(vec![]));

        let page = m.build().list("", i64::MAX).await.unwrap();
        assert!(page.board_list.is_empty());
        assert_eq!(page.page_info.total_pages, 3);
        assert_eq!(page.page_info.current_page_number, i64::MAX);
    }
}
