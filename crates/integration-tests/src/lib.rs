//! Shared fixtures for the end-to-end suites: an in-memory SQLite store,
//! a scratch directory of blobs, and the services wired over both.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Duration;
use domains::{DomainError, DomainResult, Member, ObjectStore, PostId, UploadedFile};
use services::{AttachmentSynchronizer, BlobReconciler, CommentService, LikeService, PostService};
use storage_adapters::{LocalObjectStore, SqliteStore};

pub const KEY_PREFIX: &str = "prj";
pub const PUBLIC_URL: &str = "http://cdn.test/objects";

/// Local blob store that can be told to fail puts or deletes.
pub struct FlakyStore {
    inner: LocalObjectStore,
    pub fail_puts: AtomicBool,
    pub fail_deletes: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: LocalObjectStore) -> Self {
        Self {
            inner,
            fail_puts: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for FlakyStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> DomainResult<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(DomainError::Storage(format!("put {key}: injected failure")));
        }
        self.inner.put(key, data, content_type).await
    }

    async fn delete(&self, key: &str) -> DomainResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(DomainError::Storage(format!("delete {key}: injected failure")));
        }
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> DomainResult<bool> {
        self.inner.exists(key).await
    }

    fn public_url(&self, key: &str) -> String {
        self.inner.public_url(key)
    }
}

pub struct Harness {
    pub db: Arc<SqliteStore>,
    pub blobs: Arc<FlakyStore>,
    pub root: PathBuf,
    pub posts: Arc<PostService>,
    pub comments: Arc<CommentService>,
    pub likes: Arc<LikeService>,
    pub reconciler: BlobReconciler,
}

impl Harness {
    pub async fn new() -> Self {
        let root = std::env::temp_dir().join(format!("petboard-it-{}", uuid::Uuid::new_v4().simple()));
        let db = Arc::new(SqliteStore::connect("sqlite::memory:", 1).await.unwrap());
        let blobs = Arc::new(FlakyStore::new(LocalObjectStore::new(&root, PUBLIC_URL)));

        let sync = Arc::new(AttachmentSynchronizer::new(
            db.clone(),
            db.clone(),
            blobs.clone(),
            KEY_PREFIX,
        ));
        let posts = Arc::new(PostService::new(
            db.clone(),
            db.clone(),
            db.clone(),
            db.clone(),
            db.clone(),
            sync,
        ));
        let comments = Arc::new(CommentService::new(db.clone(), db.clone()));
        let likes = Arc::new(LikeService::new(db.clone(), db.clone(), db.clone()));
        // zero grace: every recorded intent is eligible
        let reconciler = BlobReconciler::new(db.clone(), db.clone(), blobs.clone(), Duration::zero());

        Self {
            db,
            blobs,
            root,
            posts,
            comments,
            likes,
            reconciler,
        }
    }

    pub async fn member(&self, email: &str, nick: &str) {
        self.db
            .insert_member(&Member {
                email: email.into(),
                nick_name: nick.into(),
                profile_image: None,
            })
            .await
            .unwrap();
    }

    pub fn blob_path(&self, post_id: PostId, name: &str) -> PathBuf {
        self.root
            .join(KEY_PREFIX)
            .join("board")
            .join(post_id.to_string())
            .join(name)
    }

    /// Rows of `table` belonging to `post_id` (`id` for the posts table).
    pub async fn rows(&self, table: &str, post_id: PostId) -> i64 {
        let column = if table == "posts" { "id" } else { "post_id" };
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?"))
            .bind(post_id)
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }

    pub async fn pending_intents(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM blob_intents")
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

pub fn file(name: &str, body: &'static [u8]) -> UploadedFile {
    UploadedFile {
        name: name.into(),
        content_type: mime::IMAGE_PNG,
        data: Bytes::from_static(body),
    }
}
