//! State shared across all request handlers.

use std::sync::Arc;

use async_trait::async_trait;
use domains::{DomainResult, IdentityGate};
use services::{CommentService, LikeService, PostService};

use crate::metrics::Metrics;

/// Readiness check behind `GET /api/health`.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn ping(&self) -> DomainResult<()>;
}

#[async_trait]
impl HealthProbe for storage_adapters::SqliteStore {
    async fn ping(&self) -> DomainResult<()> {
        storage_adapters::SqliteStore::ping(self).await
    }
}

#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostService>,
    pub comments: Arc<CommentService>,
    pub likes: Arc<LikeService>,
    pub gate: Arc<dyn IdentityGate>,
    pub health: Arc<dyn HealthProbe>,
    pub metrics: Arc<Metrics>,
}
