//! # petboard
//!
//! Assembles the adapters selected at compile time, starts the blob
//! reconciler and serves the HTTP API until Ctrl-C or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use api_adapters::{build_router, AppState, HttpOptions, Metrics};
use auth_adapters::JwtIdentityGate;
use configs::{AppConfig, LogConfig, StorageBackend, StorageConfig};
use domains::ObjectStore;
use services::{AttachmentSynchronizer, BlobReconciler, CommentService, LikeService, PostService};
use storage_adapters::SqliteStore;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.log);

    // 1. Relational store
    let db = Arc::new(SqliteStore::connect(&config.database.url, config.database.max_connections).await?);

    // 2. Object storage
    let blobs = object_store(&config.storage).await?;

    // 3. Services
    let sync = Arc::new(AttachmentSynchronizer::new(
        db.clone(),
        db.clone(),
        blobs.clone(),
        config.storage.key_prefix.clone(),
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
    let metrics = Arc::new(Metrics::new());

    // 4. Background reconciler
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reconciler = BlobReconciler::new(
        db.clone(),
        db.clone(),
        blobs.clone(),
        chrono::Duration::seconds(config.reconciler.grace_secs),
    );
    let reconcile_task = tokio::spawn(run_reconciler(
        reconciler,
        Duration::from_secs(config.reconciler.interval_secs),
        config.reconciler.batch_size,
        metrics.clone(),
        shutdown_rx,
    ));

    // 5. HTTP
    let state = AppState {
        posts,
        comments,
        likes,
        gate: Arc::new(JwtIdentityGate::new(&config.auth.jwt_secret, config.auth.issuer.clone())),
        health: db.clone(),
        metrics,
    };
    let mut app = build_router(
        state,
        &HttpOptions {
            cors_origins: config.server.cors_origins.clone(),
            max_upload_bytes: config.server.max_upload_bytes,
        },
    );
    let public_url = config.storage.public_url.as_str();
    if config.storage.backend == StorageBackend::Local && public_url.starts_with('/') && public_url.len() > 1 {
        app = app.nest_service(
            public_url,
            tower_http::services::ServeDir::new(&config.storage.local_root),
        );
    }

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "petboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = reconcile_task.await {
        error!(error = %e, "reconciler task panicked");
    }
    info!("petboard stopped");
    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let registry = tracing_subscriber::registry().with(filter);
    if log.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn object_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn ObjectStore>> {
    match config.backend {
        #[cfg(feature = "media-local")]
        StorageBackend::Local => Ok(Arc::new(storage_adapters::LocalObjectStore::new(
            &config.local_root,
            config.public_url.clone(),
        ))),
        #[cfg(feature = "media-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .bucket
                .clone()
                .context("storage.bucket is required for the s3 backend")?;
            let store = storage_adapters::S3ObjectStore::connect(
                bucket,
                config.region.clone(),
                config.endpoint.clone(),
                config.public_url.clone(),
            )
            .await;
            Ok(Arc::new(store))
        }
        #[allow(unreachable_patterns)]
        other => anyhow::bail!("storage backend {other:?} is not compiled into this build"),
    }
}

async fn run_reconciler(
    reconciler: BlobReconciler,
    every: Duration,
    batch: i64,
    metrics: Arc<Metrics>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = ticker.tick() => match reconciler.run_once(batch).await {
                Ok(report) => metrics.observe_reconcile(&report),
                Err(e) => error!(error = %e, "reconcile pass aborted"),
            },
            _ = shutdown.changed() => break,
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
