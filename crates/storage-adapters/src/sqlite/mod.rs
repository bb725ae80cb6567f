//! # SQLite adapter
//!
//! Implements every relational port on a single `SqlitePool`. One
//! [`SqliteStore`] value is shared (behind `Arc`) as the post, attachment,
//! comment, like, listing, member and intent repository.

mod attachments;
mod comments;
mod intents;
mod likes;
mod listing;
mod members;
mod posts;

use std::str::FromStr;

use anyhow::Context;
use domains::{DomainError, Member};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `url` and applies migrations.
    ///
    /// In-memory databases are pinned to one connection that never expires,
    /// otherwise every pooled connection would see its own empty database.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url {url}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { max_connections.max(1) })
            .idle_timeout(if in_memory { None } else { Some(std::time::Duration::from_secs(600)) })
            .max_lifetime(if in_memory { None } else { Some(std::time::Duration::from_secs(1800)) })
            .connect_with(options)
            .await
            .context("failed to open sqlite database")?;

        let store = Self { pool };
        store.migrate().await?;
        info!(%url, "sqlite store ready");
        Ok(store)
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("failed to run migrations")
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Liveness check used by the health endpoint.
    pub async fn ping(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(db_err)
    }

    /// Seeds a member row. Registration itself belongs to the membership
    /// subsystem; this exists for fixtures and local setups.
    pub async fn insert_member(&self, member: &Member) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO members (email, nick_name, search_nick, profile_image) VALUES (?, ?, ?, ?)",
        )
        .bind(&member.email)
        .bind(&member.nick_name)
        .bind(listing::fold(&member.nick_name))
        .bind(&member.profile_image)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}

pub(crate) fn db_err(e: sqlx::Error) -> DomainError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DomainError::Conflict(db.message().to_string())
        }
        _ => DomainError::Internal(e.to_string()),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::Utc;
    use domains::{NewPost, PostId, PostRepository};

    pub async fn store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:", 1).await.unwrap()
    }

    pub async fn member(store: &SqliteStore, email: &str, nick: &str) {
        store
            .insert_member(&Member {
                email: email.into(),
                nick_name: nick.into(),
                profile_image: None,
            })
            .await
            .unwrap();
    }

    pub async fn post(store: &SqliteStore, author: &str, title: &str, content: &str) -> PostId {
        store
            .insert(NewPost {
                title: title.into(),
                content: content.into(),
                author_email: author.into(),
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }
}
