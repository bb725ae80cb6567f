//! Registers a member in the local database and prints a bearer token for it.
//!
//! Membership is owned by another subsystem; this is for local setups only.
//!
//! Usage: `seed <email> <nick_name> [ttl_hours]`

use anyhow::{bail, Context};
use auth_adapters::JwtIdentityGate;
use configs::AppConfig;
use domains::{DomainError, Member};
use storage_adapters::SqliteStore;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let mut args = std::env::args().skip(1);
    let (Some(email), Some(nick_name)) = (args.next(), args.next()) else {
        bail!("usage: seed <email> <nick_name> [ttl_hours]");
    };
    let ttl_hours: i64 = match args.next() {
        Some(raw) => raw.parse().with_context(|| format!("invalid ttl_hours {raw}"))?,
        None => 24,
    };

    let config = AppConfig::load().context("failed to load configuration")?;
    let store = SqliteStore::connect(&config.database.url, 1).await?;

    let member = Member {
        email: email.clone(),
        nick_name,
        profile_image: None,
    };
    match store.insert_member(&member).await {
        Ok(()) => info!(%email, "member created"),
        Err(DomainError::Conflict(_)) => info!(%email, "member already exists"),
        Err(e) => return Err(e.into()),
    }

    let gate = JwtIdentityGate::new(&config.auth.jwt_secret, config.auth.issuer.clone());
    let token = gate.issue(&email, chrono::Duration::hours(ttl_hours))?;
    println!("{token}");
    Ok(())
}
