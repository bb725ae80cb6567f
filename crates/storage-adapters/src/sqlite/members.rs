use async_trait::async_trait;
use domains::{DomainResult, Member, MemberDirectory};

use super::{db_err, SqliteStore};

#[derive(sqlx::FromRow)]
struct MemberRow {
    email: String,
    nick_name: String,
    profile_image: Option<String>,
}

#[async_trait]
impl MemberDirectory for SqliteStore {
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Member>> {
        let row: Option<MemberRow> =
            sqlx::query_as("SELECT email, nick_name, profile_image FROM members WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;

        Ok(row.map(|r| Member {
            email: r.email,
            nick_name: r.nick_name,
            profile_image: r.profile_image,
        }))
    }
}
