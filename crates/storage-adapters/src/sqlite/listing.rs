use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{DomainResult, ListingQuery, PostCounts, PostId, PostSummary};

use super::{db_err, SqliteStore};

/// Posts joined with their author and outer-joined with per-post counts,
/// so posts without comments, likes or files still appear with zeros.
const LISTING_FROM: &str = "\
    FROM posts p \
    JOIN members m ON m.email = p.author_email \
    LEFT JOIN (SELECT post_id, COUNT(*) AS cnt FROM comments GROUP BY post_id) c ON c.post_id = p.id \
    LEFT JOIN (SELECT post_id, COUNT(*) AS cnt FROM likes GROUP BY post_id) l ON l.post_id = p.id \
    LEFT JOIN (SELECT post_id, COUNT(*) AS cnt FROM attachments GROUP BY post_id) f ON f.post_id = p.id";

/// Matches against the `search_*` columns, which hold [`fold`]ed text.
const KEYWORD_FILTER: &str = "\
    WHERE p.search_title LIKE ? ESCAPE '\\' \
       OR p.search_content LIKE ? ESCAPE '\\' \
       OR m.search_nick LIKE ? ESCAPE '\\'";

#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: i64,
    title: String,
    nick_name: String,
    author_email: String,
    created_at: DateTime<Utc>,
    comment_count: i64,
    like_count: i64,
    file_count: i64,
}

#[derive(sqlx::FromRow)]
struct CountsRow {
    comment_count: i64,
    like_count: i64,
    file_count: i64,
}

/// Case folding shared by the stored search columns and the keyword.
pub(crate) fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// `%keyword%`, folded, with LIKE wildcards escaped.
fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for ch in fold(keyword).chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl ListingQuery for SqliteStore {
    async fn search(
        &self,
        keyword: &str,
        limit: i64,
        offset: i64,
    ) -> DomainResult<Vec<PostSummary>> {
        let sql = format!(
            "SELECT p.id, p.title, m.nick_name, p.author_email, p.created_at, \
                    COALESCE(c.cnt, 0) AS comment_count, \
                    COALESCE(l.cnt, 0) AS like_count, \
                    COALESCE(f.cnt, 0) AS file_count \
             {LISTING_FROM} {KEYWORD_FILTER} \
             ORDER BY p.id DESC LIMIT ? OFFSET ?"
        );
        let pattern = like_pattern(keyword);

        let rows: Vec<SummaryRow> = sqlx::query_as(&sql)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|r| PostSummary {
                id: r.id,
                title: r.title,
                writer: r.nick_name,
                member_id: r.author_email,
                inserted: r.created_at,
                counts: PostCounts {
                    comment_count: r.comment_count,
                    like_count: r.like_count,
                    file_count: r.file_count,
                },
                profile_href: None,
            })
            .collect())
    }

    async fn count_matching(&self, keyword: &str) -> DomainResult<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM posts p JOIN members m ON m.email = p.author_email {KEYWORD_FILTER}"
        );
        let pattern = like_pattern(keyword);

        sqlx::query_scalar(&sql)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn counts(&self, post_id: PostId) -> DomainResult<PostCounts> {
        let sql = format!(
            "SELECT COALESCE(c.cnt, 0) AS comment_count, \
                    COALESCE(l.cnt, 0) AS like_count, \
                    COALESCE(f.cnt, 0) AS file_count \
             {LISTING_FROM} WHERE p.id = ?"
        );

        let row: Option<CountsRow> = sqlx::query_as(&sql)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(row
            .map(|r| PostCounts {
                comment_count: r.comment_count,
                like_count: r.like_count,
                file_count: r.file_count,
            })
            .unwrap_or_default())
    }
}
