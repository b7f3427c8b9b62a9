use crate::error::{AppError, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A post as it appears in the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub author_id: Uuid,
    pub author_name: String,
    /// Like count
    pub score: i64,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A post with its body, for the post page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub author_name: String,
    pub score: i64,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
}

impl PostDetail {
    pub fn summary(&self) -> PostSummary {
        PostSummary {
            id: self.id,
            title: self.title.clone(),
            author_id: self.author_id,
            author_name: self.author_name.clone(),
            score: self.score,
            comment_count: self.comment_count,
            created_at: self.created_at,
        }
    }

    /// Canonical page path, `/{authorId}/{postId}`
    pub fn path(&self) -> String {
        format!("/{}/{}", self.author_id, self.id)
    }
}

/// One page of the feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub items: Vec<PostSummary>,
    /// Absent on the last page
    pub next_cursor: Option<String>,
}

/// Feed query as understood by the store
#[derive(Debug, Clone, PartialEq)]
pub struct PostQuery {
    pub limit: i64,
    /// Creation order instead of score order
    pub recents: bool,
    pub cursor: Option<PostCursor>,
}

/// Keyset position of the last post on a page.
///
/// Default ordering is `(score, created_at, id)` descending, recents ordering
/// is `(created_at, id)` descending; the cursor carries all three so either
/// ordering can resume from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCursor {
    #[serde(rename = "s")]
    pub score: i64,
    #[serde(rename = "t")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "i")]
    pub id: Uuid,
}

impl PostCursor {
    pub fn after(post: &PostSummary) -> Self {
        Self {
            score: post.score,
            created_at: post.created_at,
            id: post.id,
        }
    }

    pub fn encode(&self) -> String {
        // Serializing three plain fields cannot fail
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(raw: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(raw.trim())
            .map_err(|_| AppError::BadRequest("invalid cursor".to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|_| AppError::BadRequest("invalid cursor".to_string()))
    }

    /// True when `post` sorts strictly after this cursor in the given ordering.
    pub fn precedes(&self, post: &PostSummary, recents: bool) -> bool {
        if recents {
            (post.created_at, post.id) < (self.created_at, self.id)
        } else {
            (post.score, post.created_at, post.id) < (self.score, self.created_at, self.id)
        }
    }
}

/// Trims an over-fetched row set (`limit + 1` rows) into a page.
pub fn paginate(mut rows: Vec<PostSummary>, limit: i64) -> PostPage {
    let limit = limit.max(0) as usize;
    let next_cursor = if rows.len() > limit {
        rows.truncate(limit);
        rows.last().map(|last| PostCursor::after(last).encode())
    } else {
        None
    };

    PostPage {
        items: rows,
        next_cursor,
    }
}

/// Request body for creating a post
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewPost {
    #[validate(length(min = 1, max = 200, message = "Título deve conter entre 1 e 200 caracteres"))]
    pub title: String,
    #[validate(length(min = 1, max = 50000, message = "Conteúdo deve conter entre 1 e 50000 caracteres"))]
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn post(score: i64, minutes_ago: i64) -> PostSummary {
        PostSummary {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            author_id: Uuid::new_v4(),
            author_name: "ana".to_string(),
            score,
            comment_count: 0,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn cursor_survives_encoding() {
        let cursor = PostCursor::after(&post(3, 10));
        assert_eq!(PostCursor::decode(&cursor.encode()).unwrap(), cursor);
    }

    #[test]
    fn garbage_cursor_is_bad_request() {
        assert!(matches!(
            PostCursor::decode("not a cursor!"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            PostCursor::decode(&URL_SAFE_NO_PAD.encode(b"{}")),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn precedes_follows_ordering() {
        let hot_old = post(10, 60);
        let cold_new = post(0, 1);
        let cursor = PostCursor::after(&hot_old);

        // score order: the cold post comes after the hot one
        assert!(cursor.precedes(&cold_new, false));
        // creation order: the newer post comes before the older one
        assert!(!cursor.precedes(&cold_new, true));
        assert!(!cursor.precedes(&hot_old, false));
    }

    #[test]
    fn paginate_sets_cursor_only_when_rows_overflow() {
        let rows: Vec<_> = (0..4).map(|i| post(10 - i, i)).collect();
        let page = paginate(rows.clone(), 3);
        assert_eq!(page.items.len(), 3);
        let cursor = PostCursor::decode(page.next_cursor.as_deref().unwrap()).unwrap();
        assert_eq!(cursor.id, rows[2].id);

        let last = paginate(rows, 4);
        assert_eq!(last.items.len(), 4);
        assert!(last.next_cursor.is_none());
    }
}
