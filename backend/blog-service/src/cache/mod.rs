/// Content caching layer
///
/// `ContentCache` is the process-wide query cache shared by every worker:
/// - feed pages keyed by ordering, page size and cursor
/// - flat comment lists keyed by post
///
/// Mutations never write into it; they invalidate and the next read refetches.
pub mod query_cache;

pub use query_cache::QueryCache;

use crate::models::{Comment, PostPage};
use std::time::Duration;
use uuid::Uuid;

/// Cache key of one `posts.getAll` call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedKey {
    pub recents: bool,
    pub limit: i64,
    pub cursor: Option<String>,
}

pub struct ContentCache {
    pub feed: QueryCache<FeedKey, PostPage>,
    pub comments: QueryCache<Uuid, Vec<Comment>>,
}

impl ContentCache {
    pub fn new(stale_after: Option<Duration>) -> Self {
        Self {
            feed: QueryCache::new("feed", stale_after),
            comments: QueryCache::new("comments", stale_after),
        }
    }

    /// A post's thread changed
    pub fn invalidate_comments(&self, post_id: Uuid) {
        self.comments.invalidate(&post_id);
    }

    /// Scores, comment counts or the post set changed; every page may shift
    pub fn invalidate_feed(&self) {
        self.feed.invalidate_all();
    }
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new(None)
    }
}
