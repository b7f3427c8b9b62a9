//! Feed pagination state.
//!
//! `FeedPager` decides when the next page may be requested: one initial
//! load, then one page per sentinel sighting, never two requests in flight
//! and never past the last cursor. It also derives the rank shown beside each
//! post from insertion order, not from score.
//!
//! Each sentinel fragment is served by a fresh pager, so the ids ranked so
//! far travel with the sentinel as [`SeenPosts`]. A post that shows up again
//! further down keeps its first rank and does not shift later numbers.

use crate::error::{AppError, Result};
use crate::models::{PostPage, PostSummary};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use std::collections::HashMap;
use uuid::Uuid;

/// Post ids already ranked, in rank order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenPosts(Vec<Uuid>);

impl SeenPosts {
    pub fn new(ids: Vec<Uuid>) -> Self {
        Self(ids)
    }

    pub fn ids(&self) -> &[Uuid] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw 16-byte ids, URL-safe base64
    pub fn encode(&self) -> String {
        let bytes: Vec<u8> = self.0.iter().flat_map(|id| *id.as_bytes()).collect();
        URL_SAFE_NO_PAD.encode(bytes)
    }

    pub fn decode(raw: &str) -> Result<Self> {
        let invalid = || AppError::BadRequest("invalid seen list".to_string());
        let bytes = URL_SAFE_NO_PAD.decode(raw.trim()).map_err(|_| invalid())?;
        if bytes.len() % 16 != 0 {
            return Err(invalid());
        }
        let ids = bytes
            .chunks_exact(16)
            .map(|chunk| Uuid::from_slice(chunk).map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self(ids))
    }
}

/// A page the pager wants fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub recents: bool,
    pub limit: i64,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    /// First page in flight, nothing to show yet
    Loading,
    /// A further page is in flight
    FetchingNextPage,
    /// Waiting for the sentinel; more pages exist
    Idle,
    /// No further cursor and nothing in flight
    AllLoaded,
    /// The last fetch failed; the message is shown as-is
    Failed(String),
}

/// A post together with the numbers displayed beside it
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPost {
    pub rank: usize,
    /// Score held by the rank map when this row was rendered
    pub score: i64,
    pub post: PostSummary,
}

/// Insertion-ordered post id -> score map.
///
/// Re-inserting an id keeps its first position and replaces its score.
#[derive(Debug, Default)]
struct RankMap {
    positions: HashMap<Uuid, usize>,
    scores: HashMap<Uuid, i64>,
}

impl RankMap {
    fn seeded(seen: &SeenPosts) -> Self {
        let mut ranks = Self::default();
        for id in seen.ids() {
            ranks.set(*id, 0);
        }
        ranks
    }

    fn set(&mut self, id: Uuid, score: i64) -> usize {
        let next = self.positions.len();
        let position = *self.positions.entry(id).or_insert(next);
        self.scores.insert(id, score);
        position
    }

    fn score(&self, id: &Uuid) -> i64 {
        self.scores.get(id).copied().unwrap_or_default()
    }

    /// Ids in rank order
    fn ordered_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<(usize, Uuid)> =
            self.positions.iter().map(|(id, pos)| (*pos, *id)).collect();
        ids.sort_unstable();
        ids.into_iter().map(|(_, id)| id).collect()
    }
}

#[derive(Debug)]
pub struct FeedPager {
    recents: bool,
    limit: i64,
    /// Posts ranked before the first page this pager holds
    seen: SeenPosts,
    pages: Vec<PostPage>,
    /// Cursor for the first fetch of a resumed pager
    start_cursor: Option<String>,
    next_cursor: Option<String>,
    loaded: bool,
    in_flight: bool,
    error: Option<String>,
}

impl FeedPager {
    pub fn new(recents: bool, limit: i64) -> Self {
        Self::resume(recents, limit, None, SeenPosts::default())
    }

    /// Continue a feed at `cursor`, numbering new posts after `seen`
    pub fn resume(recents: bool, limit: i64, cursor: Option<String>, seen: SeenPosts) -> Self {
        Self {
            recents,
            limit,
            seen,
            pages: Vec::new(),
            start_cursor: cursor,
            next_cursor: None,
            loaded: false,
            in_flight: false,
            error: None,
        }
    }

    pub fn recents(&self) -> bool {
        self.recents
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// The initial load; issued at most once.
    pub fn start(&mut self) -> Option<PageRequest> {
        if self.loaded || self.in_flight {
            return None;
        }
        self.in_flight = true;
        self.error = None;
        Some(self.request(self.start_cursor.clone()))
    }

    /// Sentinel visibility changed. Returns the next page to fetch, if one
    /// may be fetched now.
    pub fn on_sentinel(&mut self, visible: bool) -> Option<PageRequest> {
        if !visible || !self.loaded || self.in_flight {
            return None;
        }
        let cursor = self.next_cursor.clone()?;
        self.in_flight = true;
        self.error = None;
        Some(self.request(Some(cursor)))
    }

    /// Settle the in-flight fetch with its page. Ignored when nothing is in
    /// flight.
    pub fn receive(&mut self, page: PostPage) {
        if !self.in_flight {
            return;
        }
        self.in_flight = false;
        self.loaded = true;
        self.next_cursor = page.next_cursor.clone();
        self.pages.push(page);
    }

    /// Settle the in-flight fetch with an error. State is otherwise left as
    /// it was; no retry is scheduled.
    pub fn fail(&mut self, message: impl Into<String>) {
        if !self.in_flight {
            return;
        }
        self.in_flight = false;
        self.error = Some(message.into());
    }

    pub fn has_next_page(&self) -> bool {
        !self.loaded || self.next_cursor.is_some()
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight
    }

    pub fn status(&self) -> FeedStatus {
        if self.in_flight {
            return if self.loaded {
                FeedStatus::FetchingNextPage
            } else {
                FeedStatus::Loading
            };
        }
        if let Some(message) = &self.error {
            return FeedStatus::Failed(message.clone());
        }
        if !self.loaded {
            FeedStatus::Loading
        } else if self.next_cursor.is_some() {
            FeedStatus::Idle
        } else {
            FeedStatus::AllLoaded
        }
    }

    /// Posts of every page in order, ranked by first appearance.
    ///
    /// The rank map is rebuilt on every call, the way a render would.
    pub fn ranked_posts(&self) -> Vec<RankedPost> {
        let mut ranks = RankMap::seeded(&self.seen);
        let mut rows = Vec::new();

        for post in self.pages.iter().flat_map(|page| page.items.iter()) {
            let position = ranks.set(post.id, post.score);
            rows.push(RankedPost {
                rank: position + 1,
                score: ranks.score(&post.id),
                post: post.clone(),
            });
        }

        rows
    }

    /// Everything ranked so far, for a pager resuming after this one
    pub fn seen_after(&self) -> SeenPosts {
        let mut ranks = RankMap::seeded(&self.seen);
        for post in self.pages.iter().flat_map(|page| page.items.iter()) {
            ranks.set(post.id, post.score);
        }
        SeenPosts(ranks.ordered_ids())
    }

    fn request(&self, cursor: Option<String>) -> PageRequest {
        PageRequest {
            recents: self.recents,
            limit: self.limit,
            cursor,
        }
    }
}
