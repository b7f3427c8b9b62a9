/// Post service - feed pages, post pages, post likes
use crate::cache::{ContentCache, FeedKey};
use crate::config::FeedConfig;
use crate::db::BlogStore;
use crate::error::{AppError, Result};
use crate::metrics::{record_mutation, FEED_PAGES_SERVED};
use crate::models::{NewPost, PostCursor, PostDetail, PostPage, PostQuery, PostSummary};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

/// Posts shown on a profile page
const AUTHOR_POSTS_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn BlogStore>,
    cache: Arc<ContentCache>,
    feed: FeedConfig,
}

impl PostService {
    pub fn new(store: Arc<dyn BlogStore>, cache: Arc<ContentCache>, feed: FeedConfig) -> Self {
        Self { store, cache, feed }
    }

    pub fn page_size(&self) -> i64 {
        self.feed.page_size
    }

    /// `posts.getAll`: one feed page, served from the query cache when present.
    pub async fn get_page(
        &self,
        limit: Option<i64>,
        recents: bool,
        cursor: Option<&str>,
    ) -> Result<PostPage> {
        let limit = limit.unwrap_or(self.feed.page_size);
        if !(1..=self.feed.max_page_size).contains(&limit) {
            return Err(AppError::BadRequest(format!(
                "limit must be between 1 and {}",
                self.feed.max_page_size
            )));
        }

        let cursor = cursor.map(str::trim).filter(|c| !c.is_empty());
        let decoded = cursor.map(PostCursor::decode).transpose()?;

        let key = FeedKey {
            recents,
            limit,
            cursor: cursor.map(str::to_string),
        };
        let query = PostQuery {
            limit,
            recents,
            cursor: decoded,
        };

        let page = self
            .cache
            .feed
            .fetch_with(key, || async { self.store.list_posts(&query).await })
            .await?;

        let ordering = if recents { "recents" } else { "score" };
        FEED_PAGES_SERVED.with_label_values(&[ordering]).inc();
        debug!(
            ordering,
            limit,
            items = page.items.len(),
            has_next = page.next_cursor.is_some(),
            "feed page served"
        );

        Ok(page)
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<PostDetail> {
        self.store
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))
    }

    pub async fn create_post(&self, author_id: Uuid, post: NewPost) -> Result<PostDetail> {
        post.validate()?;

        let result = self.store.create_post(author_id, &post).await;
        record_mutation("post_create", &result);
        let created = result?;

        self.cache.invalidate_feed();
        info!(post_id = %created.id, %author_id, "post created");
        Ok(created)
    }

    /// `likes.addToPost`; returns the post with its new score
    pub async fn like_post(&self, post_id: Uuid, user_id: Uuid) -> Result<PostDetail> {
        self.get_post(post_id).await?;

        let result = self.store.add_post_like(post_id, user_id).await;
        record_mutation("post_like", &result);
        if result? {
            self.cache.invalidate_feed();
        }

        self.get_post(post_id).await
    }

    /// `likes.removeFromPost`
    pub async fn unlike_post(&self, post_id: Uuid, user_id: Uuid) -> Result<PostDetail> {
        self.get_post(post_id).await?;

        let result = self.store.remove_post_like(post_id, user_id).await;
        record_mutation("post_unlike", &result);
        if result? {
            self.cache.invalidate_feed();
        }

        self.get_post(post_id).await
    }

    pub async fn has_liked(&self, post_id: Uuid, user_id: Option<Uuid>) -> Result<bool> {
        match user_id {
            Some(user_id) => self.store.has_liked_post(post_id, user_id).await,
            None => Ok(false),
        }
    }

    /// Newest posts of `author_id`, for the profile page
    pub async fn posts_by_author(&self, author_id: Uuid) -> Result<Vec<PostSummary>> {
        self.store
            .list_posts_by_author(author_id, AUTHOR_POSTS_LIMIT)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::NewUser;

    async fn setup() -> (PostService, Arc<MemoryStore>, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let user = store
            .create_user(&NewUser {
                name: "ana".to_string(),
                email: "ana@example.com".to_string(),
                password_hash: "x".to_string(),
            })
            .await
            .unwrap();
        let service = PostService::new(
            store.clone(),
            Arc::new(ContentCache::default()),
            FeedConfig::default(),
        );
        (service, store, user.id)
    }

    fn new_post(title: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: "corpo".to_string(),
        }
    }

    #[tokio::test]
    async fn limit_out_of_range_is_rejected() {
        let (service, _, _) = setup().await;
        for limit in [0, 101, -3] {
            let err = service.get_page(Some(limit), false, None).await.unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)));
        }
    }

    #[tokio::test]
    async fn malformed_cursor_is_rejected() {
        let (service, _, _) = setup().await;
        let err = service
            .get_page(None, true, Some("%%%"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn new_post_shows_up_despite_cached_page() {
        let (service, _, author) = setup().await;
        service.create_post(author, new_post("primeiro")).await.unwrap();
        assert_eq!(service.get_page(None, true, None).await.unwrap().items.len(), 1);

        service.create_post(author, new_post("segundo")).await.unwrap();
        let page = service.get_page(None, true, None).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].title, "segundo");
    }

    #[tokio::test]
    async fn liking_twice_counts_once() {
        let (service, _, author) = setup().await;
        let post = service.create_post(author, new_post("p")).await.unwrap();

        service.like_post(post.id, author).await.unwrap();
        let liked = service.like_post(post.id, author).await.unwrap();
        assert_eq!(liked.score, 1);
        assert!(service.has_liked(post.id, Some(author)).await.unwrap());

        let unliked = service.unlike_post(post.id, author).await.unwrap();
        assert_eq!(unliked.score, 0);
        let again = service.unlike_post(post.id, author).await.unwrap();
        assert_eq!(again.score, 0);
    }

    #[tokio::test]
    async fn liking_missing_post_is_not_found() {
        let (service, _, author) = setup().await;
        let err = service.like_post(Uuid::new_v4(), author).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn empty_title_fails_validation() {
        let (service, _, author) = setup().await;
        let err = service.create_post(author, new_post("")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
