//! Test helpers for HTTP integration tests
//!
//! `CountingStore` wraps the in-memory store and counts every write that
//! goes through it, so tests can assert that an action issued no mutation.
//! Fixtures are seeded through `inner()` and are not counted.

#![allow(dead_code)]

use actix_web::cookie::Cookie;
use blog_service::db::{BlogStore, MemoryStore};
use blog_service::error::Result;
use blog_service::middleware::SESSION_COOKIE;
use blog_service::models::{
    Comment, NewComment, NewPost, NewUser, PostDetail, PostPage, PostQuery, PostSummary, User,
    UserRecord,
};
use blog_service::{AppServices, Config};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    mutations: AtomicUsize,
    comment_reads: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Writes issued through the service layer
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// `list_comments` calls that reached the store
    pub fn comment_reads(&self) -> usize {
        self.comment_reads.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl BlogStore for CountingStore {
    async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<PostPage> {
        self.inner.list_posts(query).await
    }

    async fn list_posts_by_author(&self, author_id: Uuid, limit: i64) -> Result<Vec<PostSummary>> {
        self.inner.list_posts_by_author(author_id, limit).await
    }

    async fn get_post(&self, post_id: Uuid) -> Result<Option<PostDetail>> {
        self.inner.get_post(post_id).await
    }

    async fn create_post(&self, author_id: Uuid, post: &NewPost) -> Result<PostDetail> {
        self.count();
        self.inner.create_post(author_id, post).await
    }

    async fn add_post_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        self.count();
        self.inner.add_post_like(post_id, user_id).await
    }

    async fn remove_post_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        self.count();
        self.inner.remove_post_like(post_id, user_id).await
    }

    async fn has_liked_post(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        self.inner.has_liked_post(post_id, user_id).await
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        self.comment_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.list_comments(post_id).await
    }

    async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        self.inner.get_comment(comment_id).await
    }

    async fn create_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        comment: &NewComment,
    ) -> Result<Comment> {
        self.count();
        self.inner.create_comment(post_id, author_id, comment).await
    }

    async fn update_comment(
        &self,
        comment_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<Option<Comment>> {
        self.count();
        self.inner.update_comment(comment_id, author_id, content).await
    }

    async fn delete_comment(&self, comment_id: Uuid, author_id: Uuid) -> Result<Option<Uuid>> {
        self.count();
        self.inner.delete_comment(comment_id, author_id).await
    }

    async fn add_comment_like(&self, comment_id: Uuid, user_id: Uuid) -> Result<bool> {
        self.count();
        self.inner.add_comment_like(comment_id, user_id).await
    }

    async fn remove_comment_like(&self, comment_id: Uuid, user_id: Uuid) -> Result<bool> {
        self.count();
        self.inner.remove_comment_like(comment_id, user_id).await
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        self.count();
        self.inner.create_user(user).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.inner.find_user_by_email(email).await
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>> {
        self.inner.find_user_by_name(name).await
    }
}

pub fn services(store: Arc<CountingStore>) -> AppServices {
    AppServices::new(store, &Config::for_memory())
}

pub async fn seed_user(store: &CountingStore, name: &str) -> User {
    store
        .inner()
        .create_user(&NewUser {
            name: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: "unused".to_string(),
        })
        .await
        .expect("seed user")
}

pub async fn seed_post(store: &CountingStore, author: Uuid, title: &str) -> PostDetail {
    store
        .inner()
        .create_post(
            author,
            &NewPost {
                title: title.to_string(),
                content: format!("conteúdo de {}", title),
            },
        )
        .await
        .expect("seed post")
}

pub async fn seed_comment(
    store: &CountingStore,
    post_id: Uuid,
    author: Uuid,
    parent_id: Option<Uuid>,
) -> Comment {
    store
        .inner()
        .create_comment(
            post_id,
            author,
            &NewComment {
                content: "um comentário".to_string(),
                parent_id,
            },
        )
        .await
        .expect("seed comment")
}

/// Session cookie for `user`
pub fn session_for(services: &AppServices, user: &User) -> Cookie<'static> {
    let token = services
        .auth
        .sessions()
        .issue(user)
        .expect("issue session token");
    Cookie::new(SESSION_COOKIE, token)
}

/// `Authorization` header value for `user`
pub fn bearer_for(services: &AppServices, user: &User) -> (String, String) {
    let token = services
        .auth
        .sessions()
        .issue(user)
        .expect("issue session token");
    ("Authorization".to_string(), format!("Bearer {}", token))
}
