use crate::cache::ContentCache;
use crate::config::Config;
use crate::db::BlogStore;
use crate::handlers::health::HealthState;
use crate::services::{AuthService, CommentService, PostService, SessionKeys};
use actix_web::web;
use std::sync::Arc;

/// Everything the handlers pull out of app data, built once and cloned into
/// each worker
#[derive(Clone)]
pub struct AppServices {
    pub posts: web::Data<PostService>,
    pub comments: web::Data<CommentService>,
    pub auth: web::Data<AuthService>,
    pub sessions: web::Data<SessionKeys>,
    pub health: web::Data<HealthState>,
    pub cache: Arc<ContentCache>,
}

impl AppServices {
    pub fn new(store: Arc<dyn BlogStore>, config: &Config) -> Self {
        let cache = Arc::new(ContentCache::new(config.cache.stale_after()));
        let sessions = SessionKeys::new(&config.session);

        Self {
            posts: web::Data::new(PostService::new(
                store.clone(),
                cache.clone(),
                config.feed.clone(),
            )),
            comments: web::Data::new(CommentService::new(store.clone(), cache.clone())),
            auth: web::Data::new(AuthService::new(store.clone(), sessions.clone())),
            sessions: web::Data::new(sessions),
            health: web::Data::new(HealthState::new(store)),
            cache,
        }
    }

    /// App data plus every route
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.posts.clone())
            .app_data(self.comments.clone())
            .app_data(self.auth.clone())
            .app_data(self.sessions.clone())
            .app_data(self.health.clone());
        crate::handlers::configure(cfg);
    }
}
