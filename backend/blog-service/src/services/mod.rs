/// Business logic layer
///
/// Services sit between handlers and the [`BlogStore`](crate::db::BlogStore):
/// they validate input, check ownership, record mutation metrics and keep
/// the [`ContentCache`](crate::cache::ContentCache) consistent by
/// invalidating after every write.
pub mod auth;
pub mod comments;
pub mod feed;
pub mod posts;

pub use auth::{AuthService, SessionKeys, SessionUser};
pub use comments::CommentService;
pub use feed::{FeedPager, FeedStatus, PageRequest, RankedPost, SeenPosts};
pub use posts::PostService;
