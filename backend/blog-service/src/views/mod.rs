/// Server-rendered HTML
///
/// Views are plain functions from data to markup. Everything user supplied
/// goes through [`escape_html`] or the markdown renderer.
pub mod auth;
pub mod comments;
pub mod feed;
pub mod layout;
pub mod markdown;

pub use auth::{login_page, register_page, RegisterForm};
pub use comments::{comment_thread, post_page, ThreadContext};
pub use feed::{feed_fragment, feed_page, profile_page};
pub use layout::{escape_html, format_distance, page};
pub use markdown::render_markdown;
