/// Blog Service Library
///
/// A server-rendered blog: an infinite-scrolling post feed, nested comment
/// threads with likes, replies and author-only edits, and account
/// registration. The same operations are exposed as a JSON API.
///
/// # Modules
///
/// - `handlers`: JSON API, HTML pages and health probes
/// - `services`: Business logic, feed pagination state and sessions
/// - `models`: Posts, comments, users and the comment tree
/// - `db`: `BlogStore` trait with PostgreSQL and in-memory stores
/// - `cache`: Query cache with explicit invalidation
/// - `views`: HTML rendering
/// - `middleware`: Session extraction
/// - `validators`: Registration field rules
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod validators;
pub mod views;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppServices;
