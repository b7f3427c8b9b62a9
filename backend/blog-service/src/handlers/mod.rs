/// HTTP handlers for blog-service
///
/// - `api`: JSON endpoints under `/api/v1`
/// - `pages`: server-rendered pages and their form actions
/// - `health`: liveness and readiness probes
pub mod api;
pub mod health;
pub mod pages;

use actix_web::web;

/// Register every route. Static paths go first; the page routes end with
/// the `/{authorId}/{postId}` and `/{username}` catch-alls.
pub fn configure(cfg: &mut web::ServiceConfig) {
    api::configure(cfg);
    cfg.route("/metrics", web::get().to(crate::metrics::serve_metrics));
    pages::configure(cfg);
}
