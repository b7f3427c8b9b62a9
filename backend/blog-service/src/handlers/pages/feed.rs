use super::html;
use crate::middleware::Viewer;
use crate::services::{FeedPager, PostService, SeenPosts};
use crate::views;
use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct NextPageQuery {
    #[serde(default)]
    pub recents: bool,
    pub cursor: String,
    /// Posts already numbered above the sentinel, see [`SeenPosts`]
    #[serde(default)]
    pub seen: String,
}

/// Run the pager's pending request, if any, and settle it
async fn load(posts: &PostService, pager: &mut FeedPager) {
    let Some(request) = pager.start() else {
        return;
    };

    match posts
        .get_page(Some(request.limit), request.recents, request.cursor.as_deref())
        .await
    {
        Ok(page) => pager.receive(page),
        Err(err) => {
            tracing::warn!(error = %err, recents = request.recents, "feed page failed");
            pager.fail(err.message());
        }
    }
}

async fn render_feed(posts: &PostService, viewer: &Viewer, recents: bool) -> HttpResponse {
    let mut pager = FeedPager::new(recents, posts.page_size());
    load(posts, &mut pager).await;

    let title = if recents { "Recentes" } else { "Em alta" };
    html(
        StatusCode::OK,
        views::page(title, viewer.user(), &views::feed_page(&pager)),
    )
}

/// `/`: posts by score
pub async fn home(posts: web::Data<PostService>, viewer: Viewer) -> HttpResponse {
    render_feed(&posts, &viewer, false).await
}

/// `/recent`: posts by creation time
pub async fn recent(posts: web::Data<PostService>, viewer: Viewer) -> HttpResponse {
    render_feed(&posts, &viewer, true).await
}

/// `/feed/page`: the fragment that replaces a revealed sentinel
pub async fn next_page(
    posts: web::Data<PostService>,
    query: web::Query<NextPageQuery>,
) -> HttpResponse {
    let query = query.into_inner();
    let seen = match SeenPosts::decode(&query.seen) {
        Ok(seen) => seen,
        Err(err) => return err.error_response(),
    };
    let mut pager = FeedPager::resume(query.recents, posts.page_size(), Some(query.cursor), seen);
    load(&posts, &mut pager).await;

    html(StatusCode::OK, views::feed_fragment(&pager))
}
