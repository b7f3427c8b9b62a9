/// Post endpoints - feed pages, post lookup, post creation and post likes
use crate::error::Result;
use crate::models::NewPost;
use crate::services::{PostService, SessionUser};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<i64>,
    #[serde(default)]
    pub recents: bool,
    pub cursor: Option<String>,
}

/// `posts.getAll`
pub async fn list_posts(
    posts: web::Data<PostService>,
    query: web::Query<FeedQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let page = posts
        .get_page(query.limit, query.recents, query.cursor.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn get_post(
    posts: web::Data<PostService>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = posts.get_post(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// `posts.create`
pub async fn create_post(
    posts: web::Data<PostService>,
    user: SessionUser,
    body: web::Json<NewPost>,
) -> Result<HttpResponse> {
    let post = posts.create_post(user.id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(post))
}

/// `likes.addToPost`
pub async fn like_post(
    posts: web::Data<PostService>,
    user: SessionUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = posts.like_post(post_id.into_inner(), user.id).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// `likes.removeFromPost`
pub async fn unlike_post(
    posts: web::Data<PostService>,
    user: SessionUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = posts.unlike_post(post_id.into_inner(), user.id).await?;
    Ok(HttpResponse::Ok().json(post))
}
