/// Comment endpoints
///
/// Every mutation answers with the post's thread as re-read from the store
/// after the cache entry was invalidated.
use crate::error::Result;
use crate::models::{CommentUpdate, NewComment};
use crate::services::{CommentService, PostService, SessionUser};
use actix_web::{web, HttpResponse};
use uuid::Uuid;

async fn thread_response(comments: &CommentService, post_id: Uuid) -> Result<HttpResponse> {
    let tree = comments.list_tree(post_id).await?;
    Ok(HttpResponse::Ok().json(tree))
}

/// `comments.list`
pub async fn list_comments(
    posts: web::Data<PostService>,
    comments: web::Data<CommentService>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    posts.get_post(post_id).await?;
    thread_response(&comments, post_id).await
}

/// `comments.create`
pub async fn create_comment(
    comments: web::Data<CommentService>,
    user: SessionUser,
    post_id: web::Path<Uuid>,
    body: web::Json<NewComment>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    comments.create(post_id, user.id, body.into_inner()).await?;

    let tree = comments.list_tree(post_id).await?;
    Ok(HttpResponse::Created().json(tree))
}

/// `comments.update`
pub async fn update_comment(
    comments: web::Data<CommentService>,
    user: SessionUser,
    comment_id: web::Path<Uuid>,
    body: web::Json<CommentUpdate>,
) -> Result<HttpResponse> {
    let post_id = comments
        .update(comment_id.into_inner(), user.id, body.into_inner())
        .await?;
    thread_response(&comments, post_id).await
}

/// `comments.delete`
pub async fn delete_comment(
    comments: web::Data<CommentService>,
    user: SessionUser,
    comment_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post_id = comments.delete(comment_id.into_inner(), user.id).await?;
    thread_response(&comments, post_id).await
}

/// `likes.addToComment`
pub async fn like_comment(
    comments: web::Data<CommentService>,
    user: SessionUser,
    comment_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post_id = comments.like(comment_id.into_inner(), user.id).await?;
    thread_response(&comments, post_id).await
}

/// `likes.removeFromComment`
pub async fn unlike_comment(
    comments: web::Data<CommentService>,
    user: SessionUser,
    comment_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post_id = comments.unlike(comment_id.into_inner(), user.id).await?;
    thread_response(&comments, post_id).await
}
