use super::{error_page, html, login_redirect, see_other};
use crate::error::{AppError, Result};
use crate::middleware::Viewer;
use crate::models::{CommentUpdate, NewComment};
use crate::services::{CommentService, PostService};
use crate::views::{self, ThreadContext};
use actix_web::{http::StatusCode, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct PostPageQuery {
    /// Open a reply editor under this comment
    pub reply_to: Option<Uuid>,
    /// Open the edit editor for this comment
    pub edit: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub content: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct EditForm {
    pub content: String,
}

/// `/{authorId}/{postId}`
pub async fn show_post(
    posts: web::Data<PostService>,
    comments: web::Data<CommentService>,
    viewer: Viewer,
    path: web::Path<(Uuid, Uuid)>,
    query: web::Query<PostPageQuery>,
) -> HttpResponse {
    let (author_id, post_id) = path.into_inner();
    let query = query.into_inner();

    // Opening an editor is the first step of a mutation
    if viewer.id().is_none() && (query.reply_to.is_some() || query.edit.is_some()) {
        return login_redirect();
    }

    render_post(&posts, &comments, &viewer, author_id, post_id, query)
        .await
        .unwrap_or_else(|err| error_page(&err, &viewer))
}

async fn render_post(
    posts: &PostService,
    comments: &CommentService,
    viewer: &Viewer,
    author_id: Uuid,
    post_id: Uuid,
    query: PostPageQuery,
) -> Result<HttpResponse> {
    let post = posts.get_post(post_id).await?;
    if post.author_id != author_id {
        return Ok(see_other(&post.path()));
    }

    let liked = posts.has_liked(post_id, viewer.id()).await?;
    let tree = comments.list_tree(post_id).await?;
    let ctx = ThreadContext {
        viewer: viewer.id(),
        post_path: post.path(),
        reply_to: query.reply_to,
        editing: query.edit,
    };

    Ok(html(
        StatusCode::OK,
        views::page(
            &post.title,
            viewer.user(),
            &views::post_page(&post, liked, &tree, &ctx),
        ),
    ))
}

/// Where to land after a comment mutation
async fn thread_location(posts: &PostService, post_id: Uuid, anchor: &str) -> Result<String> {
    let post = posts.get_post(post_id).await?;
    Ok(format!("{}#{}", post.path(), anchor))
}

/// New root comment or reply
pub async fn create_comment(
    posts: web::Data<PostService>,
    comments: web::Data<CommentService>,
    viewer: Viewer,
    path: web::Path<(Uuid, Uuid)>,
    form: web::Form<CommentForm>,
) -> HttpResponse {
    let Some(user_id) = viewer.id() else {
        return login_redirect();
    };
    let (_, post_id) = path.into_inner();
    let form = form.into_inner();

    let result = async {
        let created = comments
            .create(
                post_id,
                user_id,
                NewComment {
                    content: form.content,
                    parent_id: form.parent_id,
                },
            )
            .await?;
        thread_location(&posts, post_id, &format!("comment-{}", created.id)).await
    }
    .await;

    match result {
        Ok(location) => see_other(&location),
        Err(err) => error_page(&err, &viewer),
    }
}

pub async fn edit_comment(
    posts: web::Data<PostService>,
    comments: web::Data<CommentService>,
    viewer: Viewer,
    comment_id: web::Path<Uuid>,
    form: web::Form<EditForm>,
) -> HttpResponse {
    let Some(user_id) = viewer.id() else {
        return login_redirect();
    };
    let comment_id = comment_id.into_inner();
    let update = CommentUpdate {
        content: form.into_inner().content,
    };

    let result = async {
        let post_id = comments.update(comment_id, user_id, update).await?;
        thread_location(&posts, post_id, &format!("comment-{}", comment_id)).await
    }
    .await;

    match result {
        Ok(location) => see_other(&location),
        Err(err) => error_page(&err, &viewer),
    }
}

/// `like`, `unlike` or `delete` on a comment
pub async fn comment_action(
    posts: web::Data<PostService>,
    comments: web::Data<CommentService>,
    viewer: Viewer,
    path: web::Path<(Uuid, String)>,
) -> HttpResponse {
    let Some(user_id) = viewer.id() else {
        return login_redirect();
    };
    let (comment_id, action) = path.into_inner();

    let result = async {
        let (post_id, anchor) = match action.as_str() {
            "like" => (
                comments.like(comment_id, user_id).await?,
                format!("comment-{}", comment_id),
            ),
            "unlike" => (
                comments.unlike(comment_id, user_id).await?,
                format!("comment-{}", comment_id),
            ),
            "delete" => (
                comments.delete(comment_id, user_id).await?,
                "comments".to_string(),
            ),
            other => {
                return Err(AppError::NotFound(format!("Unknown action {}", other)));
            }
        };
        thread_location(&posts, post_id, &anchor).await
    }
    .await;

    match result {
        Ok(location) => see_other(&location),
        Err(err) => error_page(&err, &viewer),
    }
}

async fn post_like_action(
    posts: &PostService,
    viewer: &Viewer,
    post_id: Uuid,
    like: bool,
) -> HttpResponse {
    let Some(user_id) = viewer.id() else {
        return login_redirect();
    };

    let result = if like {
        posts.like_post(post_id, user_id).await
    } else {
        posts.unlike_post(post_id, user_id).await
    };

    match result {
        Ok(post) => see_other(&post.path()),
        Err(err) => error_page(&err, viewer),
    }
}

pub async fn like_post(
    posts: web::Data<PostService>,
    viewer: Viewer,
    post_id: web::Path<Uuid>,
) -> HttpResponse {
    post_like_action(&posts, &viewer, post_id.into_inner(), true).await
}

pub async fn unlike_post(
    posts: web::Data<PostService>,
    viewer: Viewer,
    post_id: web::Path<Uuid>,
) -> HttpResponse {
    post_like_action(&posts, &viewer, post_id.into_inner(), false).await
}
