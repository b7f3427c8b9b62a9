/// Post page and comment thread rendering
///
/// The thread is rendered depth-first in the order the tree holds. Edit and
/// delete controls appear only for the comment's author; like and reply are
/// offered to everyone and the action routes send anonymous users to
/// `/login`.
use super::layout::{escape_html, time_ago};
use super::markdown::render_markdown;
use crate::models::{CommentNode, PostDetail};
use uuid::Uuid;

pub const EDIT_LABEL: &str = "Editar comentário";
pub const DELETE_LABEL: &str = "Excluir comentário";
pub const EDITED_MARK: &str = "(editado)";

/// What the thread is being rendered for
#[derive(Debug, Clone)]
pub struct ThreadContext {
    pub viewer: Option<Uuid>,
    /// `/{authorId}/{postId}`
    pub post_path: String,
    /// Comment whose reply editor is open
    pub reply_to: Option<Uuid>,
    /// Comment whose edit editor is open
    pub editing: Option<Uuid>,
}

fn comment_editor(action: &str, parent_id: Option<Uuid>, content: &str, submit: &str) -> String {
    let parent = parent_id
        .map(|id| format!(r#"<input type="hidden" name="parent_id" value="{}">"#, id))
        .unwrap_or_default();

    format!(
        r#"<form class="comment-editor" method="post" action="{action}">
  {parent}
  <textarea name="content" rows="4" maxlength="10000" required>{content}</textarea>
  <button type="submit">{submit}</button>
</form>"#,
        action = escape_html(action),
        parent = parent,
        content = escape_html(content),
        submit = submit,
    )
}

fn like_control(node: &CommentNode, viewer: Option<Uuid>) -> String {
    let comment = &node.comment;
    let liked = comment.is_liked_by(viewer);
    let (action, label) = if liked {
        ("unlike", "Descurtir")
    } else {
        ("like", "Curtir")
    };

    format!(
        r#"<form method="post" action="/comments/{id}/{action}"><button class="link" type="submit" aria-pressed="{liked}">{label} ({count})</button></form>"#,
        id = comment.id,
        action = action,
        liked = liked,
        label = label,
        count = comment.likes.len(),
    )
}

fn owner_menu(node: &CommentNode, ctx: &ThreadContext) -> String {
    let id = node.comment.id;
    format!(
        r#"<a href="{path}?edit={id}#comment-{id}">{edit}</a>
    <form method="post" action="/comments/{id}/delete"><button class="link" type="submit">{delete}</button></form>"#,
        path = ctx.post_path,
        id = id,
        edit = EDIT_LABEL,
        delete = DELETE_LABEL,
    )
}

fn render_node(node: &CommentNode, ctx: &ThreadContext, out: &mut String) {
    let comment = &node.comment;
    let owned = comment.is_owned_by(ctx.viewer);
    let editing = owned && ctx.editing == Some(comment.id);

    let body = if editing {
        comment_editor(
            &format!("/comments/{}/edit", comment.id),
            None,
            &comment.content,
            "Salvar",
        )
    } else {
        format!(
            r#"<div class="comment-body">{}</div>"#,
            render_markdown(&comment.content)
        )
    };

    let edited = if comment.has_been_edited {
        format!(" {}", EDITED_MARK)
    } else {
        String::new()
    };

    out.push_str(&format!(
        r#"<div class="comment" id="comment-{id}">
  <div class="comment-meta"><a href="/{author_url}">{author}</a> · {ago}{edited}</div>
  {body}
  <div class="comment-actions">
    {like}
    <a href="{path}?reply_to={id}#comment-{id}">Responder</a>
    {menu}
  </div>
"#,
        id = comment.id,
        author_url = urlencoding::encode(&comment.author_name),
        author = escape_html(&comment.author_name),
        ago = time_ago(comment.created_at),
        edited = edited,
        body = body,
        like = like_control(node, ctx.viewer),
        path = ctx.post_path,
        menu = if owned { owner_menu(node, ctx) } else { String::new() },
    ));

    if ctx.viewer.is_some() && ctx.reply_to == Some(comment.id) {
        out.push_str(&comment_editor(
            &format!("{}/comments", ctx.post_path),
            Some(comment.id),
            "",
            "Responder",
        ));
    }

    if !node.children.is_empty() {
        out.push_str(r#"<div class="comment-children">"#);
        for child in &node.children {
            render_node(child, ctx, out);
        }
        out.push_str("</div>");
    }

    out.push_str("</div>\n");
}

pub fn comment_thread(nodes: &[CommentNode], ctx: &ThreadContext) -> String {
    let mut out = String::new();
    for node in nodes {
        render_node(node, ctx, &mut out);
    }
    out
}

/// Full post page: body, post like, new-comment editor and thread
pub fn post_page(
    post: &PostDetail,
    liked: bool,
    nodes: &[CommentNode],
    ctx: &ThreadContext,
) -> String {
    let (like_action, like_label) = if liked {
        ("unlike", "Descurtir")
    } else {
        ("like", "Curtir")
    };

    let new_comment = if ctx.viewer.is_some() {
        comment_editor(&format!("{}/comments", ctx.post_path), None, "", "Comentar")
    } else {
        r#"<p><a href="/login">Entre</a> para comentar.</p>"#.to_string()
    };

    format!(
        r#"<article class="post">
  <h1>{title}</h1>
  <div class="post-meta">por <a href="/{author_url}">{author}</a> · {ago} · {likes}</div>
  <div class="post-body">{content}</div>
  <form method="post" action="/posts/{id}/{like_action}"><button type="submit">{like_label}</button></form>
</article>
<section id="comments">
  <h2>{count} comentários</h2>
  {new_comment}
  {thread}
</section>"#,
        title = escape_html(&post.title),
        author_url = urlencoding::encode(&post.author_name),
        author = escape_html(&post.author_name),
        ago = time_ago(post.created_at),
        likes = super::feed::likes_label(post.score),
        content = render_markdown(&post.content),
        id = post.id,
        like_action = like_action,
        like_label = like_label,
        count = post.comment_count,
        new_comment = new_comment,
        thread = comment_thread(nodes, ctx),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{build_comment_tree, Comment};
    use chrono::Utc;

    const ANA: u128 = 1;
    const BRUNO: u128 = 2;

    fn comment(id: u128, parent: Option<u128>, author: u128) -> Comment {
        Comment {
            id: Uuid::from_u128(id),
            post_id: Uuid::from_u128(900),
            parent_id: parent.map(Uuid::from_u128),
            content: format!("texto {}", id),
            author_id: Uuid::from_u128(author),
            author_name: if author == ANA { "ana" } else { "bruno" }.to_string(),
            has_been_edited: false,
            created_at: Utc::now(),
            likes: Vec::new(),
        }
    }

    fn ctx(viewer: Option<u128>) -> ThreadContext {
        ThreadContext {
            viewer: viewer.map(Uuid::from_u128),
            post_path: "/a/p".to_string(),
            reply_to: None,
            editing: None,
        }
    }

    #[test]
    fn owner_controls_only_on_own_comments() {
        let tree = build_comment_tree(vec![comment(10, None, ANA), comment(11, None, BRUNO)]);
        let html = comment_thread(&tree, &ctx(Some(ANA)));
        assert_eq!(html.matches(EDIT_LABEL).count(), 1);
        assert_eq!(html.matches(DELETE_LABEL).count(), 1);
        assert!(html.contains(&format!("/comments/{}/delete", Uuid::from_u128(10))));
        assert!(!html.contains(&format!("/comments/{}/delete", Uuid::from_u128(11))));

        let anonymous = comment_thread(&tree, &ctx(None));
        assert!(!anonymous.contains(EDIT_LABEL));
        assert!(!anonymous.contains(DELETE_LABEL));
    }

    #[test]
    fn replies_render_inside_their_parent() {
        let tree = build_comment_tree(vec![
            comment(10, None, ANA),
            comment(11, Some(10), BRUNO),
            comment(12, Some(11), ANA),
        ]);
        let html = comment_thread(&tree, &ctx(None));
        let outer = html.find("texto 10").unwrap();
        let middle = html.find("texto 11").unwrap();
        let inner = html.find("texto 12").unwrap();
        assert!(outer < middle && middle < inner);
        assert_eq!(html.matches(r#"class="comment-children""#).count(), 2);
    }

    #[test]
    fn edit_mode_prefills_current_content() {
        let mut edited = comment(10, None, ANA);
        edited.content = "antes <b>".to_string();
        let tree = build_comment_tree(vec![edited]);
        let mut context = ctx(Some(ANA));
        context.editing = Some(Uuid::from_u128(10));

        let html = comment_thread(&tree, &context);
        assert!(html.contains(&format!("/comments/{}/edit", Uuid::from_u128(10))));
        assert!(html.contains("antes &lt;b&gt;</textarea>"));
    }

    #[test]
    fn edit_mode_is_ignored_for_other_authors() {
        let tree = build_comment_tree(vec![comment(11, None, BRUNO)]);
        let mut context = ctx(Some(ANA));
        context.editing = Some(Uuid::from_u128(11));
        assert!(!comment_thread(&tree, &context).contains("/edit"));
    }

    #[test]
    fn reply_editor_carries_parent_id() {
        let tree = build_comment_tree(vec![comment(10, None, ANA)]);
        let mut context = ctx(Some(BRUNO));
        context.reply_to = Some(Uuid::from_u128(10));

        let html = comment_thread(&tree, &context);
        assert!(html.contains(r#"action="/a/p/comments""#));
        assert!(html.contains(&format!(
            r#"name="parent_id" value="{}""#,
            Uuid::from_u128(10)
        )));
    }

    #[test]
    fn like_control_reflects_viewer_state() {
        let mut liked = comment(10, None, ANA);
        liked.likes = vec![Uuid::from_u128(BRUNO)];
        liked.has_been_edited = true;
        let tree = build_comment_tree(vec![liked]);

        let html = comment_thread(&tree, &ctx(Some(BRUNO)));
        assert!(html.contains("/unlike"));
        assert!(html.contains("Descurtir (1)"));
        assert!(html.contains(EDITED_MARK));

        let html = comment_thread(&tree, &ctx(Some(ANA)));
        assert!(html.contains("Curtir (1)"));
    }
}
