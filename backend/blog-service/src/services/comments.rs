/// Comment service - threads, replies, edits, deletes and comment likes
///
/// Every mutation invalidates the post's cached comment list (and the feed,
/// whose comment counts it shifts) and hands back the post id so callers
/// can refetch the thread. Nothing is patched in place.
use crate::cache::ContentCache;
use crate::db::BlogStore;
use crate::error::{AppError, Result};
use crate::metrics::record_mutation;
use crate::models::{build_comment_tree, Comment, CommentNode, CommentUpdate, NewComment};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn BlogStore>,
    cache: Arc<ContentCache>,
}

impl CommentService {
    pub fn new(store: Arc<dyn BlogStore>, cache: Arc<ContentCache>) -> Self {
        Self { store, cache }
    }

    /// Flat comment list of a post, through the query cache
    pub async fn list(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        self.cache
            .comments
            .fetch_with(post_id, || async { self.store.list_comments(post_id).await })
            .await
    }

    /// `comments.list`: the post's thread as a forest
    pub async fn list_tree(&self, post_id: Uuid) -> Result<Vec<CommentNode>> {
        Ok(build_comment_tree(self.list(post_id).await?))
    }

    /// `comments.create`, for root comments and replies alike
    pub async fn create(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        comment: NewComment,
    ) -> Result<Comment> {
        comment.validate()?;

        let result = self.store.create_comment(post_id, author_id, &comment).await;
        record_mutation("comment_create", &result);
        let created = result?;

        self.invalidate(post_id);
        info!(
            comment_id = %created.id,
            %post_id,
            parent_id = ?created.parent_id,
            "comment created"
        );
        Ok(created)
    }

    /// `comments.update`; author only
    pub async fn update(
        &self,
        comment_id: Uuid,
        actor_id: Uuid,
        update: CommentUpdate,
    ) -> Result<Uuid> {
        update.validate()?;
        let existing = self.owned_comment(comment_id, actor_id).await?;

        let result = self
            .store
            .update_comment(comment_id, actor_id, &update.content)
            .await;
        record_mutation("comment_update", &result);
        let updated = result?.ok_or_else(|| comment_not_found(comment_id))?;

        self.invalidate(existing.post_id);
        info!(comment_id = %updated.id, post_id = %updated.post_id, "comment updated");
        Ok(updated.post_id)
    }

    /// `comments.delete`; author only. Replies go with it.
    pub async fn delete(&self, comment_id: Uuid, actor_id: Uuid) -> Result<Uuid> {
        self.owned_comment(comment_id, actor_id).await?;

        let result = self.store.delete_comment(comment_id, actor_id).await;
        record_mutation("comment_delete", &result);
        let post_id = result?.ok_or_else(|| comment_not_found(comment_id))?;

        self.invalidate(post_id);
        info!(%comment_id, %post_id, "comment deleted");
        Ok(post_id)
    }

    /// `likes.addToComment`
    pub async fn like(&self, comment_id: Uuid, user_id: Uuid) -> Result<Uuid> {
        let comment = self.existing(comment_id).await?;

        let result = self.store.add_comment_like(comment_id, user_id).await;
        record_mutation("comment_like", &result);
        result?;

        self.invalidate(comment.post_id);
        Ok(comment.post_id)
    }

    /// `likes.removeFromComment`
    pub async fn unlike(&self, comment_id: Uuid, user_id: Uuid) -> Result<Uuid> {
        let comment = self.existing(comment_id).await?;

        let result = self.store.remove_comment_like(comment_id, user_id).await;
        record_mutation("comment_unlike", &result);
        result?;

        self.invalidate(comment.post_id);
        Ok(comment.post_id)
    }

    async fn existing(&self, comment_id: Uuid) -> Result<Comment> {
        self.store
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| comment_not_found(comment_id))
    }

    async fn owned_comment(&self, comment_id: Uuid, actor_id: Uuid) -> Result<Comment> {
        let comment = self.existing(comment_id).await?;
        if !comment.is_owned_by(Some(actor_id)) {
            warn!(%comment_id, %actor_id, "comment mutation by non-author rejected");
            return Err(AppError::Forbidden(
                "Você só pode alterar seus próprios comentários".to_string(),
            ));
        }
        Ok(comment)
    }

    fn invalidate(&self, post_id: Uuid) {
        self.cache.invalidate_comments(post_id);
        self.cache.invalidate_feed();
    }
}

fn comment_not_found(comment_id: Uuid) -> AppError {
    AppError::NotFound(format!("Comment {} not found", comment_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewPost, NewUser};

    struct Fixture {
        service: CommentService,
        cache: Arc<ContentCache>,
        post_id: Uuid,
        author: Uuid,
        other: Uuid,
    }

    async fn user(store: &MemoryStore, name: &str) -> Uuid {
        store
            .create_user(&NewUser {
                name: name.to_string(),
                email: format!("{}@example.com", name),
                password_hash: "x".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let author = user(&store, "ana").await;
        let other = user(&store, "bruno").await;
        let post = store
            .create_post(
                author,
                &NewPost {
                    title: "t".to_string(),
                    content: "c".to_string(),
                },
            )
            .await
            .unwrap();
        let cache = Arc::new(ContentCache::default());
        Fixture {
            service: CommentService::new(store, cache.clone()),
            cache,
            post_id: post.id,
            author,
            other,
        }
    }

    fn text(content: &str, parent_id: Option<Uuid>) -> NewComment {
        NewComment {
            content: content.to_string(),
            parent_id,
        }
    }

    #[tokio::test]
    async fn replies_nest_under_their_parent() {
        let f = fixture().await;
        let root = f
            .service
            .create(f.post_id, f.author, text("raiz", None))
            .await
            .unwrap();
        f.service
            .create(f.post_id, f.other, text("resposta", Some(root.id)))
            .await
            .unwrap();

        let tree = f.service.list_tree(f.post_id).await.unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].comment.content, "resposta");
    }

    #[tokio::test]
    async fn like_invalidates_cached_thread() {
        let f = fixture().await;
        let root = f
            .service
            .create(f.post_id, f.author, text("raiz", None))
            .await
            .unwrap();
        f.service.list(f.post_id).await.unwrap();
        assert!(f.cache.comments.get(&f.post_id).is_some());

        f.service.like(root.id, f.other).await.unwrap();
        assert!(f.cache.comments.get(&f.post_id).is_none());

        let comments = f.service.list(f.post_id).await.unwrap();
        assert_eq!(comments[0].likes, vec![f.other]);
    }

    #[tokio::test]
    async fn only_the_author_may_edit_or_delete() {
        let f = fixture().await;
        let root = f
            .service
            .create(f.post_id, f.author, text("raiz", None))
            .await
            .unwrap();

        let update = CommentUpdate {
            content: "invasão".to_string(),
        };
        let err = f.service.update(root.id, f.other, update).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = f.service.delete(root.id, f.other).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let update = CommentUpdate {
            content: "editado".to_string(),
        };
        f.service.update(root.id, f.author, update).await.unwrap();
        let comments = f.service.list(f.post_id).await.unwrap();
        assert!(comments[0].has_been_edited);
        assert_eq!(comments[0].content, "editado");
    }

    #[tokio::test]
    async fn delete_takes_replies_along() {
        let f = fixture().await;
        let root = f
            .service
            .create(f.post_id, f.author, text("raiz", None))
            .await
            .unwrap();
        f.service
            .create(f.post_id, f.other, text("resposta", Some(root.id)))
            .await
            .unwrap();

        let post_id = f.service.delete(root.id, f.author).await.unwrap();
        assert_eq!(post_id, f.post_id);
        assert!(f.service.list_tree(f.post_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_and_oversized_comments_are_rejected() {
        let f = fixture().await;
        for content in [String::new(), "a".repeat(10_001)] {
            let err = f
                .service
                .create(f.post_id, f.author, text(&content, None))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn unknown_comment_is_not_found() {
        let f = fixture().await;
        assert!(f.service.like(Uuid::new_v4(), f.author).await.unwrap_err().is_not_found());
    }
}
