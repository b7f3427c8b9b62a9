/// Storage layer for blog-service
///
/// [`BlogStore`] is the seam between services and persistence. `PgStore`
/// backs it with PostgreSQL; `MemoryStore` keeps everything in process and
/// is selected with a `memory://` database URL.
pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::Result;
use crate::models::{
    Comment, NewComment, NewPost, NewUser, PostDetail, PostPage, PostQuery, PostSummary, User,
    UserRecord,
};
use uuid::Uuid;

/// Shown when registration hits the unique email constraint
pub const EMAIL_TAKEN: &str = "Email já cadastrado";
/// Shown when registration hits the unique name constraint
pub const NAME_TAKEN: &str = "Nome de usuário já está em uso";
/// Reply whose parent is missing or belongs to another post
pub const INVALID_PARENT: &str = "Comentário pai não encontrado neste post";

#[async_trait::async_trait]
pub trait BlogStore: Send + Sync {
    /// Cheap round trip used by the readiness probe
    async fn ping(&self) -> Result<()>;

    /// One feed page, over-fetching a row to decide `next_cursor`
    async fn list_posts(&self, query: &PostQuery) -> Result<PostPage>;

    /// Newest posts of one author
    async fn list_posts_by_author(&self, author_id: Uuid, limit: i64) -> Result<Vec<PostSummary>>;

    async fn get_post(&self, post_id: Uuid) -> Result<Option<PostDetail>>;

    async fn create_post(&self, author_id: Uuid, post: &NewPost) -> Result<PostDetail>;

    /// Returns false when the like already existed
    async fn add_post_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool>;

    /// Returns false when there was no like to remove
    async fn remove_post_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool>;

    async fn has_liked_post(&self, post_id: Uuid, user_id: Uuid) -> Result<bool>;

    /// All comments of a post, flat, oldest first, likes attached
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>>;

    async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>>;

    /// Fails with `NotFound` for an unknown post and `BadRequest` for a
    /// parent outside the post
    async fn create_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        comment: &NewComment,
    ) -> Result<Comment>;

    /// Only the author's own comment is updated; `None` otherwise
    async fn update_comment(
        &self,
        comment_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<Option<Comment>>;

    /// Deletes the comment and its replies; returns the post id when a row
    /// owned by `author_id` was deleted
    async fn delete_comment(&self, comment_id: Uuid, author_id: Uuid) -> Result<Option<Uuid>>;

    async fn add_comment_like(&self, comment_id: Uuid, user_id: Uuid) -> Result<bool>;

    async fn remove_comment_like(&self, comment_id: Uuid, user_id: Uuid) -> Result<bool>;

    /// Fails with `Conflict` on a duplicate email or name
    async fn create_user(&self, user: &NewUser) -> Result<User>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>>;
}
