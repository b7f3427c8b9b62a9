//! Data models for blog-service
//!
//! - `Post`: feed rows and post detail, keyset cursors
//! - `Comment`: flat comment rows and the nested thread tree
//! - `User`: accounts and the registration schema
pub mod comment;
pub mod post;
pub mod user;

pub use comment::{build_comment_tree, Comment, CommentNode, CommentUpdate, NewComment};
pub use post::{NewPost, PostCursor, PostDetail, PostPage, PostQuery, PostSummary};
pub use user::{LoginRequest, NewUser, RegisterRequest, User, UserRecord};
