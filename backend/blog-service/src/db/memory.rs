use super::{BlogStore, EMAIL_TAKEN, INVALID_PARENT, NAME_TAKEN};
use crate::error::{AppError, Result};
use crate::models::post::paginate;
use crate::models::{
    Comment, NewComment, NewPost, NewUser, PostDetail, PostPage, PostQuery, PostSummary, User,
    UserRecord,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct PostRow {
    id: Uuid,
    author_id: Uuid,
    title: String,
    content: String,
    score: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    parent_id: Option<Uuid>,
    author_id: Uuid,
    content: String,
    has_been_edited: bool,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserRecord>,
    posts: HashMap<Uuid, PostRow>,
    post_likes: HashSet<(Uuid, Uuid)>,
    /// Insertion order is creation order
    comments: Vec<CommentRow>,
    /// (comment_id, user_id), in like order
    comment_likes: Vec<(Uuid, Uuid)>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Tables {
    /// Wall clock, nudged forward so rows created in a burst still sort by
    /// creation
    fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        now
    }

    fn author_name(&self, user_id: Uuid) -> String {
        self.users
            .get(&user_id)
            .map(|u| u.name.clone())
            .unwrap_or_default()
    }

    fn comment_count(&self, post_id: Uuid) -> i64 {
        self.comments.iter().filter(|c| c.post_id == post_id).count() as i64
    }

    fn summary(&self, post: &PostRow) -> PostSummary {
        PostSummary {
            id: post.id,
            title: post.title.clone(),
            author_id: post.author_id,
            author_name: self.author_name(post.author_id),
            score: post.score,
            comment_count: self.comment_count(post.id),
            created_at: post.created_at,
        }
    }

    fn detail(&self, post: &PostRow) -> PostDetail {
        PostDetail {
            id: post.id,
            title: post.title.clone(),
            content: post.content.clone(),
            author_id: post.author_id,
            author_name: self.author_name(post.author_id),
            score: post.score,
            comment_count: self.comment_count(post.id),
            created_at: post.created_at,
        }
    }

    fn comment(&self, row: &CommentRow) -> Comment {
        Comment {
            id: row.id,
            post_id: row.post_id,
            parent_id: row.parent_id,
            content: row.content.clone(),
            author_id: row.author_id,
            author_name: self.author_name(row.author_id),
            has_been_edited: row.has_been_edited,
            created_at: row.created_at,
            likes: self
                .comment_likes
                .iter()
                .filter(|(comment_id, _)| *comment_id == row.id)
                .map(|(_, user_id)| *user_id)
                .collect(),
        }
    }

    /// The comment and every reply below it
    fn subtree(&self, root: Uuid) -> HashSet<Uuid> {
        let mut ids = HashSet::from([root]);
        let mut frontier = vec![root];
        while let Some(parent) = frontier.pop() {
            for row in &self.comments {
                if row.parent_id == Some(parent) && ids.insert(row.id) {
                    frontier.push(row.id);
                }
            }
        }
        ids
    }
}

/// In-process store for local development and tests
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl BlogStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<PostPage> {
        let tables = self.tables.read().await;
        let mut rows: Vec<PostSummary> = tables.posts.values().map(|p| tables.summary(p)).collect();

        if query.recents {
            rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        } else {
            rows.sort_by(|a, b| {
                (b.score, b.created_at, b.id).cmp(&(a.score, a.created_at, a.id))
            });
        }

        let rows = rows
            .into_iter()
            .filter(|post| {
                query
                    .cursor
                    .as_ref()
                    .map_or(true, |cursor| cursor.precedes(post, query.recents))
            })
            .take(query.limit.max(0) as usize + 1)
            .collect();

        Ok(paginate(rows, query.limit))
    }

    async fn list_posts_by_author(&self, author_id: Uuid, limit: i64) -> Result<Vec<PostSummary>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<PostSummary> = tables
            .posts
            .values()
            .filter(|p| p.author_id == author_id)
            .map(|p| tables.summary(p))
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn get_post(&self, post_id: Uuid) -> Result<Option<PostDetail>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&post_id).map(|p| tables.detail(p)))
    }

    async fn create_post(&self, author_id: Uuid, post: &NewPost) -> Result<PostDetail> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&author_id) {
            return Err(AppError::NotFound(format!("user {}", author_id)));
        }

        let row = PostRow {
            id: Uuid::new_v4(),
            author_id,
            title: post.title.clone(),
            content: post.content.clone(),
            score: 0,
            created_at: tables.now(),
        };
        let detail = tables.detail(&row);
        tables.posts.insert(row.id, row);
        Ok(detail)
    }

    async fn add_post_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post_id) {
            return Err(AppError::NotFound(format!("post {}", post_id)));
        }

        let inserted = tables.post_likes.insert((post_id, user_id));
        if inserted {
            if let Some(post) = tables.posts.get_mut(&post_id) {
                post.score += 1;
            }
        }
        Ok(inserted)
    }

    async fn remove_post_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.post_likes.remove(&(post_id, user_id));
        if removed {
            if let Some(post) = tables.posts.get_mut(&post_id) {
                post.score = (post.score - 1).max(0);
            }
        }
        Ok(removed)
    }

    async fn has_liked_post(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.post_likes.contains(&(post_id, user_id)))
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| tables.comment(c))
            .collect())
    }

    async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .iter()
            .find(|c| c.id == comment_id)
            .map(|c| tables.comment(c)))
    }

    async fn create_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        comment: &NewComment,
    ) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post_id) {
            return Err(AppError::NotFound(format!("post {}", post_id)));
        }
        if let Some(parent_id) = comment.parent_id {
            let parent_in_post = tables
                .comments
                .iter()
                .any(|c| c.id == parent_id && c.post_id == post_id);
            if !parent_in_post {
                return Err(AppError::BadRequest(INVALID_PARENT.to_string()));
            }
        }

        let row = CommentRow {
            id: Uuid::new_v4(),
            post_id,
            parent_id: comment.parent_id,
            author_id,
            content: comment.content.clone(),
            has_been_edited: false,
            created_at: tables.now(),
        };
        let created = tables.comment(&row);
        tables.comments.push(row);
        Ok(created)
    }

    async fn update_comment(
        &self,
        comment_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<Option<Comment>> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables
            .comments
            .iter_mut()
            .find(|c| c.id == comment_id && c.author_id == author_id)
        else {
            return Ok(None);
        };

        row.content = content.to_string();
        row.has_been_edited = true;
        let row = row.clone();
        Ok(Some(tables.comment(&row)))
    }

    async fn delete_comment(&self, comment_id: Uuid, author_id: Uuid) -> Result<Option<Uuid>> {
        let mut tables = self.tables.write().await;
        let Some(post_id) = tables
            .comments
            .iter()
            .find(|c| c.id == comment_id && c.author_id == author_id)
            .map(|c| c.post_id)
        else {
            return Ok(None);
        };

        let doomed = tables.subtree(comment_id);
        tables.comments.retain(|c| !doomed.contains(&c.id));
        tables
            .comment_likes
            .retain(|(comment_id, _)| !doomed.contains(comment_id));
        Ok(Some(post_id))
    }

    async fn add_comment_like(&self, comment_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if !tables.comments.iter().any(|c| c.id == comment_id) {
            return Err(AppError::NotFound(format!("comment {}", comment_id)));
        }
        if tables.comment_likes.contains(&(comment_id, user_id)) {
            return Ok(false);
        }
        tables.comment_likes.push((comment_id, user_id));
        Ok(true)
    }

    async fn remove_comment_like(&self, comment_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.comment_likes.len();
        tables
            .comment_likes
            .retain(|like| *like != (comment_id, user_id));
        Ok(tables.comment_likes.len() < before)
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
        }
        if tables.users.values().any(|u| u.name == user.name) {
            return Err(AppError::Conflict(NAME_TAKEN.to_string()));
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: tables.now(),
        };
        let created = record.user();
        tables.users.insert(record.id, record);
        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.name == name)
            .map(|u| u.user()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostCursor;

    async fn seed_user(store: &MemoryStore, name: &str) -> User {
        store
            .create_user(&NewUser {
                name: name.to_string(),
                email: format!("{}@example.com", name),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
    }

    async fn seed_post(store: &MemoryStore, author: Uuid, title: &str) -> PostDetail {
        store
            .create_post(
                author,
                &NewPost {
                    title: title.to_string(),
                    content: "body".to_string(),
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn pages_walk_the_whole_feed_without_overlap() {
        let store = MemoryStore::new();
        let ana = seed_user(&store, "ana").await;
        for i in 0..7 {
            seed_post(&store, ana.id, &format!("post {}", i)).await;
        }

        let mut seen = HashSet::new();
        let mut cursor = None;
        let mut pages = 0;
        loop {
            let page = store
                .list_posts(&PostQuery {
                    limit: 3,
                    recents: true,
                    cursor,
                })
                .await
                .unwrap();
            pages += 1;
            for item in &page.items {
                assert!(seen.insert(item.id), "post served twice");
            }
            match page.next_cursor {
                Some(raw) => cursor = Some(PostCursor::decode(&raw).unwrap()),
                None => break,
            }
        }

        assert_eq!(pages, 3);
        assert_eq!(seen.len(), 7);
    }

    #[tokio::test]
    async fn liked_posts_rank_first_by_default() {
        let store = MemoryStore::new();
        let ana = seed_user(&store, "ana").await;
        let first = seed_post(&store, ana.id, "first").await;
        let _second = seed_post(&store, ana.id, "second").await;
        assert!(store.add_post_like(first.id, ana.id).await.unwrap());
        assert!(!store.add_post_like(first.id, ana.id).await.unwrap());

        let page = store
            .list_posts(&PostQuery {
                limit: 15,
                recents: false,
                cursor: None,
            })
            .await
            .unwrap();
        assert_eq!(page.items[0].id, first.id);
        assert_eq!(page.items[0].score, 1);
    }

    #[tokio::test]
    async fn deleting_a_comment_removes_its_replies() {
        let store = MemoryStore::new();
        let ana = seed_user(&store, "ana").await;
        let post = seed_post(&store, ana.id, "thread").await;
        let root = store
            .create_comment(
                post.id,
                ana.id,
                &NewComment {
                    content: "root".to_string(),
                    parent_id: None,
                },
            )
            .await
            .unwrap();
        store
            .create_comment(
                post.id,
                ana.id,
                &NewComment {
                    content: "reply".to_string(),
                    parent_id: Some(root.id),
                },
            )
            .await
            .unwrap();

        assert_eq!(store.delete_comment(root.id, ana.id).await.unwrap(), Some(post.id));
        assert!(store.list_comments(post.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reply_parent_must_be_in_the_same_post() {
        let store = MemoryStore::new();
        let ana = seed_user(&store, "ana").await;
        let a = seed_post(&store, ana.id, "a").await;
        let b = seed_post(&store, ana.id, "b").await;
        let in_a = store
            .create_comment(
                a.id,
                ana.id,
                &NewComment {
                    content: "hi".to_string(),
                    parent_id: None,
                },
            )
            .await
            .unwrap();

        let err = store
            .create_comment(
                b.id,
                ana.id,
                &NewComment {
                    content: "cross-post reply".to_string(),
                    parent_id: Some(in_a.id),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        seed_user(&store, "ana").await;
        let err = store
            .create_user(&NewUser {
                name: "other".to_string(),
                email: "ana@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.message(), EMAIL_TAKEN);
    }
}
