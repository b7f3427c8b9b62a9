use super::{BlogStore, EMAIL_TAKEN, INVALID_PARENT, NAME_TAKEN};
use crate::error::{AppError, Result};
use crate::models::post::paginate;
use crate::models::{
    Comment, NewComment, NewPost, NewUser, PostDetail, PostPage, PostQuery, PostSummary, User,
    UserRecord,
};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

const POST_SUMMARY_COLUMNS: &str = r#"
    p.id, p.title, p.author_id, u.name AS author_name, p.score,
    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count,
    p.created_at
"#;

const COMMENT_COLUMNS: &str = r#"
    c.id, c.post_id, c.parent_id, c.content, c.author_id, u.name AS author_name,
    c.has_been_edited, c.created_at
"#;

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn comment_likes(&self, comment_id: Uuid) -> Result<Vec<Uuid>> {
        let likes = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM comment_likes WHERE comment_id = $1 ORDER BY created_at",
        )
        .bind(comment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(likes)
    }

    async fn post_exists(&self, post_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn comment_exists(&self, comment_id: Uuid) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM comments WHERE id = $1)")
                .bind(comment_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

fn map_user_conflict(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let message = match db_err.constraint() {
                Some("users_name_key") => NAME_TAKEN,
                _ => EMAIL_TAKEN,
            };
            return AppError::Conflict(message.to_string());
        }
    }
    AppError::from(err)
}

#[async_trait::async_trait]
impl BlogStore for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<PostPage> {
        let cursor = query.cursor.as_ref();
        let rows = if query.recents {
            let sql = format!(
                r#"
                SELECT {POST_SUMMARY_COLUMNS}
                FROM posts p
                JOIN users u ON u.id = p.author_id
                WHERE ($1::TIMESTAMPTZ IS NULL OR (p.created_at, p.id) < ($1, $2::UUID))
                ORDER BY p.created_at DESC, p.id DESC
                LIMIT $3
                "#
            );
            sqlx::query_as::<_, PostSummary>(&sql)
                .bind(cursor.map(|c| c.created_at))
                .bind(cursor.map(|c| c.id))
                .bind(query.limit + 1)
                .fetch_all(&self.pool)
                .await?
        } else {
            let sql = format!(
                r#"
                SELECT {POST_SUMMARY_COLUMNS}
                FROM posts p
                JOIN users u ON u.id = p.author_id
                WHERE ($1::BIGINT IS NULL
                       OR (p.score, p.created_at, p.id) < ($1, $2::TIMESTAMPTZ, $3::UUID))
                ORDER BY p.score DESC, p.created_at DESC, p.id DESC
                LIMIT $4
                "#
            );
            sqlx::query_as::<_, PostSummary>(&sql)
                .bind(cursor.map(|c| c.score))
                .bind(cursor.map(|c| c.created_at))
                .bind(cursor.map(|c| c.id))
                .bind(query.limit + 1)
                .fetch_all(&self.pool)
                .await?
        };

        Ok(paginate(rows, query.limit))
    }

    async fn list_posts_by_author(&self, author_id: Uuid, limit: i64) -> Result<Vec<PostSummary>> {
        let sql = format!(
            r#"
            SELECT {POST_SUMMARY_COLUMNS}
            FROM posts p
            JOIN users u ON u.id = p.author_id
            WHERE p.author_id = $1
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $2
            "#
        );
        let posts = sqlx::query_as::<_, PostSummary>(&sql)
            .bind(author_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    async fn get_post(&self, post_id: Uuid) -> Result<Option<PostDetail>> {
        let post = sqlx::query_as::<_, PostDetail>(
            r#"
            SELECT p.id, p.title, p.content, p.author_id, u.name AS author_name, p.score,
                   (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count,
                   p.created_at
            FROM posts p
            JOIN users u ON u.id = p.author_id
            WHERE p.id = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn create_post(&self, author_id: Uuid, post: &NewPost) -> Result<PostDetail> {
        let created = sqlx::query_as::<_, PostDetail>(
            r#"
            WITH inserted AS (
                INSERT INTO posts (id, author_id, title, content)
                VALUES ($1, $2, $3, $4)
                RETURNING id, title, content, author_id, score, created_at
            )
            SELECT i.id, i.title, i.content, i.author_id, u.name AS author_name, i.score,
                   0::BIGINT AS comment_count, i.created_at
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(author_id)
        .bind(&post.title)
        .bind(&post.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn add_post_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
            .bind(post_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(AppError::NotFound(format!("post {}", post_id)));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO post_likes (post_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (post_id, user_id) DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        if inserted {
            sqlx::query("UPDATE posts SET score = score + 1 WHERE id = $1")
                .bind(post_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn remove_post_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if removed {
            sqlx::query("UPDATE posts SET score = GREATEST(score - 1, 0) WHERE id = $1")
                .bind(post_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(removed)
    }

    async fn has_liked_post(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let liked: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM post_likes WHERE post_id = $1 AND user_id = $2)",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(liked)
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        let sql = format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            "#
        );
        let mut comments = sqlx::query_as::<_, Comment>(&sql)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?;

        let likes = sqlx::query_as::<_, (Uuid, Uuid)>(
            r#"
            SELECT cl.comment_id, cl.user_id
            FROM comment_likes cl
            JOIN comments c ON c.id = cl.comment_id
            WHERE c.post_id = $1
            ORDER BY cl.created_at
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_comment: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for (comment_id, user_id) in likes {
            by_comment.entry(comment_id).or_default().push(user_id);
        }
        for comment in &mut comments {
            comment.likes = by_comment.remove(&comment.id).unwrap_or_default();
        }

        Ok(comments)
    }

    async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        let sql = format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.id = $1
            "#
        );
        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?;

        match comment {
            Some(mut comment) => {
                comment.likes = self.comment_likes(comment.id).await?;
                Ok(Some(comment))
            }
            None => Ok(None),
        }
    }

    async fn create_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        comment: &NewComment,
    ) -> Result<Comment> {
        if !self.post_exists(post_id).await? {
            return Err(AppError::NotFound(format!("post {}", post_id)));
        }

        if let Some(parent_id) = comment.parent_id {
            let parent_post: Option<Uuid> =
                sqlx::query_scalar("SELECT post_id FROM comments WHERE id = $1")
                    .bind(parent_id)
                    .fetch_optional(&self.pool)
                    .await?;
            if parent_post != Some(post_id) {
                return Err(AppError::BadRequest(INVALID_PARENT.to_string()));
            }
        }

        let created = sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (id, post_id, parent_id, author_id, content)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, post_id, parent_id, content, author_id, has_been_edited, created_at
            )
            SELECT i.id, i.post_id, i.parent_id, i.content, i.author_id, u.name AS author_name,
                   i.has_been_edited, i.created_at
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(comment.parent_id)
        .bind(author_id)
        .bind(&comment.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update_comment(
        &self,
        comment_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<Option<Comment>> {
        let updated = sqlx::query_as::<_, Comment>(
            r#"
            WITH updated AS (
                UPDATE comments
                SET content = $3, has_been_edited = TRUE, updated_at = NOW()
                WHERE id = $1 AND author_id = $2
                RETURNING id, post_id, parent_id, content, author_id, has_been_edited, created_at
            )
            SELECT d.id, d.post_id, d.parent_id, d.content, d.author_id, u.name AS author_name,
                   d.has_been_edited, d.created_at
            FROM updated d
            JOIN users u ON u.id = d.author_id
            "#,
        )
        .bind(comment_id)
        .bind(author_id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(mut comment) => {
                comment.likes = self.comment_likes(comment.id).await?;
                Ok(Some(comment))
            }
            None => Ok(None),
        }
    }

    async fn delete_comment(&self, comment_id: Uuid, author_id: Uuid) -> Result<Option<Uuid>> {
        let post_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            DELETE FROM comments
            WHERE id = $1 AND author_id = $2
            RETURNING post_id
            "#,
        )
        .bind(comment_id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post_id)
    }

    async fn add_comment_like(&self, comment_id: Uuid, user_id: Uuid) -> Result<bool> {
        if !self.comment_exists(comment_id).await? {
            return Err(AppError::NotFound(format!("comment {}", comment_id)));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO comment_likes (comment_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (comment_id, user_id) DO NOTHING
            "#,
        )
        .bind(comment_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected()
            > 0;

        Ok(inserted)
    }

    async fn remove_comment_like(&self, comment_id: Uuid, user_id: Uuid) -> Result<bool> {
        let removed =
            sqlx::query("DELETE FROM comment_likes WHERE comment_id = $1 AND user_id = $2")
                .bind(comment_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?
                .rows_affected()
                > 0;

        Ok(removed)
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_user_conflict)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, name, created_at FROM users WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}
