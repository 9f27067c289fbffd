/// PostgreSQL-backed store
///
/// Usernames are joined in on read so handlers can render authors by name.
/// The post cascade runs in one transaction; the schema's `ON DELETE CASCADE`
/// is a second line, not the mechanism.
use super::{ContentStore, CredentialStore};
use crate::error::{AppError, Result};
use crate::models::{
    Actor, Comment, CommentChanges, Group, NewGroup, NewPost, Post, PostChanges, UserLogin,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: i64,
    title: String,
    slug: String,
    description: String,
}

impl From<GroupRow> for Group {
    fn from(row: GroupRow) -> Self {
        Group {
            id: row.id,
            title: row.title,
            slug: row.slug,
            description: row.description,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    text: String,
    pub_date: DateTime<Utc>,
    author_id: i64,
    author_username: String,
    group_id: Option<i64>,
    image: Option<String>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            text: row.text,
            pub_date: row.pub_date,
            author: Actor {
                id: row.author_id,
                username: row.author_username,
            },
            group_id: row.group_id,
            image: row.image,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    text: String,
    created: DateTime<Utc>,
    author_id: i64,
    author_username: String,
    post_id: i64,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            text: row.text,
            author: Actor {
                id: row.author_id,
                username: row.author_username,
            },
            post_id: row.post_id,
            created: row.created,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LoginRow {
    id: i64,
    username: String,
    password_hash: String,
}

const SELECT_POSTS: &str = r#"
    SELECT p.id, p.text, p.pub_date, p.author_id, u.username AS author_username,
           p.group_id, p.image
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

const SELECT_COMMENTS: &str = r#"
    SELECT c.id, c.text, c.created, c.author_id, u.username AS author_username, c.post_id
    FROM comments c
    JOIN users u ON u.id = c.author_id
"#;

fn violates(err: &sqlx::Error, code: &str) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .map(|c| c == code)
        .unwrap_or(false)
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("migration failed: {}", e)))
    }

    async fn fetch_post(&self, post_id: i64) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!("{SELECT_POSTS} WHERE p.id = $1"))
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Post::from))
    }

    async fn fetch_comment(&self, comment_id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query_as::<_, CommentRow>(&format!("{SELECT_COMMENTS} WHERE c.id = $1"))
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Comment::from))
    }
}

fn invalid_group(group_id: Option<i64>) -> AppError {
    AppError::Validation(format!(
        "group: Invalid pk \"{}\" - object does not exist.",
        group_id.unwrap_or_default()
    ))
}

#[async_trait]
impl ContentStore for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let rows = sqlx::query_as::<_, GroupRow>(
            "SELECT id, title, slug, description FROM groups ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Group::from).collect())
    }

    async fn get_group(&self, group_id: i64) -> Result<Option<Group>> {
        let row = sqlx::query_as::<_, GroupRow>(
            "SELECT id, title, slug, description FROM groups WHERE id = $1",
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Group::from))
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let row = sqlx::query_as::<_, GroupRow>(
            r#"
            INSERT INTO groups (title, slug, description)
            VALUES ($1, $2, $3)
            RETURNING id, title, slug, description
            "#,
        )
        .bind(&group.title)
        .bind(&group.slug)
        .bind(&group.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, UNIQUE_VIOLATION) {
                AppError::Conflict(format!("group with slug '{}' already exists", group.slug))
            } else {
                e.into()
            }
        })?;
        Ok(row.into())
    }

    async fn list_posts(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!("{SELECT_POSTS} ORDER BY p.id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn get_post(&self, post_id: i64) -> Result<Option<Post>> {
        self.fetch_post(post_id).await
    }

    async fn insert_post(&self, author: &Actor, post: NewPost) -> Result<Post> {
        let (id, pub_date) = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            r#"
            INSERT INTO posts (text, author_id, group_id, image)
            VALUES ($1, $2, $3, $4)
            RETURNING id, pub_date
            "#,
        )
        .bind(&post.text)
        .bind(author.id)
        .bind(post.group_id)
        .bind(&post.image)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, FOREIGN_KEY_VIOLATION) {
                invalid_group(post.group_id)
            } else {
                e.into()
            }
        })?;

        Ok(Post {
            id,
            text: post.text,
            pub_date,
            author: author.clone(),
            group_id: post.group_id,
            image: post.image,
        })
    }

    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Option<Post>> {
        let group_id = changes.group_id.flatten();
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET text = COALESCE($2, text),
                group_id = CASE WHEN $3 THEN $4 ELSE group_id END,
                image = CASE WHEN $5 THEN $6 ELSE image END
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .bind(&changes.text)
        .bind(changes.group_id.is_some())
        .bind(group_id)
        .bind(changes.image.is_some())
        .bind(changes.image.flatten())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, FOREIGN_KEY_VIOLATION) {
                invalid_group(group_id)
            } else {
                e.into()
            }
        })?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_post(post_id).await
    }

    async fn delete_post_cascade(&self, post_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let comments = sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        let posts = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            post_id,
            comments_removed = comments.rows_affected(),
            "post cascade delete committed"
        );
        Ok(posts.rows_affected() > 0)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "{SELECT_COMMENTS} WHERE c.post_id = $1 ORDER BY c.id"
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn get_comment(&self, comment_id: i64) -> Result<Option<Comment>> {
        self.fetch_comment(comment_id).await
    }

    async fn insert_comment(&self, author: &Actor, post_id: i64, text: String) -> Result<Comment> {
        let (id, created) = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            r#"
            INSERT INTO comments (text, author_id, post_id)
            VALUES ($1, $2, $3)
            RETURNING id, created
            "#,
        )
        .bind(&text)
        .bind(author.id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, FOREIGN_KEY_VIOLATION) {
                AppError::NotFound
            } else {
                e.into()
            }
        })?;

        Ok(Comment {
            id,
            text,
            author: author.clone(),
            post_id,
            created,
        })
    }

    async fn update_comment(
        &self,
        comment_id: i64,
        changes: CommentChanges,
    ) -> Result<Option<Comment>> {
        let result = sqlx::query("UPDATE comments SET text = COALESCE($2, text) WHERE id = $1")
            .bind(comment_id)
            .bind(&changes.text)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_comment(comment_id).await
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn actor_for_token(&self, digest: &str) -> Result<Option<Actor>> {
        let row = sqlx::query_as::<_, (i64, String)>(
            r#"
            SELECT u.id, u.username
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.digest = $1
            "#,
        )
        .bind(digest)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id, username)| Actor { id, username }))
    }

    async fn find_login(&self, username: &str) -> Result<Option<UserLogin>> {
        let row = sqlx::query_as::<_, LoginRow>(
            "SELECT id, username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| UserLogin {
            actor: Actor {
                id: row.id,
                username: row.username,
            },
            password_hash: row.password_hash,
        }))
    }

    async fn store_token(&self, user_id: i64, digest: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_tokens (digest, user_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id)
            DO UPDATE SET digest = EXCLUDED.digest, created_at = NOW()
            "#,
        )
        .bind(digest)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, FOREIGN_KEY_VIOLATION) {
                AppError::NotFound
            } else {
                e.into()
            }
        })?;
        Ok(())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<Actor> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING id",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, UNIQUE_VIOLATION) {
                AppError::Conflict(format!("user '{}' already exists", username))
            } else {
                e.into()
            }
        })?;

        Ok(Actor {
            id,
            username: username.to_string(),
        })
    }
}
