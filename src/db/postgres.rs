//! PostgreSQL-backed store.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::models::{
    Author, BlogPost, BlogPostInput, BlogPostWithAuthor, Comment, CommentFilter,
    CommentWithContext, Contact, ContactStatus, ListFilter, NewComment, NewContact, NewUser,
    PostSummary, Project, ProjectInput, ProjectWithAuthor, User,
};
use super::store::{Store, StoreError, StoreResult};

const USER_COLUMNS: &str = "id, email, password_hash, display_name, role, avatar, created_at";

const PROJECT_COLUMNS: &str = "p.id, p.title, p.description, p.content, p.image, p.technologies, \
     p.github_url, p.live_url, p.featured, p.published, p.author_id, p.created_at, p.updated_at, \
     u.display_name AS author_display_name, u.email AS author_email, u.avatar AS author_avatar";

const POST_COLUMNS: &str = "p.id, p.title, p.slug, p.content, p.excerpt, p.tags, p.image, \
     p.published, p.featured, p.read_time, p.author_id, p.created_at, p.updated_at, \
     u.display_name AS author_display_name, u.email AS author_email, u.avatar AS author_avatar";

const COMMENT_COLUMNS: &str = "c.id, c.content, c.approved, c.author_id, c.post_id, \
     c.created_at, c.updated_at, \
     u.display_name AS author_display_name, u.email AS author_email, u.avatar AS author_avatar, \
     b.title AS post_title, b.slug AS post_slug";

const CONTACT_COLUMNS: &str =
    "id, name, email, subject, message, project_type, status, created_at, updated_at";

#[derive(FromRow)]
struct ProjectRow {
    #[sqlx(flatten)]
    project: Project,
    author_display_name: String,
    author_email: String,
    author_avatar: Option<String>,
}

impl From<ProjectRow> for ProjectWithAuthor {
    fn from(row: ProjectRow) -> Self {
        let author = Author {
            id: row.project.author_id,
            display_name: row.author_display_name,
            email: row.author_email,
            avatar: row.author_avatar,
        };
        Self {
            project: row.project,
            author,
        }
    }
}

#[derive(FromRow)]
struct PostRow {
    #[sqlx(flatten)]
    post: BlogPost,
    author_display_name: String,
    author_email: String,
    author_avatar: Option<String>,
}

impl From<PostRow> for BlogPostWithAuthor {
    fn from(row: PostRow) -> Self {
        let author = Author {
            id: row.post.author_id,
            display_name: row.author_display_name,
            email: row.author_email,
            avatar: row.author_avatar,
        };
        Self {
            post: row.post,
            author,
        }
    }
}

#[derive(FromRow)]
struct CommentRow {
    #[sqlx(flatten)]
    comment: Comment,
    author_display_name: String,
    author_email: String,
    author_avatar: Option<String>,
    post_title: String,
    post_slug: String,
}

impl From<CommentRow> for CommentWithContext {
    fn from(row: CommentRow) -> Self {
        let author = Author {
            id: row.comment.author_id,
            display_name: row.author_display_name,
            email: row.author_email,
            avatar: row.author_avatar,
        };
        let post = PostSummary {
            id: row.comment.post_id,
            title: row.post_title,
            slug: row.post_slug,
        };
        Self {
            comment: row.comment,
            author,
            post,
        }
    }
}

/// Map unique and foreign-key violations onto store errors.
fn classify(err: sqlx::Error, conflict: &'static str, reference: &'static str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(conflict);
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::MissingReference(reference);
        }
    }
    StoreError::Database(err)
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_comment(&self, id: Uuid) -> StoreResult<Option<CommentWithContext>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c \
             JOIN users u ON u.id = c.author_id \
             JOIN blog_posts b ON b.id = c.post_id \
             WHERE c.id = $1"
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<Duration> {
        let start = Instant::now();
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(start.elapsed())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (id, email, password_hash, display_name, role, created_at) \
             VALUES ($1, $2, $3, $4, $5, now()) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.display_name)
            .bind(user.role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, "user", "user"))
    }

    async fn list_projects(&self, filter: ListFilter) -> StoreResult<Vec<ProjectWithAuthor>> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects p \
             JOIN users u ON u.id = p.author_id \
             WHERE ($1::BOOLEAN IS NULL OR p.published = $1) \
               AND ($2::BOOLEAN IS NULL OR p.featured = $2) \
             ORDER BY p.created_at DESC"
        );
        let rows = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(filter.published)
            .bind(filter.featured)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<ProjectWithAuthor>> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects p \
             JOIN users u ON u.id = p.author_id \
             WHERE p.id = $1"
        );
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn insert_project(
        &self,
        author_id: Uuid,
        input: ProjectInput,
    ) -> StoreResult<ProjectWithAuthor> {
        let sql = format!(
            "WITH p AS ( \
                INSERT INTO projects (id, title, description, content, image, technologies, \
                    github_url, live_url, featured, published, author_id, created_at, updated_at) \
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, now(), now()) \
                RETURNING * \
             ) \
             SELECT {PROJECT_COLUMNS} FROM p JOIN users u ON u.id = p.author_id"
        );
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.content)
            .bind(&input.image)
            .bind(&input.technologies)
            .bind(&input.github_url)
            .bind(&input.live_url)
            .bind(input.featured)
            .bind(input.published)
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, "project", "user"))?;
        Ok(row.into())
    }

    async fn update_project(
        &self,
        id: Uuid,
        input: ProjectInput,
    ) -> StoreResult<Option<ProjectWithAuthor>> {
        let sql = format!(
            "WITH p AS ( \
                UPDATE projects SET title = $2, description = $3, content = $4, image = $5, \
                    technologies = $6, github_url = $7, live_url = $8, featured = $9, \
                    published = $10, updated_at = now() \
                WHERE id = $1 \
                RETURNING * \
             ) \
             SELECT {PROJECT_COLUMNS} FROM p JOIN users u ON u.id = p.author_id"
        );
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.content)
            .bind(&input.image)
            .bind(&input.technologies)
            .bind(&input.github_url)
            .bind(&input.live_url)
            .bind(input.featured)
            .bind(input.published)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_posts(&self, filter: ListFilter) -> StoreResult<Vec<BlogPostWithAuthor>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM blog_posts p \
             JOIN users u ON u.id = p.author_id \
             WHERE ($1::BOOLEAN IS NULL OR p.published = $1) \
               AND ($2::BOOLEAN IS NULL OR p.featured = $2) \
             ORDER BY p.created_at DESC"
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(filter.published)
            .bind(filter.featured)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_post(&self, id: Uuid) -> StoreResult<Option<BlogPostWithAuthor>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM blog_posts p \
             JOIN users u ON u.id = p.author_id \
             WHERE p.id = $1"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn insert_post(
        &self,
        author_id: Uuid,
        slug: String,
        input: BlogPostInput,
    ) -> StoreResult<BlogPostWithAuthor> {
        let sql = format!(
            "WITH p AS ( \
                INSERT INTO blog_posts (id, title, slug, content, excerpt, tags, image, \
                    published, featured, read_time, author_id, created_at, updated_at) \
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, now(), now()) \
                RETURNING * \
             ) \
             SELECT {POST_COLUMNS} FROM p JOIN users u ON u.id = p.author_id"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.title)
            .bind(&slug)
            .bind(&input.content)
            .bind(&input.excerpt)
            .bind(&input.tags)
            .bind(&input.image)
            .bind(input.published)
            .bind(input.featured)
            .bind(input.read_time)
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, "slug", "user"))?;
        Ok(row.into())
    }

    async fn update_post(
        &self,
        id: Uuid,
        input: BlogPostInput,
    ) -> StoreResult<Option<BlogPostWithAuthor>> {
        let sql = format!(
            "WITH p AS ( \
                UPDATE blog_posts SET title = $2, content = $3, excerpt = $4, tags = $5, \
                    image = $6, published = $7, featured = $8, read_time = $9, \
                    updated_at = now() \
                WHERE id = $1 \
                RETURNING * \
             ) \
             SELECT {POST_COLUMNS} FROM p JOIN users u ON u.id = p.author_id"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(&input.excerpt)
            .bind(&input.tags)
            .bind(&input.image)
            .bind(input.published)
            .bind(input.featured)
            .bind(input.read_time)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<bool> {
        // comments go with the post through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_post_comments(
        &self,
        post_id: Uuid,
        filter: CommentFilter,
    ) -> StoreResult<Vec<CommentWithContext>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c \
             JOIN users u ON u.id = c.author_id \
             JOIN blog_posts b ON b.id = c.post_id \
             WHERE c.post_id = $1 AND ($2::BOOLEAN IS NULL OR c.approved = $2) \
             ORDER BY c.created_at DESC"
        );
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(post_id)
            .bind(filter.approved())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_comments(&self, filter: CommentFilter) -> StoreResult<Vec<CommentWithContext>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c \
             JOIN users u ON u.id = c.author_id \
             JOIN blog_posts b ON b.id = c.post_id \
             WHERE ($1::BOOLEAN IS NULL OR c.approved = $1) \
             ORDER BY c.created_at DESC"
        );
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(filter.approved())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<CommentWithContext> {
        let sql = format!(
            "WITH c AS ( \
                INSERT INTO comments (id, content, approved, author_id, post_id, created_at, updated_at) \
                VALUES ($1, $2, $3, $4, $5, now(), now()) \
                RETURNING * \
             ) \
             SELECT {COMMENT_COLUMNS} FROM c \
             JOIN users u ON u.id = c.author_id \
             JOIN blog_posts b ON b.id = c.post_id"
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&comment.content)
            .bind(comment.approved)
            .bind(comment.author_id)
            .bind(comment.post_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, "comment", "blog post"))?;
        Ok(row.into())
    }

    async fn set_comment_approval(
        &self,
        id: Uuid,
        approved: bool,
    ) -> StoreResult<Option<CommentWithContext>> {
        let result =
            sqlx::query("UPDATE comments SET approved = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(approved)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_comment(id).await
    }

    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_contact(&self, contact: NewContact) -> StoreResult<Contact> {
        let sql = format!(
            "INSERT INTO contacts (id, name, email, subject, message, project_type, status, \
                created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, now(), now()) \
             RETURNING {CONTACT_COLUMNS}"
        );
        let contact = sqlx::query_as::<_, Contact>(&sql)
            .bind(Uuid::new_v4())
            .bind(&contact.name)
            .bind(&contact.email)
            .bind(&contact.subject)
            .bind(&contact.message)
            .bind(&contact.project_type)
            .bind(ContactStatus::Unread.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(contact)
    }

    async fn list_contacts(&self) -> StoreResult<Vec<Contact>> {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY created_at DESC");
        let contacts = sqlx::query_as::<_, Contact>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(contacts)
    }

    async fn set_contact_status(
        &self,
        id: Uuid,
        status: ContactStatus,
    ) -> StoreResult<Option<Contact>> {
        let sql = format!(
            "UPDATE contacts SET status = $2, updated_at = now() WHERE id = $1 \
             RETURNING {CONTACT_COLUMNS}"
        );
        let contact = sqlx::query_as::<_, Contact>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(contact)
    }

    async fn delete_contact(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
