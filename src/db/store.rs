//! Data-access seam shared by the PostgreSQL and in-memory backends.

use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

use super::models::{
    BlogPostInput, BlogPostWithAuthor, CommentFilter, CommentWithContext, Contact, ContactStatus,
    ListFilter, NewComment, NewContact, NewUser, ProjectInput, ProjectWithAuthor, User,
};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0} already exists")]
    Conflict(&'static str),
    #[error("referenced {0} does not exist")]
    MissingReference(&'static str),
}

/// Every read and write the handlers perform. Listings are newest first.
///
/// Lookups return `Ok(None)` and deletes return `Ok(false)` when the id does
/// not exist, so handlers can answer 404 without inspecting error kinds.
#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name used in health output.
    fn backend(&self) -> &'static str;

    /// Round-trip to the backend, returning its latency.
    async fn ping(&self) -> StoreResult<Duration>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    /// Case-insensitive email lookup.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Fails with `Conflict` when the email is taken.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    async fn list_projects(&self, filter: ListFilter) -> StoreResult<Vec<ProjectWithAuthor>>;
    async fn find_project(&self, id: Uuid) -> StoreResult<Option<ProjectWithAuthor>>;
    async fn insert_project(
        &self,
        author_id: Uuid,
        input: ProjectInput,
    ) -> StoreResult<ProjectWithAuthor>;
    async fn update_project(
        &self,
        id: Uuid,
        input: ProjectInput,
    ) -> StoreResult<Option<ProjectWithAuthor>>;
    async fn delete_project(&self, id: Uuid) -> StoreResult<bool>;

    async fn list_posts(&self, filter: ListFilter) -> StoreResult<Vec<BlogPostWithAuthor>>;
    async fn find_post(&self, id: Uuid) -> StoreResult<Option<BlogPostWithAuthor>>;
    /// Fails with `Conflict` when the slug is taken.
    async fn insert_post(
        &self,
        author_id: Uuid,
        slug: String,
        input: BlogPostInput,
    ) -> StoreResult<BlogPostWithAuthor>;
    async fn update_post(
        &self,
        id: Uuid,
        input: BlogPostInput,
    ) -> StoreResult<Option<BlogPostWithAuthor>>;
    /// Also removes the post's comments.
    async fn delete_post(&self, id: Uuid) -> StoreResult<bool>;

    async fn list_post_comments(
        &self,
        post_id: Uuid,
        filter: CommentFilter,
    ) -> StoreResult<Vec<CommentWithContext>>;
    async fn list_comments(&self, filter: CommentFilter) -> StoreResult<Vec<CommentWithContext>>;
    async fn insert_comment(&self, comment: NewComment) -> StoreResult<CommentWithContext>;
    async fn set_comment_approval(
        &self,
        id: Uuid,
        approved: bool,
    ) -> StoreResult<Option<CommentWithContext>>;
    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool>;

    async fn insert_contact(&self, contact: NewContact) -> StoreResult<Contact>;
    async fn list_contacts(&self) -> StoreResult<Vec<Contact>>;
    async fn set_contact_status(
        &self,
        id: Uuid,
        status: ContactStatus,
    ) -> StoreResult<Option<Contact>>;
    async fn delete_contact(&self, id: Uuid) -> StoreResult<bool>;
}
