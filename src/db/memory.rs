//! In-memory store, used when no DATABASE_URL is configured and by tests.
//!
//! Rows are kept in insertion order; listings walk them newest first.

use async_trait::async_trait;
use chrono::Utc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{
    Author, BlogPost, BlogPostInput, BlogPostWithAuthor, Comment, CommentFilter,
    CommentWithContext, Contact, ContactStatus, ListFilter, NewComment, NewContact, NewUser,
    PostSummary, Project, ProjectInput, ProjectWithAuthor, User,
};
use super::store::{Store, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    projects: Vec<Project>,
    posts: Vec<BlogPost>,
    comments: Vec<Comment>,
    contacts: Vec<Contact>,
}

impl Tables {
    fn author(&self, id: Uuid) -> StoreResult<Author> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(Author::from)
            .ok_or(StoreError::MissingReference("user"))
    }

    fn project_with_author(&self, project: &Project) -> StoreResult<ProjectWithAuthor> {
        Ok(ProjectWithAuthor {
            author: self.author(project.author_id)?,
            project: project.clone(),
        })
    }

    fn post_with_author(&self, post: &BlogPost) -> StoreResult<BlogPostWithAuthor> {
        Ok(BlogPostWithAuthor {
            author: self.author(post.author_id)?,
            post: post.clone(),
        })
    }

    fn comment_with_context(&self, comment: &Comment) -> StoreResult<CommentWithContext> {
        let post = self
            .posts
            .iter()
            .find(|p| p.id == comment.post_id)
            .ok_or(StoreError::MissingReference("blog post"))?;
        Ok(CommentWithContext {
            author: self.author(comment.author_id)?,
            post: PostSummary {
                id: post.id,
                title: post.title.clone(),
                slug: post.slug.clone(),
            },
            comment: comment.clone(),
        })
    }

    fn comments_matching<'a>(
        &'a self,
        post_id: Option<Uuid>,
        filter: CommentFilter,
    ) -> impl Iterator<Item = &'a Comment> + 'a {
        self.comments.iter().rev().filter(move |c| {
            post_id.map_or(true, |id| c.post_id == id)
                && filter.approved().map_or(true, |a| c.approved == a)
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<Duration> {
        let start = Instant::now();
        let _tables = self.tables.read().await;
        Ok(start.elapsed())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        let wanted = email.to_lowercase();
        Ok(tables
            .users
            .iter()
            .find(|u| u.email.to_lowercase() == wanted)
            .cloned())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        let wanted = user.email.to_lowercase();
        if tables.users.iter().any(|u| u.email.to_lowercase() == wanted) {
            return Err(StoreError::Conflict("user"));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            display_name: user.display_name,
            role: user.role,
            avatar: None,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn list_projects(&self, filter: ListFilter) -> StoreResult<Vec<ProjectWithAuthor>> {
        let tables = self.tables.read().await;
        tables
            .projects
            .iter()
            .rev()
            .filter(|p| filter.matches(p.published, p.featured))
            .map(|p| tables.project_with_author(p))
            .collect()
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<ProjectWithAuthor>> {
        let tables = self.tables.read().await;
        tables
            .projects
            .iter()
            .find(|p| p.id == id)
            .map(|p| tables.project_with_author(p))
            .transpose()
    }

    async fn insert_project(
        &self,
        author_id: Uuid,
        input: ProjectInput,
    ) -> StoreResult<ProjectWithAuthor> {
        let mut tables = self.tables.write().await;
        let author = tables.author(author_id)?;
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            content: input.content,
            image: input.image,
            technologies: input.technologies,
            github_url: input.github_url,
            live_url: input.live_url,
            featured: input.featured,
            published: input.published,
            author_id,
            created_at: now,
            updated_at: now,
        };
        tables.projects.push(project.clone());
        Ok(ProjectWithAuthor { project, author })
    }

    async fn update_project(
        &self,
        id: Uuid,
        input: ProjectInput,
    ) -> StoreResult<Option<ProjectWithAuthor>> {
        let mut tables = self.tables.write().await;
        let Some(project) = tables.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        project.title = input.title;
        project.description = input.description;
        project.content = input.content;
        project.image = input.image;
        project.technologies = input.technologies;
        project.github_url = input.github_url;
        project.live_url = input.live_url;
        project.featured = input.featured;
        project.published = input.published;
        project.updated_at = Utc::now();
        let project = project.clone();
        tables.project_with_author(&project).map(Some)
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.projects.len();
        tables.projects.retain(|p| p.id != id);
        Ok(tables.projects.len() < before)
    }

    async fn list_posts(&self, filter: ListFilter) -> StoreResult<Vec<BlogPostWithAuthor>> {
        let tables = self.tables.read().await;
        tables
            .posts
            .iter()
            .rev()
            .filter(|p| filter.matches(p.published, p.featured))
            .map(|p| tables.post_with_author(p))
            .collect()
    }

    async fn find_post(&self, id: Uuid) -> StoreResult<Option<BlogPostWithAuthor>> {
        let tables = self.tables.read().await;
        tables
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|p| tables.post_with_author(p))
            .transpose()
    }

    async fn insert_post(
        &self,
        author_id: Uuid,
        slug: String,
        input: BlogPostInput,
    ) -> StoreResult<BlogPostWithAuthor> {
        let mut tables = self.tables.write().await;
        if tables.posts.iter().any(|p| p.slug == slug) {
            return Err(StoreError::Conflict("slug"));
        }
        let author = tables.author(author_id)?;
        let now = Utc::now();
        let post = BlogPost {
            id: Uuid::new_v4(),
            title: input.title,
            slug,
            content: input.content,
            excerpt: input.excerpt,
            tags: input.tags,
            image: input.image,
            published: input.published,
            featured: input.featured,
            read_time: Some(input.read_time),
            author_id,
            created_at: now,
            updated_at: now,
        };
        tables.posts.push(post.clone());
        Ok(BlogPostWithAuthor { post, author })
    }

    async fn update_post(
        &self,
        id: Uuid,
        input: BlogPostInput,
    ) -> StoreResult<Option<BlogPostWithAuthor>> {
        let mut tables = self.tables.write().await;
        let Some(post) = tables.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.title = input.title;
        post.content = input.content;
        post.excerpt = input.excerpt;
        post.tags = input.tags;
        post.image = input.image;
        post.published = input.published;
        post.featured = input.featured;
        post.read_time = Some(input.read_time);
        post.updated_at = Utc::now();
        let post = post.clone();
        tables.post_with_author(&post).map(Some)
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        if tables.posts.len() == before {
            return Ok(false);
        }
        tables.comments.retain(|c| c.post_id != id);
        Ok(true)
    }

    async fn list_post_comments(
        &self,
        post_id: Uuid,
        filter: CommentFilter,
    ) -> StoreResult<Vec<CommentWithContext>> {
        let tables = self.tables.read().await;
        tables
            .comments_matching(Some(post_id), filter)
            .map(|c| tables.comment_with_context(c))
            .collect()
    }

    async fn list_comments(&self, filter: CommentFilter) -> StoreResult<Vec<CommentWithContext>> {
        let tables = self.tables.read().await;
        tables
            .comments_matching(None, filter)
            .map(|c| tables.comment_with_context(c))
            .collect()
    }

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<CommentWithContext> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(StoreError::MissingReference("blog post"));
        }
        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            content: comment.content,
            approved: comment.approved,
            author_id: comment.author_id,
            post_id: comment.post_id,
            created_at: now,
            updated_at: now,
        };
        let view = tables.comment_with_context(&comment)?;
        tables.comments.push(comment);
        Ok(view)
    }

    async fn set_comment_approval(
        &self,
        id: Uuid,
        approved: bool,
    ) -> StoreResult<Option<CommentWithContext>> {
        let mut tables = self.tables.write().await;
        let Some(comment) = tables.comments.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        comment.approved = approved;
        comment.updated_at = Utc::now();
        let comment = comment.clone();
        tables.comment_with_context(&comment).map(Some)
    }

    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != id);
        Ok(tables.comments.len() < before)
    }

    async fn insert_contact(&self, contact: NewContact) -> StoreResult<Contact> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let contact = Contact {
            id: Uuid::new_v4(),
            name: contact.name,
            email: contact.email,
            subject: contact.subject,
            message: contact.message,
            project_type: contact.project_type,
            status: ContactStatus::Unread,
            created_at: now,
            updated_at: now,
        };
        tables.contacts.push(contact.clone());
        Ok(contact)
    }

    async fn list_contacts(&self) -> StoreResult<Vec<Contact>> {
        let tables = self.tables.read().await;
        Ok(tables.contacts.iter().rev().cloned().collect())
    }

    async fn set_contact_status(
        &self,
        id: Uuid,
        status: ContactStatus,
    ) -> StoreResult<Option<Contact>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .contacts
            .iter_mut()
            .find(|c| c.id == id)
            .map(|contact| {
                contact.status = status;
                contact.updated_at = Utc::now();
                contact.clone()
            }))
    }

    async fn delete_contact(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.contacts.len();
        tables.contacts.retain(|c| c.id != id);
        Ok(tables.contacts.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Role;

    async fn seed_author(store: &MemoryStore) -> User {
        store
            .insert_user(NewUser {
                email: "author@example.com".to_string(),
                password_hash: "hash".to_string(),
                display_name: "Author".to_string(),
                role: Role::Admin,
            })
            .await
            .unwrap()
    }

    fn post_input(title: &str, published: bool) -> BlogPostInput {
        BlogPostInput {
            title: title.to_string(),
            content: "Body".to_string(),
            excerpt: String::new(),
            tags: "[]".to_string(),
            image: None,
            published,
            featured: false,
            read_time: 1,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict_regardless_of_case() {
        let store = MemoryStore::new();
        seed_author(&store).await;
        let result = store
            .insert_user(NewUser {
                email: "AUTHOR@example.com".to_string(),
                password_hash: "hash".to_string(),
                display_name: "Other".to_string(),
                role: Role::User,
            })
            .await;
        assert!(matches!(result, Err(StoreError::Conflict("user"))));
    }

    #[tokio::test]
    async fn test_email_case_folding_covers_non_ascii() {
        let store = MemoryStore::new();
        store
            .insert_user(NewUser {
                email: "zoë@example.com".to_string(),
                password_hash: "hash".to_string(),
                display_name: "Zoë".to_string(),
                role: Role::User,
            })
            .await
            .unwrap();

        let found = store.find_user_by_email("ZOË@EXAMPLE.COM").await.unwrap();
        assert!(found.is_some());

        let result = store
            .insert_user(NewUser {
                email: "ZOË@example.com".to_string(),
                password_hash: "hash".to_string(),
                display_name: "Other".to_string(),
                role: Role::User,
            })
            .await;
        assert!(matches!(result, Err(StoreError::Conflict("user"))));
    }

    #[tokio::test]
    async fn test_posts_list_newest_first_and_filter() {
        let store = MemoryStore::new();
        let author = seed_author(&store).await;
        store
            .insert_post(author.id, "first".to_string(), post_input("First", true))
            .await
            .unwrap();
        store
            .insert_post(author.id, "draft".to_string(), post_input("Draft", false))
            .await
            .unwrap();
        store
            .insert_post(author.id, "third".to_string(), post_input("Third", true))
            .await
            .unwrap();

        let published = store
            .list_posts(ListFilter {
                published: Some(true),
                featured: None,
            })
            .await
            .unwrap();
        let titles: Vec<_> = published.iter().map(|p| p.post.title.as_str()).collect();
        assert_eq!(titles, vec!["Third", "First"]);

        let all = store.list_posts(ListFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_conflict() {
        let store = MemoryStore::new();
        let author = seed_author(&store).await;
        store
            .insert_post(author.id, "same".to_string(), post_input("A", true))
            .await
            .unwrap();
        let result = store
            .insert_post(author.id, "same".to_string(), post_input("B", true))
            .await;
        assert!(matches!(result, Err(StoreError::Conflict("slug"))));
    }

    #[tokio::test]
    async fn test_deleting_post_removes_its_comments() {
        let store = MemoryStore::new();
        let author = seed_author(&store).await;
        let post = store
            .insert_post(author.id, "post".to_string(), post_input("Post", true))
            .await
            .unwrap();
        store
            .insert_comment(NewComment {
                content: "Nice".to_string(),
                approved: true,
                author_id: author.id,
                post_id: post.post.id,
            })
            .await
            .unwrap();

        assert!(store.delete_post(post.post.id).await.unwrap());
        assert!(store
            .list_comments(CommentFilter::All)
            .await
            .unwrap()
            .is_empty());
        assert!(!store.delete_post(post.post.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_comment_on_missing_post_is_rejected() {
        let store = MemoryStore::new();
        let author = seed_author(&store).await;
        let result = store
            .insert_comment(NewComment {
                content: "Orphan".to_string(),
                approved: false,
                author_id: author.id,
                post_id: Uuid::new_v4(),
            })
            .await;
        assert!(matches!(
            result,
            Err(StoreError::MissingReference("blog post"))
        ));
    }

    #[tokio::test]
    async fn test_contact_status_update_on_unknown_id_is_none() {
        let store = MemoryStore::new();
        let updated = store
            .set_contact_status(Uuid::new_v4(), ContactStatus::Read)
            .await
            .unwrap();
        assert!(updated.is_none());
    }
}
