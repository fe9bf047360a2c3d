//! Database Models - structs representing database tables (used by sqlx/serde).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unknown value read from an enum-like text column.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(UnknownVariant {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Contact submission status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContactStatus {
    Unread,
    Read,
    Replied,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Unread => "UNREAD",
            ContactStatus::Read => "READ",
            ContactStatus::Replied => "REPLIED",
        }
    }
}

impl FromStr for ContactStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNREAD" => Ok(ContactStatus::Unread),
            "READ" => Ok(ContactStatus::Read),
            "REPLIED" => Ok(ContactStatus::Replied),
            other => Err(UnknownVariant {
                kind: "contact status",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ContactStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// User model
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// New user for insertion
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub role: Role,
}

/// Public author details joined onto projects, posts and comments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
    pub avatar: Option<String>,
}

impl From<&User> for Author {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

/// Project model. `technologies` holds the raw stored text.
#[derive(Debug, Clone, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    pub image: Option<String>,
    pub technologies: String,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub featured: bool,
    pub published: bool,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields written on project create and full replace
#[derive(Debug, Clone)]
pub struct ProjectInput {
    pub title: String,
    pub description: String,
    pub content: String,
    pub image: Option<String>,
    pub technologies: String,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub featured: bool,
    pub published: bool,
}

#[derive(Debug, Clone)]
pub struct ProjectWithAuthor {
    pub project: Project,
    pub author: Author,
}

/// Blog post model. `tags` holds the raw stored text.
#[derive(Debug, Clone, FromRow)]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub tags: String,
    pub image: Option<String>,
    pub published: bool,
    pub featured: bool,
    pub read_time: Option<i32>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields written on blog post create and full replace
#[derive(Debug, Clone)]
pub struct BlogPostInput {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub tags: String,
    pub image: Option<String>,
    pub published: bool,
    pub featured: bool,
    pub read_time: i32,
}

#[derive(Debug, Clone)]
pub struct BlogPostWithAuthor {
    pub post: BlogPost,
    pub author: Author,
}

/// Comment model
#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub approved: bool,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New comment for insertion
#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub approved: bool,
    pub author_id: Uuid,
    pub post_id: Uuid,
}

/// The post a comment belongs to, as shown in the moderation queue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Clone)]
pub struct CommentWithContext {
    pub comment: Comment,
    pub author: Author,
    pub post: PostSummary,
}

/// Which comments the moderation queue should return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentFilter {
    #[default]
    All,
    Pending,
    Approved,
}

impl CommentFilter {
    /// `None` means no constraint on `approved`.
    pub fn approved(&self) -> Option<bool> {
        match self {
            CommentFilter::All => None,
            CommentFilter::Pending => Some(false),
            CommentFilter::Approved => Some(true),
        }
    }
}

/// Contact model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub project_type: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New contact submission for insertion
#[derive(Debug, Clone)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub project_type: Option<String>,
}

/// Filter for project and blog listings. `None` leaves a column unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub published: Option<bool>,
    pub featured: Option<bool>,
}

impl ListFilter {
    pub fn matches(&self, published: bool, featured: bool) -> bool {
        self.published.map_or(true, |p| p == published)
            && self.featured.map_or(true, |f| f == featured)
    }
}
