//! Admin bootstrap. Registration only ever creates `USER` accounts, so the
//! first `ADMIN` comes from here: at startup via `ADMIN_EMAIL` /
//! `ADMIN_PASSWORD`, or from the `create-admin` binary.
//!
//! A fresh install can also be given a couple of sample projects and a
//! welcome post with `SEED_SAMPLE_CONTENT=true`.

use crate::auth::password::hash_password;
use crate::auth::AuthError;
use crate::config::AdminSeed;
use crate::db::models::{BlogPostInput, ListFilter, NewUser, ProjectInput, Role, User};
use crate::db::{Store, StoreError};
use crate::list_field::encode_list;
use crate::routes::blog::read_time;

const SAMPLE_POST_SLUG: &str = "getting-started-with-the-portfolio";

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("admin password must be at least 6 characters")]
    WeakPassword,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[derive(Debug)]
pub enum SeedOutcome {
    Created(User),
    /// The email is taken. The existing account is left untouched, whatever its role.
    AlreadyExists(User),
}

pub async fn seed_admin(
    store: &dyn Store,
    seed: &AdminSeed,
    bcrypt_cost: u32,
) -> Result<SeedOutcome, SeedError> {
    if let Some(existing) = store.find_user_by_email(&seed.email).await? {
        if existing.role != Role::Admin {
            tracing::warn!(
                user_id = %existing.id,
                "Admin seed email belongs to a non-admin account; leaving it unchanged"
            );
        }
        return Ok(SeedOutcome::AlreadyExists(existing));
    }

    if seed.password.chars().count() < 6 {
        return Err(SeedError::WeakPassword);
    }

    let password_hash = hash_password(seed.password.clone(), bcrypt_cost).await?;
    let user = store
        .insert_user(NewUser {
            email: seed.email.trim().to_string(),
            password_hash,
            display_name: seed.display_name.clone(),
            role: Role::Admin,
        })
        .await?;

    tracing::info!(user_id = %user.id, "Admin user created");
    Ok(SeedOutcome::Created(user))
}

fn list(items: &[&str]) -> String {
    encode_list(&items.iter().map(|s| s.to_string()).collect::<Vec<_>>())
}

fn sample_projects() -> Vec<ProjectInput> {
    vec![
        ProjectInput {
            title: "E-learning Platform".to_string(),
            description: "An online learning platform with courses and progress tracking"
                .to_string(),
            content: "Video lessons, quizzes and per-student progress tracking.".to_string(),
            image: None,
            technologies: list(&["Rust", "Axum", "PostgreSQL"]),
            github_url: None,
            live_url: None,
            featured: true,
            published: true,
        },
        ProjectInput {
            title: "Task Management App".to_string(),
            description: "A task board with team workspaces".to_string(),
            content: "Shared boards, assignments and real-time updates.".to_string(),
            image: None,
            technologies: list(&["TypeScript", "React", "WebSockets"]),
            github_url: None,
            live_url: None,
            featured: false,
            published: true,
        },
    ]
}

fn sample_post() -> BlogPostInput {
    let content = "Welcome to the blog. Posts are written in Markdown, \
                   can be tagged, and readers can leave comments once they sign in. \
                   Comments from readers wait for moderation before they appear."
        .to_string();
    BlogPostInput {
        title: "Getting Started with the Portfolio".to_string(),
        read_time: read_time(&content),
        content,
        excerpt: "A quick tour of the portfolio and its blog".to_string(),
        tags: list(&["Announcements", "Tutorial"]),
        image: None,
        published: true,
        featured: true,
    }
}

/// Insert sample projects and a welcome post authored by `author`.
///
/// Projects are only added to an empty catalogue and the post is keyed by its
/// fixed slug, so running this on every start is harmless. Returns whether
/// anything was written.
pub async fn seed_sample_content(store: &dyn Store, author: &User) -> Result<bool, SeedError> {
    let mut wrote = false;

    if store.list_projects(ListFilter::default()).await?.is_empty() {
        for project in sample_projects() {
            store.insert_project(author.id, project).await?;
        }
        wrote = true;
    }

    match store
        .insert_post(author.id, SAMPLE_POST_SLUG.to_string(), sample_post())
        .await
    {
        Ok(_) => wrote = true,
        Err(StoreError::Conflict(_)) => {}
        Err(e) => return Err(e.into()),
    }

    if wrote {
        tracing::info!(author_id = %author.id, "Sample content seeded");
    }
    Ok(wrote)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn seed() -> AdminSeed {
        AdminSeed {
            email: "admin@example.com".to_string(),
            password: "admin-password".to_string(),
            display_name: "Admin".to_string(),
        }
    }

    #[tokio::test]
    async fn test_seed_creates_admin_once() {
        let store = MemoryStore::new();
        let first = seed_admin(&store, &seed(), 4).await.unwrap();
        let SeedOutcome::Created(admin) = first else {
            panic!("expected a new admin");
        };
        assert_eq!(admin.role, Role::Admin);

        let second = seed_admin(&store, &seed(), 4).await.unwrap();
        assert!(matches!(second, SeedOutcome::AlreadyExists(u) if u.id == admin.id));
    }

    #[tokio::test]
    async fn test_seed_rejects_short_password() {
        let store = MemoryStore::new();
        let weak = AdminSeed {
            password: "12345".to_string(),
            ..seed()
        };
        assert!(matches!(
            seed_admin(&store, &weak, 4).await,
            Err(SeedError::WeakPassword)
        ));
    }

    #[tokio::test]
    async fn test_sample_content_is_seeded_once() {
        let store = MemoryStore::new();
        let SeedOutcome::Created(admin) = seed_admin(&store, &seed(), 4).await.unwrap() else {
            panic!("expected a new admin");
        };

        assert!(seed_sample_content(&store, &admin).await.unwrap());
        let projects = store.list_projects(ListFilter::default()).await.unwrap();
        assert_eq!(projects.len(), 2);
        let posts = store.list_posts(ListFilter::default()).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].post.slug, SAMPLE_POST_SLUG);
        assert_eq!(posts[0].post.author_id, admin.id);

        assert!(!seed_sample_content(&store, &admin).await.unwrap());
        assert_eq!(store.list_projects(ListFilter::default()).await.unwrap().len(), 2);
        assert_eq!(store.list_posts(ListFilter::default()).await.unwrap().len(), 1);
    }
}
