/*!
 * Authentication
 * Password hashing, JWT issue/verify, session resolution and role gating
 */
pub mod guard;
pub mod password;
pub mod session;
pub mod token;

pub use guard::{require_role, Access, AdminUser, CurrentUser, MaybeUser};
pub use session::{resolve_session, SessionUser, SESSION_COOKIE};
pub use token::{Claims, TokenService};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
