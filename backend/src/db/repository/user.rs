//! User account storage.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{NewUser, User, UserId};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a new account.
    ///
    /// # Returns
    /// * `Ok(User)` - The stored account with its id
    /// * `Err(RepositoryError::Conflict)` - If the email is already registered
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User>;

    async fn get_user(&self, id: UserId) -> RepositoryResult<Option<User>>;

    /// Look up an account by email. Emails are compared case-insensitively.
    async fn get_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    /// Check if the storage backend is reachable.
    ///
    /// # Returns
    /// * `Ok(true)` - If the backend answers
    /// * `Err(RepositoryError)` - If the check itself fails
    async fn health_check(&self) -> RepositoryResult<bool>;
}
