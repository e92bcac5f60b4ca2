use async_trait::async_trait;
use uuid::Uuid;

use super::RepoError;
use crate::domain::user::User;

#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Fails with `RepoError::Conflict` when the email is already taken.
    async fn create_user(&self, user: User) -> Result<User, RepoError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepoError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    async fn list_users(&self) -> Result<Vec<User>, RepoError>;
    /// Replaces the stored document; `None` when the user does not exist.
    async fn save_user(&self, user: User) -> Result<Option<User>, RepoError>;
}
