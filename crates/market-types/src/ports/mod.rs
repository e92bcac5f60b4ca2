pub mod livestock_repository;
pub mod notification_repository;
pub mod order_repository;
pub mod user_repository;

pub use livestock_repository::LivestockRepository;
pub use notification_repository::NotificationRepository;
pub use order_repository::OrderRepository;
pub use user_repository::UserRepository;

/// Everything the application layer needs from a storage backend.
pub trait MarketRepository:
    UserRepository + LivestockRepository + OrderRepository + NotificationRepository
{
}

impl<T> MarketRepository for T where
    T: UserRepository + LivestockRepository + OrderRepository + NotificationRepository
{
}

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("db error: {0}")]
    DbError(String),

    #[error("conflict: {0}")]
    Conflict(String),
}
