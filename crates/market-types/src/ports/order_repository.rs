use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::RepoError;
use crate::domain::order::{Order, OrderStatus};

#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    async fn create_order(&self, order: Order) -> Result<Order, RepoError>;
    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError>;
    /// Newest first, optionally narrowed to one status.
    async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, RepoError>;
    async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError>;
    async fn save_order(&self, order: Order) -> Result<Option<Order>, RepoError>;
    /// Pending orders created at or before `cutoff`.
    async fn list_pending_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, RepoError>;

    /// Order that already claimed this proof hash, if any.
    async fn find_proof_hash(&self, sha256: &str) -> Result<Option<Uuid>, RepoError>;
    /// Unique insert; `RepoError::Conflict` when the hash is already registered.
    async fn record_proof_hash(&self, sha256: &str, order_id: Uuid) -> Result<(), RepoError>;
    /// Drops the hash only while `order_id` still owns it.
    async fn release_proof_hash(&self, sha256: &str, order_id: Uuid) -> Result<(), RepoError>;
}
