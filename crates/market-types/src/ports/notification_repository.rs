use async_trait::async_trait;

use super::RepoError;
use crate::domain::notification::AdminNotification;

#[async_trait]
pub trait NotificationRepository: Send + Sync + 'static {
    async fn push_admin_notification(&self, n: AdminNotification) -> Result<(), RepoError>;
    /// Newest first.
    async fn list_admin_notifications(&self) -> Result<Vec<AdminNotification>, RepoError>;
    async fn mark_admin_notifications_read(&self) -> Result<u64, RepoError>;
}
