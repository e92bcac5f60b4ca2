use async_trait::async_trait;
use uuid::Uuid;

use super::RepoError;
use crate::domain::livestock::{Image, Livestock, LivestockFilter, LivestockStatus};

#[async_trait]
pub trait LivestockRepository: Send + Sync + 'static {
    async fn create_livestock(&self, item: Livestock) -> Result<Livestock, RepoError>;
    async fn get_livestock(&self, id: Uuid) -> Result<Option<Livestock>, RepoError>;
    /// Newest first.
    async fn list_livestock(&self, filter: &LivestockFilter) -> Result<Vec<Livestock>, RepoError>;
    async fn save_livestock(&self, item: Livestock) -> Result<Option<Livestock>, RepoError>;
    async fn delete_livestock(&self, id: Uuid) -> Result<bool, RepoError>;
    /// Flips the status of every listed id that exists; returns how many changed rows.
    async fn set_livestock_status(
        &self,
        ids: &[Uuid],
        status: LivestockStatus,
    ) -> Result<u64, RepoError>;

    async fn put_image(&self, image: Image) -> Result<Uuid, RepoError>;
    async fn get_image(&self, id: Uuid) -> Result<Option<Image>, RepoError>;
    async fn delete_image(&self, id: Uuid) -> Result<bool, RepoError>;
}
