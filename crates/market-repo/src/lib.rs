#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use market_types::domain::livestock::{Image, Livestock, LivestockFilter, LivestockStatus};
use market_types::domain::notification::AdminNotification;
use market_types::domain::order::{Order, OrderStatus};
use market_types::domain::user::User;
use market_types::ports::{
    LivestockRepository, NotificationRepository, OrderRepository, RepoError, UserRepository,
};
use uuid::Uuid;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub const DEFAULT_SQLITE_URL: &str = "sqlite://market.db";

/// Storage backend picked at start-up from the enabled features and the
/// configured database url.
pub enum Repo {
    #[cfg(feature = "memory")]
    Memory(memory::InMemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteRepo),
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_repo(_: Option<&str>) -> anyhow::Result<Self> {
        tracing::info!("using in-memory store");
        Ok(Self::Memory(memory::InMemoryRepo::new()))
    }

    #[cfg(all(feature = "sqlite", not(feature = "memory")))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or(DEFAULT_SQLITE_URL);
        tracing::info!(url, "using sqlite store");
        Ok(Self::Sqlite(sqlite::SqliteRepo::new(url).await?))
    }

    // With both features a configured url selects sqlite, otherwise memory.
    #[cfg(all(feature = "sqlite", feature = "memory"))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        match database_url {
            Some(url) => {
                tracing::info!(url, "using sqlite store");
                Ok(Self::Sqlite(sqlite::SqliteRepo::new(url).await?))
            }
            None => {
                tracing::info!("using in-memory store");
                Ok(Self::Memory(memory::InMemoryRepo::new()))
            }
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(_) => "memory",
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(_) => "sqlite",
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $repo:ident => $call:expr) => {
        match $self {
            #[cfg(feature = "memory")]
            Repo::Memory($repo) => $call,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite($repo) => $call,
        }
    };
}

#[async_trait]
impl UserRepository for Repo {
    async fn create_user(&self, user: User) -> Result<User, RepoError> {
        dispatch!(self, r => r.create_user(user).await)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        dispatch!(self, r => r.get_user(id).await)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        dispatch!(self, r => r.get_user_by_email(email).await)
    }

    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        dispatch!(self, r => r.list_users().await)
    }

    async fn save_user(&self, user: User) -> Result<Option<User>, RepoError> {
        dispatch!(self, r => r.save_user(user).await)
    }
}

#[async_trait]
impl LivestockRepository for Repo {
    async fn create_livestock(&self, item: Livestock) -> Result<Livestock, RepoError> {
        dispatch!(self, r => r.create_livestock(item).await)
    }

    async fn get_livestock(&self, id: Uuid) -> Result<Option<Livestock>, RepoError> {
        dispatch!(self, r => r.get_livestock(id).await)
    }

    async fn list_livestock(&self, filter: &LivestockFilter) -> Result<Vec<Livestock>, RepoError> {
        dispatch!(self, r => r.list_livestock(filter).await)
    }

    async fn save_livestock(&self, item: Livestock) -> Result<Option<Livestock>, RepoError> {
        dispatch!(self, r => r.save_livestock(item).await)
    }

    async fn delete_livestock(&self, id: Uuid) -> Result<bool, RepoError> {
        dispatch!(self, r => r.delete_livestock(id).await)
    }

    async fn set_livestock_status(
        &self,
        ids: &[Uuid],
        status: LivestockStatus,
    ) -> Result<u64, RepoError> {
        dispatch!(self, r => r.set_livestock_status(ids, status).await)
    }

    async fn put_image(&self, image: Image) -> Result<Uuid, RepoError> {
        dispatch!(self, r => r.put_image(image).await)
    }

    async fn get_image(&self, id: Uuid) -> Result<Option<Image>, RepoError> {
        dispatch!(self, r => r.get_image(id).await)
    }

    async fn delete_image(&self, id: Uuid) -> Result<bool, RepoError> {
        dispatch!(self, r => r.delete_image(id).await)
    }
}

#[async_trait]
impl OrderRepository for Repo {
    async fn create_order(&self, order: Order) -> Result<Order, RepoError> {
        dispatch!(self, r => r.create_order(order).await)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        dispatch!(self, r => r.get_order(id).await)
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, RepoError> {
        dispatch!(self, r => r.list_orders(status).await)
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError> {
        dispatch!(self, r => r.list_orders_for_user(user_id).await)
    }

    async fn save_order(&self, order: Order) -> Result<Option<Order>, RepoError> {
        dispatch!(self, r => r.save_order(order).await)
    }

    async fn list_pending_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, RepoError> {
        dispatch!(self, r => r.list_pending_before(cutoff).await)
    }

    async fn find_proof_hash(&self, sha256: &str) -> Result<Option<Uuid>, RepoError> {
        dispatch!(self, r => r.find_proof_hash(sha256).await)
    }

    async fn record_proof_hash(&self, sha256: &str, order_id: Uuid) -> Result<(), RepoError> {
        dispatch!(self, r => r.record_proof_hash(sha256, order_id).await)
    }

    async fn release_proof_hash(&self, sha256: &str, order_id: Uuid) -> Result<(), RepoError> {
        dispatch!(self, r => r.release_proof_hash(sha256, order_id).await)
    }
}

#[async_trait]
impl NotificationRepository for Repo {
    async fn push_admin_notification(&self, n: AdminNotification) -> Result<(), RepoError> {
        dispatch!(self, r => r.push_admin_notification(n).await)
    }

    async fn list_admin_notifications(&self) -> Result<Vec<AdminNotification>, RepoError> {
        dispatch!(self, r => r.list_admin_notifications().await)
    }

    async fn mark_admin_notifications_read(&self) -> Result<u64, RepoError> {
        dispatch!(self, r => r.mark_admin_notifications_read().await)
    }
}
