use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use market_types::domain::livestock::{Image, Livestock, LivestockFilter, LivestockStatus};
use market_types::domain::notification::AdminNotification;
use market_types::domain::order::{Order, OrderStatus};
use market_types::domain::user::User;
use market_types::ports::{
    LivestockRepository, NotificationRepository, OrderRepository, RepoError, UserRepository,
};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct InMemoryRepo {
    pub users: Arc<DashMap<Uuid, User>>,
    emails: Arc<DashMap<String, Uuid>>,
    pub livestock: Arc<DashMap<Uuid, Livestock>>,
    images: Arc<DashMap<Uuid, Image>>,
    pub orders: Arc<DashMap<Uuid, Order>>,
    proof_hashes: Arc<DashMap<String, Uuid>>,
    notifications: Arc<DashMap<Uuid, AdminNotification>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            users: Arc::new(DashMap::new()),
            emails: Arc::new(DashMap::new()),
            livestock: Arc::new(DashMap::new()),
            images: Arc::new(DashMap::new()),
            orders: Arc::new(DashMap::new()),
            proof_hashes: Arc::new(DashMap::new()),
            notifications: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

fn newest_first<T>(mut rows: Vec<T>, created: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    rows.sort_by_key(|r| std::cmp::Reverse(created(r)));
    rows
}

#[async_trait]
impl UserRepository for InMemoryRepo {
    async fn create_user(&self, user: User) -> Result<User, RepoError> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(RepoError::Conflict(format!("email {}", user.email))),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user.clone());
                Ok(user)
            }
        }
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.get(&id).map(|r| r.clone()))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let Some(id) = self.emails.get(email).map(|r| *r) else {
            return Ok(None);
        };
        self.get_user(id).await
    }

    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        let rows = self.users.iter().map(|kv| kv.value().clone()).collect();
        Ok(newest_first(rows, |u: &User| u.created_at))
    }

    async fn save_user(&self, user: User) -> Result<Option<User>, RepoError> {
        if let Some(mut v) = self.users.get_mut(&user.id) {
            *v = user.clone();
            return Ok(Some(user));
        }
        Ok(None)
    }
}

#[async_trait]
impl LivestockRepository for InMemoryRepo {
    async fn create_livestock(&self, item: Livestock) -> Result<Livestock, RepoError> {
        self.livestock.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get_livestock(&self, id: Uuid) -> Result<Option<Livestock>, RepoError> {
        Ok(self.livestock.get(&id).map(|r| r.clone()))
    }

    async fn list_livestock(&self, filter: &LivestockFilter) -> Result<Vec<Livestock>, RepoError> {
        let rows = self
            .livestock
            .iter()
            .filter(|kv| filter.matches(kv.value()))
            .map(|kv| kv.value().clone())
            .collect();
        Ok(newest_first(rows, |l: &Livestock| l.created_at))
    }

    async fn save_livestock(&self, item: Livestock) -> Result<Option<Livestock>, RepoError> {
        if let Some(mut v) = self.livestock.get_mut(&item.id) {
            *v = item.clone();
            return Ok(Some(item));
        }
        Ok(None)
    }

    async fn delete_livestock(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.livestock.remove(&id).is_some())
    }

    async fn set_livestock_status(
        &self,
        ids: &[Uuid],
        status: LivestockStatus,
    ) -> Result<u64, RepoError> {
        let mut changed = 0;
        for id in ids {
            if let Some(mut v) = self.livestock.get_mut(id) {
                v.status = status;
                v.updated_at = Utc::now();
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn put_image(&self, image: Image) -> Result<Uuid, RepoError> {
        let id = image.id;
        self.images.insert(id, image);
        Ok(id)
    }

    async fn get_image(&self, id: Uuid) -> Result<Option<Image>, RepoError> {
        Ok(self.images.get(&id).map(|r| r.clone()))
    }

    async fn delete_image(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.images.remove(&id).is_some())
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepo {
    async fn create_order(&self, order: Order) -> Result<Order, RepoError> {
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        Ok(self.orders.get(&id).map(|r| r.clone()))
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, RepoError> {
        let rows = self
            .orders
            .iter()
            .filter(|kv| status.map_or(true, |s| kv.value().status == s))
            .map(|kv| kv.value().clone())
            .collect();
        Ok(newest_first(rows, |o: &Order| o.created_at))
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError> {
        let rows = self
            .orders
            .iter()
            .filter(|kv| kv.value().user_id == user_id)
            .map(|kv| kv.value().clone())
            .collect();
        Ok(newest_first(rows, |o: &Order| o.created_at))
    }

    async fn save_order(&self, order: Order) -> Result<Option<Order>, RepoError> {
        if let Some(mut v) = self.orders.get_mut(&order.id) {
            *v = order.clone();
            return Ok(Some(order));
        }
        Ok(None)
    }

    async fn list_pending_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, RepoError> {
        Ok(self
            .orders
            .iter()
            .filter(|kv| kv.value().status == OrderStatus::Pending && kv.value().created_at <= cutoff)
            .map(|kv| kv.value().clone())
            .collect())
    }

    async fn find_proof_hash(&self, sha256: &str) -> Result<Option<Uuid>, RepoError> {
        Ok(self.proof_hashes.get(sha256).map(|r| *r))
    }

    async fn record_proof_hash(&self, sha256: &str, order_id: Uuid) -> Result<(), RepoError> {
        match self.proof_hashes.entry(sha256.to_string()) {
            Entry::Occupied(_) => Err(RepoError::Conflict(format!("proof hash {sha256}"))),
            Entry::Vacant(slot) => {
                slot.insert(order_id);
                Ok(())
            }
        }
    }

    async fn release_proof_hash(&self, sha256: &str, order_id: Uuid) -> Result<(), RepoError> {
        self.proof_hashes.remove_if(sha256, |_, owner| *owner == order_id);
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryRepo {
    async fn push_admin_notification(&self, n: AdminNotification) -> Result<(), RepoError> {
        self.notifications.insert(n.id, n);
        Ok(())
    }

    async fn list_admin_notifications(&self) -> Result<Vec<AdminNotification>, RepoError> {
        let rows = self
            .notifications
            .iter()
            .map(|kv| kv.value().clone())
            .collect();
        Ok(newest_first(rows, |n: &AdminNotification| n.created_at))
    }

    async fn mark_admin_notifications_read(&self) -> Result<u64, RepoError> {
        let mut changed = 0;
        for mut n in self.notifications.iter_mut() {
            if !n.read {
                n.read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }
}
