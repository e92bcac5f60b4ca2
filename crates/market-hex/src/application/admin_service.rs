use std::collections::BTreeMap;
use std::sync::Arc;

use market_types::domain::livestock::{LivestockFilter, LivestockStatus};
use market_types::domain::notification::AdminNotification;
use market_types::domain::order::OrderStatus;
use market_types::domain::user::UserView;
use market_types::ports::{
    LivestockRepository, MarketRepository, NotificationRepository, UserRepository,
};
use serde::Serialize;

use crate::errors::AppError;

/// Dashboard counters.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdminStats {
    pub orders_by_status: BTreeMap<String, usize>,
    pub livestock_available: usize,
    pub livestock_sold: usize,
    pub users: usize,
    /// Sum of Delivered order totals.
    pub revenue_cents: i64,
}

pub struct AdminService<R: MarketRepository> {
    repo: Arc<R>,
}

impl<R: MarketRepository> AdminService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn list_users(&self) -> Result<Vec<UserView>, AppError> {
        let users = self.repo.list_users().await?;
        Ok(users.iter().map(UserView::from).collect())
    }

    pub async fn notifications(&self) -> Result<Vec<AdminNotification>, AppError> {
        Ok(self.repo.list_admin_notifications().await?)
    }

    pub async fn mark_notifications_read(&self) -> Result<u64, AppError> {
        Ok(self.repo.mark_admin_notifications_read().await?)
    }

    pub async fn stats(&self) -> Result<AdminStats, AppError> {
        let orders = self.repo.list_orders(None).await?;
        let mut orders_by_status: BTreeMap<String, usize> = OrderStatus::ALL
            .into_iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        let mut revenue_cents: i64 = 0;
        for order in &orders {
            *orders_by_status
                .entry(order.status.as_str().to_string())
                .or_default() += 1;
            if order.status == OrderStatus::Delivered {
                revenue_cents = revenue_cents
                    .checked_add(order.total_cents)
                    .ok_or_else(|| anyhow::anyhow!("revenue total out of range"))?;
            }
        }

        let livestock = self.repo.list_livestock(&LivestockFilter::default()).await?;
        let livestock_sold = livestock
            .iter()
            .filter(|l| l.status == LivestockStatus::Sold)
            .count();

        Ok(AdminStats {
            orders_by_status,
            livestock_available: livestock.len() - livestock_sold,
            livestock_sold,
            users: self.repo.list_users().await?.len(),
            revenue_cents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_repo::memory::InMemoryRepo;
    use market_types::domain::livestock::{Category, Gender, Livestock, NewLivestock};
    use market_types::domain::order::{Order, OrderItem};
    use market_types::domain::user::{Address, Role, User};
    use market_types::ports::OrderRepository;

    #[tokio::test]
    async fn stats_count_users_stock_and_orders() {
        let repo = InMemoryRepo::new();
        repo.create_user(User::new("A".into(), "a@farm.io", "h".into(), Role::Customer).unwrap())
            .await
            .unwrap();
        for (i, price) in [10_000, 20_000].into_iter().enumerate() {
            let item = Livestock::new(NewLivestock {
                name: format!("Buck {i}"),
                category: Category::Goat,
                breed: String::new(),
                age_months: 0,
                weight_kg: 0.0,
                gender: Gender::Male,
                description: String::new(),
                price_cents: price,
            })
            .unwrap();
            repo.create_livestock(item).await.unwrap();
        }
        let all = repo.list_livestock(&LivestockFilter::default()).await.unwrap();
        repo.set_livestock_status(&[all[0].id], LivestockStatus::Sold)
            .await
            .unwrap();

        let svc = AdminService::new(Arc::new(repo));
        let stats = svc.stats().await.unwrap();
        assert_eq!(stats.users, 1);
        assert_eq!(stats.livestock_sold, 1);
        assert_eq!(stats.livestock_available, 1);
        assert_eq!(stats.orders_by_status["Pending"], 0);
        assert_eq!(stats.orders_by_status.len(), OrderStatus::ALL.len());
        assert_eq!(stats.revenue_cents, 0);

        let users = svc.list_users().await.unwrap();
        assert_eq!(users[0].email, "a@farm.io");
    }

    fn delivered(total: i64) -> Order {
        let item = OrderItem {
            livestock_id: uuid::Uuid::new_v4(),
            name: "Ram".into(),
            breed: "Uda".into(),
            category: Category::Sheep,
            price_cents: total,
        };
        let shipping = Address {
            id: uuid::Uuid::new_v4(),
            label: String::new(),
            full_name: "Ada".into(),
            phone: "0805".into(),
            line1: "9 Kraal Rd".into(),
            line2: None,
            city: "Kano".into(),
            region: String::new(),
            postal_code: String::new(),
            is_default: true,
        };
        let mut order = Order::new(uuid::Uuid::new_v4(), vec![item], shipping).unwrap();
        order.status = OrderStatus::Delivered;
        order
    }

    #[tokio::test]
    async fn revenue_sums_delivered_and_reports_overflow() {
        let repo = InMemoryRepo::new();
        repo.create_order(delivered(30_000)).await.unwrap();
        repo.create_order(delivered(12_500)).await.unwrap();
        let svc = AdminService::new(Arc::new(repo.clone()));
        assert_eq!(svc.stats().await.unwrap().revenue_cents, 42_500);

        repo.create_order(delivered(i64::MAX)).await.unwrap();
        assert!(matches!(svc.stats().await, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn notification_feed_marks_read() {
        let repo = InMemoryRepo::new();
        repo.push_admin_notification(AdminNotification::new("one".into(), None))
            .await
            .unwrap();
        let svc = AdminService::new(Arc::new(repo));
        assert_eq!(svc.notifications().await.unwrap().len(), 1);
        assert_eq!(svc.mark_notifications_read().await.unwrap(), 1);
        assert!(svc.notifications().await.unwrap()[0].read);
    }
}
