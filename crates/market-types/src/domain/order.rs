use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::livestock::{Category, Livestock};
use super::user::Address;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Processing,
    Delivered,
    Cancelled,
    #[serde(rename = "Payment Rejected")]
    PaymentRejected,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::PaymentRejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::PaymentRejected => "Payment Rejected",
        }
    }

    /// Whether the order still holds its items off the market.
    pub fn holds_inventory(&self) -> bool {
        !matches!(self, OrderStatus::Cancelled | OrderStatus::PaymentRejected)
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Pending, PaymentRejected)
                | (Processing, Delivered)
                | (Processing, Cancelled)
                | (Processing, PaymentRejected)
                | (PaymentRejected, Processing)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s) || format!("{st:?}").eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("unknown order status {s}"))
    }
}

/// What a status change does to the listings attached to the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryEffect {
    None,
    /// Listings go back on the market.
    Release,
    /// Listings are taken off the market again.
    Reserve,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("cannot move order from {from} to {to}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub livestock_id: Uuid,
    pub name: String,
    pub breed: String,
    pub category: Category,
    pub price_cents: i64,
}

impl From<&Livestock> for OrderItem {
    fn from(item: &Livestock) -> Self {
        Self {
            livestock_id: item.id,
            name: item.name.clone(),
            breed: item.breed.clone(),
            category: item.category,
            price_cents: item.price_cents,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentProof {
    pub image_id: Uuid,
    pub sha256: String,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<OrderItem>,
    pub shipping: Address,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub payment_proof: Option<PaymentProof>,
    pub status_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(user_id: Uuid, items: Vec<OrderItem>, shipping: Address) -> anyhow::Result<Self> {
        if items.is_empty() {
            anyhow::bail!("items empty");
        }
        shipping.validate()?;
        let total = items
            .iter()
            .try_fold(0i64, |acc, it| acc.checked_add(it.price_cents))
            .ok_or_else(|| anyhow::anyhow!("order total out of range"))?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            items,
            shipping,
            total_cents: total,
            status: OrderStatus::Pending,
            payment_proof: None,
            status_note: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn livestock_ids(&self) -> Vec<Uuid> {
        self.items.iter().map(|it| it.livestock_id).collect()
    }

    /// Moves the order along the lifecycle, reporting what must happen to
    /// the listings it holds.
    pub fn transition(
        &mut self,
        next: OrderStatus,
        note: Option<String>,
    ) -> Result<InventoryEffect, TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        let effect = match (self.status.holds_inventory(), next.holds_inventory()) {
            (true, false) => InventoryEffect::Release,
            (false, true) => InventoryEffect::Reserve,
            _ => InventoryEffect::None,
        };
        self.status = next;
        self.status_note = note;
        self.updated_at = Utc::now();
        Ok(effect)
    }

    pub fn attach_proof(&mut self, proof: PaymentProof) {
        self.payment_proof = Some(proof);
        self.updated_at = Utc::now();
    }

    pub fn is_expired(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        self.status == OrderStatus::Pending && self.created_at + window <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address {
            id: Uuid::new_v4(),
            label: String::new(),
            full_name: "Musa".into(),
            phone: "0803".into(),
            line1: "2 Market St".into(),
            line2: None,
            city: "Jos".into(),
            region: String::new(),
            postal_code: String::new(),
            is_default: true,
        }
    }

    fn item(price: i64) -> OrderItem {
        OrderItem {
            livestock_id: Uuid::new_v4(),
            name: "Dolly".into(),
            breed: "Dorper".into(),
            category: Category::Sheep,
            price_cents: price,
        }
    }

    #[test]
    fn new_order_computes_total_and_defaults_pending() {
        let order = Order::new(Uuid::new_v4(), vec![item(500), item(250)], address()).unwrap();
        assert_eq!(order.total_cents, 750);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn validation_errors() {
        assert!(Order::new(Uuid::new_v4(), vec![], address()).is_err());
        let mut bad = address();
        bad.phone = String::new();
        assert!(Order::new(Uuid::new_v4(), vec![item(1)], bad).is_err());
    }

    #[test]
    fn total_overflow_is_an_error() {
        let res = Order::new(Uuid::new_v4(), vec![item(i64::MAX), item(1)], address());
        assert!(res.is_err());
    }

    #[test]
    fn cancel_releases_and_reupload_reserves() {
        let mut order = Order::new(Uuid::new_v4(), vec![item(100)], address()).unwrap();
        let before = order.updated_at;
        assert_eq!(
            order.transition(OrderStatus::PaymentRejected, Some("blurry".into())),
            Ok(InventoryEffect::Release)
        );
        assert!(order.updated_at >= before);
        assert_eq!(order.status_note.as_deref(), Some("blurry"));
        assert_eq!(
            order.transition(OrderStatus::Processing, None),
            Ok(InventoryEffect::Reserve)
        );
        assert_eq!(
            order.transition(OrderStatus::Delivered, None),
            Ok(InventoryEffect::None)
        );
    }

    #[test]
    fn terminal_states_reject_transitions() {
        let mut order = Order::new(Uuid::new_v4(), vec![item(100)], address()).unwrap();
        order.transition(OrderStatus::Cancelled, None).unwrap();
        let err = order.transition(OrderStatus::Processing, None).unwrap_err();
        assert_eq!(err.from, OrderStatus::Cancelled);
        assert_eq!(order.status, OrderStatus::Cancelled);

        let mut order = Order::new(Uuid::new_v4(), vec![item(100)], address()).unwrap();
        assert!(order.transition(OrderStatus::Delivered, None).is_err());
    }

    #[test]
    fn expiry_only_applies_to_pending() {
        let mut order = Order::new(Uuid::new_v4(), vec![item(100)], address()).unwrap();
        let window = chrono::Duration::hours(24);
        let later = order.created_at + chrono::Duration::hours(25);
        assert!(!order.is_expired(order.created_at, window));
        assert!(order.is_expired(later, window));
        order.transition(OrderStatus::Processing, None).unwrap();
        assert!(!order.is_expired(later, window));
    }

    #[test]
    fn status_round_trips_through_text() {
        assert_eq!(
            "Payment Rejected".parse::<OrderStatus>().unwrap(),
            OrderStatus::PaymentRejected
        );
        assert_eq!(
            "paymentrejected".parse::<OrderStatus>().unwrap(),
            OrderStatus::PaymentRejected
        );
        assert!("Shipped".parse::<OrderStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&OrderStatus::PaymentRejected).unwrap(),
            "\"Payment Rejected\""
        );
    }
}
