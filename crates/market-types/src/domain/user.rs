use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::livestock::{Category, Livestock};
use super::notification::UserNotification;

/// Entries kept in a user's notification feed; older ones are dropped.
pub const MAX_NOTIFICATIONS: usize = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

/// Snapshot of a listing taken when it was put in the cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub livestock_id: Uuid,
    pub name: String,
    pub breed: String,
    pub category: Category,
    pub price_cents: i64,
    pub image_id: Option<Uuid>,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    pub fn snapshot(item: &Livestock) -> Self {
        Self {
            livestock_id: item.id,
            name: item.name.clone(),
            breed: item.breed.clone(),
            category: item.category,
            price_cents: item.price_cents,
            image_id: item.cover_image(),
            added_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub label: String,
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub is_default: bool,
}

impl Address {
    pub fn validate(&self) -> anyhow::Result<()> {
        for (field, value) in [
            ("full_name", &self.full_name),
            ("phone", &self.phone),
            ("line1", &self.line1),
            ("city", &self.city),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("address {field} empty");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub cart: Vec<CartItem>,
    pub wishlist: Vec<Uuid>,
    pub addresses: Vec<Address>,
    pub notifications: Vec<UserNotification>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public projection of a user; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            role: u.role,
            created_at: u.created_at,
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> anyhow::Result<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => anyhow::bail!("invalid email"),
    }
}

impl User {
    /// Builds a user from already-hashed credentials.
    pub fn new(name: String, email: &str, password_hash: String, role: Role) -> anyhow::Result<Self> {
        if name.trim().is_empty() {
            anyhow::bail!("name empty");
        }
        let email = normalize_email(email);
        validate_email(&email)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email,
            password_hash,
            role,
            cart: Vec::new(),
            wishlist: Vec::new(),
            addresses: Vec::new(),
            notifications: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn set_cart(&mut self, items: Vec<CartItem>) {
        let mut cart: Vec<CartItem> = Vec::with_capacity(items.len());
        for item in items {
            if !cart.iter().any(|c| c.livestock_id == item.livestock_id) {
                cart.push(item);
            }
        }
        self.cart = cart;
        self.touch();
    }

    pub fn add_to_cart(&mut self, item: CartItem) {
        if !self.cart.iter().any(|c| c.livestock_id == item.livestock_id) {
            self.cart.push(item);
        }
        self.touch();
    }

    /// Drops the given listings from the cart, returning how many were removed.
    pub fn remove_from_cart(&mut self, ids: &[Uuid]) -> usize {
        let before = self.cart.len();
        self.cart.retain(|c| !ids.contains(&c.livestock_id));
        self.touch();
        before - self.cart.len()
    }

    pub fn set_wishlist(&mut self, ids: Vec<Uuid>) {
        let mut wishlist = Vec::with_capacity(ids.len());
        for id in ids {
            if !wishlist.contains(&id) {
                wishlist.push(id);
            }
        }
        self.wishlist = wishlist;
        self.touch();
    }

    pub fn add_to_wishlist(&mut self, id: Uuid) {
        if !self.wishlist.contains(&id) {
            self.wishlist.push(id);
        }
        self.touch();
    }

    pub fn remove_from_wishlist(&mut self, id: Uuid) -> bool {
        let before = self.wishlist.len();
        self.wishlist.retain(|w| *w != id);
        self.touch();
        before != self.wishlist.len()
    }

    pub fn set_addresses(&mut self, addresses: Vec<Address>) -> anyhow::Result<()> {
        for a in &addresses {
            a.validate()?;
        }
        self.addresses = addresses;
        self.normalize_default_address();
        self.touch();
        Ok(())
    }

    pub fn add_address(&mut self, address: Address) -> anyhow::Result<()> {
        address.validate()?;
        if address.is_default {
            for a in &mut self.addresses {
                a.is_default = false;
            }
        }
        self.addresses.push(address);
        self.normalize_default_address();
        self.touch();
        Ok(())
    }

    pub fn remove_address(&mut self, id: Uuid) -> bool {
        let before = self.addresses.len();
        self.addresses.retain(|a| a.id != id);
        let removed = before != self.addresses.len();
        if removed {
            self.normalize_default_address();
            self.touch();
        }
        removed
    }

    pub fn address(&self, id: Uuid) -> Option<&Address> {
        self.addresses.iter().find(|a| a.id == id)
    }

    pub fn default_address(&self) -> Option<&Address> {
        self.addresses
            .iter()
            .find(|a| a.is_default)
            .or_else(|| self.addresses.first())
    }

    // Exactly one default when any address exists; the first flagged wins.
    fn normalize_default_address(&mut self) {
        let default_idx = self
            .addresses
            .iter()
            .position(|a| a.is_default)
            .unwrap_or(0);
        for (i, a) in self.addresses.iter_mut().enumerate() {
            a.is_default = i == default_idx;
        }
    }

    pub fn notify(&mut self, notification: UserNotification) {
        self.notifications.insert(0, notification);
        self.notifications.truncate(MAX_NOTIFICATIONS);
        self.touch();
    }

    pub fn unread_notifications(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn mark_notifications_read(&mut self) {
        for n in &mut self.notifications {
            n.read = true;
        }
        self.touch();
    }
}
