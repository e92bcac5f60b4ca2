use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Entry in a customer's notification feed, stored on the user document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserNotification {
    pub id: Uuid,
    pub message: String,
    pub order_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl UserNotification {
    pub fn new(message: String, order_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            message,
            order_id,
            read: false,
            created_at: Utc::now(),
        }
    }
}

/// Message for the operator console.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminNotification {
    pub id: Uuid,
    pub message: String,
    pub order_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl AdminNotification {
    pub fn new(message: String, order_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            message,
            order_id,
            read: false,
            created_at: Utc::now(),
        }
    }
}
