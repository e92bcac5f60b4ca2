pub mod livestock;
pub mod notification;
pub mod order;
pub mod user;
