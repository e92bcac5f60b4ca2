use std::sync::Arc;

use market_types::domain::notification::UserNotification;
use market_types::domain::user::{Address, CartItem, User};
use market_types::ports::{LivestockRepository, UserRepository};
use uuid::Uuid;

use super::{load_user, store_user};
use crate::errors::AppError;

/// Per-user state kept on the account document: cart, wishlist, address
/// book and notification feed.
pub struct AccountService<R: UserRepository + LivestockRepository> {
    repo: Arc<R>,
}

impl<R: UserRepository + LivestockRepository> AccountService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<User, AppError> {
        load_user(self.repo.as_ref(), user_id).await
    }

    async fn snapshots(&self, ids: &[Uuid]) -> Result<Vec<CartItem>, AppError> {
        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            let item = self
                .repo
                .get_livestock(*id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("livestock {id}")))?;
            items.push(CartItem::snapshot(&item));
        }
        Ok(items)
    }

    pub async fn replace_cart(
        &self,
        user_id: Uuid,
        ids: Vec<Uuid>,
    ) -> Result<Vec<CartItem>, AppError> {
        let mut user = self.profile(user_id).await?;
        let snapshots = self.snapshots(&ids).await?;
        user.set_cart(snapshots);
        Ok(store_user(self.repo.as_ref(), user).await?.cart)
    }

    pub async fn add_to_cart(&self, user_id: Uuid, id: Uuid) -> Result<Vec<CartItem>, AppError> {
        let mut user = self.profile(user_id).await?;
        let mut snapshot = self.snapshots(&[id]).await?;
        if let Some(item) = snapshot.pop() {
            user.add_to_cart(item);
        }
        Ok(store_user(self.repo.as_ref(), user).await?.cart)
    }

    pub async fn remove_from_cart(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Vec<CartItem>, AppError> {
        let mut user = self.profile(user_id).await?;
        user.remove_from_cart(&[id]);
        Ok(store_user(self.repo.as_ref(), user).await?.cart)
    }

    pub async fn replace_wishlist(
        &self,
        user_id: Uuid,
        ids: Vec<Uuid>,
    ) -> Result<Vec<Uuid>, AppError> {
        let mut user = self.profile(user_id).await?;
        self.snapshots(&ids).await?;
        user.set_wishlist(ids);
        Ok(store_user(self.repo.as_ref(), user).await?.wishlist)
    }

    pub async fn add_to_wishlist(&self, user_id: Uuid, id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let mut user = self.profile(user_id).await?;
        self.snapshots(&[id]).await?;
        user.add_to_wishlist(id);
        Ok(store_user(self.repo.as_ref(), user).await?.wishlist)
    }

    pub async fn remove_from_wishlist(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Vec<Uuid>, AppError> {
        let mut user = self.profile(user_id).await?;
        user.remove_from_wishlist(id);
        Ok(store_user(self.repo.as_ref(), user).await?.wishlist)
    }

    pub async fn replace_addresses(
        &self,
        user_id: Uuid,
        addresses: Vec<Address>,
    ) -> Result<Vec<Address>, AppError> {
        let mut user = self.profile(user_id).await?;
        user.set_addresses(addresses).map_err(AppError::bad_request)?;
        Ok(store_user(self.repo.as_ref(), user).await?.addresses)
    }

    pub async fn add_address(
        &self,
        user_id: Uuid,
        address: Address,
    ) -> Result<Vec<Address>, AppError> {
        let mut user = self.profile(user_id).await?;
        if user.address(address.id).is_some() {
            return Err(AppError::Conflict(format!("address {} exists", address.id)));
        }
        user.add_address(address).map_err(AppError::bad_request)?;
        Ok(store_user(self.repo.as_ref(), user).await?.addresses)
    }

    pub async fn remove_address(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<Vec<Address>, AppError> {
        let mut user = self.profile(user_id).await?;
        if !user.remove_address(address_id) {
            return Err(AppError::NotFound(format!("address {address_id}")));
        }
        Ok(store_user(self.repo.as_ref(), user).await?.addresses)
    }

    pub async fn notifications(&self, user_id: Uuid) -> Result<Vec<UserNotification>, AppError> {
        Ok(self.profile(user_id).await?.notifications)
    }

    pub async fn mark_notifications_read(&self, user_id: Uuid) -> Result<(), AppError> {
        let mut user = self.profile(user_id).await?;
        user.mark_notifications_read();
        store_user(self.repo.as_ref(), user).await?;
        Ok(())
    }
}
