use std::sync::Arc;

use chrono::{DateTime, Utc};
use market_types::domain::livestock::{Image, LivestockStatus};
use market_types::domain::notification::{AdminNotification, UserNotification};
use market_types::domain::order::{
    InventoryEffect, Order, OrderItem, OrderStatus, PaymentProof,
};
use market_types::domain::user::Address;
use market_types::ports::{
    LivestockRepository, MarketRepository, NotificationRepository, OrderRepository, RepoError,
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::{load_user, store_user, Upload};
use crate::errors::AppError;

/// Hex-encoded SHA-256 of an uploaded payment proof.
pub fn proof_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    /// Listings to buy; the caller's cart when absent.
    #[serde(default)]
    pub livestock_ids: Option<Vec<Uuid>>,
    /// Inline shipping address.
    #[serde(default)]
    pub address: Option<Address>,
    /// A saved address from the caller's address book.
    #[serde(default)]
    pub address_id: Option<Uuid>,
}

/// Who asked for a status change; decides who gets told about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Customer,
    Admin,
    Sweep,
}

pub struct OrderService<R: MarketRepository> {
    repo: Arc<R>,
    expiry: chrono::Duration,
}

impl<R: MarketRepository> OrderService<R> {
    pub fn new(repo: Arc<R>, expiry: chrono::Duration) -> Self {
        Self { repo, expiry }
    }

    pub fn expiry_window(&self) -> chrono::Duration {
        self.expiry
    }

    pub async fn create_order(
        &self,
        user_id: Uuid,
        req: CheckoutRequest,
        proof: Option<Upload>,
    ) -> Result<Order, AppError> {
        let mut user = load_user(self.repo.as_ref(), user_id).await?;

        let requested = req
            .livestock_ids
            .unwrap_or_else(|| user.cart.iter().map(|c| c.livestock_id).collect());
        let mut ids: Vec<Uuid> = Vec::with_capacity(requested.len());
        for id in requested {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        if ids.is_empty() {
            return Err(AppError::BadRequest("no items to order".into()));
        }

        let shipping = match (req.address_id, req.address) {
            (Some(address_id), _) => user
                .address(address_id)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("address {address_id}")))?,
            (None, Some(address)) => address,
            (None, None) => user
                .default_address()
                .cloned()
                .ok_or_else(|| AppError::BadRequest("shipping address required".into()))?,
        };

        let mut items = Vec::with_capacity(ids.len());
        for id in &ids {
            let listing = self
                .repo
                .get_livestock(*id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("livestock {id}")))?;
            if !listing.is_available() {
                return Err(AppError::Conflict(format!(
                    "{} is no longer available",
                    listing.name
                )));
            }
            items.push(OrderItem::from(&listing));
        }

        let order = Order::new(user.id, items, shipping).map_err(AppError::bad_request)?;

        let proof = match proof {
            Some(upload) => {
                let image = upload.into_image()?;
                let digest = proof_digest(&image.data);
                if self.repo.find_proof_hash(&digest).await?.is_some() {
                    return Err(proof_reused());
                }
                Some((image, digest))
            }
            None => None,
        };

        let order = match proof {
            Some((image, digest)) => {
                self.claim_proof(&digest, order.id).await?;
                let order_id = order.id;
                match self.persist_order(order, &ids, Some((image, digest.clone()))).await {
                    Ok(order) => order,
                    Err(e) => {
                        self.release_proof(&digest, order_id).await;
                        return Err(e);
                    }
                }
            }
            None => self.persist_order(order, &ids, None).await?,
        };

        if user.remove_from_cart(&ids) > 0 {
            store_user(self.repo.as_ref(), user).await?;
        }
        self.notify_admin(
            format!(
                "New order {} from {} ({} item(s), {} cents)",
                order.id,
                order.shipping.full_name,
                order.items.len(),
                order.total_cents
            ),
            order.id,
        )
        .await;

        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            total_cents = order.total_cents,
            status = %order.status,
            "order created"
        );
        Ok(order)
    }

    pub async fn list_my_orders(&self, user_id: Uuid) -> Result<Vec<Order>, AppError> {
        Ok(self.repo.list_orders_for_user(user_id).await?)
    }

    /// Orders owned by someone else read as missing.
    pub async fn get_my_order(&self, user_id: Uuid, id: Uuid) -> Result<Order, AppError> {
        let order = self.get_order(id).await?;
        if order.user_id != user_id {
            return Err(AppError::NotFound(format!("order {id}")));
        }
        Ok(order)
    }

    pub async fn cancel_order(&self, user_id: Uuid, id: Uuid) -> Result<Order, AppError> {
        let order = self.get_my_order(user_id, id).await?;
        self.apply_transition(
            order,
            OrderStatus::Cancelled,
            Some("cancelled by customer".into()),
            Actor::Customer,
        )
        .await
    }

    /// Attaches (or replaces) the payment proof. A proof already used by a
    /// different order is refused.
    pub async fn upload_proof(
        &self,
        user_id: Uuid,
        id: Uuid,
        upload: Upload,
    ) -> Result<Order, AppError> {
        let order = self.get_my_order(user_id, id).await?;
        if !matches!(
            order.status,
            OrderStatus::Pending | OrderStatus::Processing | OrderStatus::PaymentRejected
        ) {
            return Err(AppError::Conflict(format!(
                "order {id} is {} and no longer accepts payment proof",
                order.status
            )));
        }

        let image = upload.into_image()?;
        let digest = proof_digest(&image.data);
        let already_owned = match self.repo.find_proof_hash(&digest).await? {
            Some(owner) if owner != order.id => return Err(proof_reused()),
            Some(_) => true,
            None => false,
        };

        if order.status == OrderStatus::PaymentRejected {
            for item in &order.items {
                let available = self
                    .repo
                    .get_livestock(item.livestock_id)
                    .await?
                    .is_some_and(|l| l.is_available());
                if !available {
                    return Err(AppError::Conflict(format!(
                        "{} is no longer available",
                        item.name
                    )));
                }
            }
        }

        // Claim only after every check passed.
        if !already_owned {
            self.claim_proof(&digest, order.id).await?;
        }
        let order_id = order.id;
        let previous = order.payment_proof.as_ref().map(|p| p.image_id);
        let order = match self.replace_proof(order, image, digest.clone()).await {
            Ok(order) => order,
            Err(e) => {
                if !already_owned {
                    self.release_proof(&digest, order_id).await;
                }
                return Err(e);
            }
        };
        if let Some(old) = previous {
            self.repo.delete_image(old).await?;
        }
        tracing::info!(order_id = %order.id, "payment proof uploaded");
        Ok(order)
    }

    /// Proof image for the order's owner or an admin.
    pub async fn proof_image(
        &self,
        requester: Uuid,
        is_admin: bool,
        id: Uuid,
    ) -> Result<Image, AppError> {
        let order = if is_admin {
            self.get_order(id).await?
        } else {
            self.get_my_order(requester, id).await?
        };
        let proof = order
            .payment_proof
            .ok_or_else(|| AppError::NotFound(format!("payment proof for order {id}")))?;
        self.repo
            .get_image(proof.image_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("payment proof for order {id}")))
    }

    pub async fn get_order(&self, id: Uuid) -> Result<Order, AppError> {
        match self.repo.get_order(id).await? {
            Some(o) => Ok(o),
            None => Err(AppError::NotFound(format!("order {id}"))),
        }
    }

    pub async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, AppError> {
        Ok(self.repo.list_orders(status).await?)
    }

    pub async fn approve(&self, id: Uuid) -> Result<Order, AppError> {
        self.update_status(id, OrderStatus::Processing, None).await
    }

    pub async fn deliver(&self, id: Uuid) -> Result<Order, AppError> {
        self.update_status(id, OrderStatus::Delivered, None).await
    }

    pub async fn reject(&self, id: Uuid, reason: Option<String>) -> Result<Order, AppError> {
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "payment could not be verified".into());
        self.update_status(id, OrderStatus::PaymentRejected, Some(reason))
            .await
    }

    /// Admin-driven move along the lifecycle.
    pub async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        note: Option<String>,
    ) -> Result<Order, AppError> {
        let order = self.get_order(id).await?;
        if order.status == OrderStatus::PaymentRejected && status == OrderStatus::Processing {
            return Err(AppError::Conflict(
                "a rejected order needs a new payment proof from the customer".into(),
            ));
        }
        self.apply_transition(order, status, note, Actor::Admin).await
    }

    /// Cancels every Pending order older than the payment window. Failures
    /// are logged and skipped so one bad row does not stall the sweep.
    pub async fn expire_stale_orders(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let stale = self.repo.list_pending_before(now - self.expiry).await?;
        let mut expired = 0;
        for order in stale {
            if !order.is_expired(now, self.expiry) {
                continue;
            }
            let id = order.id;
            match self
                .apply_transition(
                    order,
                    OrderStatus::Cancelled,
                    Some("payment window expired".into()),
                    Actor::Sweep,
                )
                .await
            {
                Ok(_) => expired += 1,
                Err(e) => tracing::warn!(order_id = %id, error = %e, "failed to expire order"),
            }
        }
        Ok(expired)
    }

    async fn apply_transition(
        &self,
        mut order: Order,
        next: OrderStatus,
        note: Option<String>,
        actor: Actor,
    ) -> Result<Order, AppError> {
        let from = order.status;
        let effect = order.transition(next, note)?;
        let order = self.save(order).await?;

        let ids = order.livestock_ids();
        match effect {
            InventoryEffect::Release => {
                self.repo
                    .set_livestock_status(&ids, LivestockStatus::Available)
                    .await?;
            }
            InventoryEffect::Reserve => {
                self.repo
                    .set_livestock_status(&ids, LivestockStatus::Sold)
                    .await?;
            }
            InventoryEffect::None => {}
        }

        let message = status_message(&order);
        match actor {
            Actor::Admin => self.notify_user(order.user_id, message, order.id).await,
            Actor::Customer => self.notify_admin(message, order.id).await,
            Actor::Sweep => {
                self.notify_admin(message.clone(), order.id).await;
                self.notify_user(order.user_id, message, order.id).await;
            }
        }

        tracing::info!(
            order_id = %order.id,
            from = %from,
            to = %order.status,
            actor = ?actor,
            effect = ?effect,
            "order status changed"
        );
        Ok(order)
    }

    /// Stores the optional proof, takes the listings off the market and
    /// writes the new order.
    async fn persist_order(
        &self,
        mut order: Order,
        ids: &[Uuid],
        proof: Option<(Image, String)>,
    ) -> Result<Order, AppError> {
        if let Some((image, digest)) = proof {
            let proof = self.store_proof(image, digest).await?;
            order.attach_proof(proof);
            order.transition(OrderStatus::Processing, None)?;
        }
        self.repo
            .set_livestock_status(ids, LivestockStatus::Sold)
            .await?;
        Ok(self.repo.create_order(order).await?)
    }

    async fn replace_proof(
        &self,
        mut order: Order,
        image: Image,
        digest: String,
    ) -> Result<Order, AppError> {
        let proof = self.store_proof(image, digest).await?;
        order.attach_proof(proof);
        if order.status == OrderStatus::Processing {
            self.save(order).await
        } else {
            self.apply_transition(order, OrderStatus::Processing, None, Actor::Customer)
                .await
        }
    }

    async fn save(&self, order: Order) -> Result<Order, AppError> {
        let id = order.id;
        self.repo
            .save_order(order)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {id}")))
    }

    async fn claim_proof(&self, digest: &str, order_id: Uuid) -> Result<(), AppError> {
        self.repo
            .record_proof_hash(digest, order_id)
            .await
            .map_err(|e| match e {
                RepoError::Conflict(_) => proof_reused(),
                other => other.into(),
            })
    }

    async fn release_proof(&self, digest: &str, order_id: Uuid) {
        if let Err(e) = self.repo.release_proof_hash(digest, order_id).await {
            tracing::warn!(%order_id, error = %e, "failed to release payment proof hash");
        }
    }

    async fn store_proof(&self, image: Image, sha256: String) -> Result<PaymentProof, AppError> {
        let content_type = image.content_type.clone();
        let image_id = self.repo.put_image(image).await?;
        Ok(PaymentProof {
            image_id,
            sha256,
            content_type,
            uploaded_at: Utc::now(),
        })
    }

    // Notifications are best effort; the status change already happened.
    async fn notify_admin(&self, message: String, order_id: Uuid) {
        let n = AdminNotification::new(message, Some(order_id));
        if let Err(e) = self.repo.push_admin_notification(n).await {
            tracing::warn!(%order_id, error = %e, "failed to record admin notification");
        }
    }

    async fn notify_user(&self, user_id: Uuid, message: String, order_id: Uuid) {
        if let Err(e) = self.push_user_notification(user_id, message, order_id).await {
            tracing::warn!(%order_id, %user_id, error = %e, "failed to notify user");
        }
    }

    async fn push_user_notification(
        &self,
        user_id: Uuid,
        message: String,
        order_id: Uuid,
    ) -> Result<(), AppError> {
        let mut user = load_user(self.repo.as_ref(), user_id).await?;
        user.notify(UserNotification::new(message, Some(order_id)));
        store_user(self.repo.as_ref(), user).await?;
        Ok(())
    }
}

fn proof_reused() -> AppError {
    AppError::Conflict("payment proof already used for another order".into())
}

fn status_message(order: &Order) -> String {
    let base = match order.status {
        OrderStatus::Pending => format!("Order {} is awaiting payment", order.id),
        OrderStatus::Processing => format!("Order {} is being processed", order.id),
        OrderStatus::Delivered => format!("Order {} has been delivered", order.id),
        OrderStatus::Cancelled => format!("Order {} was cancelled", order.id),
        OrderStatus::PaymentRejected => format!("Payment for order {} was rejected", order.id),
    };
    match &order.status_note {
        Some(note) => format!("{base}: {note}"),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_repo::memory::InMemoryRepo;
    use market_types::domain::livestock::{Category, Gender, Livestock, NewLivestock};
    use market_types::domain::user::{CartItem, Role, User};
    use market_types::ports::UserRepository;

    struct Fixture {
        repo: InMemoryRepo,
        svc: OrderService<InMemoryRepo>,
        user_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let repo = InMemoryRepo::new();
        let mut user = User::new("Bola".into(), "bola@farm.io", "h".into(), Role::Customer).unwrap();
        user.add_address(Address {
            id: Uuid::new_v4(),
            label: "Home".into(),
            full_name: "Bola".into(),
            phone: "0801".into(),
            line1: "4 Creek".into(),
            line2: None,
            city: "Ilorin".into(),
            region: String::new(),
            postal_code: String::new(),
            is_default: true,
        })
        .unwrap();
        let user_id = user.id;
        repo.create_user(user).await.unwrap();
        let svc = OrderService::new(Arc::new(repo.clone()), chrono::Duration::hours(24));
        Fixture { repo, svc, user_id }
    }

    async fn listing(repo: &InMemoryRepo, price: i64) -> Livestock {
        let item = Livestock::new(NewLivestock {
            name: "Kid".into(),
            category: Category::Goat,
            breed: "Red Sokoto".into(),
            age_months: 6,
            weight_kg: 18.0,
            gender: Gender::Male,
            description: String::new(),
            price_cents: price,
        })
        .unwrap();
        repo.create_livestock(item).await.unwrap()
    }

    fn proof(bytes: &[u8]) -> Upload {
        Upload {
            content_type: "image/jpeg".into(),
            bytes: bytes.to_vec(),
        }
    }

    fn ids(list: &[&Livestock]) -> CheckoutRequest {
        CheckoutRequest {
            livestock_ids: Some(list.iter().map(|l| l.id).collect()),
            ..Default::default()
        }
    }

    async fn status_of(repo: &InMemoryRepo, id: Uuid) -> LivestockStatus {
        repo.get_livestock(id).await.unwrap().unwrap().status
    }

    #[test]
    fn digest_is_stable_hex() {
        assert_eq!(
            proof_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn creating_an_order_marks_items_sold() {
        let f = fixture().await;
        let a = listing(&f.repo, 10_000).await;
        let b = listing(&f.repo, 15_000).await;

        let order = f
            .svc
            .create_order(f.user_id, ids(&[&a, &b, &a]), None)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.total_cents, 25_000);
        assert_eq!(order.shipping.city, "Ilorin");
        assert_eq!(status_of(&f.repo, a.id).await, LivestockStatus::Sold);
        assert_eq!(status_of(&f.repo, b.id).await, LivestockStatus::Sold);

        let again = f.svc.create_order(f.user_id, ids(&[&a]), None).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));

        let feed = f.repo.list_admin_notifications().await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].order_id, Some(order.id));
    }

    #[tokio::test]
    async fn checkout_from_cart_empties_it() {
        let f = fixture().await;
        let a = listing(&f.repo, 10_000).await;
        let mut user = f.repo.get_user(f.user_id).await.unwrap().unwrap();
        user.add_to_cart(CartItem::snapshot(&a));
        f.repo.save_user(user).await.unwrap();

        let order = f
            .svc
            .create_order(f.user_id, CheckoutRequest::default(), None)
            .await
            .unwrap();
        assert_eq!(order.items[0].livestock_id, a.id);
        let user = f.repo.get_user(f.user_id).await.unwrap().unwrap();
        assert!(user.cart.is_empty());

        let empty = f
            .svc
            .create_order(f.user_id, CheckoutRequest::default(), None)
            .await;
        assert!(matches!(empty, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn checkout_with_proof_starts_processing() {
        let f = fixture().await;
        let a = listing(&f.repo, 10_000).await;
        let order = f
            .svc
            .create_order(f.user_id, ids(&[&a]), Some(proof(b"receipt-1")))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Processing);
        let stored = order.payment_proof.clone().unwrap();
        assert_eq!(stored.sha256, proof_digest(b"receipt-1"));

        let image = f.svc.proof_image(f.user_id, false, order.id).await.unwrap();
        assert_eq!(image.data, b"receipt-1");
        let stranger = f.svc.proof_image(Uuid::new_v4(), false, order.id).await;
        assert!(matches!(stranger, Err(AppError::NotFound(_))));
        assert!(f.svc.proof_image(Uuid::new_v4(), true, order.id).await.is_ok());
    }

    #[tokio::test]
    async fn cancelling_processing_order_restocks() {
        let f = fixture().await;
        let a = listing(&f.repo, 10_000).await;
        let order = f
            .svc
            .create_order(f.user_id, ids(&[&a]), Some(proof(b"r")))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Processing);

        let cancelled = f.svc.cancel_order(f.user_id, order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(status_of(&f.repo, a.id).await, LivestockStatus::Available);

        let twice = f.svc.cancel_order(f.user_id, order.id).await;
        assert!(matches!(twice, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn reused_proof_for_other_order_is_rejected() {
        let f = fixture().await;
        let a = listing(&f.repo, 10_000).await;
        let b = listing(&f.repo, 12_000).await;
        let first = f
            .svc
            .create_order(f.user_id, ids(&[&a]), Some(proof(b"same-receipt")))
            .await
            .unwrap();
        let second = f
            .svc
            .create_order(f.user_id, ids(&[&b]), None)
            .await
            .unwrap();

        let res = f
            .svc
            .upload_proof(f.user_id, second.id, proof(b"same-receipt"))
            .await;
        assert!(matches!(res, Err(AppError::Conflict(_))));

        let dup_checkout = f
            .svc
            .create_order(f.user_id, ids(&[&b]), Some(proof(b"same-receipt")))
            .await;
        assert!(dup_checkout.is_err());

        // Re-sending the same proof for its own order is fine.
        let same = f
            .svc
            .upload_proof(f.user_id, first.id, proof(b"same-receipt"))
            .await
            .unwrap();
        assert_eq!(same.status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn reject_then_reupload_reserves_again() {
        let f = fixture().await;
        let a = listing(&f.repo, 10_000).await;
        let order = f
            .svc
            .create_order(f.user_id, ids(&[&a]), Some(proof(b"blurry")))
            .await
            .unwrap();

        let rejected = f.svc.reject(order.id, Some("blurry photo".into())).await.unwrap();
        assert_eq!(rejected.status, OrderStatus::PaymentRejected);
        assert_eq!(status_of(&f.repo, a.id).await, LivestockStatus::Available);
        let user = f.repo.get_user(f.user_id).await.unwrap().unwrap();
        assert_eq!(user.unread_notifications(), 1);
        assert!(user.notifications[0].message.contains("blurry photo"));

        let admin_retry = f.svc.approve(order.id).await;
        assert!(matches!(admin_retry, Err(AppError::Conflict(_))));

        let back = f
            .svc
            .upload_proof(f.user_id, order.id, proof(b"sharp"))
            .await
            .unwrap();
        assert_eq!(back.status, OrderStatus::Processing);
        assert_eq!(status_of(&f.repo, a.id).await, LivestockStatus::Sold);

        let delivered = f.svc.deliver(order.id).await.unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
    }

    #[tokio::test]
    async fn reupload_after_rejection_needs_stock() {
        let f = fixture().await;
        let a = listing(&f.repo, 10_000).await;
        let order = f
            .svc
            .create_order(f.user_id, ids(&[&a]), None)
            .await
            .unwrap();
        f.svc.reject(order.id, None).await.unwrap();
        f.repo
            .set_livestock_status(&[a.id], LivestockStatus::Sold)
            .await
            .unwrap();
        let res = f.svc.upload_proof(f.user_id, order.id, proof(b"late")).await;
        assert!(matches!(res, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn refused_upload_leaves_receipt_unclaimed() {
        let f = fixture().await;
        let a = listing(&f.repo, 10_000).await;
        let b = listing(&f.repo, 10_000).await;
        let order = f
            .svc
            .create_order(f.user_id, ids(&[&a]), None)
            .await
            .unwrap();
        f.svc.reject(order.id, None).await.unwrap();
        f.repo
            .set_livestock_status(&[a.id], LivestockStatus::Sold)
            .await
            .unwrap();

        let refused = f
            .svc
            .upload_proof(f.user_id, order.id, proof(b"fresh-receipt"))
            .await;
        assert!(matches!(refused, Err(AppError::Conflict(_))));
        assert_eq!(
            f.repo
                .find_proof_hash(&proof_digest(b"fresh-receipt"))
                .await
                .unwrap(),
            None
        );

        let paid = f
            .svc
            .create_order(f.user_id, ids(&[&b]), Some(proof(b"fresh-receipt")))
            .await
            .unwrap();
        assert_eq!(paid.status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn failed_checkout_leaves_receipt_unclaimed() {
        let f = fixture().await;
        let a = listing(&f.repo, 10_000).await;
        let gone = Uuid::new_v4();
        let req = CheckoutRequest {
            livestock_ids: Some(vec![a.id, gone]),
            ..Default::default()
        };
        let res = f
            .svc
            .create_order(f.user_id, req, Some(proof(b"receipt-7")))
            .await;
        assert!(matches!(res, Err(AppError::NotFound(_))));
        assert_eq!(status_of(&f.repo, a.id).await, LivestockStatus::Available);

        let order = f
            .svc
            .create_order(f.user_id, ids(&[&a]), Some(proof(b"receipt-7")))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn overflowing_total_is_a_bad_request() {
        let f = fixture().await;
        let a = listing(&f.repo, 10_000).await;
        let mut huge = listing(&f.repo, 10_000).await;
        huge.price_cents = i64::MAX;
        f.repo.save_livestock(huge.clone()).await.unwrap();

        let res = f.svc.create_order(f.user_id, ids(&[&huge, &a]), None).await;
        assert!(matches!(res, Err(AppError::BadRequest(_))));
        assert_eq!(status_of(&f.repo, a.id).await, LivestockStatus::Available);
    }

    #[tokio::test]
    async fn stale_pending_orders_expire_and_restock() {
        let f = fixture().await;
        let a = listing(&f.repo, 10_000).await;
        let b = listing(&f.repo, 10_000).await;
        let stale = f
            .svc
            .create_order(f.user_id, ids(&[&a]), None)
            .await
            .unwrap();
        let paid = f
            .svc
            .create_order(f.user_id, ids(&[&b]), Some(proof(b"paid")))
            .await
            .unwrap();

        let now = Utc::now();
        assert_eq!(f.svc.expire_stale_orders(now).await.unwrap(), 0);

        let later = now + chrono::Duration::hours(25);
        assert_eq!(f.svc.expire_stale_orders(later).await.unwrap(), 1);

        let stale = f.repo.get_order(stale.id).await.unwrap().unwrap();
        assert_eq!(stale.status, OrderStatus::Cancelled);
        assert_eq!(stale.status_note.as_deref(), Some("payment window expired"));
        assert_eq!(status_of(&f.repo, a.id).await, LivestockStatus::Available);

        let paid = f.repo.get_order(paid.id).await.unwrap().unwrap();
        assert_eq!(paid.status, OrderStatus::Processing);
        assert_eq!(status_of(&f.repo, b.id).await, LivestockStatus::Sold);

        let feed = f.repo.list_admin_notifications().await.unwrap();
        assert!(feed.iter().any(|n| n.message.contains("payment window expired")));
    }

    #[tokio::test]
    async fn other_users_orders_are_hidden() {
        let f = fixture().await;
        let a = listing(&f.repo, 10_000).await;
        let order = f
            .svc
            .create_order(f.user_id, ids(&[&a]), None)
            .await
            .unwrap();
        let stranger = Uuid::new_v4();
        assert!(matches!(
            f.svc.get_my_order(stranger, order.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.svc.cancel_order(stranger, order.id).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(f.svc.list_my_orders(f.user_id).await.unwrap().len(), 1);
        assert!(f.svc.list_my_orders(stranger).await.unwrap().is_empty());
    }
}
