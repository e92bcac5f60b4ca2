#![cfg(feature = "sqlite")]

use market_repo::sqlite::SqliteRepo;
use market_types::domain::livestock::{
    Category, Gender, Image, Livestock, LivestockFilter, LivestockStatus, NewLivestock,
};
use market_types::domain::notification::AdminNotification;
use market_types::domain::order::{OrderStatus, PaymentProof};
use market_types::domain::user::{CartItem, Role, User};
use market_types::ports::{
    LivestockRepository, NotificationRepository, OrderRepository, RepoError, UserRepository,
};
use std::path::PathBuf;
use uuid::Uuid;

mod common;

fn temp_db_url() -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut path = PathBuf::from(dir.path());
    path.push(format!("market-{}.db", Uuid::new_v4()));
    let url = format!("sqlite://{}", path.display());
    (dir, url)
}

fn sheep(name: &str, price: i64) -> Livestock {
    Livestock::new(NewLivestock {
        name: name.into(),
        category: Category::Sheep,
        breed: "Dorper".into(),
        age_months: 8,
        weight_kg: 41.5,
        gender: Gender::Male,
        description: "Ram lamb, vaccinated".into(),
        price_cents: price,
    })
    .unwrap()
}

#[tokio::test]
async fn sqlite_repo_user_round_trip() {
    let (_dir, url) = temp_db_url();
    let repo = SqliteRepo::new(&url).await.unwrap();

    let mut user = User::new("Test".into(), "test@example.com", "h".into(), Role::Admin).unwrap();
    repo.create_user(user.clone()).await.unwrap();

    let dup = User::new("Dup".into(), "test@example.com", "h".into(), Role::Customer).unwrap();
    assert!(matches!(
        repo.create_user(dup).await.unwrap_err(),
        RepoError::Conflict(_)
    ));

    let item = sheep("Shaun", 30_000);
    user.add_to_cart(CartItem::snapshot(&item));
    user.add_address(common::address()).unwrap();
    repo.save_user(user.clone()).await.unwrap().unwrap();

    let fetched = repo
        .get_user_by_email("test@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.role, Role::Admin);
    assert_eq!(fetched.cart.len(), 1);
    assert_eq!(fetched.cart[0].livestock_id, item.id);
    assert_eq!(fetched.addresses, user.addresses);
}

#[tokio::test]
async fn sqlite_repo_livestock_filters_and_status() {
    let (_dir, url) = temp_db_url();
    let repo = SqliteRepo::new(&url).await.unwrap();

    let cheap = repo.create_livestock(sheep("Cheap", 10_000)).await.unwrap();
    let dear = repo.create_livestock(sheep("Dear", 90_000)).await.unwrap();

    let found = repo
        .list_livestock(&LivestockFilter {
            q: Some("VACCINATED".into()),
            max_price: Some(50_000),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, cheap.id);

    let changed = repo
        .set_livestock_status(&[cheap.id, dear.id], LivestockStatus::Sold)
        .await
        .unwrap();
    assert_eq!(changed, 2);
    let sold = repo
        .list_livestock(&LivestockFilter {
            status: Some(LivestockStatus::Sold),
            category: Some(Category::Sheep),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(sold.len(), 2);

    let image = Image::new("image/jpeg".into(), vec![0xff, 0xd8, 0xff]).unwrap();
    let image_id = repo.put_image(image.clone()).await.unwrap();
    let mut edited = repo.get_livestock(dear.id).await.unwrap().unwrap();
    edited.image_ids.push(image_id);
    repo.save_livestock(edited).await.unwrap().unwrap();
    let fetched = repo.get_livestock(dear.id).await.unwrap().unwrap();
    assert_eq!(fetched.image_ids, vec![image_id]);
    assert_eq!(repo.get_image(image_id).await.unwrap(), Some(image));

    assert!(repo.delete_livestock(cheap.id).await.unwrap());
    assert!(repo.get_livestock(cheap.id).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_repo_order_flow() {
    let (_dir, url) = temp_db_url();
    let repo = SqliteRepo::new(&url).await.unwrap();

    let mut order = common::order();
    repo.create_order(order.clone()).await.unwrap();

    let cutoff = order.created_at + chrono::Duration::seconds(1);
    let stale = repo.list_pending_before(cutoff).await.unwrap();
    assert_eq!(stale.len(), 1);
    assert!(repo
        .list_pending_before(order.created_at - chrono::Duration::seconds(1))
        .await
        .unwrap()
        .is_empty());

    order.attach_proof(PaymentProof {
        image_id: Uuid::new_v4(),
        sha256: "deadbeef".into(),
        content_type: "image/png".into(),
        uploaded_at: chrono::Utc::now(),
    });
    order
        .transition(OrderStatus::PaymentRejected, Some("unreadable".into()))
        .unwrap();
    repo.save_order(order.clone()).await.unwrap().unwrap();

    let fetched = repo.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, OrderStatus::PaymentRejected);
    assert_eq!(fetched.status_note.as_deref(), Some("unreadable"));
    assert_eq!(fetched.payment_proof, order.payment_proof);
    assert_eq!(fetched.shipping, order.shipping);

    let rejected = repo
        .list_orders(Some(OrderStatus::PaymentRejected))
        .await
        .unwrap();
    assert_eq!(rejected.len(), 1);
    assert_eq!(
        repo.list_orders_for_user(order.user_id).await.unwrap().len(),
        1
    );

    repo.record_proof_hash("deadbeef", order.id).await.unwrap();
    assert_eq!(
        repo.find_proof_hash("deadbeef").await.unwrap(),
        Some(order.id)
    );
    assert!(matches!(
        repo.record_proof_hash("deadbeef", Uuid::new_v4())
            .await
            .unwrap_err(),
        RepoError::Conflict(_)
    ));

    repo.release_proof_hash("deadbeef", Uuid::new_v4())
        .await
        .unwrap();
    assert!(repo.find_proof_hash("deadbeef").await.unwrap().is_some());
    repo.release_proof_hash("deadbeef", order.id).await.unwrap();
    assert!(repo.find_proof_hash("deadbeef").await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_repo_admin_notifications() {
    let (_dir, url) = temp_db_url();
    let repo = SqliteRepo::new(&url).await.unwrap();

    let order_id = Uuid::new_v4();
    repo.push_admin_notification(AdminNotification::new("new order".into(), Some(order_id)))
        .await
        .unwrap();
    repo.push_admin_notification(AdminNotification::new("hello".into(), None))
        .await
        .unwrap();

    let listed = repo.list_admin_notifications().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().any(|n| n.order_id == Some(order_id)));
    assert_eq!(repo.mark_admin_notifications_read().await.unwrap(), 2);
    assert_eq!(repo.mark_admin_notifications_read().await.unwrap(), 0);
}

#[tokio::test]
async fn sqlite_repo_handles_missing_rows() {
    let (_dir, url) = temp_db_url();
    let repo = SqliteRepo::new(&url).await.unwrap();
    let missing_id = Uuid::new_v4();

    assert!(repo.get_order(missing_id).await.unwrap().is_none());
    assert!(repo.get_user(missing_id).await.unwrap().is_none());
    assert!(repo.save_order(common::order()).await.unwrap().is_none());
    assert!(!repo.delete_livestock(missing_id).await.unwrap());
    assert_eq!(
        repo.set_livestock_status(&[], LivestockStatus::Sold)
            .await
            .unwrap(),
        0
    );
}
