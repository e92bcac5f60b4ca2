use market_types::domain::livestock::Category;
use market_types::domain::order::{Order, OrderItem};
use market_types::domain::user::Address;
use uuid::Uuid;

pub fn address() -> Address {
    Address {
        id: Uuid::new_v4(),
        label: "Farm".into(),
        full_name: "Test Buyer".into(),
        phone: "0800000000".into(),
        line1: "1 Ranch Way".into(),
        line2: None,
        city: "Abuja".into(),
        region: "FCT".into(),
        postal_code: "900001".into(),
        is_default: true,
    }
}

pub fn order() -> Order {
    Order::new(
        Uuid::new_v4(),
        vec![OrderItem {
            livestock_id: Uuid::new_v4(),
            name: "Sahel Buck".into(),
            breed: "Boer".into(),
            category: Category::Goat,
            price_cents: 500,
        }],
        address(),
    )
    .unwrap()
}
