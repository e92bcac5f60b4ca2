///  To run :
///  cargo r --example client_example
use market_client::{Checkout, MarketClient};
use market_hex::application::catalog_service::CatalogService;
use market_hex::application::Services;
use market_hex::config::Config;
use market_hex::inbound::http::{HttpServer, HttpServerConfig};
use market_repo::build_repo;
use market_types::domain::livestock::{Category, Gender, LivestockFilter, NewLivestock};
use market_types::domain::order::OrderStatus;
use market_types::domain::user::Address;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Start the API on an ephemeral port with the in-memory store.
    let config = Config::default();
    let services = Services::new(build_repo(None).await?, &config);
    seed(&services.catalog).await?;

    let server = HttpServer::new(services, HttpServerConfig::from(&config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = format!("http://{}/", listener.local_addr()?);
    let handle = tokio::spawn(async move {
        if let Err(e) = server.serve(listener).await {
            eprintln!("server stopped: {e}");
        }
    });

    let client = MarketClient::new(&addr)?;
    let me = client
        .register("Example", "example@example.com", "example-pass")
        .await?;
    println!("Registered {} ({:?})", me.email, me.role);

    let goats = client
        .list_livestock(&LivestockFilter {
            category: Some(Category::Goat),
            ..Default::default()
        })
        .await?;
    println!("{} goat(s) listed", goats.len());
    let pick = goats.first().ok_or_else(|| anyhow::anyhow!("no goats"))?;

    let order = client
        .create_order(
            &Checkout {
                livestock_ids: Some(vec![pick.id]),
                address: Some(Address {
                    id: Uuid::new_v4(),
                    label: "Home".into(),
                    full_name: "Example Buyer".into(),
                    phone: "0800".into(),
                    line1: "1 Example Way".into(),
                    line2: None,
                    city: "Lagos".into(),
                    region: String::new(),
                    postal_code: String::new(),
                    is_default: true,
                }),
                address_id: None,
            },
            None,
        )
        .await?;
    println!("Order {} is {}", order.id, order.status);
    assert_eq!(order.status, OrderStatus::Pending);

    let listing = client.get_livestock(pick.id).await?;
    println!("{} is now {:?}", listing.name, listing.status);

    let cancelled = client.cancel_order(order.id).await?;
    println!("Order {} is {}", cancelled.id, cancelled.status);

    println!("{} order(s) on file", client.list_orders().await?.len());
    client.logout().await?;

    handle.abort();
    Ok(())
}

async fn seed<R: market_types::ports::MarketRepository>(
    catalog: &CatalogService<R>,
) -> anyhow::Result<()> {
    for (name, price_cents) in [("Sahel buck", 90_000), ("Red Sokoto doe", 65_000)] {
        catalog
            .create(
                NewLivestock {
                    name: name.into(),
                    category: Category::Goat,
                    breed: String::new(),
                    age_months: 10,
                    weight_kg: 30.0,
                    gender: Gender::Male,
                    description: String::new(),
                    price_cents,
                },
                vec![],
            )
            .await?;
    }
    Ok(())
}
