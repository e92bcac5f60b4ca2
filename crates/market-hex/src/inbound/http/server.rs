use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    serve, Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::handlers::{account, admin, auth, catalog, orders};
use crate::application::Services;
use crate::config::Config;
use crate::errors::AppError;
use market_types::ports::MarketRepository;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
    pub cookie_secure: bool,
    pub max_upload_bytes: usize,
}

impl From<&Config> for HttpServerConfig {
    fn from(config: &Config) -> Self {
        Self {
            port: config.server_port.clone(),
            cookie_secure: config.cookie_secure,
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

/// Shared by every handler behind an `Arc`.
pub struct AppState<R: MarketRepository> {
    pub services: Services<R>,
    pub cookie_secure: bool,
}

pub struct HttpServer<R: MarketRepository> {
    pub state: Arc<AppState<R>>,
    pub config: HttpServerConfig,
}

impl<R: MarketRepository> HttpServer<R> {
    pub fn new(services: Services<R>, config: HttpServerConfig) -> Self {
        Self {
            state: Arc::new(AppState {
                services,
                cookie_secure: config.cookie_secure,
            }),
            config,
        }
    }

    pub fn router(&self) -> Router {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        Router::new()
            .route("/health", get(health))
            .route("/auth/register", post(auth::register::<R>))
            .route("/auth/login", post(auth::login::<R>))
            .route("/auth/logout", post(auth::logout))
            .route("/auth/me", get(auth::me::<R>))
            .route("/livestock", get(catalog::list::<R>))
            .route("/livestock/{id}", get(catalog::get::<R>))
            .route("/images/{id}", get(catalog::image::<R>))
            .route(
                "/me/cart",
                get(account::cart::<R>).put(account::replace_cart::<R>),
            )
            .route(
                "/me/cart/{id}",
                post(account::add_to_cart::<R>).delete(account::remove_from_cart::<R>),
            )
            .route(
                "/me/wishlist",
                get(account::wishlist::<R>).put(account::replace_wishlist::<R>),
            )
            .route(
                "/me/wishlist/{id}",
                post(account::add_to_wishlist::<R>).delete(account::remove_from_wishlist::<R>),
            )
            .route(
                "/me/addresses",
                get(account::addresses::<R>)
                    .put(account::replace_addresses::<R>)
                    .post(account::add_address::<R>),
            )
            .route("/me/addresses/{id}", delete(account::remove_address::<R>))
            .route("/me/notifications", get(account::notifications::<R>))
            .route(
                "/me/notifications/read",
                post(account::mark_notifications_read::<R>),
            )
            .route(
                "/orders",
                post(orders::create::<R>).get(orders::list_mine::<R>),
            )
            .route("/orders/{id}", get(orders::get_mine::<R>))
            .route("/orders/{id}/cancel", post(orders::cancel::<R>))
            .route(
                "/orders/{id}/proof",
                post(orders::upload_proof::<R>).get(orders::proof_image::<R>),
            )
            .route(
                "/admin/livestock",
                get(admin::list_livestock::<R>).post(admin::create_livestock::<R>),
            )
            .route(
                "/admin/livestock/{id}",
                patch(admin::update_livestock::<R>).delete(admin::delete_livestock::<R>),
            )
            .route("/admin/livestock/{id}/images", post(admin::add_images::<R>))
            .route(
                "/admin/livestock/{id}/images/{image_id}",
                delete(admin::remove_image::<R>),
            )
            .route("/admin/orders", get(admin::list_orders::<R>))
            .route("/admin/orders/{id}", get(admin::get_order::<R>))
            .route("/admin/orders/{id}/approve", post(admin::approve::<R>))
            .route("/admin/orders/{id}/deliver", post(admin::deliver::<R>))
            .route("/admin/orders/{id}/reject", post(admin::reject::<R>))
            .route("/admin/orders/{id}/status", patch(admin::update_status::<R>))
            .route("/admin/users", get(admin::users::<R>))
            .route("/admin/stats", get(admin::stats::<R>))
            .route("/admin/notifications", get(admin::notifications::<R>))
            .route(
                "/admin/notifications/read",
                post(admin::mark_notifications_read::<R>),
            )
            .layer(DefaultBodyLimit::max(self.config.max_upload_bytes))
            .layer(trace_layer)
            .with_state(self.state.clone())
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("starting server on {}", addr);
        self.serve(listener).await
    }

    /// Serves on an already bound listener until ctrl-c.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let app = self.router();
        serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        tracing::info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn health() -> (axum::http::StatusCode, Json<serde_json::Value>) {
    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({ "status": "ok" })),
    )
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|e| AppError::BadRequest(format!("invalid id {raw}: {e}")))
}
