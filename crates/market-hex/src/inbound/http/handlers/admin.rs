use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use market_types::domain::livestock::{Livestock, LivestockFilter, LivestockPatch, NewLivestock};
use market_types::domain::notification::AdminNotification;
use market_types::domain::order::{Order, OrderStatus};
use market_types::domain::user::UserView;
use market_types::ports::MarketRepository;
use serde::Deserialize;

use crate::application::admin_service::AdminStats;
use crate::errors::AppError;
use crate::inbound::http::auth::AdminUser;
use crate::inbound::http::server::{parse_id, AppState};
use crate::inbound::http::upload::Form;

type Shared<R> = State<Arc<AppState<R>>>;

#[derive(Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub note: Option<String>,
}

pub(crate) async fn list_livestock<R: MarketRepository>(
    State(state): Shared<R>,
    _admin: AdminUser,
    Query(filter): Query<LivestockFilter>,
) -> Result<Json<Vec<Livestock>>, AppError> {
    Ok(Json(state.services.catalog.list(&filter).await?))
}

/// Multipart: a `livestock` JSON part plus any number of `images`.
pub(crate) async fn create_livestock<R: MarketRepository>(
    State(state): Shared<R>,
    _admin: AdminUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Livestock>), AppError> {
    let mut form = Form::read(multipart).await?;
    let input: NewLivestock = form
        .json("livestock")?
        .ok_or_else(|| AppError::BadRequest("livestock field required".into()))?;
    let item = state
        .services
        .catalog
        .create(input, form.files("images"))
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub(crate) async fn update_livestock<R: MarketRepository>(
    State(state): Shared<R>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(patch): Json<LivestockPatch>,
) -> Result<Json<Livestock>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(state.services.catalog.update(id, patch).await?))
}

pub(crate) async fn delete_livestock<R: MarketRepository>(
    State(state): Shared<R>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    state.services.catalog.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn add_images<R: MarketRepository>(
    State(state): Shared<R>,
    _admin: AdminUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Livestock>, AppError> {
    let id = parse_id(&id)?;
    let mut form = Form::read(multipart).await?;
    let item = state
        .services
        .catalog
        .add_images(id, form.files("images"))
        .await?;
    Ok(Json(item))
}

pub(crate) async fn remove_image<R: MarketRepository>(
    State(state): Shared<R>,
    _admin: AdminUser,
    Path((id, image_id)): Path<(String, String)>,
) -> Result<Json<Livestock>, AppError> {
    let id = parse_id(&id)?;
    let image_id = parse_id(&image_id)?;
    Ok(Json(state.services.catalog.remove_image(id, image_id).await?))
}

pub(crate) async fn list_orders<R: MarketRepository>(
    State(state): Shared<R>,
    _admin: AdminUser,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<OrderStatus>().map_err(AppError::bad_request)?),
        None => None,
    };
    Ok(Json(state.services.orders.list_orders(status).await?))
}

pub(crate) async fn get_order<R: MarketRepository>(
    State(state): Shared<R>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(state.services.orders.get_order(id).await?))
}

pub(crate) async fn approve<R: MarketRepository>(
    State(state): Shared<R>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(state.services.orders.approve(id).await?))
}

pub(crate) async fn deliver<R: MarketRepository>(
    State(state): Shared<R>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(state.services.orders.deliver(id).await?))
}

/// The body is optional; an empty one rejects with the default reason.
pub(crate) async fn reject<R: MarketRepository>(
    State(state): Shared<R>,
    _admin: AdminUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Order>, AppError> {
    let id = parse_id(&id)?;
    let request: RejectRequest = if body.is_empty() {
        RejectRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(AppError::bad_request)?
    };
    Ok(Json(state.services.orders.reject(id, request.reason).await?))
}

pub(crate) async fn update_status<R: MarketRepository>(
    State(state): Shared<R>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, AppError> {
    let id = parse_id(&id)?;
    let updated = state
        .services
        .orders
        .update_status(id, payload.status, payload.note)
        .await?;
    Ok(Json(updated))
}

pub(crate) async fn users<R: MarketRepository>(
    State(state): Shared<R>,
    _admin: AdminUser,
) -> Result<Json<Vec<UserView>>, AppError> {
    Ok(Json(state.services.admin.list_users().await?))
}

pub(crate) async fn stats<R: MarketRepository>(
    State(state): Shared<R>,
    _admin: AdminUser,
) -> Result<Json<AdminStats>, AppError> {
    Ok(Json(state.services.admin.stats().await?))
}

pub(crate) async fn notifications<R: MarketRepository>(
    State(state): Shared<R>,
    _admin: AdminUser,
) -> Result<Json<Vec<AdminNotification>>, AppError> {
    Ok(Json(state.services.admin.notifications().await?))
}

pub(crate) async fn mark_notifications_read<R: MarketRepository>(
    State(state): Shared<R>,
    _admin: AdminUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let updated = state.services.admin.mark_notifications_read().await?;
    Ok(Json(serde_json::json!({ "updated": updated })))
}
