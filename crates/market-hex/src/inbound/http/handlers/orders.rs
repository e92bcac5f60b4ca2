use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use market_types::domain::order::Order;
use market_types::ports::MarketRepository;

use crate::application::order_service::CheckoutRequest;
use crate::errors::AppError;
use crate::inbound::http::auth::AuthUser;
use crate::inbound::http::server::{parse_id, AppState};
use crate::inbound::http::upload::Form;

/// Multipart checkout: an optional `order` JSON part and an optional
/// `proof` image.
pub(crate) async fn create<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let mut form = Form::read(multipart).await?;
    let request: CheckoutRequest = form.json("order")?.unwrap_or_default();
    let proof = form.file("proof");
    let order = state
        .services
        .orders
        .create_order(user.id, request, proof)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub(crate) async fn list_mine<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    user: AuthUser,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(state.services.orders.list_my_orders(user.id).await?))
}

pub(crate) async fn get_mine<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(state.services.orders.get_my_order(user.id, id).await?))
}

pub(crate) async fn cancel<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(state.services.orders.cancel_order(user.id, id).await?))
}

pub(crate) async fn upload_proof<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    user: AuthUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Order>, AppError> {
    let id = parse_id(&id)?;
    let mut form = Form::read(multipart).await?;
    let proof = form
        .file("proof")
        .ok_or_else(|| AppError::BadRequest("proof file required".into()))?;
    let order = state
        .services
        .orders
        .upload_proof(user.id, id, proof)
        .await?;
    Ok(Json(order))
}

pub(crate) async fn proof_image<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let image = state
        .services
        .orders
        .proof_image(user.id, user.is_admin(), id)
        .await?;
    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, "private, no-store".to_string()),
        ],
        image.data,
    ))
}
