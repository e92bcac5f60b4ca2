use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use market_types::domain::notification::UserNotification;
use market_types::domain::user::{Address, CartItem};
use market_types::ports::MarketRepository;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::inbound::http::auth::AuthUser;
use crate::inbound::http::server::{parse_id, AppState};

#[derive(Deserialize)]
pub struct IdList {
    pub livestock_ids: Vec<Uuid>,
}

type Shared<R> = State<Arc<AppState<R>>>;

pub(crate) async fn cart<R: MarketRepository>(
    State(state): Shared<R>,
    user: AuthUser,
) -> Result<Json<Vec<CartItem>>, AppError> {
    Ok(Json(state.services.account.profile(user.id).await?.cart))
}

pub(crate) async fn replace_cart<R: MarketRepository>(
    State(state): Shared<R>,
    user: AuthUser,
    Json(body): Json<IdList>,
) -> Result<Json<Vec<CartItem>>, AppError> {
    let cart = state
        .services
        .account
        .replace_cart(user.id, body.livestock_ids)
        .await?;
    Ok(Json(cart))
}

pub(crate) async fn add_to_cart<R: MarketRepository>(
    State(state): Shared<R>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<CartItem>>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(state.services.account.add_to_cart(user.id, id).await?))
}

pub(crate) async fn remove_from_cart<R: MarketRepository>(
    State(state): Shared<R>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<CartItem>>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(
        state.services.account.remove_from_cart(user.id, id).await?,
    ))
}

pub(crate) async fn wishlist<R: MarketRepository>(
    State(state): Shared<R>,
    user: AuthUser,
) -> Result<Json<Vec<Uuid>>, AppError> {
    Ok(Json(state.services.account.profile(user.id).await?.wishlist))
}

pub(crate) async fn replace_wishlist<R: MarketRepository>(
    State(state): Shared<R>,
    user: AuthUser,
    Json(body): Json<IdList>,
) -> Result<Json<Vec<Uuid>>, AppError> {
    let list = state
        .services
        .account
        .replace_wishlist(user.id, body.livestock_ids)
        .await?;
    Ok(Json(list))
}

pub(crate) async fn add_to_wishlist<R: MarketRepository>(
    State(state): Shared<R>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Uuid>>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(
        state.services.account.add_to_wishlist(user.id, id).await?,
    ))
}

pub(crate) async fn remove_from_wishlist<R: MarketRepository>(
    State(state): Shared<R>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Uuid>>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(
        state
            .services
            .account
            .remove_from_wishlist(user.id, id)
            .await?,
    ))
}

pub(crate) async fn addresses<R: MarketRepository>(
    State(state): Shared<R>,
    user: AuthUser,
) -> Result<Json<Vec<Address>>, AppError> {
    Ok(Json(state.services.account.profile(user.id).await?.addresses))
}

pub(crate) async fn replace_addresses<R: MarketRepository>(
    State(state): Shared<R>,
    user: AuthUser,
    Json(body): Json<Vec<Address>>,
) -> Result<Json<Vec<Address>>, AppError> {
    Ok(Json(
        state
            .services
            .account
            .replace_addresses(user.id, body)
            .await?,
    ))
}

pub(crate) async fn add_address<R: MarketRepository>(
    State(state): Shared<R>,
    user: AuthUser,
    Json(body): Json<Address>,
) -> Result<(StatusCode, Json<Vec<Address>>), AppError> {
    let list = state.services.account.add_address(user.id, body).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

pub(crate) async fn remove_address<R: MarketRepository>(
    State(state): Shared<R>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Address>>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(
        state.services.account.remove_address(user.id, id).await?,
    ))
}

pub(crate) async fn notifications<R: MarketRepository>(
    State(state): Shared<R>,
    user: AuthUser,
) -> Result<Json<Vec<UserNotification>>, AppError> {
    Ok(Json(state.services.account.notifications(user.id).await?))
}

pub(crate) async fn mark_notifications_read<R: MarketRepository>(
    State(state): Shared<R>,
    user: AuthUser,
) -> Result<StatusCode, AppError> {
    state
        .services
        .account
        .mark_notifications_read(user.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
