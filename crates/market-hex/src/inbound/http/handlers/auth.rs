use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;
use market_types::domain::user::{Address, CartItem, User, UserView};
use market_types::ports::MarketRepository;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::inbound::http::auth::{clear_session, session_cookie, AuthUser};
use crate::inbound::http::server::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    user: UserView,
    cart: Vec<CartItem>,
    wishlist: Vec<Uuid>,
    addresses: Vec<Address>,
    unread_notifications: usize,
}

impl From<User> for MeResponse {
    fn from(user: User) -> Self {
        Self {
            user: UserView::from(&user),
            unread_notifications: user.unread_notifications(),
            cart: user.cart,
            wishlist: user.wishlist,
            addresses: user.addresses,
        }
    }
}

fn start_session<R: MarketRepository>(
    state: &AppState<R>,
    jar: CookieJar,
    token: String,
) -> CookieJar {
    let ttl = state.services.auth.keys().ttl();
    jar.add(session_cookie(token, ttl, state.cookie_secure))
}

pub(crate) async fn register<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<UserView>), AppError> {
    let (user, token) = state
        .services
        .auth
        .register(payload.name, payload.email, payload.password)
        .await?;
    let jar = start_session(&state, jar, token);
    Ok((StatusCode::CREATED, jar, Json(UserView::from(&user))))
}

pub(crate) async fn login<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<UserView>), AppError> {
    let (user, token) = state
        .services
        .auth
        .login(payload.email, payload.password)
        .await?;
    let jar = start_session(&state, jar, token);
    Ok((jar, Json(UserView::from(&user))))
}

pub(crate) async fn logout(jar: CookieJar) -> (StatusCode, CookieJar) {
    (StatusCode::NO_CONTENT, clear_session(jar))
}

pub(crate) async fn me<R: MarketRepository>(
    State(state): State<Arc<AppState<R>>>,
    user: AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let user = state.services.auth.current_user(user.id).await?;
    Ok(Json(MeResponse::from(user)))
}
