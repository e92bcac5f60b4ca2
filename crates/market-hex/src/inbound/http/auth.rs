//! Session cookie handling and the extractors that guard routes.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use market_types::domain::user::Role;
use market_types::ports::MarketRepository;
use uuid::Uuid;

use super::server::AppState;
use crate::errors::AppError;

pub const SESSION_COOKIE: &str = "token";

/// The caller behind a valid session cookie.
///
/// ```rust,ignore
/// async fn handler<R: MarketRepository>(user: AuthUser) -> String {
///     format!("hello {}", user.name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// An [`AuthUser`] whose token carries the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl<R: MarketRepository> FromRequestParts<Arc<AppState<R>>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<R>>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("authentication required".into()))?;
        let claims = state.services.auth.verify_token(&token)?;
        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
            role: claims.role,
        })
    }
}

impl<R: MarketRepository> FromRequestParts<Arc<AppState<R>>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<R>>,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::info!(user_id = %user.id, path = %parts.uri.path(), "admin route refused");
            return Err(AppError::Forbidden("admin access required".into()));
        }
        Ok(AdminUser(user))
    }
}

pub(crate) fn session_cookie(token: String, ttl: chrono::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .secure(secure)
        .build()
}

pub(crate) fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}
