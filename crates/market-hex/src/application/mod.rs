pub mod account_service;
pub mod admin_service;
pub mod auth_service;
pub mod catalog_service;
pub mod expiry;
pub mod order_service;

use std::sync::Arc;

use market_types::domain::livestock::Image;
use market_types::domain::user::User;
use market_types::ports::{MarketRepository, UserRepository};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;

use account_service::AccountService;
use admin_service::AdminService;
use auth_service::{AuthService, TokenKeys};
use catalog_service::CatalogService;
use order_service::OrderService;

/// A file received from a client before it is validated as an image.
#[derive(Debug, Clone)]
pub struct Upload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn into_image(self) -> Result<Image, AppError> {
        Image::new(self.content_type, self.bytes).map_err(AppError::bad_request)
    }
}

/// Every application service, wired to one shared repository.
pub struct Services<R: MarketRepository> {
    pub auth: AuthService<R>,
    pub catalog: CatalogService<R>,
    pub account: AccountService<R>,
    pub orders: Arc<OrderService<R>>,
    pub admin: AdminService<R>,
}

impl<R: MarketRepository> Services<R> {
    pub fn new(repo: R, config: &Config) -> Self {
        let repo = Arc::new(repo);
        let keys = TokenKeys::new(
            config.jwt_secret.as_bytes(),
            chrono::Duration::hours(config.token_ttl_hours),
        );
        Self {
            auth: AuthService::new(repo.clone(), keys, config.admin_emails.clone()),
            catalog: CatalogService::new(repo.clone()),
            account: AccountService::new(repo.clone()),
            orders: Arc::new(OrderService::new(repo.clone(), config.order_expiry())),
            admin: AdminService::new(repo),
        }
    }
}

pub(crate) async fn load_user<R: UserRepository>(repo: &R, id: Uuid) -> Result<User, AppError> {
    repo.get_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))
}

pub(crate) async fn store_user<R: UserRepository>(repo: &R, user: User) -> Result<User, AppError> {
    let id = user.id;
    repo.save_user(user)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))
}
