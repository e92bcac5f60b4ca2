//! Typed HTTP client for the marketplace API. Sessions ride on the `token`
//! cookie, so the default client keeps a cookie store.

use std::time::Duration;

use anyhow::Context;
use market_types::domain::livestock::{Livestock, LivestockFilter};
use market_types::domain::order::Order;
use market_types::domain::user::{Address, CartItem, UserView};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone)]
pub struct MarketClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

#[derive(Clone)]
pub struct MarketClient {
    base: Url,
    client: reqwest::Client,
}

impl MarketClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<MarketClientBuilder> {
        let base = Url::parse(base_url).context("invalid base url")?;
        Ok(MarketClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    async fn send(&self, req: RequestBuilder) -> anyhow::Result<Response> {
        let res = req.send().await?;
        tracing::debug!(status = %res.status(), url = %res.url(), "market api response");
        Ok(res.error_for_status()?)
    }

    async fn json<T: DeserializeOwned>(&self, req: RequestBuilder) -> anyhow::Result<T> {
        Ok(self.send(req).await?.json().await?)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> anyhow::Result<UserView> {
        let body = RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        };
        self.json(self.client.post(self.url("auth/register")?).json(&body))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> anyhow::Result<UserView> {
        let body = LoginRequest {
            email: email.into(),
            password: password.into(),
        };
        self.json(self.client.post(self.url("auth/login")?).json(&body))
            .await
    }

    pub async fn logout(&self) -> anyhow::Result<()> {
        self.send(self.client.post(self.url("auth/logout")?)).await?;
        Ok(())
    }

    pub async fn me(&self) -> anyhow::Result<Profile> {
        self.json(self.client.get(self.url("auth/me")?)).await
    }

    pub async fn list_livestock(&self, filter: &LivestockFilter) -> anyhow::Result<Vec<Livestock>> {
        self.json(self.client.get(self.url("livestock")?).query(filter))
            .await
    }

    pub async fn get_livestock(&self, id: Uuid) -> anyhow::Result<Livestock> {
        self.json(self.client.get(self.url(&format!("livestock/{id}"))?))
            .await
    }

    /// Checks out; the optional proof is `(bytes, content type)`.
    pub async fn create_order(
        &self,
        checkout: &Checkout,
        proof: Option<(Vec<u8>, &str)>,
    ) -> anyhow::Result<Order> {
        let mut form = Form::new().text("order", serde_json::to_string(checkout)?);
        if let Some((bytes, content_type)) = proof {
            let part = Part::bytes(bytes)
                .file_name("proof")
                .mime_str(content_type)
                .context("invalid proof content type")?;
            form = form.part("proof", part);
        }
        self.json(self.client.post(self.url("orders")?).multipart(form))
            .await
    }

    pub async fn list_orders(&self) -> anyhow::Result<Vec<Order>> {
        self.json(self.client.get(self.url("orders")?)).await
    }

    pub async fn get_order(&self, id: Uuid) -> anyhow::Result<Order> {
        self.json(self.client.get(self.url(&format!("orders/{id}"))?))
            .await
    }

    pub async fn cancel_order(&self, id: Uuid) -> anyhow::Result<Order> {
        self.json(
            self.client
                .post(self.url(&format!("orders/{id}/cancel"))?),
        )
        .await
    }
}

impl MarketClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Uses the given client as is; it needs its own cookie store for
    /// authenticated calls.
    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<MarketClient> {
        if let Some(client) = self.client {
            return Ok(MarketClient {
                base: self.base,
                client,
            });
        }

        let mut builder = reqwest::Client::builder().cookie_store(true);
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(MarketClient {
            base: self.base,
            client,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct RegisterRequest {
    name: String,
    email: String,
    password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct LoginRequest {
    email: String,
    password: String,
}

/// Checkout body. With no ids the server uses the cart; with no address the
/// saved default.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Checkout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub livestock_ids: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_id: Option<Uuid>,
}

/// The signed-in account as returned by `/auth/me`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Profile {
    #[serde(flatten)]
    pub user: UserView,
    pub cart: Vec<CartItem>,
    pub wishlist: Vec<Uuid>,
    pub addresses: Vec<Address>,
    pub unread_notifications: usize,
}
