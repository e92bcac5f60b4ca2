use serde::Deserialize;
use std::env;
use std::str::FromStr;

pub const DEV_JWT_SECRET: &str = "dev-only-insecure-secret";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub cookie_secure: bool,
    pub admin_emails: Vec<String>,
    pub order_expiry_minutes: i64,
    pub sweep_interval_secs: u64,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: "3000".into(),
            database_url: None,
            jwt_secret: DEV_JWT_SECRET.into(),
            token_ttl_hours: 24,
            cookie_secure: false,
            admin_emails: Vec::new(),
            order_expiry_minutes: 24 * 60,
            sweep_interval_secs: 60,
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

fn parsed<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {key}: {e}")),
        Err(_) => Ok(default),
    }
}

pub fn parse_admin_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let server_port = env::var("SERVER_PORT").unwrap_or(defaults.server_port);
        let database_url = env::var("DATABASE_URL").ok().filter(|u| !u.is_empty());
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                tracing::warn!("JWT_SECRET not set; using the development secret");
                defaults.jwt_secret
            }
        };
        let admin_emails = env::var("ADMIN_EMAILS")
            .map(|raw| parse_admin_emails(&raw))
            .unwrap_or_default();

        let cfg = Self {
            server_port,
            database_url,
            jwt_secret,
            token_ttl_hours: parsed("TOKEN_TTL_HOURS", defaults.token_ttl_hours)?,
            cookie_secure: parsed("COOKIE_SECURE", defaults.cookie_secure)?,
            admin_emails,
            order_expiry_minutes: parsed("ORDER_EXPIRY_MINUTES", defaults.order_expiry_minutes)?,
            sweep_interval_secs: parsed("SWEEP_INTERVAL_SECS", defaults.sweep_interval_secs)?,
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
        };
        if cfg.token_ttl_hours <= 0 || cfg.order_expiry_minutes <= 0 || cfg.sweep_interval_secs == 0 {
            anyhow::bail!("TOKEN_TTL_HOURS, ORDER_EXPIRY_MINUTES and SWEEP_INTERVAL_SECS must be positive");
        }
        Ok(cfg)
    }

    pub fn order_expiry(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.order_expiry_minutes)
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|a| *a == email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_emails_are_normalized() {
        let cfg = Config {
            admin_emails: parse_admin_emails(" Boss@Farm.io, ,ops@farm.io"),
            ..Config::default()
        };
        assert_eq!(cfg.admin_emails, vec!["boss@farm.io", "ops@farm.io"]);
        assert!(cfg.is_admin_email("BOSS@farm.io"));
        assert!(!cfg.is_admin_email("guest@farm.io"));
    }

    #[test]
    fn default_expiry_is_a_day() {
        assert_eq!(Config::default().order_expiry(), chrono::Duration::hours(24));
    }
}
