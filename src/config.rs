use std::{env, time::Duration};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub migrations_dir: String,
    /// Decrement stock inside the checkout transaction and refuse to oversell.
    /// Off by default: checkout never touches stock unless asked to.
    pub strict_stock: bool,
    /// Session carts untouched for this long are dropped.
    pub cart_idle: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let migrations_dir =
            env::var("MIGRATIONS_DIR").unwrap_or_else(|_| "migrations".to_string());
        let strict_stock = env::var("CHECKOUT_STRICT_STOCK")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        let cart_idle = env::var("CART_IDLE_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60 * 60));
        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            migrations_dir,
            strict_stock,
            cart_idle,
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
