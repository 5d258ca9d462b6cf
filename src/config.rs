use anyhow::Context;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,

    pub jwt_secret: String,
    pub jwt_access_ttl_secs: i64,
    pub app_password_hash: String,

    // Weather enrichment; lookups are skipped without a key
    pub weather_api_key: Option<String>,
    pub weather_base_url: String,
    pub latitude: f64,
    pub longitude: f64,

    // Image storage
    pub image_dir: PathBuf,
    pub image_signing_secret: String,
    pub image_url_ttl_secs: i64,
    pub image_max_bytes: usize,
    pub public_base_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var("PORT", "8080")?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            // In dev, also allow LAN access (e.g. testing from a phone)
            cors_extra_origins: env::var("CORS_EXTRA_ORIGINS")
                .map(|extra| {
                    extra
                        .split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),

            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_access_ttl_secs: parse_var("JWT_ACCESS_TTL_SECS", "86400")?,
            app_password_hash: env::var("APP_PASSWORD_HASH")
                .context("APP_PASSWORD_HASH must be set (see `gratitude-api hash-password`)")?,

            weather_api_key: env::var("WEATHER_API_KEY").ok().filter(|s| !s.is_empty()),
            weather_base_url: env::var("WEATHER_BASE_URL")
                .unwrap_or_else(|_| "https://api.openweathermap.org".into()),
            latitude: parse_var("LAT", "0")?,
            longitude: parse_var("LONG", "0")?,

            image_dir: env::var("IMAGE_DIR")
                .unwrap_or_else(|_| "./images".into())
                .into(),
            image_signing_secret: env::var("IMAGE_SIGNING_SECRET")
                .context("IMAGE_SIGNING_SECRET must be set")?,
            image_url_ttl_secs: parse_var("IMAGE_URL_TTL_SECS", "3600")?,
            image_max_bytes: parse_var("IMAGE_MAX_BYTES", "10485760")?,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(name: &str, default: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(name)
        .unwrap_or_else(|_| default.into())
        .parse()
        .with_context(|| format!("{name} must be a number"))
}

#[cfg(test)]
impl Config {
    /// In-memory SQLite, no weather, images under `image_dir`.
    pub fn for_tests(image_dir: PathBuf) -> Self {
        Self {
            database_url: "sqlite::memory:".into(),
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:3000".into(),
            cors_extra_origins: Vec::new(),
            jwt_secret: "test-secret".into(),
            jwt_access_ttl_secs: 900,
            app_password_hash: String::new(),
            weather_api_key: None,
            weather_base_url: "http://127.0.0.1:9".into(),
            latitude: 51.5,
            longitude: -0.12,
            image_dir,
            image_signing_secret: "test-image-secret".into(),
            image_url_ttl_secs: 600,
            image_max_bytes: 1024 * 1024,
            public_base_url: "http://journal.test".into(),
        }
    }
}
