//! Runtime configuration: connection, auth, media, admin and server settings.
//! Defaults mirror a local development setup; every value can be overridden from the environment.

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data.db";

#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// sqlx SQLite URL, already normalized (see [`normalize_database_url`]).
    pub url: String,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub enabled: bool,
    pub jwt_secret: String,
    pub cookie_name: String,
    pub token_ttl_secs: u64,
    pub allow_register: bool,
    pub seed_email: Option<String>,
    pub seed_password: Option<String>,
}

#[derive(Clone, Debug)]
pub struct MediaConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub max_size: usize,
}

#[derive(Clone, Debug)]
pub struct AdminConfig {
    pub basepath: String,
    /// Where the admin UI sends the user after logout / via its logo.
    pub logo_return_path: String,
    /// Origin the admin bundle uses for API calls.
    pub base_url: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub connection: ConnectionConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
    pub admin: AdminConfig,
    pub bind_addr: SocketAddr,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            connection: ConnectionConfig {
                url: DEFAULT_DATABASE_URL.into(),
            },
            auth: AuthConfig {
                enabled: true,
                jwt_secret: random_secret(),
                cookie_name: "auth".into(),
                token_ttl_secs: 86_400,
                allow_register: true,
                seed_email: None,
                seed_password: None,
            },
            media: MediaConfig {
                enabled: true,
                path: PathBuf::from("./public/uploads"),
                max_size: 10 * 1024 * 1024,
            },
            admin: AdminConfig {
                basepath: "/admin".into(),
                logo_return_path: "/../".into(),
                base_url: "http://localhost:3000".into(),
            },
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get("DATABASE_URL") {
            config.connection.url = normalize_database_url(&url);
        }
        if let Some(addr) = get("BIND_ADDR") {
            config.bind_addr = parse("BIND_ADDR", &addr)?;
        }
        if let Some(url) = get("PUBLIC_URL") {
            config.admin.base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(v) = get("AUTH_ENABLED") {
            config.auth.enabled = parse_flag("AUTH_ENABLED", &v)?;
        }
        match get("AUTH_JWT_SECRET") {
            Some(secret) => config.auth.jwt_secret = secret,
            None if config.auth.enabled => {
                tracing::warn!("AUTH_JWT_SECRET not set; sessions will not survive a restart");
            }
            None => {}
        }
        if let Some(name) = get("AUTH_COOKIE_NAME") {
            config.auth.cookie_name = name;
        }
        if let Some(v) = get("AUTH_TOKEN_TTL_SECS") {
            config.auth.token_ttl_secs = parse("AUTH_TOKEN_TTL_SECS", &v)?;
        }
        if let Some(v) = get("AUTH_ALLOW_REGISTER") {
            config.auth.allow_register = parse_flag("AUTH_ALLOW_REGISTER", &v)?;
        }
        config.auth.seed_email = get("AUTH_SEED_EMAIL");
        config.auth.seed_password = get("AUTH_SEED_PASSWORD");

        if let Some(v) = get("MEDIA_ENABLED") {
            config.media.enabled = parse_flag("MEDIA_ENABLED", &v)?;
        }
        if let Some(path) = get("MEDIA_PATH") {
            config.media.path = PathBuf::from(path);
        }
        if let Some(v) = get("MEDIA_MAX_SIZE") {
            config.media.max_size = parse("MEDIA_MAX_SIZE", &v)?;
        }

        Ok(config)
    }

    pub fn is_in_memory(&self) -> bool {
        self.connection.url.contains(":memory:") || self.connection.url.contains("mode=memory")
    }
}

/// Accepts sqlx URLs as-is and turns bare paths (`data.db`) into `sqlite://data.db`.
pub fn normalize_database_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw == ":memory:" {
        return "sqlite::memory:".into();
    }
    if raw.starts_with("sqlite:") {
        return raw.to_string();
    }
    let path = raw.strip_prefix("file:").unwrap_or(raw);
    format!("sqlite://{}", path)
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{} has an invalid value: {}", key, value)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Validation(format!("{} must be a boolean, got {}", key, value))),
    }
}

fn random_secret() -> String {
    format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
}
