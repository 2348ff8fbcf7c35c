use std::path::PathBuf;
use std::time::Duration;

use gemellifix_ai::http::{DEFAULT_BASE_URL, DEFAULT_MODEL};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// Every field except the JWT secret and the database URL has a default
/// suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub ai: AiConfig,
    /// First administrator to create when the users table is empty.
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Where uploaded files live and how they are addressed.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory the local blob store writes under.
    pub root: PathBuf,
    /// URL prefix the files are served from (mounted by the router).
    pub public_url: String,
}

/// Model gateway settings. Without an API key the AI endpoints answer 502.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `HOST`                     | `0.0.0.0`               |
    /// | `PORT`                     | `3000`                  |
    /// | `CORS_ORIGINS`             | `http://localhost:9002` |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                    |
    /// | `STORAGE_ROOT`             | `./uploads`             |
    /// | `STORAGE_PUBLIC_URL`       | `/files`                |
    /// | `AI_API_KEY`               | unset (AI disabled)     |
    /// | `AI_MODEL`                 | `gemini-2.0-flash`      |
    /// | `AI_BASE_URL`              | Gemini v1beta endpoint  |
    /// | `AI_TIMEOUT_SECS`          | `60`                    |
    /// | `BOOTSTRAP_ADMIN_EMAIL`    | unset                   |
    /// | `BOOTSTRAP_ADMIN_PASSWORD` | unset                   |
    ///
    /// JWT settings come from [`JwtConfig::from_env`].
    pub fn from_env() -> Self {
        let host = env_or("HOST", "0.0.0.0");

        let port: u16 = env_or("PORT", "3000")
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:9002")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", "30")
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let storage = StorageConfig {
            root: PathBuf::from(env_or("STORAGE_ROOT", "./uploads")),
            public_url: env_or("STORAGE_PUBLIC_URL", "/files")
                .trim_end_matches('/')
                .to_string(),
        };

        let ai_timeout_secs: u64 = env_or("AI_TIMEOUT_SECS", "60")
            .parse()
            .expect("AI_TIMEOUT_SECS must be a valid u64");
        let ai = AiConfig {
            api_key: non_empty_env("AI_API_KEY"),
            model: env_or("AI_MODEL", DEFAULT_MODEL),
            base_url: env_or("AI_BASE_URL", DEFAULT_BASE_URL),
            timeout: Duration::from_secs(ai_timeout_secs),
        };

        let bootstrap_admin = match (
            non_empty_env("BOOTSTRAP_ADMIN_EMAIL"),
            non_empty_env("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            _ => None,
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            storage,
            ai,
            bootstrap_admin,
        }
    }
}
