/// Configuration management for the blog service
///
/// Everything is read from environment variables (a `.env` file is loaded by
/// `main` beforehand). The resulting `Config` is built once and passed down
/// explicitly; nothing here is global.
use db_pool::env_utils::{env_non_empty, parse_env_or};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Storage configuration
    pub database: DatabaseConfig,
    /// Token settings
    pub auth: AuthConfig,
    /// Feed and comment limits
    pub feed: FeedConfig,
    /// Upload directory and limits
    pub uploads: UploadConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Postgres => write!(f, "postgres"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Storage configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    /// Database URL
    #[serde(skip_serializing)]
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Token settings
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub token_expiry_days: i64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_expiry_days", &self.token_expiry_days)
            .finish()
    }
}

/// Feed pagination and comment limits
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Page size used when the client sends no `limit`
    pub default_page_size: u32,
    /// Larger `limit` values are clamped to this
    pub max_page_size: u32,
    /// Longest accepted comment, in characters
    pub comment_max_length: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 50,
            comment_max_length: 2000,
        }
    }
}

/// Upload directory and limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_file_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let app = AppConfig {
            env: app_env,
            host: std::env::var("BLOG_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env_or("BLOG_SERVICE_PORT", 5001)?,
        };
        let production = app.is_production();

        let cors = {
            let allowed_origins = match env_non_empty("CORS_ALLOWED_ORIGINS") {
                Some(value) => value,
                None if production => {
                    return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                }
                None => "http://localhost:5173".to_string(),
            };

            if production && allowed_origins.trim() == "*" {
                return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
            }

            CorsConfig { allowed_origins }
        };

        let backend: StorageBackend = parse_env_or("STORAGE_BACKEND", StorageBackend::Postgres)?;
        let database = DatabaseConfig {
            backend,
            url: match (env_non_empty("DATABASE_URL"), backend) {
                (Some(url), _) => url,
                (None, StorageBackend::Memory) => String::new(),
                (None, StorageBackend::Postgres) if production => {
                    return Err("DATABASE_URL must be set in production".to_string())
                }
                (None, StorageBackend::Postgres) => "postgresql://localhost/quill".to_string(),
            },
            max_connections: parse_env_or("DATABASE_MAX_CONNECTIONS", 10)?,
        };

        let auth = {
            let jwt_secret = env_non_empty("JWT_SECRET")
                .ok_or_else(|| "JWT_SECRET must be set".to_string())?;
            if production && jwt_secret.len() < crypto_core::jwt::MIN_PRODUCTION_SECRET_BYTES {
                return Err(format!(
                    "JWT_SECRET must be at least {} bytes in production",
                    crypto_core::jwt::MIN_PRODUCTION_SECRET_BYTES
                ));
            }
            let token_expiry_days = parse_env_or(
                "JWT_EXPIRY_DAYS",
                crypto_core::jwt::DEFAULT_TOKEN_EXPIRY_DAYS,
            )?;
            if token_expiry_days <= 0 {
                return Err("JWT_EXPIRY_DAYS must be positive".to_string());
            }
            AuthConfig {
                jwt_secret,
                token_expiry_days,
            }
        };

        let defaults = FeedConfig::default();
        let feed = FeedConfig {
            default_page_size: parse_env_or("FEED_DEFAULT_PAGE_SIZE", defaults.default_page_size)?,
            max_page_size: parse_env_or("FEED_MAX_PAGE_SIZE", defaults.max_page_size)?,
            comment_max_length: parse_env_or("COMMENT_MAX_LENGTH", defaults.comment_max_length)?,
        };
        if feed.max_page_size == 0 || feed.default_page_size == 0 {
            return Err("feed page sizes must be positive".to_string());
        }
        if feed.default_page_size > feed.max_page_size {
            return Err(format!(
                "FEED_DEFAULT_PAGE_SIZE ({}) exceeds FEED_MAX_PAGE_SIZE ({})",
                feed.default_page_size, feed.max_page_size
            ));
        }

        let uploads = UploadConfig {
            dir: env_non_empty("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./uploads")),
            max_file_bytes: parse_env_or("UPLOAD_MAX_FILE_BYTES", 5 * 1024 * 1024)?,
        };

        Ok(Config {
            app,
            cors,
            database,
            auth,
            feed,
            uploads,
        })
    }
}
