/// Blog Service Library
///
/// Backend for the Quill social blogging app: accounts, posts with images,
/// likes, comments, and a paginated, searchable feed over REST.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route table
/// - `services`: Feed reads, post lifecycle and engagement, accounts
/// - `db`: Store traits with Postgres and in-memory implementations
/// - `models`: Posts, comments, users and their public views
/// - `middleware`: Bearer-token gate and ownership checks
/// - `uploads`: Image upload storage
/// - `state`: Shared application state
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod uploads;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;

/// Embedded schema migrations for the Postgres store.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
