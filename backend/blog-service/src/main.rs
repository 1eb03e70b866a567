use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use blog_service::config::StorageBackend;
use blog_service::db::{InMemoryStore, PgStore};
use blog_service::uploads::UploadStore;
use blog_service::{handlers, AppState, Config, MIGRATOR};
use crypto_core::JwtKeys;
use db_pool::{create_pool, DbConfig};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    tracing::error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn build_state(config: &Config) -> io::Result<AppState> {
    let jwt = JwtKeys::from_secret(config.auth.jwt_secret.as_bytes(), config.auth.token_expiry_days)
        .map_err(|e| startup_error("Invalid JWT configuration", e))?;

    let uploads = UploadStore::new(&config.uploads);
    uploads
        .ensure_dir()
        .await
        .map_err(|e| startup_error("Failed to create upload directory", e))?;
    tracing::info!(dir = %uploads.dir().display(), "Upload directory ready");

    match config.database.backend {
        StorageBackend::Postgres => {
            let mut db_cfg = DbConfig::from_env("blog-service", &config.database.url);
            db_cfg.max_connections = config.database.max_connections;
            db_cfg.log_config();

            let pool = create_pool(db_cfg)
                .await
                .map_err(|e| startup_error("Failed to create database pool", e))?;
            MIGRATOR
                .run(&pool)
                .await
                .map_err(|e| startup_error("Database migration failed", e))?;
            tracing::info!("Connected to database, migrations applied");

            Ok(AppState::with_postgres(PgStore::new(pool), jwt, uploads, config.feed))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(AppState::with_memory(
                Arc::new(InMemoryStore::new()),
                jwt,
                uploads,
                config.feed,
            ))
        }
    }
}

/// Blog Service
///
/// # Routes
///
/// - `/api/auth/*` - signup, login, profile
/// - `/api/posts/*` - feed, posts, likes, comments
/// - `/uploads/{name}` - stored images
/// - `/api/health`, `/api/health/live`
#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting blog-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        env = %config.app.env,
        storage = %config.database.backend,
        "Configuration loaded"
    );

    let state = web::Data::new(build_state(&config).await?);

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(&bind_address)?
    .run();

    let server_handle = server.handle();
    let mut server_task = actix_rt::spawn(server);

    let result = tokio::select! {
        result = &mut server_task => result,
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
            server_task.await
        }
    };

    match result {
        Ok(outcome) => outcome?,
        Err(e) => return Err(startup_error("HTTP server task failed", e)),
    }

    tracing::info!("blog-service shut down");
    Ok(())
}
