//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use auth::infra::{SmtpConfig, SmtpMailer, TwilioConfig, TwilioVerifyClient};
use auth::{AuthConfig, PgAuthRepository, RedisStore, auth_router};
use axum::{
    Router, http,
    http::{Method, header},
};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let repo = PgAuthRepository::new(pool.clone());

    // Startup cleanup: drop long-expired refresh tokens.
    // Errors here should not prevent server startup.
    match repo.cleanup_expired_tokens().await {
        Ok(deleted) => {
            tracing::info!(tokens_deleted = deleted, "Refresh token cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Refresh token cleanup failed, continuing anyway");
        }
    }

    // Ephemeral store
    let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let store = RedisStore::connect(&redis_url).await?;
    tracing::info!("Connected to ephemeral store");

    // Notification transports
    let mailer = SmtpMailer::new(SmtpConfig {
        host: env::var("SMTP_HOST").expect("SMTP_HOST must be set in environment"),
        port: env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse()?,
        username: env::var("SMTP_USERNAME").expect("SMTP_USERNAME must be set in environment"),
        password: env::var("SMTP_PASSWORD").expect("SMTP_PASSWORD must be set in environment"),
        from_name: env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "Clinic".to_string()),
        from_address: env::var("SMTP_FROM_ADDRESS")
            .expect("SMTP_FROM_ADDRESS must be set in environment"),
    })?;

    let phone = TwilioVerifyClient::new(TwilioConfig {
        account_sid: env::var("TWILIO_ACCOUNT_SID")
            .expect("TWILIO_ACCOUNT_SID must be set in environment"),
        auth_token: env::var("TWILIO_AUTH_TOKEN")
            .expect("TWILIO_AUTH_TOKEN must be set in environment"),
        service_sid: env::var("TWILIO_VERIFY_SERVICE_SID")
            .expect("TWILIO_VERIFY_SERVICE_SID must be set in environment"),
    });

    // Auth configuration
    let auth_config = if cfg!(debug_assertions) && env::var("JWT_SECRET").is_err() {
        tracing::warn!("JWT_SECRET not set, using a random secret (development only)");
        AuthConfig::with_random_secret()
    } else {
        AuthConfig {
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set in production"),
            password_pepper: env::var("PASSWORD_PEPPER")
                .ok()
                .map(|p| p.into_bytes()),
            ..AuthConfig::default()
        }
    };

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:5173,http://127.0.0.1:5173".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest(
            "/api/auth",
            auth_router(repo, store, mailer, phone, auth_config),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "31113".to_string())
        .parse()?;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
