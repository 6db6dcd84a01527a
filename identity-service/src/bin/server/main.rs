use std::sync::Arc;

use auth::PasswordHasher;
use auth::TokenCodec;
use identity_service::config::Config;
use identity_service::domain::identity::service::AuthEngine;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::oauth::GoogleOAuthClient;
use identity_service::outbound::repositories::PostgresCredentialStore;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        frontend_url = %config.server.frontend_url,
        access_ttl_minutes = config.jwt.access_ttl_minutes,
        refresh_ttl_days = config.jwt.refresh_ttl_days,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let password_hasher = PasswordHasher::new(config.password.work_factor())?;
    let token_codec = Arc::new(TokenCodec::new(
        config.jwt.secret.as_bytes(),
        config.jwt.access_ttl(),
        config.jwt.refresh_ttl(),
    ));

    let store = Arc::new(PostgresCredentialStore::new(pg_pool));
    let auth_engine = Arc::new(AuthEngine::new(
        store,
        password_hasher,
        Arc::clone(&token_codec),
    ));
    let google = Arc::new(GoogleOAuthClient::new(&config.google)?);

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(
        auth_engine,
        token_codec,
        google,
        config.server.frontend_url.clone(),
    );

    axum::serve(http_listener, http_application).await?;

    Ok(())
}
