use std::sync::Arc;

use meditrack_core::auth::{AllowList, GoogleTokenInfo, TokenSigner};
use meditrack_core::storage::LogFormat;
use meditrack_core::{Config, ConfigError, Database};
use meditrack_server::{create_app, AppState};
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
    tracing::info!("shutting down");
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let secret = config
        .server
        .jwt_secret
        .clone()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConfigError::MissingKey("server.jwt_secret (or MEDITRACK_JWT_SECRET)".into()))?;

    let store = match &config.server.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::open()?,
    };

    if config.server.google_client_id.is_none() {
        tracing::warn!("google_client_id is not set; ID token audience will not be checked");
    }
    let identity = GoogleTokenInfo::new(config.server.google_client_id.clone())?;

    let allow_list = AllowList::new(&config.server.allowed_emails);
    if !allow_list.is_configured() {
        tracing::warn!("allowed_emails is empty; every sign-in will be denied");
    }

    let state = AppState::new(
        store,
        TokenSigner::new(secret),
        Arc::new(identity),
        allow_list,
        config.analytics.max_range_days,
    );
    let app = create_app(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    tracing::info!(addr = %config.server.bind_addr, "Meditrack backend listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let config = match Config::load() {
        Ok(config) => config.with_env_overrides(),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(config.server.log_format);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "server failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
