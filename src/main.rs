use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::info;

use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use http::{Method, header::CONTENT_TYPE};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use anyhow::anyhow;

use callbot_gateway::{ServerConfig, routes, state::AppState};

/// Call bot gateway - Twilio media streams to a voice ordering assistant
#[derive(Parser, Debug)]
#[command(name = "callbot-gateway")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Must be installed before any TLS connection is attempted
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    let config = if let Some(config_path) = cli.config {
        println!("Loading configuration from {}", config_path.display());
        ServerConfig::from_file(&config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    let address = config.address();
    let tls_config = config.tls.clone();
    let cors_origins = config.cors_allowed_origins.clone();
    println!("Starting server on {address}");

    let app_state = AppState::new(config).await?;

    let cors_layer = match cors_origins.as_deref() {
        Some("*") => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE])
            .allow_credentials(false),
        Some(origins) => {
            // Parse comma-separated origins
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([CONTENT_TYPE])
        }
        None => {
            info!(
                "CORS not configured, defaulting to same-origin only. \
                 Set CORS_ALLOWED_ORIGINS to enable cross-origin access."
            );
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([CONTENT_TYPE])
        }
    };

    let security_headers = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_CONTENT_TYPE_OPTIONS,
            http::HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_FRAME_OPTIONS,
            http::HeaderValue::from_static("DENY"),
        ));

    let app = routes::create_router(app_state)
        .layer(cors_layer)
        .layer(security_headers);

    let socket_addr: SocketAddr = address
        .parse()
        .map_err(|e| anyhow!("Invalid server address '{}': {}", address, e))?;

    if let Some(tls) = tls_config {
        let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
            .await
            .map_err(|e| {
                anyhow!(
                    "Failed to load TLS certificates from {} and {}: {}",
                    tls.cert_path.display(),
                    tls.key_path.display(),
                    e
                )
            })?;

        println!("Server listening on https://{} (TLS enabled)", socket_addr);

        axum_server::bind_rustls(socket_addr, rustls_config)
            .serve(app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|e| anyhow!("TLS server error: {}", e))?;
    } else {
        println!("Server listening on http://{}", socket_addr);

        let listener = TcpListener::bind(&socket_addr).await?;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
    }

    Ok(())
}
