//! Admin session service binary.

use std::net::SocketAddr;

use admin_config::{init_logging, AdminConfig};
use admin_server::{router, AppState};
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "outstatic-admin", about = "Admin session service")]
struct Args {
    /// Address to bind the HTTP server to.
    #[arg(long, env = "OST_BIND", default_value = "127.0.0.1:8080")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = AdminConfig::new();
    init_logging(&config.log_level);

    if config.cookie_secret == admin_config::DEV_COOKIE_SECRET {
        warn!("OST_COOKIE_SECRET is not set; using the development secret");
    }

    let state = AppState::new(config);
    let app = router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    info!(addr = %args.bind, "Admin session service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutting down");
}
