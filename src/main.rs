use spendlog::clock::SystemClock;
use spendlog::config::Config;
use spendlog::server;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spendlog=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Starting spendlog {} on {}", spendlog::VERSION, config.address());

    let host = config.host.clone();
    let port = config.port;
    let (_state, app) =
        server::build_app(config, Arc::new(SystemClock)).expect("Failed to build application");

    let (port, handle) = server::serve(app, &host, port)
        .await
        .expect("Failed to bind address");
    tracing::info!("Listening on http://{}:{}", host, port);

    if let Err(e) = handle.await {
        tracing::error!("Server task failed: {}", e);
    }
}
