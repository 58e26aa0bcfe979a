use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_cookies::CookieManagerLayer;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::clock::Clock;
use crate::config::Config;
use crate::db::{create_pool, migrations};
use crate::handlers;
use crate::state::AppState;
use crate::xsrf;

/// Build the application state and Axum router from a [`Config`].
///
/// Creates the database pool, runs migrations and assembles the full
/// middleware stack.
pub fn build_app(
    config: Config,
    clock: Arc<dyn Clock>,
) -> Result<(AppState, Router), Box<dyn std::error::Error>> {
    let db = create_pool(&config.database_path)?;

    {
        let conn = db.get()?;
        migrations::run_migrations(&conn, &config.migrations_path)?;
    }

    if !config.requires_login() {
        tracing::warn!("Authentication is disabled by configuration");
    }

    let state = AppState::new(db, config, clock);
    let app = router(state.clone());
    Ok((state, app))
}

/// The full router, auth gate included, over an existing state.
pub fn router(state: AppState) -> Router {
    let static_path = state.config.static_path.clone();

    Router::new()
        .merge(handlers::routes())
        .route("/login", get(auth::login_page))
        .route("/login", post(auth::login_submit))
        .route("/logout", post(auth::logout))
        .fallback(handlers::not_found)
        .nest_service("/static", ServeDir::new(static_path))
        // Runs after the login gate, so anonymous POSTs still go to /login.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            xsrf::xsrf_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .layer(CookieManagerLayer::new())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the router to `host:port` and spawn the server as a tokio task.
///
/// Returns the actual port the server bound to (useful when `port` is 0 for
/// OS-assigned ports) and a [`JoinHandle`] for the server task.
pub async fn serve(
    app: Router,
    host: &str,
    port: u16,
) -> Result<(u16, JoinHandle<()>), Box<dyn std::error::Error>> {
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    let actual_port = listener.local_addr()?.port();

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_port, handle))
}
