use crate::auth::Sessions;
use crate::clock::Clock;
use crate::config::Config;
use crate::db::DbPool;
use crate::models::CategoryRegistry;
use crate::xsrf::XsrfToken;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub clock: Arc<dyn Clock>,
    pub categories: Arc<CategoryRegistry>,
    pub sessions: Sessions,
    pub xsrf_token: XsrfToken,
}

impl AppState {
    pub fn new(db: DbPool, config: Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            clock,
            categories: Arc::new(CategoryRegistry::builtin()),
            sessions: Sessions::default(),
            xsrf_token: XsrfToken::generate(),
        }
    }

    pub fn currency(&self) -> &str {
        &self.config.currency_symbol
    }

    /// Value for the hidden `_xsrf_token` field of rendered forms.
    pub fn xsrf(&self) -> String {
        self.xsrf_token.value().to_string()
    }
}
