use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the user. Storage details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::NotFound(msg) | AppError::Validation(msg) => msg.clone(),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Could not read or write your expenses. Please try again.".to_string()
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {:?}", e);
                "Database connection error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                msg.clone()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.public_message();

        let html = format!(
            r#"<div class="error-banner" role="alert">
                <p>{}</p>
                <a href="/">Back to today</a>
            </div>"#,
            html_escape(&message)
        );

        (status, Html(html)).into_response()
    }
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

pub type AppResult<T> = Result<T, AppError>;

pub trait RenderHtml {
    fn render_html(self) -> AppResult<Html<String>>;
}

impl<T: Template> RenderHtml for T {
    fn render_html(self) -> AppResult<Html<String>> {
        self.render()
            .map(Html)
            .map_err(|e| AppError::Internal(format!("Template error: {}", e)))
    }
}
