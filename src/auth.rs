//! Login gate.
//!
//! Whether a login is required is decided by configuration alone: an Argon2
//! hash in `SPENDLOG_PASSWORD_HASH` turns the gate on, the explicit value
//! `DANGEROUSLY_ALLOW_UNAUTHENTICATED_USERS` turns it off, and anything else
//! refuses to start (see [`crate::config`]).
//!
//! Session tokens are random UUIDs held in memory, so a restart signs
//! everybody out.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use askama::Template;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::config::AuthMode;
use crate::error::RenderHtml;
use crate::state::AppState;
use crate::VERSION;

pub const SESSION_COOKIE: &str = "session";

/// Live session tokens.
#[derive(Debug, Clone, Default)]
pub struct Sessions(Arc<Mutex<HashSet<String>>>);

impl Sessions {
    fn tokens(&self) -> MutexGuard<'_, HashSet<String>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a session and return its token.
    pub fn open(&self) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens().insert(token.clone());
        token
    }

    pub fn is_open(&self, token: &str) -> bool {
        self.tokens().contains(token)
    }

    pub fn close(&self, token: &str) -> bool {
        self.tokens().remove(token)
    }

    pub fn len(&self) -> usize {
        self.tokens().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub title: String,
    pub version: &'static str,
    pub nav: &'static str,
    pub show_logout: bool,
    pub xsrf_token: String,
    pub error: Option<String>,
}

impl LoginTemplate {
    fn new(state: &AppState, error: Option<String>) -> Self {
        Self {
            title: "Login".into(),
            version: VERSION,
            nav: "login",
            show_logout: false,
            xsrf_token: state.xsrf(),
            error,
        }
    }

    pub fn error_text(&self) -> &str {
        self.error.as_deref().unwrap_or("")
    }

    fn respond(self, status: StatusCode) -> Response {
        match self.render_html() {
            Ok(html) => (status, html).into_response(),
            Err(e) => e.into_response(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginFormData {
    pub password: String,
}

/// How the gate treats a request path when there is no valid session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anonymous {
    Allow,
    Unauthorized,
    RedirectToLogin,
}

fn classify(path: &str) -> Anonymous {
    if path == "/login" || path == "/health" || path.starts_with("/static/") {
        Anonymous::Allow
    } else if path.starts_with("/api/") {
        Anonymous::Unauthorized
    } else {
        Anonymous::RedirectToLogin
    }
}

/// Whether the request carries a live session cookie.
pub fn has_session(state: &AppState, cookies: &Cookies) -> bool {
    cookies
        .get(SESSION_COOKIE)
        .is_some_and(|cookie| state.sessions.is_open(cookie.value()))
}

fn session_cookie(value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build()
}

/// Redirects anonymous browsers to `/login` and answers 401 to API callers.
pub async fn auth_middleware(
    State(state): State<AppState>,
    cookies: Cookies,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.requires_login() || has_session(&state, &cookies) {
        return next.run(request).await;
    }

    let path = request.uri().path();
    match classify(path) {
        Anonymous::Allow => next.run(request).await,
        Anonymous::Unauthorized => {
            (StatusCode::UNAUTHORIZED, "Authentication required").into_response()
        }
        Anonymous::RedirectToLogin => {
            tracing::debug!(%path, "Redirecting anonymous request to login");
            Redirect::to("/login").into_response()
        }
    }
}

pub async fn login_page(State(state): State<AppState>) -> Response {
    if !state.config.requires_login() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate::new(&state, None).respond(StatusCode::OK)
}

pub async fn login_submit(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<LoginFormData>,
) -> Response {
    let AuthMode::Password(hash) = &state.config.auth_mode else {
        return Redirect::to("/").into_response();
    };

    if !verify_password(&form.password, hash) {
        tracing::warn!("Login failed: invalid password");
        return LoginTemplate::new(&state, Some("Invalid password".into()))
            .respond(StatusCode::UNAUTHORIZED);
    }

    cookies.add(session_cookie(state.sessions.open()));
    tracing::info!(active_sessions = state.sessions.len(), "Login succeeded");
    Redirect::to("/").into_response()
}

pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> Redirect {
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        state.sessions.close(cookie.value());
    }
    cookies.remove(session_cookie(String::new()));
    Redirect::to("/login")
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "SPENDLOG_PASSWORD_HASH is not a valid Argon2 hash");
            false
        }
    }
}
