//! Shared test utilities for integration tests.
//!
//! `TestClient` drives the full router against a fresh in-memory database with
//! a frozen clock, so "today" and "this month" are stable across runs.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use spendlog::clock::FixedClock;
use spendlog::config::{AuthMode, Config, DEFAULT_CURRENCY_SYMBOL};
use spendlog::db::queries::expenses;
use spendlog::db::{create_in_memory_pool, migrations};
use spendlog::models::Expense;
use spendlog::server;
use spendlog::services::stats::AverageBasis;
use spendlog::state::AppState;
use spendlog::xsrf::XSRF_FORM_FIELD;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower::ServiceExt;

/// 2026-10-19 12:00:00 UTC.
pub const NOW: i64 = 1_792_411_200_000;
/// 2026-10-01 12:00:00 UTC.
pub const OCT_1: i64 = 1_790_856_000_000;
/// 2026-09-15 12:00:00 UTC.
pub const SEP_15: i64 = 1_789_473_600_000;

/// Argon2id hash of `testpass123`.
pub const TEST_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$rJQH0emBAuPPLwwjO9XGAN1BANE";

pub struct Response {
    pub status: StatusCode,
    pub location: Option<String>,
    pub set_cookie: Option<String>,
    pub body: String,
}

/// A test client over the production router with a frozen clock.
pub struct TestClient {
    state: AppState,
}

impl TestClient {
    /// Fresh in-memory database, auth disabled.
    pub fn new() -> Self {
        Self::build(AuthMode::Unauthenticated, AverageBasis::CurrentDay)
    }

    pub fn with_auth_mode(auth_mode: AuthMode) -> Self {
        Self::build(auth_mode, AverageBasis::CurrentDay)
    }

    pub fn with_average_basis(basis: AverageBasis) -> Self {
        Self::build(AuthMode::Unauthenticated, basis)
    }

    fn build(auth_mode: AuthMode, average_basis: AverageBasis) -> Self {
        let pool = create_in_memory_pool().expect("Failed to create in-memory pool");
        {
            let conn = pool.get().expect("Failed to get connection");
            migrations::run_migrations(&conn, Path::new("migrations"))
                .expect("Failed to run migrations");
        }

        let config = Config {
            host: "127.0.0.1".into(),
            port: 7070,
            database_path: PathBuf::from(":memory:"),
            migrations_path: PathBuf::from("migrations"),
            static_path: PathBuf::from("static"),
            auth_mode,
            average_basis,
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.into(),
        };

        let state = AppState::new(pool, config, Arc::new(FixedClock::at_millis(NOW)));
        Self { state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        server::router(self.state.clone())
    }

    async fn send(&self, request: Request<Body>) -> Response {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let header_value = |name| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let location = header_value(header::LOCATION);
        let set_cookie = header_value(header::SET_COOKIE);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        Response {
            status,
            location,
            set_cookie,
            body: String::from_utf8_lossy(&body).to_string(),
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        let response = self.get_full(uri, None).await;
        (response.status, response.body)
    }

    /// GET with an optional `Cookie` header, keeping headers for inspection.
    pub async fn get_full(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// POST a form the way a rendered page would, XSRF token included.
    pub async fn post_form(&self, uri: &str, form_data: &[(&str, &str)]) -> Response {
        let token = self.state.xsrf_token.value().to_string();
        let mut fields = form_data.to_vec();
        fields.push((XSRF_FORM_FIELD, &token));
        self.post_form_raw(uri, &fields, None).await
    }

    /// POST exactly the given fields, optionally with a `Cookie` header.
    pub async fn post_form_raw(
        &self,
        uri: &str,
        form_data: &[(&str, &str)],
        cookie: Option<&str>,
    ) -> Response {
        let body = form_data
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    pub fn xsrf_token(&self) -> &str {
        self.state.xsrf_token.value()
    }

    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        uri: &str,
    ) -> (StatusCode, Option<T>) {
        let (status, body) = self.get(uri).await;
        let parsed = serde_json::from_str(&body).ok();
        (status, parsed)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Add an expense through the ledger form, as the browser would.
    pub async fn add_expense(&self, category_id: &str, title: &str, amount: &str) -> Response {
        self.post_form(
            "/expenses/create",
            &[
                ("category_id", category_id),
                ("title", title),
                ("description", ""),
                ("amount", amount),
            ],
        )
        .await
    }

    pub async fn expenses(&self) -> Vec<Expense> {
        let (status, list) = self.get_json::<Vec<Expense>>("/api/expenses").await;
        assert_eq!(status, StatusCode::OK);
        list.expect("expense list should be JSON")
    }

    /// Insert straight into the store, bypassing the clock.
    pub fn insert(&self, id: &str, category_id: &str, title: &str, cents: i64, created_at: i64) {
        let conn = self.state.db.get().unwrap();
        expenses::insert_expense(
            &conn,
            &Expense {
                id: id.into(),
                category_id: category_id.into(),
                title: title.into(),
                description: None,
                amount_cents: cents,
                created_at,
            },
        )
        .unwrap();
    }
}
