//! Cross-site request forgery guard for the ledger and login forms.
//!
//! Every page embeds a per-process token in a hidden `_xsrf_token` field. A
//! POST must echo it, either in that field or in the `X-XSRF-Token` header,
//! or it is refused with 403 before reaching a handler. This matters most
//! when authentication is switched off, since no session cookie stands in
//! the way of a foreign page posting to `/expenses/create`.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use uuid::Uuid;

use crate::state::AppState;

pub const XSRF_HEADER: &str = "X-XSRF-Token";
pub const XSRF_FORM_FIELD: &str = "_xsrf_token";

/// Form bodies larger than this are refused outright.
const MAX_FORM_BYTES: usize = 64 * 1024;

/// The token pages embed and POSTs must return. Regenerated on every start.
#[derive(Debug, Clone)]
pub struct XsrfToken(Arc<str>);

impl XsrfToken {
    pub fn generate() -> Self {
        Self(Arc::from(Uuid::new_v4().to_string()))
    }

    pub fn value(&self) -> &str {
        &self.0
    }

    fn matches(&self, candidate: &str) -> bool {
        !candidate.is_empty() && candidate == self.value()
    }
}

/// Token carried by an urlencoded form body, if any.
pub fn form_token(body: &[u8]) -> Option<String> {
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)
        .ok()?
        .into_iter()
        .find_map(|(key, value)| (key == XSRF_FORM_FIELD).then_some(value))
}

pub async fn xsrf_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if *request.method() != Method::POST {
        return next.run(request).await;
    }

    let expected = &state.xsrf_token;
    let path = request.uri().path().to_string();

    if let Some(header) = request.headers().get(XSRF_HEADER) {
        let valid = header.to_str().is_ok_and(|token| expected.matches(token));
        return if valid {
            next.run(request).await
        } else {
            rejected(&path)
        };
    }

    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
    if !is_form {
        return rejected(&path);
    }

    let (parts, body) = request.into_parts();
    let bytes: Bytes = match axum::body::to_bytes(body, MAX_FORM_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return rejected(&path),
    };

    match form_token(&bytes) {
        Some(token) if expected.matches(&token) => {
            next.run(Request::from_parts(parts, Body::from(bytes))).await
        }
        _ => rejected(&path),
    }
}

fn rejected(path: &str) -> Response {
    tracing::warn!(%path, "Rejected POST without a valid XSRF token");
    (StatusCode::FORBIDDEN, "Invalid or missing XSRF token").into_response()
}
