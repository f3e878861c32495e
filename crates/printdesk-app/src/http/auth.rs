// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP Basic login in front of every page except the health check.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use printdesk_print::PrintService;

use super::AppState;

/// The logged-in user, available to handlers as an extension.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

pub async fn require_login<S: PrintService>(
    State(state): State<AppState<S>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some((username, password)) = basic_credentials(request.headers().get(header::AUTHORIZATION))
    else {
        return login_required();
    };

    if !state.credentials.verify(&username, &password) {
        debug!(%username, "login rejected");
        return login_required();
    }

    request.extensions_mut().insert(AuthenticatedUser(username));
    next.run(request).await
}

fn login_required() -> Response {
    let mut response = (StatusCode::UNAUTHORIZED, "Log in to print").into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static(r#"Basic realm="Login required""#),
    );
    response
}

/// Decode `Authorization: Basic base64(user:password)`.
fn basic_credentials(value: Option<&HeaderValue>) -> Option<(String, String)> {
    let raw = value?.to_str().ok()?;
    let (scheme, encoded) = raw.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (username, password) = text.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
