// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request handlers.

use axum::Json;
use axum::extract::{Extension, Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{error, warn};

use printdesk_core::types::{FailureKind, SubmissionOutcome};
use printdesk_print::PrintService;

use super::AppState;
use super::auth::AuthenticatedUser;
use super::multipart::{FormError, read_submission_form};
use super::views::{IndexPage, ResultPage, render};

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    pub team: Option<String>,
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// The submission form.
pub async fn index<S: PrintService>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<IndexQuery>,
) -> Response {
    let token = match state.csrf.issue(&user.0) {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "could not issue form token");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong on our side.")
                .into_response();
        }
    };

    let policy = state.submissions.policy();
    let page = match state.submissions.destinations().await {
        Ok(destinations) => IndexPage::new(policy, &destinations, query.team.as_deref(), token),
        Err(e) => {
            warn!(error = %e, "destination listing failed");
            IndexPage::new(policy, &[], query.team.as_deref(), token)
                .with_notice("Printers are unavailable right now. Reload the page in a minute.")
        }
    };
    render(&page, StatusCode::OK)
}

/// Accept a submission and show its outcome.
pub async fn submit<S: PrintService>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthenticatedUser>,
    mut multipart: Multipart,
) -> Response {
    let form = match read_submission_form(&mut multipart).await {
        Ok(form) => form,
        Err(FormError::TooLarge) => {
            let page = ResultPage {
                success: false,
                message: "This file is too large to print.".into(),
                team: String::new(),
            };
            return render(&page, StatusCode::PAYLOAD_TOO_LARGE);
        }
        Err(FormError::Malformed) => {
            return (StatusCode::BAD_REQUEST, "Malformed form submission").into_response();
        }
    };

    if !state.csrf.verify(&form.csrf_token, &user.0) {
        warn!(user = %user.0, "anti-forgery token rejected");
        let page = ResultPage {
            success: false,
            message: "This form has expired. Go back, reload the page and try again.".into(),
            team: String::new(),
        };
        return render(&page, StatusCode::FORBIDDEN);
    }

    let team = if state.submissions.policy().has_group(&form.team) {
        form.team.clone()
    } else {
        String::new()
    };
    let outcome = state.submissions.submit(form.into_submission()).await;
    let page = ResultPage {
        success: outcome.success,
        message: outcome.message.clone(),
        team,
    };
    render(&page, outcome_status(&outcome))
}

/// Exposed destinations as JSON.
pub async fn destinations<S: PrintService>(State(state): State<AppState<S>>) -> Response {
    match state.submissions.destinations().await {
        Ok(destinations) => Json(destinations).into_response(),
        Err(e) => {
            warn!(error = %e, "destination listing failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": "print service unavailable" })),
            )
                .into_response()
        }
    }
}

fn outcome_status(outcome: &SubmissionOutcome) -> StatusCode {
    match outcome.reason {
        None => StatusCode::OK,
        Some(kind) if kind.is_rejection() => StatusCode::UNPROCESSABLE_ENTITY,
        Some(FailureKind::Conversion | FailureKind::PrintBackend) => StatusCode::BAD_GATEWAY,
        Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
