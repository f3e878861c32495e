// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP boundary.
//
//   GET  /healthz            liveness, no login
//   GET  /                   submission form
//   POST /                   multipart submission, renders the outcome
//   GET  /api/destinations   exposed destinations as JSON
//
// Everything except /healthz sits behind the basic-auth login.  Request
// bodies are capped at the policy's byte limit plus room for the multipart
// framing and the other form fields.

pub mod auth;
pub mod handlers;
pub mod multipart;
pub mod views;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::get;

use printdesk_print::PrintService;
use printdesk_security::{Credentials, CsrfGuard};

use crate::services::SubmissionService;

/// Bytes allowed on top of `max_bytes` for multipart framing and text fields.
pub const MULTIPART_ALLOWANCE: usize = 64 * 1024;

/// Shared state handed to every handler.
pub struct AppState<S> {
    pub submissions: SubmissionService<S>,
    pub credentials: Arc<Credentials>,
    pub csrf: Arc<CsrfGuard>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            submissions: self.submissions.clone(),
            credentials: Arc::clone(&self.credentials),
            csrf: Arc::clone(&self.csrf),
        }
    }
}

impl<S: PrintService> AppState<S> {
    pub fn new(
        submissions: SubmissionService<S>,
        credentials: Credentials,
        csrf: CsrfGuard,
    ) -> Self {
        Self {
            submissions,
            credentials: Arc::new(credentials),
            csrf: Arc::new(csrf),
        }
    }
}

pub fn router<S: PrintService>(state: AppState<S>) -> Router {
    let body_limit =
        usize::try_from(state.submissions.policy().max_bytes).unwrap_or(usize::MAX)
            .saturating_add(MULTIPART_ALLOWANCE);

    let protected = Router::new()
        .route("/", get(handlers::index::<S>).post(handlers::submit::<S>))
        .route("/api/destinations", get(handlers::destinations::<S>))
        .layer(DefaultBodyLimit::max(body_limit))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_login::<S>,
        ));

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .merge(protected)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use tower::ServiceExt;

    use printdesk_core::config::Policy;
    use printdesk_core::error::Result;
    use printdesk_core::types::{DestinationInfo, DocumentType, Stage};
    use printdesk_document::{ConversionPipeline, StageSpec};
    use printdesk_print::JobOptions;

    use super::*;

    const USER: &str = "tjioi";
    const PASSWORD: &str = "whatdoyoumeanidosomuchwork";
    const BOUNDARY: &str = "printdesk-test-boundary";

    struct StaticCups {
        queues: Vec<&'static str>,
    }

    impl PrintService for StaticCups {
        async fn list_destinations(&self) -> Result<BTreeMap<String, DestinationInfo>> {
            Ok(self
                .queues
                .iter()
                .map(|q| (q.to_string(), DestinationInfo::default()))
                .collect())
        }

        async fn submit_job(
            &self,
            _destination: &str,
            _file: &Path,
            _title: &str,
            _options: &JobOptions,
        ) -> Result<i32> {
            Ok(77)
        }
    }

    fn copy_stage(stage: Stage, output: &str) -> StageSpec {
        StageSpec {
            stage,
            program: PathBuf::from("sh"),
            args: vec![
                "-c".into(),
                r#"cp "$1" "$2""#.into(),
                "sh".into(),
                "{input}".into(),
                "{output}".into(),
            ],
            output: output.into(),
            output_type: DocumentType::PostScript,
        }
    }

    fn state_with(queues: Vec<&'static str>, policy: Policy, root: &Path) -> AppState<StaticCups> {
        let pipeline = ConversionPipeline::new(
            vec![
                copy_stage(Stage::Paginate, "paginated.ps"),
                copy_stage(Stage::Render, "document.pdf"),
            ],
            Duration::from_secs(10),
        );
        let submissions = SubmissionService::new(
            Arc::new(StaticCups { queues }),
            Arc::new(policy),
            pipeline,
            root,
        );
        AppState::new(
            submissions,
            Credentials::new(USER, PASSWORD).unwrap(),
            CsrfGuard::new().unwrap(),
        )
    }

    fn state(root: &Path) -> AppState<StaticCups> {
        state_with(vec!["Room_16", "Room_17"], Policy::default(), root)
    }

    fn basic(user: &str, password: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, basic(USER, PASSWORD))
            .body(Body::empty())
            .unwrap()
    }

    fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((filename, content)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn post(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::AUTHORIZATION, basic(USER, PASSWORD))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[tokio::test]
    async fn health_check_needs_no_login() {
        let root = tempfile::tempdir().unwrap();
        let response = router(state(root.path()))
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn pages_require_login() {
        let root = tempfile::tempdir().unwrap();
        let app = router(state(root.path()));

        let anonymous = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            anonymous.headers()[header::WWW_AUTHENTICATE],
            r#"Basic realm="Login required""#
        );
        assert_eq!(body_text(anonymous).await, "Log in to print");

        let wrong = app
            .oneshot(
                Request::builder()
                    .uri("/api/destinations")
                    .header(header::AUTHORIZATION, basic(USER, "guess"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn form_lists_printers_and_carries_token() {
        let root = tempfile::tempdir().unwrap();
        let response = router(state(root.path()))
            .oneshot(get("/?team=team3"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(r#"name="csrf_token""#));
        assert!(html.contains(r#"<option value="Room_16" selected>"#));
        assert!(html.contains(r#"<option value="Room_17">"#));
    }

    #[tokio::test]
    async fn empty_catalog_lists_as_empty_json() {
        let root = tempfile::tempdir().unwrap();
        let state = state_with(vec!["Office_Color"], Policy::default(), root.path());
        let response = router(state).oneshot(get("/api/destinations")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "[]");
    }

    #[tokio::test]
    async fn destinations_json_lists_exposed() {
        let root = tempfile::tempdir().unwrap();
        let response = router(state(root.path()))
            .oneshot(get("/api/destinations"))
            .await
            .unwrap();
        let listed: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(listed.as_array().map(Vec::len), Some(2));
        assert_eq!(listed[0]["id"], "Room_16");
    }

    #[tokio::test]
    async fn forged_token_is_refused() {
        let root = tempfile::tempdir().unwrap();
        let body = multipart_body(
            &[("team", "team3"), ("printer", "Room_16"), ("csrf_token", "00.00")],
            Some(("main.py", &b"print(1)\n"[..])),
        );
        let response = router(state(root.path())).oneshot(post(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn disallowed_extension_is_unprocessable() {
        let root = tempfile::tempdir().unwrap();
        let state = state(root.path());
        let token = state.csrf.issue(USER).unwrap();
        let body = multipart_body(
            &[("team", "team3"), ("printer", "Room_16"), ("csrf_token", token.as_str())],
            Some(("tool.exe", &b"MZ\x90\x00"[..])),
        );
        let response = router(state).oneshot(post(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = body_text(response).await;
        assert!(html.contains("This file can"));
        assert!(!html.contains(&root.path().display().to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn accepted_submission_reports_job() {
        let root = tempfile::tempdir().unwrap();
        let state = state(root.path());
        let token = state.csrf.issue(USER).unwrap();
        let body = multipart_body(
            &[("csrf_token", token.as_str()), ("team", "team3"), ("printer", "Room_16")],
            Some(("main.py", &b"print(1)\n"[..])),
        );
        let response = router(state).oneshot(post(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("job 77"), "{html}");
        assert!(html.contains("?team=team3"));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn oversize_body_is_rejected_before_processing() {
        let root = tempfile::tempdir().unwrap();
        let policy = Policy {
            max_bytes: 1024,
            ..Policy::default()
        };
        let state = state_with(vec!["Room_16"], policy, root.path());
        let token = state.csrf.issue(USER).unwrap();
        let huge = vec![b'x'; 1024 + MULTIPART_ALLOWANCE + 1];
        let body = multipart_body(
            &[("csrf_token", token.as_str()), ("team", "team3"), ("printer", "Room_16")],
            Some(("big.txt", huge.as_slice())),
        );
        let response = router(state).oneshot(post(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(std::fs::read_dir(root.path()).map(|d| d.count()).unwrap_or(0), 0);
    }
}
