// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printdesk App: the submission orchestrator and the authenticated HTTP
// front end that feeds it.

pub mod http;
pub mod services;
pub mod settings;

pub use http::{AppState, router};
pub use services::SubmissionService;
