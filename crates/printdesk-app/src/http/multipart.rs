// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Submission form parsing.

use axum::extract::Multipart;
use axum::http::StatusCode;
use tracing::warn;

use printdesk_core::types::Submission;

/// Fields of the submission form, in any order.
#[derive(Debug, Default)]
pub struct SubmissionForm {
    pub team: String,
    pub printer: String,
    pub csrf_token: String,
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl SubmissionForm {
    pub fn into_submission(self) -> Submission {
        Submission {
            source_filename: self.filename,
            raw_bytes: self.bytes,
            destination_id: self.printer,
            group_id: self.team,
        }
    }
}

/// Why the form body could not be read.
#[derive(Debug, PartialEq, Eq)]
pub enum FormError {
    TooLarge,
    Malformed,
}

/// Read every field of the form.  Unknown fields are skipped; a missing file
/// leaves an empty filename for validation to reject.
pub async fn read_submission_form(multipart: &mut Multipart) -> Result<SubmissionForm, FormError> {
    let mut form = SubmissionForm::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return Err(classify(err.status(), &err.body_text())),
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                form.filename = field.file_name().unwrap_or_default().to_string();
                form.bytes = field
                    .bytes()
                    .await
                    .map_err(|err| classify(err.status(), &err.body_text()))?
                    .to_vec();
            }
            "team" | "printer" | "csrf_token" => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| classify(err.status(), &err.body_text()))?
                    .trim()
                    .to_string();
                match name.as_str() {
                    "team" => form.team = value,
                    "printer" => form.printer = value,
                    _ => form.csrf_token = value,
                }
            }
            _ => continue,
        }
    }
    Ok(form)
}

fn classify(status: StatusCode, detail: &str) -> FormError {
    warn!(status = status.as_u16(), error = %detail, "failed to read multipart form");
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        FormError::TooLarge
    } else {
        FormError::Malformed
    }
}
