// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Submission orchestrator.
//
// Drives one submission through
//   received -> validated -> staged -> converted -> dispatched -> succeeded
// and turns any failure along the way into a `SubmissionOutcome` carrying
// user-safe wording.  The internal error detail goes to the log and the
// audit trail only.
//
// The audit log is rusqlite-backed (`Send` but not `Sync`) so it sits behind
// a `Mutex`; writes are a single INSERT and never held across an await.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{Instrument, error, info, info_span, warn};

use printdesk_core::config::Policy;
use printdesk_core::error::{PrintdeskError, Result};
use printdesk_core::human_errors::humanize_error;
use printdesk_core::types::{
    Destination, PrintJobId, Submission, SubmissionId, SubmissionOutcome, SubmissionState,
};
use printdesk_core::check_policy;
use printdesk_document::{ConversionPipeline, with_workspace};
use printdesk_print::{DestinationCatalog, PrintDispatcher, PrintService};
use printdesk_security::{AuditLog, AuditRecord, hash_bytes};

/// What a successful run produced.
struct Dispatched {
    job_id: PrintJobId,
    page_count: Option<u32>,
}

/// End-to-end submission flow shared by every request handler.
pub struct SubmissionService<S> {
    policy: Arc<Policy>,
    catalog: DestinationCatalog<S>,
    dispatcher: PrintDispatcher<S>,
    pipeline: Arc<ConversionPipeline>,
    workspace_root: PathBuf,
    audit: Option<Arc<Mutex<AuditLog>>>,
}

impl<S> Clone for SubmissionService<S> {
    fn clone(&self) -> Self {
        Self {
            policy: Arc::clone(&self.policy),
            catalog: self.catalog.clone(),
            dispatcher: self.dispatcher.clone(),
            pipeline: Arc::clone(&self.pipeline),
            workspace_root: self.workspace_root.clone(),
            audit: self.audit.clone(),
        }
    }
}

impl<S: PrintService> SubmissionService<S> {
    pub fn new(
        service: Arc<S>,
        policy: Arc<Policy>,
        pipeline: ConversionPipeline,
        workspace_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog: DestinationCatalog::new(Arc::clone(&service), Arc::clone(&policy)),
            dispatcher: PrintDispatcher::new(service),
            policy,
            pipeline: Arc::new(pipeline),
            workspace_root: workspace_root.into(),
            audit: None,
        }
    }

    /// Record every finished submission in `audit`.
    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(Arc::new(Mutex::new(audit)));
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Destinations users may currently pick.
    pub async fn destinations(&self) -> Result<Vec<Destination>> {
        self.catalog.list_exposed().await
    }

    /// Run one submission to a terminal outcome.  Never fails: every error
    /// becomes a failed outcome.
    pub async fn submit(&self, submission: Submission) -> SubmissionOutcome {
        let id = SubmissionId::new();
        let span = info_span!(
            "submission",
            submission_id = %id,
            group = %submission.group_id,
            destination = %submission.destination_id,
        );
        self.run(id, submission).instrument(span).await
    }

    async fn run(&self, id: SubmissionId, submission: Submission) -> SubmissionOutcome {
        let document_hash = hash_bytes(&submission.raw_bytes);
        info!(
            state = %SubmissionState::Received,
            %document_hash,
            size = submission.raw_bytes.len(),
            "submission received"
        );

        let result = self.process(&submission).await;

        let (outcome, details) = match &result {
            Ok(done) => {
                info!(
                    state = %SubmissionState::Succeeded,
                    job_id = done.job_id,
                    pages = ?done.page_count,
                    "submission printed"
                );
                (SubmissionOutcome::succeeded(done.job_id, done.page_count), None)
            }
            Err(e) => {
                let kind = e.failure_kind();
                if kind.is_rejection() {
                    warn!(
                        state = %SubmissionState::Failed,
                        reason = kind.as_str(),
                        error = %e,
                        "submission rejected"
                    );
                } else {
                    error!(
                        state = %SubmissionState::Failed,
                        reason = kind.as_str(),
                        stage = ?e.stage(),
                        error = %e,
                        "submission failed"
                    );
                }
                let human = humanize_error(e);
                (SubmissionOutcome::failed(kind, human.to_string()), Some(e.to_string()))
            }
        };

        self.audit_outcome(id, &submission, &document_hash, &outcome, details.as_deref());
        outcome
    }

    async fn process(&self, submission: &Submission) -> Result<Dispatched> {
        let checked = check_policy(submission, &self.policy)?;
        let destinations = self.catalog.list_exposed().await?;
        let validated = checked.check_destination(&submission.destination_id, &destinations)?;
        info!(
            state = %SubmissionState::Validated,
            extension = %validated.extension,
            "submission validated"
        );

        with_workspace(&self.workspace_root, |ws| async move {
            let source = ws.stage(&validated.filename, &submission.raw_bytes).await?;
            info!(state = %SubmissionState::Staged, "source staged");

            let document = self
                .pipeline
                .convert(ws.path(), &source, &validated.group_id, &self.policy)
                .await?;
            info!(
                state = %SubmissionState::Converted,
                pages = ?document.page_count,
                "document converted"
            );

            let job_id = self
                .dispatcher
                .submit(&validated.destination_id, &document.path, &validated.filename)
                .await?;
            info!(state = %SubmissionState::Dispatched, job_id, "job dispatched");

            Ok::<_, PrintdeskError>(Dispatched {
                job_id,
                page_count: document.page_count,
            })
        })
        .await
    }

    fn audit_outcome(
        &self,
        id: SubmissionId,
        submission: &Submission,
        document_hash: &str,
        outcome: &SubmissionOutcome,
        details: Option<&str>,
    ) {
        let Some(audit) = &self.audit else {
            return;
        };
        let submission_id = id.to_string();
        let record = AuditRecord {
            submission_id: &submission_id,
            group_id: &submission.group_id,
            destination_id: &submission.destination_id,
            document_hash,
            success: outcome.success,
            job_id: outcome.job_id,
            reason: outcome.reason.map(|r| r.as_str()),
            details,
        };
        let written = match audit.lock() {
            Ok(log) => log.record(&record),
            Err(_) => Err(PrintdeskError::Database("audit log lock poisoned".into())),
        };
        if let Err(e) = written {
            error!(error = %e, "failed to write audit entry");
        }
    }
}
