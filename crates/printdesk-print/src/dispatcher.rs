// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Hands finished documents to the print service.  One attempt per
// submission; a rejection is reported, never retried.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use printdesk_core::error::{PrintdeskError, Result};
use printdesk_core::types::PrintJobId;

use crate::client::{JobOptions, PrintService};

pub struct PrintDispatcher<S> {
    service: Arc<S>,
}

impl<S> Clone for PrintDispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S: PrintService> PrintDispatcher<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }

    /// Submit `file` to `destination` under the title `display_name`.
    ///
    /// No job options are sent.  Any failure from the service, including
    /// an unreadable file, comes back as [`PrintdeskError::PrintBackend`].
    #[instrument(skip(self, file), fields(file = %file.display()))]
    pub async fn submit(
        &self,
        destination: &str,
        file: &Path,
        display_name: &str,
    ) -> Result<PrintJobId> {
        let options = JobOptions::new();
        match self
            .service
            .submit_job(destination, file, display_name, &options)
            .await
        {
            Ok(job_id) => {
                info!(job_id, "job dispatched");
                Ok(job_id)
            }
            Err(e) => {
                warn!(error = %e, "print service rejected job");
                Err(match e {
                    PrintdeskError::PrintBackend(detail) => PrintdeskError::PrintBackend(detail),
                    other => PrintdeskError::PrintBackend(other.to_string()),
                })
            }
        }
    }
}
