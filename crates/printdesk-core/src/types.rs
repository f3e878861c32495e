// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Printdesk submission pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation identifier for one submission, used in logs and the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub Uuid);

impl SubmissionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier the print service assigns to an accepted job.
pub type PrintJobId = i32;

/// A document as received from the user.  Never mutated after receipt.
#[derive(Clone)]
pub struct Submission {
    pub source_filename: String,
    pub raw_bytes: Vec<u8>,
    pub destination_id: String,
    pub group_id: String,
}

impl std::fmt::Debug for Submission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Submission")
            .field("source_filename", &self.source_filename)
            .field("size", &self.raw_bytes.len())
            .field("destination_id", &self.destination_id)
            .field("group_id", &self.group_id)
            .finish()
    }
}

/// Document formats flowing through the conversion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    /// Raw text or source code as uploaded.
    PlainText,
    /// Paginated intermediate produced by the paginate stage.
    PostScript,
    /// Print-ready output of the render stage.
    Pdf,
}

impl DocumentType {
    /// MIME type string for IPP `document-format`.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::PlainText => "text/plain",
            Self::PostScript => "application/postscript",
            Self::Pdf => "application/pdf",
        }
    }
}

/// Physical page medium shared by both conversion stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageMedium {
    Letter,
    Legal,
    A3,
    A4,
    A5,
}

impl PageMedium {
    /// Media name as understood by the paginator (`--media=`).
    pub fn paginator_name(&self) -> &'static str {
        match self {
            Self::Letter => "Letter",
            Self::Legal => "Legal",
            Self::A3 => "A3",
            Self::A4 => "A4",
            Self::A5 => "A5",
        }
    }

    /// Paper size keyword as understood by the renderer (`-sPAPERSIZE=`).
    pub fn renderer_name(&self) -> &'static str {
        match self {
            Self::Letter => "letter",
            Self::Legal => "legal",
            Self::A3 => "a3",
            Self::A4 => "a4",
            Self::A5 => "a5",
        }
    }
}

/// A step of the conversion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Source text to paginated intermediate.
    Paginate,
    /// Paginated intermediate to print-ready output.
    Render,
}

impl Stage {
    /// One-based position of the stage in the pipeline.
    pub fn number(&self) -> u8 {
        match self {
            Self::Paginate => 1,
            Self::Render => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paginate => "paginate",
            Self::Render => "render",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a converter process ended when it did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageExit {
    /// Process exited with a non-zero status code.
    Code(i32),
    /// Process was terminated by a signal.
    Signal,
    /// Process exceeded the stage time limit and was killed.
    TimedOut { after_secs: u64 },
}

impl StageExit {
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Code(code) => Some(*code),
            _ => None,
        }
    }
}

impl std::fmt::Display for StageExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code(code) => write!(f, "exit code {code}"),
            Self::Signal => f.write_str("terminated by signal"),
            Self::TimedOut { after_secs } => write!(f, "timed out after {after_secs}s"),
        }
    }
}

/// Metadata the print service reports for one of its destinations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationInfo {
    /// `printer-info`: free-form description set by the administrator.
    pub info: Option<String>,
    /// `printer-location`.
    pub location: Option<String>,
}

/// A print queue as shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub id: String,
    pub display_name: String,
    pub is_exposed: bool,
}

/// Linear lifecycle of a submission inside the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionState {
    Received,
    Validated,
    Staged,
    Converted,
    Dispatched,
    Succeeded,
    Failed,
}

impl std::fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::Staged => "staged",
            Self::Converted => "converted",
            Self::Dispatched => "dispatched",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Coarse classification of why a submission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidGroup,
    InvalidDestination,
    InvalidFile,
    Conversion,
    PrintBackend,
    Internal,
}

impl FailureKind {
    /// Whether the failure was caused by the user's input.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidGroup | Self::InvalidDestination | Self::InvalidFile
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidGroup => "invalid_group",
            Self::InvalidDestination => "invalid_destination",
            Self::InvalidFile => "invalid_file",
            Self::Conversion => "conversion",
            Self::PrintBackend => "print_backend",
            Self::Internal => "internal",
        }
    }
}

/// Terminal result of one submission, handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub success: bool,
    pub job_id: Option<PrintJobId>,
    pub message: String,
    pub reason: Option<FailureKind>,
    /// Pages in the rendered document, when it could be counted.
    pub page_count: Option<u32>,
}

impl SubmissionOutcome {
    pub fn succeeded(job_id: PrintJobId, page_count: Option<u32>) -> Self {
        let message = match page_count {
            Some(1) => format!("Sent to the printer as job {job_id} (1 page)."),
            Some(pages) => format!("Sent to the printer as job {job_id} ({pages} pages)."),
            None => format!("Sent to the printer as job {job_id}."),
        };
        Self {
            success: true,
            job_id: Some(job_id),
            message,
            reason: None,
            page_count,
        }
    }

    pub fn failed(reason: FailureKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            job_id: None,
            message: message.into(),
            reason: Some(reason),
            page_count: None,
        }
    }
}
