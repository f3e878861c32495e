// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Printdesk.

use thiserror::Error;

use crate::types::{FailureKind, Stage, StageExit};

/// Top-level error type for all Printdesk operations.
#[derive(Debug, Error)]
pub enum PrintdeskError {
    // -- Validation errors --
    #[error("invalid group: {0}")]
    InvalidGroup(String),

    #[error("invalid destination: {0}")]
    InvalidDestination(String),

    #[error("invalid file: {0}")]
    InvalidFile(String),

    // -- Conversion errors --
    #[error("{stage} stage failed: {exit}")]
    ConversionFailed { stage: Stage, exit: StageExit },

    #[error("{stage} stage reported success but produced no output")]
    ConversionMissingOutput { stage: Stage },

    #[error("{stage} converter could not be started: {detail}")]
    ConverterUnavailable { stage: Stage, detail: String },

    // -- Dispatch errors --
    #[error("print backend error: {0}")]
    PrintBackend(String),

    // -- Infrastructure --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("security error: {0}")]
    Security(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PrintdeskError {
    /// Classify this error for the submission outcome.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::InvalidGroup(_) => FailureKind::InvalidGroup,
            Self::InvalidDestination(_) => FailureKind::InvalidDestination,
            Self::InvalidFile(_) => FailureKind::InvalidFile,
            Self::ConversionFailed { .. }
            | Self::ConversionMissingOutput { .. }
            | Self::ConverterUnavailable { .. } => FailureKind::Conversion,
            Self::PrintBackend(_) => FailureKind::PrintBackend,
            Self::Config(_)
            | Self::Database(_)
            | Self::Security(_)
            | Self::Io(_)
            | Self::Serialization(_) => FailureKind::Internal,
        }
    }

    /// The conversion stage this error originated from, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::ConversionFailed { stage, .. }
            | Self::ConversionMissingOutput { stage }
            | Self::ConverterUnavailable { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PrintdeskError>;
