// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// User-facing messages for submission failures.
//
// Every error is mapped to fixed wording.  The detail strings carried by the
// error variants (paths, command lines, backend replies) stay in the server
// log and never appear here.

use crate::error::PrintdeskError;

/// A message safe to show to the person who submitted the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanError {
    /// Short summary (shown as a heading).
    pub message: String,
    /// What the user should try next.
    pub suggestion: String,
}

impl std::fmt::Display for HumanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.message, self.suggestion)
    }
}

/// Convert a `PrintdeskError` into wording for the result page.
pub fn humanize_error(err: &PrintdeskError) -> HumanError {
    match err {
        PrintdeskError::InvalidGroup(_) => HumanError {
            message: "Invalid team.".into(),
            suggestion: "Pick your team from the list and submit again.".into(),
        },

        PrintdeskError::InvalidDestination(_) => HumanError {
            message: "Invalid printer.".into(),
            suggestion: "That printer is not available right now. Reload the page and pick one from the list.".into(),
        },

        PrintdeskError::InvalidFile(_) => HumanError {
            message: "This file can't be printed.".into(),
            suggestion: "Only plain text and source files within the size limit are accepted.".into(),
        },

        PrintdeskError::ConversionFailed { .. }
        | PrintdeskError::ConversionMissingOutput { .. }
        | PrintdeskError::ConverterUnavailable { .. } => HumanError {
            message: "Could not process file.".into(),
            suggestion: "Check that it is a plain text file and try again, or ask a volunteer for help.".into(),
        },

        PrintdeskError::PrintBackend(_) => HumanError {
            message: "Could not print.".into(),
            suggestion: "The print service did not accept the job. Try again in a minute or choose another printer.".into(),
        },

        PrintdeskError::Config(_)
        | PrintdeskError::Database(_)
        | PrintdeskError::Security(_)
        | PrintdeskError::Io(_)
        | PrintdeskError::Serialization(_) => HumanError {
            message: "Something went wrong on our side.".into(),
            suggestion: "Try again. If this keeps happening, ask a volunteer for help.".into(),
        },
    }
}
