// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Submission validation against the static policy and the live destination
// listing.  Runs before any workspace or converter is touched.

use tracing::debug;

use crate::config::Policy;
use crate::error::{PrintdeskError, Result};
use crate::filename::{extension_of, staged_filename};
use crate::types::{Destination, Submission};

/// A submission that passed every policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSubmission {
    /// Filesystem-safe name to stage the upload under.
    pub filename: String,
    /// Lower-cased extension, guaranteed to be allowed by policy.
    pub extension: String,
    pub group_id: String,
    pub destination_id: String,
}

/// A submission whose group and file passed the static policy checks but
/// whose destination has not been checked yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyChecked {
    filename: String,
    extension: String,
    group_id: String,
}

impl PolicyChecked {
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Finish validation against the live destination listing.
    ///
    /// `current_destinations` must come from a catalog query made for this
    /// submission; a destination that was listed when the form was rendered
    /// may have disappeared since.
    pub fn check_destination(
        self,
        destination_id: &str,
        current_destinations: &[Destination],
    ) -> Result<ValidatedSubmission> {
        if destination_id.is_empty() || !current_destinations.iter().any(|d| d.id == destination_id)
        {
            return Err(PrintdeskError::InvalidDestination(format!(
                "'{destination_id}' is not currently available"
            )));
        }

        Ok(ValidatedSubmission {
            filename: self.filename,
            extension: self.extension,
            group_id: self.group_id,
            destination_id: destination_id.to_string(),
        })
    }
}

/// Group, extension and size checks.  Needs nothing but the policy, so it
/// runs before the print service is asked for its destinations.
pub fn check_policy(submission: &Submission, policy: &Policy) -> Result<PolicyChecked> {
    let group_id = submission.group_id.as_str();
    if group_id.is_empty() || !policy.has_group(group_id) {
        return Err(PrintdeskError::InvalidGroup(format!("'{group_id}' is not a known group")));
    }

    let extension = extension_of(&submission.source_filename).ok_or_else(|| {
        PrintdeskError::InvalidFile(format!(
            "'{}' has no extension",
            submission.source_filename
        ))
    })?;
    if !policy.is_allowed_extension(&extension) {
        return Err(PrintdeskError::InvalidFile(format!(
            "extension '{extension}' is not allowed"
        )));
    }

    let size = submission.raw_bytes.len() as u64;
    if size > policy.max_bytes {
        return Err(PrintdeskError::InvalidFile(format!(
            "{size} bytes exceeds the {} byte limit",
            policy.max_bytes
        )));
    }

    let filename = staged_filename(&submission.source_filename, &extension);
    debug!(%filename, %extension, size, "submission passed policy checks");

    Ok(PolicyChecked {
        filename,
        extension,
        group_id: group_id.to_string(),
    })
}

/// Check a submission's group, file and destination.
pub fn validate(
    submission: &Submission,
    policy: &Policy,
    current_destinations: &[Destination],
) -> Result<ValidatedSubmission> {
    check_policy(submission, policy)?
        .check_destination(&submission.destination_id, current_destinations)
}
