// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printdesk core types, policy and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod filename;
pub mod human_errors;
pub mod types;
pub mod validate;

pub use config::{AppConfig, Policy};
pub use error::PrintdeskError;
pub use types::*;
pub use validate::{PolicyChecked, ValidatedSubmission, check_policy, validate};
