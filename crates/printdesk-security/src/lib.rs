// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// printdesk-security: trust primitives around the submission pipeline.
//
// Document fingerprints for logs, an append-only submission audit trail, the
// HTTP boundary's credential check and per-form anti-forgery tokens.

pub mod audit;
pub mod credentials;
pub mod integrity;

pub use audit::{AuditEntry, AuditLog, AuditRecord};
pub use credentials::{Credentials, CsrfGuard};
pub use integrity::hash_bytes;
