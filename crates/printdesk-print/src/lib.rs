// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printdesk Print: the seam to the external print service.  `PrintService`
// is the injected client; `DestinationCatalog` and `PrintDispatcher` are the
// two views the rest of the system has of it.

pub mod catalog;
pub mod client;
pub mod dispatcher;

pub use catalog::DestinationCatalog;
pub use client::{CupsClient, JobOptions, PrintService};
pub use dispatcher::PrintDispatcher;
