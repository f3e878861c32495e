// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// printdesk-document: document preparation for the Printdesk pipeline.
//
// Provides isolated per-submission workspaces and the staged conversion of an
// uploaded source file into a print-ready PDF by way of external converters
// (paginate: text → PostScript, render: PostScript → PDF).

pub mod convert;
pub mod pdf;
pub mod workspace;

pub use convert::{ConversionPipeline, ConvertedDocument, StageSpec};
pub use workspace::{Workspace, WorkspaceDir, with_workspace};
