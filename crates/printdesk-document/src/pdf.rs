// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Inspection of rendered PDF output.

use std::path::Path;

use tracing::{debug, warn};

/// Count the pages of the PDF at `path`.
///
/// Returns `None` when the file cannot be parsed; the count is informational
/// and never decides whether a submission succeeds.
pub fn page_count(path: &Path) -> Option<u32> {
    match lopdf::Document::load(path) {
        Ok(doc) => {
            let pages = doc.get_pages().len() as u32;
            debug!(path = %path.display(), pages, "counted rendered pages");
            Some(pages)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read rendered PDF");
            None
        }
    }
}

/// [`page_count`] on the blocking thread pool.
pub async fn page_count_async(path: &Path) -> Option<u32> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || page_count(&path))
        .await
        .ok()
        .flatten()
}
