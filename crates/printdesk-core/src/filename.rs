// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Filename handling for uploaded documents.
//
// The staged name must be a single, plain path component: no separators, no
// parent references, no leading dots, ASCII only.

/// Longest staged filename we produce.
const MAX_STAGED_LEN: usize = 128;

/// Stem used when nothing printable survives normalisation.
const FALLBACK_STEM: &str = "upload";

/// Lower-cased extension of the last path component, without the dot.
///
/// Returns `None` when the name has no dot or ends with one.
pub fn extension_of(filename: &str) -> Option<String> {
    let last = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let (_, ext) = last.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

/// Reduce an arbitrary client-supplied name to `[A-Za-z0-9_.-]`.
///
/// Path separators become word breaks, runs of whitespace collapse into a
/// single underscore, everything else outside the safe set is dropped, and
/// leading or trailing dots and underscores are trimmed.  The result may be
/// empty.
pub fn secure_filename(filename: &str) -> String {
    let spaced: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let safe: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    safe.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Name under which the upload is written inside its workspace.
///
/// Always ends in `.{extension}` so the paginator can pick syntax
/// highlighting from it, and never exceeds [`MAX_STAGED_LEN`] bytes.
pub fn staged_filename(filename: &str, extension: &str) -> String {
    let suffix = format!(".{extension}");
    let secured = secure_filename(filename);

    let split = secured.len().saturating_sub(suffix.len());
    let stem = match secured.get(split..) {
        Some(tail) if split > 0 && tail.eq_ignore_ascii_case(&suffix) => &secured[..split],
        _ => FALLBACK_STEM,
    };
    let stem = if stem.ends_with('.') { FALLBACK_STEM } else { stem };

    let budget = MAX_STAGED_LEN.saturating_sub(suffix.len()).max(1);
    // `stem` is pure ASCII here so byte slicing is on char boundaries.
    let stem = &stem[..stem.len().min(budget)];
    format!("{stem}{suffix}")
}
