// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTML pages.

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tracing::error;

use printdesk_core::config::Policy;
use printdesk_core::types::Destination;

pub struct GroupOption {
    pub id: String,
    pub selected: bool,
}

pub struct PrinterOption {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(
    ext = "html",
    source = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Print</title>
</head>
<body>
<h1>Print a file</h1>
{% if !notice.is_empty() %}<p class="notice">{{ notice }}</p>{% endif %}
<form method="post" action="/" enctype="multipart/form-data">
<input type="hidden" name="csrf_token" value="{{ csrf_token }}">
<p><label>Team
<select name="team" required>
<option value="">Choose your team</option>
{% for group in groups %}<option value="{{ group.id }}"{% if group.selected %} selected{% endif %}>{{ group.id }}</option>
{% endfor %}</select></label></p>
<p><label>Printer
<select name="printer" required>
{% for printer in printers %}<option value="{{ printer.id }}"{% if printer.selected %} selected{% endif %}>{{ printer.label }}</option>
{% endfor %}</select></label></p>
<p><label>File <input type="file" name="file" required></label></p>
<p class="hint">Accepted: {{ extensions }}. Only the first {{ max_pages }} pages are printed.</p>
<p><button type="submit">Print</button></p>
</form>
</body>
</html>
"#
)]
pub struct IndexPage {
    pub csrf_token: String,
    pub groups: Vec<GroupOption>,
    pub printers: Vec<PrinterOption>,
    pub extensions: String,
    pub max_pages: u32,
    pub notice: String,
}

impl IndexPage {
    /// Form for `policy`, with `team`'s group and suggested printer
    /// preselected when it is a known group.
    pub fn new(
        policy: &Policy,
        destinations: &[Destination],
        team: Option<&str>,
        csrf_token: String,
    ) -> Self {
        let team = team.filter(|t| policy.has_group(t));
        let hint = team.and_then(|t| policy.destination_hint(t));

        let mut ids: Vec<&String> = policy.groups.keys().collect();
        ids.sort_by(|a, b| natural_key(a).cmp(&natural_key(b)));
        let groups = ids
            .into_iter()
            .map(|id| GroupOption {
                id: id.clone(),
                selected: Some(id.as_str()) == team,
            })
            .collect();

        let printers = destinations
            .iter()
            .map(|d| PrinterOption {
                id: d.id.clone(),
                label: d.display_name.clone(),
                selected: Some(d.id.as_str()) == hint,
            })
            .collect();

        let extensions = policy
            .allowed_extensions
            .iter()
            .map(|e| format!(".{e}"))
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            csrf_token,
            groups,
            printers,
            extensions,
            max_pages: policy.max_pages,
            notice: String::new(),
        }
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = notice.into();
        self
    }
}

#[derive(Template)]
#[template(
    ext = "html",
    source = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Print</title>
</head>
<body>
<p class="{% if success %}flash-success{% else %}flash-error{% endif %}">{{ message }}</p>
<p><a href="/{% if !team.is_empty() %}?team={{ team }}{% endif %}">Print another file</a></p>
</body>
</html>
"#
)]
pub struct ResultPage {
    pub success: bool,
    pub message: String,
    pub team: String,
}

/// Sort key that orders `team2` before `team10`.
fn natural_key(id: &str) -> (&str, u64, &str) {
    let digits_at = id.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    let (prefix, digits) = id.split_at(digits_at);
    (prefix, digits.parse().unwrap_or(0), id)
}

/// Render `template` with `status`, or a bare 500 if rendering fails.
pub fn render<T: Template>(template: &T, status: StatusCode) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => {
            error!(error = %err, "template rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong on our side.").into_response()
        }
    }
}
