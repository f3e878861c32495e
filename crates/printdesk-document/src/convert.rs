// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Staged conversion of an uploaded source file into print-ready output.
//
// The pipeline is an ordered list of stage descriptors.  Each stage runs one
// external program inside the submission's workspace and must leave a file
// with a fixed name behind; the next stage consumes it.  The first failure
// ends the pipeline, and nothing is retried.
//
// Argument templates may use these placeholders:
//
//   {source}     absolute path of the staged upload
//   {input}      output of the previous stage ({source} for the first stage)
//   {output}     absolute path this stage must write
//   {media}      page medium as the paginator names it ("Letter")
//   {paper}      page medium as the renderer names it ("letter")
//   {pages}      page range kept by the paginator ("1-20")
//   {footer}     caller-supplied footer label
//   {highlight}  syntax highlighting language, when one is known
//
// An argument containing a placeholder without a value (only {highlight}
// can be empty) is left out of the command line entirely.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{info, instrument, warn};

use printdesk_core::config::{ConverterConfig, Policy};
use printdesk_core::error::{PrintdeskError, Result};
use printdesk_core::types::{DocumentType, Stage, StageExit};

/// File written by the default paginate stage.
pub const PAGINATED_FILE: &str = "paginated.ps";

/// File written by the default render stage.
pub const RENDERED_FILE: &str = "document.pdf";

/// Converter stderr kept in logs, in bytes.
const STDERR_LOG_LIMIT: usize = 2048;

/// One external conversion step.
#[derive(Debug, Clone)]
pub struct StageSpec {
    pub stage: Stage,
    pub program: PathBuf,
    /// Argument templates, see the module docs for placeholders.
    pub args: Vec<String>,
    /// Name of the file the stage must create in the workspace.
    pub output: String,
    /// Format of that file.
    pub output_type: DocumentType,
}

impl StageSpec {
    /// Text to PostScript: fixed medium, one column, one page per sheet,
    /// truncated to the page cap, footer on every page, highlighting by
    /// extension.
    pub fn paginate(program: impl Into<PathBuf>) -> Self {
        Self {
            stage: Stage::Paginate,
            program: program.into(),
            args: [
                "--quiet",
                "--media={media}",
                "--columns=1",
                "--nup=1",
                "--pages={pages}",
                "--footer={footer}",
                "--highlight={highlight}",
                "--output={output}",
                "{source}",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            output: PAGINATED_FILE.into(),
            output_type: DocumentType::PostScript,
        }
    }

    /// PostScript to PDF on the same medium.
    pub fn render(program: impl Into<PathBuf>) -> Self {
        Self {
            stage: Stage::Render,
            program: program.into(),
            args: ["-sPAPERSIZE={paper}", "{input}", "{output}"]
                .into_iter()
                .map(String::from)
                .collect(),
            output: RENDERED_FILE.into(),
            output_type: DocumentType::Pdf,
        }
    }
}

/// The finished print artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedDocument {
    pub path: PathBuf,
    pub document_type: DocumentType,
    /// Pages in the output, when it is a PDF that could be read.
    pub page_count: Option<u32>,
}

/// Values substituted into argument templates for one stage.
struct Placeholders<'a> {
    source: &'a Path,
    input: &'a Path,
    output: &'a Path,
    media: &'a str,
    paper: &'a str,
    pages: &'a str,
    footer: &'a str,
    highlight: Option<&'a str>,
}

impl Placeholders<'_> {
    fn lookup(&self, name: &str) -> Option<Option<String>> {
        let value = match name {
            "source" => Some(self.source.display().to_string()),
            "input" => Some(self.input.display().to_string()),
            "output" => Some(self.output.display().to_string()),
            "media" => Some(self.media.to_string()),
            "paper" => Some(self.paper.to_string()),
            "pages" => Some(self.pages.to_string()),
            "footer" => Some(self.footer.to_string()),
            "highlight" => self.highlight.map(String::from),
            _ => return None,
        };
        Some(value)
    }

    /// Expand one template; `None` drops the argument.
    fn expand(&self, template: &str) -> Option<String> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open..];
            match after.find('}') {
                Some(close) => {
                    let name = &after[1..close];
                    match self.lookup(name) {
                        Some(Some(value)) => out.push_str(&value),
                        Some(None) => return None,
                        // Unknown names are literal text.
                        None => out.push_str(&after[..=close]),
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    out.push_str(after);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        Some(out)
    }
}

/// Paginator highlighting language for a file extension.
///
/// Extensions without a language print as plain text.
pub fn highlight_language(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "c" | "h" => Some("c"),
        "cpp" | "cc" | "cxx" | "hpp" => Some("cpp"),
        "java" => Some("java"),
        "py" => Some("python"),
        _ => None,
    }
}

/// Ordered list of conversion stages sharing one time limit per stage.
#[derive(Debug, Clone)]
pub struct ConversionPipeline {
    stages: Vec<StageSpec>,
    stage_timeout: Duration,
}

impl ConversionPipeline {
    pub fn new(stages: Vec<StageSpec>, stage_timeout: Duration) -> Self {
        Self {
            stages,
            stage_timeout,
        }
    }

    /// The standard paginate → render pipeline.
    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(
            vec![
                StageSpec::paginate(&config.paginate_program),
                StageSpec::render(&config.render_program),
            ],
            Duration::from_secs(config.stage_timeout_secs),
        )
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// Run every stage in order inside `workspace`.
    ///
    /// `source` is the staged upload; its extension selects highlighting.
    /// `footer` is printed on every page.  Page cap and medium come from
    /// `policy`.
    #[instrument(skip(self, policy), fields(workspace = %workspace.display()))]
    pub async fn convert(
        &self,
        workspace: &Path,
        source: &Path,
        footer: &str,
        policy: &Policy,
    ) -> Result<ConvertedDocument> {
        let last = self
            .stages
            .last()
            .ok_or_else(|| PrintdeskError::Config("no conversion stages configured".into()))?;

        let highlight = source
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(highlight_language);
        let pages = format!("1-{}", policy.max_pages);

        let mut input = source.to_path_buf();
        for spec in &self.stages {
            let output = workspace.join(&spec.output);
            let placeholders = Placeholders {
                source,
                input: &input,
                output: &output,
                media: policy.page_medium.paginator_name(),
                paper: policy.page_medium.renderer_name(),
                pages: &pages,
                footer,
                highlight,
            };
            let args = expand_args(&spec.args, &placeholders);
            self.run_stage(spec, &args, workspace, &output).await?;
            input = output;
        }

        let page_count = match last.output_type {
            DocumentType::Pdf => crate::pdf::page_count_async(&input).await,
            _ => None,
        };

        Ok(ConvertedDocument {
            path: input,
            document_type: last.output_type,
            page_count,
        })
    }

    async fn run_stage(
        &self,
        spec: &StageSpec,
        args: &[String],
        workspace: &Path,
        output: &Path,
    ) -> Result<()> {
        let stage = spec.stage;
        let command_line = format!("{} {}", spec.program.display(), args.join(" "));
        let started = Instant::now();

        let mut command = Command::new(&spec.program);
        command
            .args(args)
            .current_dir(workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output_result = match tokio::time::timeout(self.stage_timeout, command.output()).await {
            Ok(result) => result,
            Err(_) => {
                let after_secs = self.stage_timeout.as_secs();
                warn!(
                    %stage,
                    stage_number = stage.number(),
                    command = %command_line,
                    timeout_secs = after_secs,
                    "converter timed out and was killed"
                );
                return Err(PrintdeskError::ConversionFailed {
                    stage,
                    exit: StageExit::TimedOut { after_secs },
                });
            }
        };

        let process = output_result.map_err(|e| {
            warn!(
                %stage,
                stage_number = stage.number(),
                command = %command_line,
                error = %e,
                "failed to spawn converter"
            );
            PrintdeskError::ConverterUnavailable {
                stage,
                detail: e.to_string(),
            }
        })?;

        if !process.status.success() {
            let exit = match process.status.code() {
                Some(code) => StageExit::Code(code),
                None => StageExit::Signal,
            };
            let exit_code = exit.code().map(i64::from).unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&process.stderr);
            warn!(
                %stage,
                stage_number = stage.number(),
                exit_code,
                command = %command_line,
                stderr = %truncate(&stderr, STDERR_LOG_LIMIT),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "converter failed"
            );
            return Err(PrintdeskError::ConversionFailed { stage, exit });
        }

        let produced = tokio::fs::metadata(output)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !produced {
            warn!(
                %stage,
                stage_number = stage.number(),
                command = %command_line,
                expected = %output.display(),
                "converter exited successfully without writing its output"
            );
            return Err(PrintdeskError::ConversionMissingOutput { stage });
        }

        info!(
            %stage,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "conversion stage complete"
        );
        Ok(())
    }
}

fn expand_args(templates: &[String], placeholders: &Placeholders<'_>) -> Vec<String> {
    templates
        .iter()
        .filter_map(|template| placeholders.expand(template))
        .collect()
}

fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
