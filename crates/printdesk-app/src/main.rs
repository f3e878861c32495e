// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printdesk: authenticated print submission desk.
//
// Entry point.  Initialises logging, loads configuration, builds the print
// client and services, and serves HTTP until Ctrl-C.

use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use printdesk_app::settings::{self, Cli};
use printdesk_app::{AppState, SubmissionService, router};
use printdesk_core::error::{PrintdeskError, Result};
use printdesk_document::ConversionPipeline;
use printdesk_print::CupsClient;
use printdesk_security::{AuditLog, Credentials, CsrfGuard};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = settings::init_tracing(cli.log_json) {
        eprintln!("printdesk: {e}");
        process::exit(1);
    }

    if let Err(e) = run(cli).await {
        error!(error = %e, "printdesk stopped");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = settings::load(&cli)?;
    info!(
        listen = %config.listen,
        print_server = %config.print_server_uri,
        workspace_root = %config.workspace_root.display(),
        "Printdesk starting"
    );

    let cups = Arc::new(CupsClient::new(&config.print_server_uri)?);
    let pipeline = ConversionPipeline::from_config(&config.converters);
    let mut submissions = SubmissionService::new(
        cups,
        Arc::new(config.policy.clone()),
        pipeline,
        &config.workspace_root,
    );
    if let Some(path) = &config.audit_db {
        submissions = submissions.with_audit(AuditLog::open(path)?);
        info!(path = %path.display(), "audit trail enabled");
    }

    let state = AppState::new(
        submissions,
        Credentials::new(&config.auth.username, &config.auth.password)?,
        CsrfGuard::new()?,
    );

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!(addr = %config.listen, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(PrintdeskError::Io)?;

    info!("Printdesk stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl-C");
    }
    info!("shutdown requested");
}
