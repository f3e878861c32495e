// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Startup settings: command line, configuration file and log output.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use printdesk_core::AppConfig;
use printdesk_core::error::{PrintdeskError, Result};

/// Authenticated print submission desk.
#[derive(Debug, Parser)]
#[command(name = "printdesk", version, about)]
pub struct Cli {
    /// JSON configuration file; built-in defaults apply when omitted.
    #[arg(long, env = "PRINTDESK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration file.
    #[arg(long, env = "PRINTDESK_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Login password, overriding the configuration file.
    #[arg(long, env = "PRINTDESK_AUTH_PASSWORD", hide_env_values = true)]
    pub auth_password: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
}

/// Install the global tracing subscriber.  `RUST_LOG` wins over the
/// `info` default.
pub fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if json {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| PrintdeskError::Config(format!("failed to install tracing subscriber: {e}")))
}

/// Read the configuration named on the command line and apply overrides.
///
/// The result has passed [`AppConfig::validate`].
pub fn load(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => {
            info!("no configuration file given, using defaults");
            AppConfig::default()
        }
    };

    if let Some(listen) = cli.listen {
        config.listen = listen;
    }
    if let Some(password) = &cli.auth_password {
        config.auth.password = password.clone();
    }

    config.validate()?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<AppConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        PrintdeskError::Config(format!("cannot read {}: {e}", path.display()))
    })?;
    let config = AppConfig::from_json(&text)?;
    debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(config: Option<PathBuf>) -> Cli {
        Cli {
            config,
            listen: None,
            auth_password: None,
            log_json: false,
        }
    }

    #[test]
    fn file_values_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("printdesk.json");
        std::fs::write(
            &path,
            r#"{ "listen": "127.0.0.1:9000",
                 "auth": { "username": "tjioi", "password": "from-file" },
                 "policy": { "page_medium": "A4" } }"#,
        )
        .unwrap();

        let mut args = cli(Some(path));
        let config = load(&args).unwrap();
        assert_eq!(config.listen, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.auth.password, "from-file");

        args.listen = Some("0.0.0.0:8181".parse().unwrap());
        args.auth_password = Some("from-env".into());
        let config = load(&args).unwrap();
        assert_eq!(config.listen.port(), 8181);
        assert_eq!(config.auth.password, "from-env");
    }

    #[test]
    fn defaults_need_a_password() {
        assert!(matches!(load(&cli(None)), Err(PrintdeskError::Config(_))));

        let mut args = cli(None);
        args.auth_password = Some("pw".into());
        assert!(load(&args).is_ok());
    }

    #[test]
    fn unreadable_or_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(&cli(Some(dir.path().join("absent.json")))),
            Err(PrintdeskError::Config(_))
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(
            load(&cli(Some(bad))),
            Err(PrintdeskError::Serialization(_))
        ));
    }

    #[test]
    fn cli_parses_flags() {
        let parsed = Cli::try_parse_from([
            "printdesk",
            "--config",
            "/etc/printdesk.json",
            "--listen",
            "127.0.0.1:8080",
            "--log-json",
        ])
        .unwrap();
        assert_eq!(parsed.config, Some(PathBuf::from("/etc/printdesk.json")));
        assert!(parsed.log_json);
    }
}
