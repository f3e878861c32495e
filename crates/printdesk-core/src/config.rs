// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration and submission policy.
//
// Both are loaded once at startup and shared read-only for the lifetime of
// the process.

use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PrintdeskError, Result};
use crate::types::PageMedium;

/// Per-submission rules checked before and during conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// File extensions (without the dot) that may be printed.
    pub allowed_extensions: BTreeSet<String>,
    /// Recognised groups, each mapped to the destination suggested to it.
    pub groups: BTreeMap<String, String>,
    /// Print service destinations users are allowed to see and use.
    pub exposed_destinations: BTreeSet<String>,
    /// Pages beyond this count are dropped during pagination.
    pub max_pages: u32,
    /// Largest upload accepted, in bytes.
    pub max_bytes: u64,
    /// Page medium used by every conversion stage.
    pub page_medium: PageMedium,
}

impl Default for Policy {
    fn default() -> Self {
        let allowed_extensions = ["txt", "c", "cpp", "java", "py"]
            .into_iter()
            .map(String::from)
            .collect();

        let exposed_destinations = ["Room_200", "Room_200C", "Room_16", "Room_17"]
            .into_iter()
            .map(String::from)
            .collect();

        let groups = (1..=16)
            .map(|n| {
                let room = if n <= 8 { "Room_16" } else { "Room_17" };
                (format!("team{n}"), room.to_string())
            })
            .collect();

        Self {
            allowed_extensions,
            groups,
            exposed_destinations,
            max_pages: 20,
            max_bytes: 16 * 1024 * 1024,
            page_medium: PageMedium::Letter,
        }
    }
}

impl Policy {
    /// Case-insensitive extension check.
    pub fn is_allowed_extension(&self, extension: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    }

    pub fn has_group(&self, group_id: &str) -> bool {
        self.groups.contains_key(group_id)
    }

    /// Destination suggested for a group, if the group is known.
    pub fn destination_hint(&self, group_id: &str) -> Option<&str> {
        self.groups.get(group_id).map(String::as_str)
    }

    pub fn is_exposed(&self, destination_id: &str) -> bool {
        self.exposed_destinations.contains(destination_id)
    }

    /// Reject configurations that could never accept a submission.
    pub fn validate_self(&self) -> Result<()> {
        if self.allowed_extensions.is_empty() {
            return Err(PrintdeskError::Config(
                "policy.allowed_extensions must not be empty".into(),
            ));
        }
        if let Some(bad) = self
            .allowed_extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.contains('.') || ext.contains('/'))
        {
            return Err(PrintdeskError::Config(format!(
                "policy.allowed_extensions contains an invalid entry '{bad}'"
            )));
        }
        if self.max_pages == 0 {
            return Err(PrintdeskError::Config("policy.max_pages must be at least 1".into()));
        }
        if self.max_bytes == 0 {
            return Err(PrintdeskError::Config("policy.max_bytes must be at least 1".into()));
        }
        for (group, hint) in &self.groups {
            if !self.is_exposed(hint) {
                return Err(PrintdeskError::Config(format!(
                    "group '{group}' suggests destination '{hint}' which is not exposed"
                )));
            }
        }
        Ok(())
    }
}

/// Basic-auth credentials required at the HTTP boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

/// External converter programs and their limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Program for the paginate stage (text to PostScript).
    pub paginate_program: PathBuf,
    /// Program for the render stage (PostScript to PDF).
    pub render_program: PathBuf,
    /// Wall-clock limit for each stage.
    pub stage_timeout_secs: u64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            paginate_program: PathBuf::from("enscript"),
            render_program: PathBuf::from("ps2pdf"),
            stage_timeout_secs: 60,
        }
    }
}

/// Process-wide settings, loaded from a JSON file at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub listen: SocketAddr,
    /// Base URI of the CUPS print service (e.g. `ipp://cups2:631`).
    pub print_server_uri: String,
    /// Directory under which per-submission workspaces are created.
    pub workspace_root: PathBuf,
    /// SQLite file for the submission audit trail; disabled when unset.
    pub audit_db: Option<PathBuf>,
    pub auth: AuthConfig,
    pub converters: ConverterConfig,
    pub policy: Policy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            print_server_uri: "ipp://localhost:631".into(),
            workspace_root: std::env::temp_dir().join("printdesk"),
            audit_db: None,
            auth: AuthConfig {
                username: "printdesk".into(),
                password: String::new(),
            },
            converters: ConverterConfig::default(),
            policy: Policy::default(),
        }
    }
}

impl AppConfig {
    /// Parse a configuration document, filling omitted fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check the whole configuration before the server starts.
    pub fn validate(&self) -> Result<()> {
        if self.auth.username.is_empty() || self.auth.password.is_empty() {
            return Err(PrintdeskError::Config(
                "auth.username and auth.password must both be set".into(),
            ));
        }
        if self.converters.stage_timeout_secs == 0 {
            return Err(PrintdeskError::Config(
                "converters.stage_timeout_secs must be at least 1".into(),
            ));
        }
        self.policy.validate_self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_consistent() {
        let policy = Policy::default();
        policy.validate_self().expect("default policy valid");
        assert!(policy.has_group("team3"));
        assert_eq!(policy.destination_hint("team3"), Some("Room_16"));
        assert_eq!(policy.destination_hint("team12"), Some("Room_17"));
    }

    #[test]
    fn extension_check_ignores_case() {
        let policy = Policy::default();
        assert!(policy.is_allowed_extension("PY"));
        assert!(policy.is_allowed_extension("cpp"));
        assert!(!policy.is_allowed_extension("exe"));
    }

    #[test]
    fn hint_must_be_exposed() {
        let mut policy = Policy::default();
        policy.groups.insert("ghost".into(), "Basement".into());
        assert!(matches!(policy.validate_self(), Err(PrintdeskError::Config(_))));
    }

    #[test]
    fn zero_page_cap_rejected() {
        let policy = Policy {
            max_pages: 0,
            ..Policy::default()
        };
        assert!(policy.validate_self().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AppConfig::from_json(
            r#"{ "print_server_uri": "ipp://cups2:631",
                 "auth": { "username": "tjioi", "password": "pw" },
                 "policy": { "max_pages": 5 } }"#,
        )
        .expect("parse");
        assert_eq!(config.print_server_uri, "ipp://cups2:631");
        assert_eq!(config.policy.max_pages, 5);
        assert!(config.policy.is_allowed_extension("java"));
        assert_eq!(config.converters.render_program, PathBuf::from("ps2pdf"));
        config.validate().expect("valid");
    }

    #[test]
    fn missing_password_rejected() {
        assert!(AppConfig::default().validate().is_err());
    }
}
