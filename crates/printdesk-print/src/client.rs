// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Async client for the shared CUPS print service.
//
// Uses the `ipp` crate's async API:
//   - CUPS-Get-Printers  (CUPS IPP extension, lists every queue)
//   - Print-Job          (RFC 8011 §4.2.1)
//
// One `CupsClient` is built at startup and shared by reference; it holds no
// connection state, so every call is an independent request.

use std::collections::BTreeMap;
use std::future::Future;
use std::io::Cursor;
use std::path::Path;

use ipp::prelude::*;
use tracing::{debug, error, info, instrument};

use printdesk_core::error::{PrintdeskError, Result};
use printdesk_core::types::{DestinationInfo, DocumentType};

/// Extra job attributes, sent as IPP keywords.
pub type JobOptions = BTreeMap<String, String>;

/// Operations the system needs from an external print service.
pub trait PrintService: Send + Sync + 'static {
    /// Every destination the service knows, keyed by queue name.
    fn list_destinations(
        &self,
    ) -> impl Future<Output = Result<BTreeMap<String, DestinationInfo>>> + Send;

    /// Submit the file at `file` to `destination`, returning the job id.
    fn submit_job(
        &self,
        destination: &str,
        file: &Path,
        title: &str,
        options: &JobOptions,
    ) -> impl Future<Output = Result<i32>> + Send;
}

/// [`PrintService`] backed by a CUPS server over IPP.
#[derive(Debug, Clone)]
pub struct CupsClient {
    server: Uri,
}

impl CupsClient {
    /// `server_uri` is the CUPS root, e.g. `ipp://localhost:631`.
    pub fn new(server_uri: &str) -> Result<Self> {
        let server: Uri = server_uri.parse().map_err(|e| {
            PrintdeskError::Config(format!("invalid print server URI '{server_uri}': {e}"))
        })?;
        Ok(Self { server })
    }

    fn printer_uri(&self, destination: &str) -> Result<Uri> {
        let base = self.server.to_string();
        let uri = format!("{}/printers/{destination}", base.trim_end_matches('/'));
        uri.parse()
            .map_err(|e| PrintdeskError::PrintBackend(format!("invalid printer URI '{uri}': {e}")))
    }
}

impl PrintService for CupsClient {
    #[instrument(skip(self), fields(server = %self.server))]
    async fn list_destinations(&self) -> Result<BTreeMap<String, DestinationInfo>> {
        let operation = IppOperationBuilder::cups().get_printers();
        let client = AsyncIppClient::new(self.server.clone());

        debug!("sending CUPS-Get-Printers");
        let response = client
            .send(operation)
            .await
            .map_err(|e| PrintdeskError::PrintBackend(format!("CUPS-Get-Printers: {e}")))?;

        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            error!(status = ?code, "CUPS-Get-Printers failed");
            return Err(PrintdeskError::PrintBackend(format!(
                "CUPS-Get-Printers returned status {code:?}"
            )));
        }

        let destinations = parse_printers(response.attributes());
        debug!(count = destinations.len(), "received destination list");
        Ok(destinations)
    }

    #[instrument(skip(self, file, options), fields(destination = %destination, title = %title))]
    async fn submit_job(
        &self,
        destination: &str,
        file: &Path,
        title: &str,
        options: &JobOptions,
    ) -> Result<i32> {
        let uri = self.printer_uri(destination)?;
        let bytes = tokio::fs::read(file).await?;
        let document_type = document_type_of(file);
        let payload = IppPayload::new(Cursor::new(bytes));

        let mut builder = IppOperationBuilder::print_job(uri.clone(), payload)
            .job_title(title)
            .document_format(document_type.mime_type());
        for (name, value) in options {
            builder = builder.attribute(IppAttribute::new(
                name.as_str(),
                IppValue::Keyword(value.clone()),
            ));
        }
        let operation = builder.build();

        let client = AsyncIppClient::new(uri);

        info!(mime = document_type.mime_type(), "sending Print-Job");
        let response = client
            .send(operation)
            .await
            .map_err(|e| PrintdeskError::PrintBackend(format!("Print-Job: {e}")))?;

        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            error!(status = ?code, "Print-Job failed");
            return Err(PrintdeskError::PrintBackend(format!(
                "Print-Job returned status {code:?}"
            )));
        }

        let job_id = extract_job_id(response.attributes()).ok_or_else(|| {
            PrintdeskError::PrintBackend("Print-Job response missing job-id attribute".into())
        })?;

        info!(job_id, "print job accepted");
        Ok(job_id)
    }
}

fn document_type_of(file: &Path) -> DocumentType {
    match file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("pdf") => DocumentType::Pdf,
        Some("ps") => DocumentType::PostScript,
        _ => DocumentType::PlainText,
    }
}

/// One destination per Printer Attributes group, keyed by `printer-name`.
fn parse_printers(attrs: &IppAttributes) -> BTreeMap<String, DestinationInfo> {
    let mut destinations = BTreeMap::new();
    for group in attrs.groups_of(DelimiterTag::PrinterAttributes) {
        let attributes = group.attributes();
        let Some(name) = attributes.get("printer-name").map(|a| a.value().to_string()) else {
            continue;
        };
        let text = |key: &str| {
            attributes
                .get(key)
                .map(|a| a.value().to_string())
                .filter(|v| !v.is_empty())
        };
        destinations.insert(
            name,
            DestinationInfo {
                info: text("printer-info"),
                location: text("printer-location"),
            },
        );
    }
    destinations
}

fn extract_job_id(attrs: &IppAttributes) -> Option<i32> {
    for group in attrs.groups_of(DelimiterTag::JobAttributes) {
        if let Some(attr) = group.attributes().get("job-id")
            && let IppValue::Integer(id) = attr.value()
        {
            return Some(*id);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_server_uri() {
        let err = CupsClient::new("not a uri").unwrap_err();
        assert!(matches!(err, PrintdeskError::Config(_)));
    }

    #[test]
    fn printer_uri_joins_queue_name() {
        let client = CupsClient::new("ipp://localhost:631").unwrap();
        let uri = client.printer_uri("Room_16").unwrap();
        assert_eq!(uri.path(), "/printers/Room_16");
        assert_eq!(uri.host(), Some("localhost"));
    }

    #[test]
    fn document_format_follows_extension() {
        assert_eq!(document_type_of(Path::new("/w/document.pdf")), DocumentType::Pdf);
        assert_eq!(document_type_of(Path::new("/w/paginated.PS")), DocumentType::PostScript);
        assert_eq!(document_type_of(Path::new("/w/notes.txt")), DocumentType::PlainText);
    }

    #[tokio::test]
    async fn unreachable_server_is_backend_error() {
        // Nothing listens on port 9 (discard) on loopback in test environments.
        let client = CupsClient::new("ipp://127.0.0.1:9").unwrap();
        let err = client.list_destinations().await.unwrap_err();
        assert!(matches!(err, PrintdeskError::PrintBackend(_)));
    }
}
