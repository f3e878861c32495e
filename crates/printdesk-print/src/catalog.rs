// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Destination catalog: the print service's live queue list, filtered to the
// queues policy allows users to see.  Nothing is cached; printers come and go
// between a page render and the matching submission.

use std::sync::Arc;

use tracing::{debug, instrument};

use printdesk_core::config::Policy;
use printdesk_core::error::Result;
use printdesk_core::types::Destination;

use crate::client::PrintService;

pub struct DestinationCatalog<S> {
    service: Arc<S>,
    policy: Arc<Policy>,
}

impl<S> Clone for DestinationCatalog<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            policy: Arc::clone(&self.policy),
        }
    }
}

impl<S: PrintService> DestinationCatalog<S> {
    pub fn new(service: Arc<S>, policy: Arc<Policy>) -> Self {
        Self { service, policy }
    }

    /// Every destination the service reports, each marked with whether
    /// policy exposes it.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Destination>> {
        let live = self.service.list_destinations().await?;
        let destinations: Vec<Destination> = live
            .into_iter()
            .map(|(id, info)| Destination {
                is_exposed: self.policy.is_exposed(&id),
                display_name: info.info.unwrap_or_else(|| id.clone()),
                id,
            })
            .collect();
        debug!(count = destinations.len(), "destinations listed");
        Ok(destinations)
    }

    /// The exposed subset, sorted by id.  Empty when none of the allowed
    /// queues currently exist.
    pub async fn list_exposed(&self) -> Result<Vec<Destination>> {
        let exposed: Vec<Destination> = self
            .list_all()
            .await?
            .into_iter()
            .filter(|d| d.is_exposed)
            .collect();
        debug!(count = exposed.len(), "exposed destinations");
        Ok(exposed)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use printdesk_core::error::PrintdeskError;
    use printdesk_core::types::DestinationInfo;

    use super::*;
    use crate::client::JobOptions;

    /// In-memory print service with a mutable queue list.
    #[derive(Default)]
    pub(crate) struct FakeService {
        pub queues: Mutex<BTreeMap<String, DestinationInfo>>,
        pub fail_listing: bool,
        pub reject_jobs: bool,
        pub listings: AtomicUsize,
        pub attempts: AtomicUsize,
        pub submitted: Mutex<Vec<(String, String, JobOptions)>>,
    }

    impl FakeService {
        pub fn with_queues(names: &[&str]) -> Self {
            let service = Self::default();
            {
                let mut queues = service.queues.lock().unwrap();
                for name in names {
                    queues.insert(name.to_string(), DestinationInfo::default());
                }
            }
            service
        }
    }

    impl PrintService for FakeService {
        async fn list_destinations(&self) -> Result<BTreeMap<String, DestinationInfo>> {
            self.listings.fetch_add(1, Ordering::SeqCst);
            if self.fail_listing {
                return Err(PrintdeskError::PrintBackend("connection refused".into()));
            }
            Ok(self.queues.lock().unwrap().clone())
        }

        async fn submit_job(
            &self,
            destination: &str,
            _file: &Path,
            title: &str,
            options: &JobOptions,
        ) -> Result<i32> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.reject_jobs {
                return Err(PrintdeskError::PrintBackend(
                    "client-error-not-possible".into(),
                ));
            }
            let mut submitted = self.submitted.lock().unwrap();
            submitted.push((destination.to_string(), title.to_string(), options.clone()));
            Ok(100 + submitted.len() as i32)
        }
    }

    fn catalog(service: FakeService) -> (DestinationCatalog<FakeService>, Arc<FakeService>) {
        let service = Arc::new(service);
        let catalog = DestinationCatalog::new(Arc::clone(&service), Arc::new(Policy::default()));
        (catalog, service)
    }

    #[tokio::test]
    async fn filters_to_exposed_queues() {
        let (catalog, _) = catalog(FakeService::with_queues(&["Room_16", "Office_Color", "Room_17"]));
        let ids: Vec<String> = catalog
            .list_exposed()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["Room_16", "Room_17"]);
    }

    #[tokio::test]
    async fn list_all_marks_exposure() {
        let (catalog, _) = catalog(FakeService::with_queues(&["Room_16", "Office_Color"]));
        let all = catalog.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|d| d.id == "Office_Color" && !d.is_exposed));
        assert!(all.iter().any(|d| d.id == "Room_16" && d.is_exposed));
    }

    #[tokio::test]
    async fn none_allowed_is_empty_not_error() {
        let (catalog, _) = catalog(FakeService::with_queues(&["Office_Color"]));
        assert!(catalog.list_exposed().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn display_name_prefers_printer_info() {
        let service = FakeService::with_queues(&["Room_200"]);
        service.queues.lock().unwrap().insert(
            "Room_200".into(),
            DestinationInfo {
                info: Some("Room 200 laser".into()),
                location: Some("Second floor".into()),
            },
        );
        let (catalog, _) = catalog(service);
        let exposed = catalog.list_exposed().await.unwrap();
        assert_eq!(exposed[0].display_name, "Room 200 laser");
    }

    #[tokio::test]
    async fn queries_service_on_every_call() {
        let (catalog, service) = catalog(FakeService::with_queues(&["Room_16"]));
        assert_eq!(catalog.list_exposed().await.unwrap().len(), 1);

        service.queues.lock().unwrap().clear();
        assert!(catalog.list_exposed().await.unwrap().is_empty());
        assert_eq!(service.listings.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn listing_failure_propagates() {
        let service = FakeService {
            fail_listing: true,
            ..Default::default()
        };
        let (catalog, _) = catalog(service);
        assert!(matches!(
            catalog.list_exposed().await,
            Err(PrintdeskError::PrintBackend(_))
        ));
    }
}
