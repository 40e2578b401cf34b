use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::workflows::review::{
    AccessToken, Listing, ListingDetails, ListingId, ListingPage, ListingRecord, ListingStatus,
    ListingStore, PartitionQuery, ReviewWorkflow, StoreError, SummaryCounts, TokenStore,
};
use crate::workflows::sandbox::InMemoryListingStore;

pub(super) const TOKEN: &str = "admin-jwt";

pub(super) type TestWorkflow = ReviewWorkflow<FakeStore, TokenStore>;

pub(super) fn listing(id: i64, status: ListingStatus) -> Listing {
    Listing {
        id: ListingId::Numeric(id),
        status,
        details: ListingDetails {
            title: Some(format!("Listing {id}")),
            city: Some("Leeds".to_string()),
            price: Some(1000.0 + id as f64),
            ..ListingDetails::default()
        },
    }
}

/// Two pending listings (41, 42) and one approved (7).
pub(super) fn seeded_store() -> Arc<FakeStore> {
    Arc::new(FakeStore::new(vec![
        listing(7, ListingStatus::Approved),
        listing(41, ListingStatus::Pending),
        listing(42, ListingStatus::Pending),
    ]))
}

pub(super) fn logged_in() -> Arc<TokenStore> {
    Arc::new(TokenStore::new(AccessToken::new(TOKEN)))
}

pub(super) fn build_workflow(store: &Arc<FakeStore>, session: Arc<TokenStore>) -> TestWorkflow {
    ReviewWorkflow::new(store.clone(), session)
}

pub(super) fn ids(listings: &[Listing]) -> Vec<i64> {
    listings
        .iter()
        .filter_map(|listing| match listing.id {
            ListingId::Numeric(id) => Some(id),
            ListingId::Text(_) => None,
        })
        .collect()
}

/// Fails if any listing id shows up in more than one partition.
pub(super) fn assert_disjoint(workflow: &TestWorkflow) {
    let mut seen = BTreeMap::new();
    for status in ListingStatus::ordered() {
        for listing in workflow.partition(status).listings() {
            if let Some(previous) = seen.insert(listing.id.clone(), status) {
                panic!("listing {} is in both {previous} and {status}", listing.id);
            }
        }
    }
}

pub(super) async fn wait_for_list_calls(store: &FakeStore, status: ListingStatus, expected: usize) {
    while store.list_calls(status) < expected {
        tokio::task::yield_now().await;
    }
}

pub(super) async fn wait_for_update_calls(store: &FakeStore, expected: usize) {
    while store.update_calls() < expected {
        tokio::task::yield_now().await;
    }
}

/// Sandbox-backed store that counts calls per endpoint, can be told to fail,
/// and can park a single request until the test releases it.
#[derive(Default)]
pub(super) struct FakeStore {
    pub(super) inner: InMemoryListingStore,
    summary_calls: AtomicUsize,
    update_calls: AtomicUsize,
    list_calls: Mutex<BTreeMap<ListingStatus, usize>>,
    failing_partitions: Mutex<HashSet<ListingStatus>>,
    fail_summary: Mutex<Option<StoreError>>,
    fail_update: Mutex<Option<StoreError>>,
    extra_records: Mutex<Vec<(ListingStatus, ListingRecord)>>,
    partition_gates: Mutex<BTreeMap<ListingStatus, Arc<Notify>>>,
    update_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeStore {
    pub(super) fn new(listings: Vec<Listing>) -> Self {
        Self {
            inner: InMemoryListingStore::new(listings)
                .expect("numeric ids")
                .with_required_token(TOKEN),
            ..Self::default()
        }
    }

    pub(super) fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    pub(super) fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub(super) fn list_calls(&self, status: ListingStatus) -> usize {
        self.list_calls
            .lock()
            .expect("fake store mutex poisoned")
            .get(&status)
            .copied()
            .unwrap_or(0)
    }

    pub(super) fn fail_partition(&self, status: ListingStatus) {
        self.failing_partitions
            .lock()
            .expect("fake store mutex poisoned")
            .insert(status);
    }

    pub(super) fn heal_partition(&self, status: ListingStatus) {
        self.failing_partitions
            .lock()
            .expect("fake store mutex poisoned")
            .remove(&status);
    }

    pub(super) fn fail_summary(&self, err: Option<StoreError>) {
        *self.fail_summary.lock().expect("fake store mutex poisoned") = err;
    }

    pub(super) fn fail_update(&self, err: StoreError) {
        *self.fail_update.lock().expect("fake store mutex poisoned") = Some(err);
    }

    /// Appends a raw record to every page served for `status`.
    pub(super) fn append_record(
        &self,
        status: ListingStatus,
        record: ListingRecord,
    ) {
        self.extra_records
            .lock()
            .expect("fake store mutex poisoned")
            .push((status, record));
    }

    /// Parks the next request for `status` after its response is computed.
    pub(super) fn hold_partition(&self, status: ListingStatus) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.partition_gates
            .lock()
            .expect("fake store mutex poisoned")
            .insert(status, gate.clone());
        gate
    }

    /// Parks the next status update before it is applied.
    pub(super) fn hold_update(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.update_gate.lock().expect("fake store mutex poisoned") = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl ListingStore for FakeStore {
    async fn summary(&self) -> Result<SummaryCounts, StoreError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self
            .fail_summary
            .lock()
            .expect("fake store mutex poisoned")
            .clone()
        {
            return Err(err);
        }
        Ok(self.inner.summary())
    }

    async fn list_by_status(&self, query: PartitionQuery) -> Result<ListingPage, StoreError> {
        *self
            .list_calls
            .lock()
            .expect("fake store mutex poisoned")
            .entry(query.status)
            .or_insert(0) += 1;

        let failing = self
            .failing_partitions
            .lock()
            .expect("fake store mutex poisoned")
            .contains(&query.status);
        let response = if failing {
            Err(StoreError::Rejected {
                status: 500,
                message: "database offline".to_string(),
            })
        } else {
            ListingStore::list_by_status(&self.inner, query)
                .await
                .map(|mut page| {
                    let extras = self.extra_records.lock().expect("fake store mutex poisoned");
                    page.content.extend(
                        extras
                            .iter()
                            .filter(|(status, _)| *status == query.status)
                            .map(|(_, record)| record.clone()),
                    );
                    page
                })
        };

        let gate = self
            .partition_gates
            .lock()
            .expect("fake store mutex poisoned")
            .remove(&query.status);
        if let Some(gate) = gate {
            gate.notified().await;
        }
        response
    }

    async fn update_status(
        &self,
        id: &ListingId,
        status: ListingStatus,
        token: &AccessToken,
    ) -> Result<(), StoreError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self
            .update_gate
            .lock()
            .expect("fake store mutex poisoned")
            .take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(err) = self
            .fail_update
            .lock()
            .expect("fake store mutex poisoned")
            .clone()
        {
            return Err(err);
        }
        ListingStore::update_status(&self.inner, id, status, token).await
    }
}
