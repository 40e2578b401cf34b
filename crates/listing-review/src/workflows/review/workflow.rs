use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{Listing, ListingId, ListingStatus, PendingTransition, SummaryCounts};
use super::session::SessionProvider;
use super::store::{ListingStore, PartitionQuery};
use super::view::{Notification, PartitionView, ReviewIssue, ReviewSnapshot, SummaryView};
use crate::config::ApiConfig;

/// Reviewer state over the remote listing store: tab-scoped partitions,
/// summary counts, and at most one unconfirmed status change.
///
/// Every method takes `&self`; state sits behind a mutex that is never held
/// across an `.await`, so overlapping calls (a tab switch during a confirm)
/// interleave safely. Each region remembers the generation of the latest
/// request issued for it and ignores responses from older requests. A single
/// partition load only ever writes its own slot; cross-partition
/// deduplication happens in `refresh_all`, where all pages land together.
pub struct ReviewWorkflow<S, P> {
    store: Arc<S>,
    session: Arc<P>,
    page_size: u32,
    completions: AtomicU64,
    state: Mutex<ReviewState>,
}

/// Result of a single region load.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded { count: usize },
    /// Summary counts replaced with a fresh copy.
    Refreshed { counts: SummaryCounts },
    /// Previous counts were kept; the failure was only logged.
    KeptPrevious { issue: ReviewIssue },
    Failed { issue: ReviewIssue },
    /// A newer request for the same region was issued; the response was dropped.
    Superseded,
}

/// Outcome of `refresh_all`, one entry per region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshReport {
    pub summary: LoadOutcome,
    pub partitions: Vec<(ListingStatus, LoadOutcome)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConfirmOutcome {
    NothingPending,
    LoginRequired {
        request: PendingTransition,
    },
    Applied {
        request: PendingTransition,
        refresh: RefreshReport,
    },
    Failed {
        request: PendingTransition,
        issue: ReviewIssue,
        refresh: RefreshReport,
    },
}

/// Local validation failure when proposing a transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("listing {0} is not in any loaded partition")]
    UnknownListing(ListingId),
    #[error("listing {listing_id} is already {status}")]
    SelfTransition {
        listing_id: ListingId,
        status: ListingStatus,
    },
}

#[derive(Debug)]
struct ReviewState {
    active_tab: ListingStatus,
    summary: SummaryView,
    summary_generation: u64,
    partitions: BTreeMap<ListingStatus, PartitionSlot>,
    pending: Option<PendingTransition>,
    notifications: Vec<Notification>,
}

#[derive(Debug)]
struct PartitionSlot {
    generation: u64,
    view: PartitionView,
}

impl Default for ReviewState {
    fn default() -> Self {
        let partitions = ListingStatus::ordered()
            .into_iter()
            .map(|status| {
                (
                    status,
                    PartitionSlot {
                        generation: 0,
                        view: PartitionView::NotLoaded,
                    },
                )
            })
            .collect();

        Self {
            active_tab: ListingStatus::Pending,
            summary: SummaryView::default(),
            summary_generation: 0,
            partitions,
            pending: None,
            notifications: Vec::new(),
        }
    }
}

type Fetched<T> = (Result<T, ReviewIssue>, u64);

impl<S, P> ReviewWorkflow<S, P>
where
    S: ListingStore + 'static,
    P: SessionProvider + 'static,
{
    pub fn new(store: Arc<S>, session: Arc<P>) -> Self {
        Self::with_page_size(store, session, ApiConfig::DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(store: Arc<S>, session: Arc<P>, page_size: u32) -> Self {
        Self {
            store,
            session,
            page_size: page_size.max(1),
            completions: AtomicU64::new(0),
            state: Mutex::new(ReviewState::default()),
        }
    }

    /// Activates a tab and reloads its partition alongside the summary.
    pub async fn select_tab(&self, status: ListingStatus) -> LoadOutcome {
        self.lock().active_tab = status;
        debug!(tab = status.key(), "tab selected");
        let (_, outcome) = tokio::join!(self.load_summary(), self.load_partition(status));
        outcome
    }

    pub async fn load_summary(&self) -> LoadOutcome {
        let ticket = self.begin_summary();
        let fetched = self.fetch_summary().await;
        self.lock().finish_summary(ticket, fetched)
    }

    pub async fn load_partition(&self, status: ListingStatus) -> LoadOutcome {
        let ticket = self.begin_partition(status);
        let (result, _) = self.fetch_partition(status).await;
        self.lock().finish_partition(status, ticket, result)
    }

    /// Reloads the summary and all three partitions, applying the four
    /// results together once every request has resolved.
    pub async fn refresh_all(&self) -> RefreshReport {
        let summary_ticket = self.begin_summary();
        let tickets = ListingStatus::ordered().map(|status| (status, self.begin_partition(status)));

        let (summary, pending, approved, rejected) = tokio::join!(
            self.fetch_summary(),
            self.fetch_partition(ListingStatus::Pending),
            self.fetch_partition(ListingStatus::Approved),
            self.fetch_partition(ListingStatus::Rejected),
        );

        let mut state = self.lock();
        let summary = state.finish_summary(summary_ticket, summary);
        let pages = tickets
            .into_iter()
            .zip([pending, approved, rejected])
            .map(|((status, ticket), fetched)| (status, ticket, fetched))
            .collect();
        let partitions = state.finish_refresh(pages);
        info!("listing review state refreshed");

        RefreshReport {
            summary,
            partitions,
        }
    }

    /// Records an unconfirmed status change, replacing any earlier one. The
    /// id is matched against loaded listings by its text form, so `42` finds
    /// a listing the store keyed as `"42"`; the request carries the stored id.
    pub fn propose_transition(
        &self,
        listing_id: ListingId,
        target: ListingStatus,
    ) -> Result<PendingTransition, TransitionError> {
        let mut state = self.lock();
        let (listing_id, from) = state
            .locate(&listing_id)
            .ok_or_else(|| TransitionError::UnknownListing(listing_id.clone()))?;

        if !from.can_transition_to(target) {
            return Err(TransitionError::SelfTransition {
                listing_id,
                status: from,
            });
        }

        let request = PendingTransition {
            listing_id,
            from,
            target,
        };
        if let Some(previous) = state.pending.replace(request.clone()) {
            debug!(listing = %previous.listing_id, "replacing unconfirmed transition");
        }
        Ok(request)
    }

    pub fn cancel_transition(&self) -> Option<PendingTransition> {
        self.lock().pending.take()
    }

    /// Sends the pending status change and then reloads everything, whether
    /// or not the change was accepted.
    pub async fn confirm_transition(&self) -> ConfirmOutcome {
        let Some(request) = self.lock().pending.take() else {
            return ConfirmOutcome::NothingPending;
        };

        let Some(token) = self.session.access_token() else {
            warn!(listing = %request.listing_id, "status change attempted without a session");
            self.notify(Notification::blocking(&ReviewIssue::login_required()));
            return ConfirmOutcome::LoginRequired { request };
        };

        let result = self
            .store
            .update_status(&request.listing_id, request.target, &token)
            .await;

        let issue = match result {
            Ok(()) => {
                info!(
                    listing = %request.listing_id,
                    from = request.from.wire(),
                    to = request.target.wire(),
                    "listing status updated"
                );
                self.notify(Notification::info(format!(
                    "Listing {} moved to {}.",
                    request.listing_id,
                    request.target.label()
                )));
                None
            }
            Err(err) => {
                warn!(listing = %request.listing_id, error = %err, "listing status update failed");
                let issue = ReviewIssue::update(&err);
                self.notify(Notification::blocking(&issue));
                Some(issue)
            }
        };

        let refresh = self.refresh_all().await;
        match issue {
            None => ConfirmOutcome::Applied { request, refresh },
            Some(issue) => ConfirmOutcome::Failed {
                request,
                issue,
                refresh,
            },
        }
    }

    pub fn active_tab(&self) -> ListingStatus {
        self.lock().active_tab
    }

    pub fn active_view(&self) -> PartitionView {
        let state = self.lock();
        state.partition(state.active_tab).view.clone()
    }

    pub fn partition(&self, status: ListingStatus) -> PartitionView {
        self.lock().partition(status).view.clone()
    }

    pub fn summary(&self) -> SummaryView {
        self.lock().summary.clone()
    }

    pub fn pending_transition(&self) -> Option<PendingTransition> {
        self.lock().pending.clone()
    }

    /// Drains notifications raised since the last call.
    pub fn take_notifications(&self) -> Vec<Notification> {
        std::mem::take(&mut self.lock().notifications)
    }

    pub fn snapshot(&self) -> ReviewSnapshot {
        let state = self.lock();
        ReviewSnapshot {
            active_tab: state.active_tab,
            summary: state.summary.clone(),
            active: state.partition(state.active_tab).view.clone(),
            pending: state.pending.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ReviewState> {
        self.state.lock().expect("review state mutex poisoned")
    }

    fn notify(&self, notification: Notification) {
        self.lock().notifications.push(notification);
    }

    fn completed(&self) -> u64 {
        self.completions.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn begin_summary(&self) -> u64 {
        let mut state = self.lock();
        state.summary_generation += 1;
        state.summary_generation
    }

    fn begin_partition(&self, status: ListingStatus) -> u64 {
        let mut state = self.lock();
        let slot = state.partition_mut(status);
        slot.generation += 1;
        slot.view = PartitionView::Loading;
        slot.generation
    }

    async fn fetch_summary(&self) -> Fetched<SummaryCounts> {
        let result = self
            .store
            .summary()
            .await
            .map_err(|err| ReviewIssue::summary_load(&err));
        (result, self.completed())
    }

    async fn fetch_partition(&self, status: ListingStatus) -> Fetched<Vec<Listing>> {
        let query = PartitionQuery::first_page(status, self.page_size);
        let result = match self.store.list_by_status(query).await {
            Ok(page) => Ok(page
                .content
                .into_iter()
                .filter_map(|record| match record.into_listing(status) {
                    Ok(listing) => Some(listing),
                    Err(rejection) => {
                        warn!(partition = status.key(), %rejection, "dropping listing record");
                        None
                    }
                })
                .collect()),
            Err(err) => {
                warn!(partition = status.key(), error = %err, "listing partition load failed");
                Err(ReviewIssue::partition_load(status, &err))
            }
        };
        (result, self.completed())
    }
}

impl ReviewState {
    fn partition(&self, status: ListingStatus) -> &PartitionSlot {
        &self.partitions[&status]
    }

    fn partition_mut(&mut self, status: ListingStatus) -> &mut PartitionSlot {
        self.partitions
            .entry(status)
            .or_insert_with(|| PartitionSlot {
                generation: 0,
                view: PartitionView::NotLoaded,
            })
    }

    /// Finds a loaded listing by id, preferring an exact match over one that
    /// only agrees on the rendered id.
    fn locate(&self, id: &ListingId) -> Option<(ListingId, ListingStatus)> {
        let loaded = || {
            self.partitions.iter().flat_map(|(status, slot)| {
                slot.view
                    .listings()
                    .iter()
                    .map(move |listing| (&listing.id, *status))
            })
        };
        let rendered = id.to_string();

        loaded()
            .find(|(candidate, _)| *candidate == id)
            .or_else(|| loaded().find(|(candidate, _)| candidate.to_string() == rendered))
            .map(|(candidate, status)| (candidate.clone(), status))
    }

    fn finish_summary(&mut self, ticket: u64, fetched: Fetched<SummaryCounts>) -> LoadOutcome {
        if ticket != self.summary_generation {
            debug!(ticket, current = self.summary_generation, "dropping stale summary response");
            return LoadOutcome::Superseded;
        }

        match fetched.0 {
            Ok(counts) => {
                self.summary = SummaryView {
                    counts: Some(counts),
                    issue: None,
                };
                LoadOutcome::Refreshed { counts }
            }
            Err(issue) => {
                warn!(message = %issue.message, "summary load failed");
                if self.summary.counts.is_some() {
                    LoadOutcome::KeptPrevious { issue }
                } else {
                    self.summary.issue = Some(issue.clone());
                    LoadOutcome::Failed { issue }
                }
            }
        }
    }

    fn finish_partition(
        &mut self,
        status: ListingStatus,
        ticket: u64,
        result: Result<Vec<Listing>, ReviewIssue>,
    ) -> LoadOutcome {
        let current = self.partition(status).generation;
        if ticket != current {
            debug!(partition = status.key(), ticket, current, "dropping stale partition response");
            return LoadOutcome::Superseded;
        }

        let slot = self.partition_mut(status);
        match result {
            Ok(listings) => {
                let count = listings.len();
                slot.view = PartitionView::Loaded { listings };
                LoadOutcome::Loaded { count }
            }
            Err(issue) => {
                slot.view = PartitionView::Failed {
                    issue: issue.clone(),
                };
                LoadOutcome::Failed { issue }
            }
        }
    }

    /// Applies one page per partition from the same reload cycle. Pages that
    /// are still current are deduplicated against each other first: when two
    /// of them list the same id, the page that resolved later keeps it.
    fn finish_refresh(
        &mut self,
        pages: Vec<(ListingStatus, u64, Fetched<Vec<Listing>>)>,
    ) -> Vec<(ListingStatus, LoadOutcome)> {
        let mut owners: BTreeMap<ListingId, (ListingStatus, u64)> = BTreeMap::new();
        for (status, ticket, (result, completed_at)) in &pages {
            if *ticket != self.partition(*status).generation {
                continue;
            }
            let Ok(listings) = result else {
                continue;
            };
            for listing in listings {
                let owner = owners
                    .entry(listing.id.clone())
                    .or_insert((*status, *completed_at));
                if *completed_at > owner.1 {
                    *owner = (*status, *completed_at);
                }
            }
        }

        pages
            .into_iter()
            .map(|(status, ticket, (result, _))| {
                let result = result.map(|listings| {
                    listings
                        .into_iter()
                        .filter(|listing| {
                            let keep = owners
                                .get(&listing.id)
                                .map_or(true, |(owner, _)| *owner == status);
                            if !keep {
                                debug!(
                                    listing = %listing.id,
                                    dropped_from = status.key(),
                                    "listing reported by two partitions"
                                );
                            }
                            keep
                        })
                        .collect()
                });
                (status, self.finish_partition(status, ticket, result))
            })
            .collect()
    }
}
