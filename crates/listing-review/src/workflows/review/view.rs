use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Listing, ListingStatus, PendingTransition, SummaryCounts};
use super::store::StoreError;

/// What a reviewer sees for one status region.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PartitionView {
    NotLoaded,
    Loading,
    Loaded { listings: Vec<Listing> },
    Failed { issue: ReviewIssue },
}

impl PartitionView {
    /// Listings on display; empty unless the partition loaded successfully.
    pub fn listings(&self) -> &[Listing] {
        match self {
            PartitionView::Loaded { listings } => listings,
            _ => &[],
        }
    }

    pub fn issue(&self) -> Option<&ReviewIssue> {
        match self {
            PartitionView::Failed { issue } => Some(issue),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PartitionView::Loading)
    }
}

/// Summary region: last known counts plus an issue shown only when no counts exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryView {
    pub counts: Option<SummaryCounts>,
    pub issue: Option<ReviewIssue>,
}

impl SummaryView {
    pub fn counts_or_zero(&self) -> SummaryCounts {
        self.counts.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    LoadFailed,
    UpdateFailed,
    LoginRequired,
    SessionRejected,
}

/// A user-facing problem scoped to one region or action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewIssue {
    pub kind: IssueKind,
    pub message: String,
}

impl ReviewIssue {
    pub fn login_required() -> Self {
        Self {
            kind: IssueKind::LoginRequired,
            message: "You must be logged in to change a listing status.".to_string(),
        }
    }

    pub fn summary_load(err: &StoreError) -> Self {
        Self::from_store(IssueKind::LoadFailed, format!("Summary load failed: {err}"), err)
    }

    pub fn partition_load(status: ListingStatus, err: &StoreError) -> Self {
        Self::from_store(
            IssueKind::LoadFailed,
            format!("Failed to load {} listings: {err}", status.key()),
            err,
        )
    }

    pub fn update(err: &StoreError) -> Self {
        Self::from_store(
            IssueKind::UpdateFailed,
            format!("Failed to update status: {err}"),
            err,
        )
    }

    fn from_store(kind: IssueKind, message: String, err: &StoreError) -> Self {
        if err.is_authorization() {
            Self {
                kind: IssueKind::SessionRejected,
                message: "Your session is no longer valid. Please log in again.".to_string(),
            }
        } else {
            Self { kind, message }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    /// Must be acknowledged before the reviewer continues.
    Blocking,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub kind: Option<IssueKind>,
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    pub(crate) fn info(message: String) -> Self {
        Self {
            level: NotificationLevel::Info,
            message,
            kind: None,
            raised_at: Utc::now(),
        }
    }

    pub(crate) fn blocking(issue: &ReviewIssue) -> Self {
        Self {
            level: NotificationLevel::Blocking,
            message: issue.message.clone(),
            kind: Some(issue.kind),
            raised_at: Utc::now(),
        }
    }
}

/// Serializable picture of everything the console renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSnapshot {
    pub active_tab: ListingStatus,
    pub summary: SummaryView,
    pub active: PartitionView,
    pub pending: Option<PendingTransition>,
}
