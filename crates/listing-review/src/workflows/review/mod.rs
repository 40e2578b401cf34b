//! Listing review workflow: status partitions, summary counts, and the
//! propose/confirm/cancel cycle for moving a listing between statuses.

pub mod domain;
pub mod http;
pub mod session;
pub mod store;
pub mod view;
mod workflow;

#[cfg(test)]
mod tests;

pub use domain::{
    format_price, Listing, ListingDetails, ListingId, ListingStatus, PendingTransition,
    SummaryCounts, TransitionAction,
};
pub use http::HttpListingStore;
pub use session::{AccessToken, SessionProvider, TokenStore};
pub use store::{
    ListingPage, ListingRecord, ListingStore, PartitionQuery, RecordRejection, StoreError,
};
pub use view::{
    IssueKind, Notification, NotificationLevel, PartitionView, ReviewIssue, ReviewSnapshot,
    SummaryView,
};
pub use workflow::{
    ConfirmOutcome, LoadOutcome, RefreshReport, ReviewWorkflow, TransitionError,
};
