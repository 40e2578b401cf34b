use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::workflows::review::{
    AccessToken, Listing, ListingId, ListingPage, ListingRecord, ListingStatus, ListingStore,
    PartitionQuery, StoreError, SummaryCounts,
};

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 500;

/// In-memory listing store with the admin API's semantics: newest listings
/// first, case-insensitive status names, and an optional bearer token guarding
/// status changes.
#[derive(Debug, Default)]
pub struct InMemoryListingStore {
    listings: Mutex<BTreeMap<i64, Listing>>,
    required_token: Option<String>,
}

/// Spring-style page body returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxPage {
    pub content: Vec<Listing>,
    pub total_elements: u64,
    pub total_pages: u64,
    pub number: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub id: i64,
    pub status: ListingStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SandboxError {
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
    #[error("status is required")]
    MissingStatus,
    #[error("Property not found")]
    NotFound,
    #[error("sandbox listings need numeric ids, got '{0}'")]
    NonNumericId(ListingId),
    #[error("Authentication required")]
    Unauthorized,
}

impl SandboxError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SandboxError::InvalidStatus(_)
            | SandboxError::MissingStatus
            | SandboxError::NonNumericId(_) => StatusCode::BAD_REQUEST,
            SandboxError::NotFound => StatusCode::NOT_FOUND,
            SandboxError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for SandboxError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}

impl InMemoryListingStore {
    pub fn new(listings: Vec<Listing>) -> Result<Self, SandboxError> {
        let store = Self::default();
        for listing in listings {
            store.insert(listing)?;
        }
        Ok(store)
    }

    /// Requires `Authorization: Bearer <token>` on status changes.
    pub fn with_required_token(mut self, token: impl Into<String>) -> Self {
        self.required_token = Some(token.into());
        self
    }

    pub fn insert(&self, listing: Listing) -> Result<(), SandboxError> {
        let ListingId::Numeric(id) = listing.id else {
            return Err(SandboxError::NonNumericId(listing.id));
        };
        self.listings
            .lock()
            .expect("sandbox mutex poisoned")
            .insert(id, listing);
        Ok(())
    }

    pub fn status_of(&self, id: i64) -> Option<ListingStatus> {
        self.listings
            .lock()
            .expect("sandbox mutex poisoned")
            .get(&id)
            .map(|listing| listing.status)
    }

    pub fn summary(&self) -> SummaryCounts {
        let guard = self.listings.lock().expect("sandbox mutex poisoned");
        let mut counts = SummaryCounts {
            total: guard.len() as u64,
            ..SummaryCounts::default()
        };
        for listing in guard.values() {
            match listing.status {
                ListingStatus::Pending => counts.pending += 1,
                ListingStatus::Approved => counts.approved += 1,
                ListingStatus::Rejected => counts.rejected += 1,
            }
        }
        counts
    }

    /// One page of listings in `status` (default `PENDING`), highest id first.
    pub fn page(
        &self,
        status: Option<&str>,
        page: Option<u32>,
        size: Option<u32>,
    ) -> Result<SandboxPage, SandboxError> {
        let status = match status {
            Some(raw) => ListingStatus::from_wire(raw)
                .ok_or_else(|| SandboxError::InvalidStatus(raw.to_string()))?,
            None => ListingStatus::Pending,
        };
        let number = page.unwrap_or(0);
        let size = size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

        let guard = self.listings.lock().expect("sandbox mutex poisoned");
        let matching: Vec<&Listing> = guard
            .values()
            .rev()
            .filter(|listing| listing.status == status)
            .collect();
        let total_elements = matching.len() as u64;
        let content = matching
            .into_iter()
            .skip(number as usize * size as usize)
            .take(size as usize)
            .cloned()
            .collect();

        Ok(SandboxPage {
            content,
            total_elements,
            total_pages: total_elements.div_ceil(u64::from(size)),
            number,
            size,
        })
    }

    pub fn set_status(&self, id: i64, status: Option<&str>) -> Result<StatusChange, SandboxError> {
        let raw = status.ok_or(SandboxError::MissingStatus)?;
        let status =
            ListingStatus::from_wire(raw).ok_or_else(|| SandboxError::InvalidStatus(raw.to_string()))?;

        let mut guard = self.listings.lock().expect("sandbox mutex poisoned");
        let listing = guard.get_mut(&id).ok_or(SandboxError::NotFound)?;
        let previous = listing.status;
        listing.status = status;
        info!(listing = id, from = previous.wire(), to = status.wire(), "sandbox status changed");

        Ok(StatusChange { id, status })
    }

    pub fn authorize(&self, presented: Option<&str>) -> Result<(), SandboxError> {
        match &self.required_token {
            None => Ok(()),
            Some(expected) if presented == Some(expected.as_str()) => Ok(()),
            Some(_) => Err(SandboxError::Unauthorized),
        }
    }
}

/// Lets the workflow run in-process against the sandbox without HTTP.
#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn summary(&self) -> Result<SummaryCounts, StoreError> {
        Ok(InMemoryListingStore::summary(self))
    }

    async fn list_by_status(&self, query: PartitionQuery) -> Result<ListingPage, StoreError> {
        let page = self
            .page(Some(query.status.wire()), Some(query.page), Some(query.size))
            .map_err(into_store_error)?;
        Ok(ListingPage {
            content: page.content.into_iter().map(ListingRecord::from).collect(),
            total_elements: Some(page.total_elements),
        })
    }

    async fn update_status(
        &self,
        id: &ListingId,
        status: ListingStatus,
        token: &AccessToken,
    ) -> Result<(), StoreError> {
        self.authorize(Some(token.expose()))
            .map_err(into_store_error)?;
        let ListingId::Numeric(id) = id else {
            return Err(into_store_error(SandboxError::NotFound));
        };
        self.set_status(*id, Some(status.wire()))
            .map(|_| ())
            .map_err(into_store_error)
    }
}

fn into_store_error(err: SandboxError) -> StoreError {
    StoreError::from_status(err.status_code().as_u16(), &err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::review::ListingDetails;

    fn listing(id: i64, status: ListingStatus) -> Listing {
        Listing {
            id: ListingId::Numeric(id),
            status,
            details: ListingDetails {
                title: Some(format!("Listing {id}")),
                ..ListingDetails::default()
            },
        }
    }

    fn store() -> InMemoryListingStore {
        InMemoryListingStore::new(vec![
            listing(1, ListingStatus::Pending),
            listing(2, ListingStatus::Approved),
            listing(3, ListingStatus::Pending),
            listing(4, ListingStatus::Rejected),
            listing(5, ListingStatus::Pending),
        ])
        .expect("numeric ids")
    }

    #[test]
    fn summary_counts_every_status() {
        assert_eq!(
            store().summary(),
            SummaryCounts {
                pending: 3,
                approved: 1,
                rejected: 1,
                total: 5,
            }
        );
    }

    #[test]
    fn pages_are_newest_first_and_case_insensitive() {
        let page = store()
            .page(Some("pending"), Some(0), Some(2))
            .expect("valid status");
        let ids: Vec<_> = page.content.iter().map(|listing| listing.id.clone()).collect();
        assert_eq!(ids, vec![ListingId::Numeric(5), ListingId::Numeric(3)]);
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages, 2);

        let second = store()
            .page(None, Some(1), Some(2))
            .expect("defaults to pending");
        assert_eq!(second.content.len(), 1);
    }

    #[test]
    fn invalid_status_is_rejected() {
        assert_eq!(
            store().page(Some("archived"), None, None),
            Err(SandboxError::InvalidStatus("archived".to_string()))
        );
        assert_eq!(
            store().set_status(1, None),
            Err(SandboxError::MissingStatus)
        );
        assert_eq!(
            store().set_status(99, Some("APPROVED")),
            Err(SandboxError::NotFound)
        );
    }

    #[test]
    fn status_change_moves_listing() {
        let store = store();
        let change = store.set_status(3, Some("approved")).expect("known id");
        assert_eq!(change.status, ListingStatus::Approved);
        assert_eq!(store.status_of(3), Some(ListingStatus::Approved));
        assert_eq!(store.summary().approved, 2);
    }

    #[test]
    fn required_token_must_match() {
        let store = store().with_required_token("admin-jwt");
        assert_eq!(store.authorize(None), Err(SandboxError::Unauthorized));
        assert_eq!(
            store.authorize(Some("other")),
            Err(SandboxError::Unauthorized)
        );
        assert_eq!(store.authorize(Some("admin-jwt")), Ok(()));
    }

    #[test]
    fn text_ids_are_refused() {
        let mut entry = listing(1, ListingStatus::Pending);
        entry.id = ListingId::Text("abc".to_string());
        assert!(matches!(
            InMemoryListingStore::default().insert(entry),
            Err(SandboxError::NonNumericId(_))
        ));
    }

    #[tokio::test]
    async fn in_process_store_enforces_token() {
        let store = store().with_required_token("admin-jwt");
        let wrong = AccessToken::new("nope").expect("token");
        let err = ListingStore::update_status(&store, &ListingId::Numeric(1), ListingStatus::Approved, &wrong)
            .await
            .expect_err("wrong token refused");
        assert!(err.is_authorization());
        assert_eq!(store.status_of(1), Some(ListingStatus::Pending));
    }
}
