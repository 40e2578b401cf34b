use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::{Listing, ListingDetails, ListingId, ListingStatus, SummaryCounts};
use super::session::AccessToken;

/// First-page request for one status partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionQuery {
    pub status: ListingStatus,
    pub page: u32,
    pub size: u32,
}

impl PartitionQuery {
    pub const fn first_page(status: ListingStatus, size: u32) -> Self {
        Self {
            status,
            page: 0,
            size,
        }
    }
}

/// Listing as it arrives over the wire, before its status is validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: ListingId,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub details: ListingDetails,
}

impl ListingRecord {
    /// Validates the record against the partition it was requested for. A
    /// record without a status inherits the requested one.
    pub fn into_listing(self, requested: ListingStatus) -> Result<Listing, RecordRejection> {
        let status = match self.status.as_deref() {
            None => requested,
            Some(raw) => ListingStatus::from_wire(raw).ok_or_else(|| {
                RecordRejection::UnknownStatus {
                    id: self.id.clone(),
                    value: raw.to_string(),
                }
            })?,
        };

        if status != requested {
            return Err(RecordRejection::StatusMismatch {
                id: self.id,
                requested,
                actual: status,
            });
        }

        Ok(Listing {
            id: self.id,
            status,
            details: self.details,
        })
    }
}

impl From<Listing> for ListingRecord {
    fn from(listing: Listing) -> Self {
        Self {
            id: listing.id,
            status: Some(listing.status.wire().to_string()),
            details: listing.details,
        }
    }
}

/// Why a record was left out of a partition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordRejection {
    #[error("listing {id} carries unknown status '{value}'")]
    UnknownStatus { id: ListingId, value: String },
    #[error("listing {id} reported as {actual} inside the {requested} partition")]
    StatusMismatch {
        id: ListingId,
        requested: ListingStatus,
        actual: ListingStatus,
    },
}

/// Page body of the partition endpoint. Only `content` is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    #[serde(default)]
    pub content: Vec<ListingRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_elements: Option<u64>,
}

/// Remote authority for listing records and their review status.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn summary(&self) -> Result<SummaryCounts, StoreError>;

    async fn list_by_status(&self, query: PartitionQuery) -> Result<ListingPage, StoreError>;

    async fn update_status(
        &self,
        id: &ListingId,
        status: ListingStatus,
        token: &AccessToken,
    ) -> Result<(), StoreError>;
}

/// Failure talking to the listing store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("not authorized by the listing store (HTTP {status})")]
    Unauthorized { status: u16 },
    #[error("listing store answered HTTP {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("listing store unreachable: {0}")]
    Transport(String),
    #[error("unexpected response from listing store: {0}")]
    Decode(String),
}

impl StoreError {
    /// Classifies a non-success HTTP status.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => Self::Unauthorized { status },
            _ => Self::Rejected {
                status,
                message: summarize_body(body),
            },
        }
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

fn summarize_body(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.get("error").and_then(|message| message.as_str()) {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no response body".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}
