use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Store-assigned listing identifier, passed through exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListingId {
    Numeric(i64),
    Text(String),
}

impl ListingId {
    /// Parses user input, preferring the numeric form the backend issues.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(value) => Self::Numeric(value),
            Err(_) => Self::Text(trimmed.to_string()),
        }
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingId::Numeric(value) => write!(f, "{value}"),
            ListingId::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for ListingId {
    fn from(value: i64) -> Self {
        Self::Numeric(value)
    }
}

impl From<&str> for ListingId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Review status of a listing. The only attribute the workflow may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingStatus {
    Pending,
    Approved,
    Rejected,
}

impl ListingStatus {
    pub const fn ordered() -> [Self; 3] {
        [Self::Pending, Self::Approved, Self::Rejected]
    }

    /// Upper-case representation used on the wire.
    pub const fn wire(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Lower-case tab key.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    /// Case-insensitive parse of a wire value. Anything outside the three
    /// statuses yields `None`.
    pub fn from_wire(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|status| status.wire().eq_ignore_ascii_case(trimmed))
    }

    /// The two actions offered to a reviewer for a listing in this status.
    pub const fn actions(self) -> [TransitionAction; 2] {
        match self {
            Self::Pending => [TransitionAction::APPROVE, TransitionAction::DECLINE],
            Self::Approved => [TransitionAction::UNPUBLISH, TransitionAction::DECLINE],
            Self::Rejected => [TransitionAction::RECONSIDER, TransitionAction::APPROVE],
        }
    }

    pub fn can_transition_to(self, target: ListingStatus) -> bool {
        self.actions().iter().any(|action| action.target == target)
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::from_wire(raw).ok_or_else(|| {
            format!("unknown listing status '{raw}' (expected pending, approved, or rejected)")
        })
    }
}

/// A reviewer-facing button: the status it moves a listing to and its caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionAction {
    pub target: ListingStatus,
    pub label: &'static str,
}

impl TransitionAction {
    pub const APPROVE: Self = Self {
        target: ListingStatus::Approved,
        label: "Approve",
    };
    pub const DECLINE: Self = Self {
        target: ListingStatus::Rejected,
        label: "Decline",
    };
    pub const UNPUBLISH: Self = Self {
        target: ListingStatus::Pending,
        label: "Unpublish (Pending)",
    };
    pub const RECONSIDER: Self = Self {
        target: ListingStatus::Pending,
        label: "Reconsider (Pending)",
    };
}

/// Read-only card attributes as the admin endpoints return them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDetails {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<u32>,
    #[serde(default, rename = "type")]
    pub property_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub owner_email: Option<String>,
}

/// A listing whose status has been validated at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub status: ListingStatus,
    #[serde(flatten)]
    pub details: ListingDetails,
}

const PLACEHOLDER_IMAGE: &str = "/placeholder.jpg";
const UNKNOWN_SELLER: &str = "Unknown seller";

impl Listing {
    pub fn title(&self) -> &str {
        non_blank(self.details.title.as_deref()).unwrap_or("Untitled listing")
    }

    /// "City, State" with blank parts skipped; empty when neither is known.
    pub fn location(&self) -> String {
        [self.details.city.as_deref(), self.details.state.as_deref()]
            .into_iter()
            .filter_map(non_blank)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn cover_image(&self) -> &str {
        non_blank(self.details.cover_image_url.as_deref()).unwrap_or(PLACEHOLDER_IMAGE)
    }

    pub fn display_owner(&self) -> &str {
        non_blank(self.details.owner_name.as_deref())
            .or_else(|| non_blank(self.details.owner_email.as_deref()))
            .unwrap_or(UNKNOWN_SELLER)
    }

    pub fn owner_initials(&self) -> String {
        self.display_owner()
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }

    pub fn formatted_price(&self) -> String {
        format_price(self.details.price)
    }

    /// Route the navigation shell uses for the public details page.
    pub fn details_path(&self) -> String {
        format!("/buy/properties/{}", self.id)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|raw| !raw.trim().is_empty())
}

/// Formats a price as pounds with thousands separators.
pub fn format_price(price: Option<f64>) -> String {
    let Some(value) = price.filter(|value| value.is_finite()) else {
        return "Price on request".to_string();
    };

    let rendered = format!("{:.2}", value.abs());
    let (whole, fraction) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let fraction = fraction.trim_end_matches('0');
    let sign = if value < 0.0 { "-" } else { "" };
    if fraction.is_empty() {
        format!("{sign}£{grouped}")
    } else {
        format!("{sign}£{grouped}.{fraction}")
    }
}

/// Aggregate cardinalities reported by the store. Missing or null fields read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCounts {
    #[serde(default, deserialize_with = "null_as_default")]
    pub pending: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub approved: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rejected: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u64,
}

impl SummaryCounts {
    pub const fn count(&self, status: ListingStatus) -> u64 {
        match status {
            ListingStatus::Pending => self.pending,
            ListingStatus::Approved => self.approved,
            ListingStatus::Rejected => self.rejected,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An unconfirmed status change awaiting the reviewer's decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingTransition {
    pub listing_id: ListingId,
    pub from: ListingStatus,
    pub target: ListingStatus,
}

impl PendingTransition {
    /// Short verb phrase used on the confirm button.
    pub fn action_label(&self) -> &'static str {
        match self.target {
            ListingStatus::Approved => "Approve this listing",
            ListingStatus::Rejected => "Decline this listing",
            ListingStatus::Pending => "move this listing back to pending",
        }
    }

    pub fn prompt(&self) -> String {
        format!(
            "Are you sure you want to {}? Once confirmed, the status will be updated.",
            self.action_label()
        )
    }
}
