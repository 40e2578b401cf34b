use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::workflows::review::{Listing, ListingDetails, ListingId, ListingStatus};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read listing seed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid listing seed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("seed row {row}: unknown status '{value}'")]
    InvalidStatus { row: usize, value: String },
    #[error("seed row {row}: duplicate listing id {id}")]
    DuplicateId { row: usize, id: i64 },
}

#[derive(Debug, Deserialize)]
struct SeedRow {
    id: i64,
    title: String,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    bedrooms: Option<u32>,
    #[serde(default)]
    bathrooms: Option<u32>,
    #[serde(default, rename = "type")]
    property_type: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    owner_name: Option<String>,
    #[serde(default)]
    owner_email: Option<String>,
    #[serde(default)]
    cover_image_url: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

pub fn load_seed_file<P: AsRef<Path>>(path: P) -> Result<Vec<Listing>, SeedError> {
    let file = std::fs::File::open(path)?;
    parse_seed(file)
}

/// Reads listings from CSV with a header row. Only `id` and `title` are
/// required; a missing status means `PENDING`.
pub fn parse_seed<R: Read>(reader: R) -> Result<Vec<Listing>, SeedError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut seen = HashSet::new();
    let mut listings = Vec::new();

    for (index, record) in csv_reader.deserialize::<SeedRow>().enumerate() {
        let row = record?;
        let line = index + 1;

        let status = match row.status.as_deref() {
            None => ListingStatus::Pending,
            Some(raw) => ListingStatus::from_wire(raw).ok_or_else(|| SeedError::InvalidStatus {
                row: line,
                value: raw.to_string(),
            })?,
        };

        if !seen.insert(row.id) {
            return Err(SeedError::DuplicateId {
                row: line,
                id: row.id,
            });
        }

        listings.push(Listing {
            id: ListingId::Numeric(row.id),
            status,
            details: ListingDetails {
                title: Some(row.title),
                city: row.city,
                state: row.state,
                price: row.price,
                cover_image_url: row.cover_image_url,
                bedrooms: row.bedrooms,
                bathrooms: row.bathrooms,
                property_type: row.property_type,
                description: row.description,
                owner_id: None,
                owner_name: row.owner_name,
                owner_email: row.owner_email,
            },
        });
    }

    Ok(listings)
}

/// Two pending submissions awaiting review.
pub fn demo_listings() -> Vec<Listing> {
    vec![
        Listing {
            id: ListingId::Numeric(41),
            status: ListingStatus::Pending,
            details: ListingDetails {
                title: Some("Riverside two-bed flat".to_string()),
                city: Some("London".to_string()),
                state: Some("Greater London".to_string()),
                price: Some(1850.0),
                bedrooms: Some(2),
                bathrooms: Some(1),
                property_type: Some("FLAT".to_string()),
                owner_name: Some("Priya Shah".to_string()),
                owner_email: Some("priya@example.com".to_string()),
                ..ListingDetails::default()
            },
        },
        Listing {
            id: ListingId::Numeric(42),
            status: ListingStatus::Pending,
            details: ListingDetails {
                title: Some("Victorian terrace".to_string()),
                city: Some("Manchester".to_string()),
                state: Some("Greater Manchester".to_string()),
                price: Some(325000.0),
                bedrooms: Some(3),
                bathrooms: Some(2),
                property_type: Some("HOUSE".to_string()),
                owner_email: Some("owner42@example.com".to_string()),
                ..ListingDetails::default()
            },
        },
    ]
}
