//! Reviewer-side workflow for moderating Golden Nest property listings.
//!
//! The [`workflows::review`] module owns the tab/partition state and the guarded
//! status transitions, while [`workflows::sandbox`] provides an in-memory copy of
//! the admin listing API for demos and tests.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
