//! In-memory stand-in for the admin listing API, used by the console's
//! `sandbox` and `demo` commands and by tests.

pub mod router;
pub mod seed;
pub mod store;

pub use router::sandbox_router;
pub use seed::{demo_listings, load_seed_file, parse_seed, SeedError};
pub use store::{InMemoryListingStore, SandboxError, SandboxPage, StatusChange};
