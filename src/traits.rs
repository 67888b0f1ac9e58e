//! Seams between the dispatch engine and its collaborators.
//!
//! The engine reads its reference data from a [`CatalogSource`] and its
//! wall-clock time from a [`Clock`]. Both are injected per session so tests
//! can substitute fixed data and a manually advanced clock.

use chrono::{DateTime, Utc};

use crate::catalog::CatalogData;
use crate::error::DispatchResult;

/// Supplies the static catalog for a dispatch session.
pub trait CatalogSource {
    fn load_catalog(&self) -> DispatchResult<CatalogData>;
}

/// Wall clock used for trip and stop timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
