//! Lookup of source rasters by instrument and time.

use chrono::{DateTime, Utc};

use crate::{
    foundation::error::ComposeResult,
    model::{instrument::InstrumentKey, layer::SourceDescriptor},
};

pub mod catalog;

pub use catalog::{CatalogEntry, CatalogIndex};

/// Resolves an instrument/time query to the raster that best matches it.
///
/// Fails with [`crate::ComposeError::SourceUnavailable`] when no data is available.
pub trait ImageIndex: Send + Sync {
    fn resolve(
        &self,
        timestamp: DateTime<Utc>,
        key: &InstrumentKey,
    ) -> ComposeResult<SourceDescriptor>;
}
