use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

use anyhow::Context as _;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::{ComposeError, ComposeResult},
    index::ImageIndex,
    model::{instrument::InstrumentKey, layer::SourceDescriptor},
};

/// One catalogued source raster.
///
/// `sun_center_x`/`sun_center_y` are the solar disk center in image pixels with y measured
/// upwards from the bottom row, as recorded in source headers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub key: InstrumentKey,
    pub date: DateTime<Utc>,
    pub uri: String,
    pub width: u32,
    pub height: u32,
    /// Arcseconds per pixel.
    pub scale: f64,
    pub sun_center_x: f64,
    pub sun_center_y: f64,
}

impl CatalogEntry {
    pub fn descriptor(&self) -> SourceDescriptor {
        SourceDescriptor {
            uri: self.uri.clone(),
            timestamp: self.date,
            width: self.width,
            height: self.height,
            native_scale: self.scale,
            sun_center_offset_x: self.sun_center_x - f64::from(self.width) / 2.0,
            sun_center_offset_y: f64::from(self.height) / 2.0 - self.sun_center_y,
        }
    }
}

/// In-memory image index over a fixed list of entries.
#[derive(Clone, Debug, Default)]
pub struct CatalogIndex {
    /// Entries per source, sorted by date.
    by_key: BTreeMap<InstrumentKey, Vec<CatalogEntry>>,
    window: Option<Duration>,
}

impl CatalogIndex {
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut by_key: BTreeMap<InstrumentKey, Vec<CatalogEntry>> = BTreeMap::new();
        for e in entries {
            by_key.entry(e.key.clone()).or_default().push(e);
        }
        for list in by_key.values_mut() {
            list.sort_by_key(|e| e.date);
        }
        Self {
            by_key,
            window: None,
        }
    }

    /// Reject matches farther than `secs` from the requested time.
    pub fn with_window_secs(mut self, secs: Option<i64>) -> Self {
        self.window = secs.map(Duration::seconds);
        self
    }

    /// Load a JSON array of [`CatalogEntry`].
    pub fn from_json_file(path: &Path) -> ComposeResult<Self> {
        let f = File::open(path).with_context(|| format!("open catalog '{}'", path.display()))?;
        let entries: Vec<CatalogEntry> = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse catalog '{}'", path.display()))?;
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.by_key.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry closest in time to `timestamp`; ties go to the earlier image.
    pub fn closest(
        &self,
        timestamp: DateTime<Utc>,
        key: &InstrumentKey,
    ) -> Option<&CatalogEntry> {
        let list = self.by_key.get(key)?;
        let idx = list.partition_point(|e| e.date < timestamp);
        let after = list.get(idx);
        let before = idx.checked_sub(1).and_then(|i| list.get(i));
        match (before, after) {
            (Some(b), Some(a)) => {
                if a.date - timestamp < timestamp - b.date {
                    Some(a)
                } else {
                    Some(b)
                }
            }
            (b, a) => b.or(a),
        }
    }
}

impl ImageIndex for CatalogIndex {
    fn resolve(
        &self,
        timestamp: DateTime<Utc>,
        key: &InstrumentKey,
    ) -> ComposeResult<SourceDescriptor> {
        let label = key.watermark_label();
        let entry = self
            .closest(timestamp, key)
            .ok_or_else(|| ComposeError::unavailable(&label, format!("no images for {key}")))?;

        if let Some(window) = self.window {
            let dist = (entry.date - timestamp).abs();
            if dist > window {
                return Err(ComposeError::unavailable(
                    label,
                    "no data available for source in requested window",
                ));
            }
        }

        tracing::debug!(%key, date = %entry.date, uri = %entry.uri, "resolved source");
        Ok(entry.descriptor())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/index/catalog.rs"]
mod tests;
