use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::{ComposeError, ComposeResult},
    geometry::roi::ArcsecRoi,
    model::instrument::{InstrumentKey, InstrumentProfile},
};

/// Stacking tier of a layer: 1 is drawn on top, 3 at the back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LayeringOrder(u8);

impl LayeringOrder {
    pub const FIRST: Self = Self(1);
    pub const SECOND: Self = Self(2);
    pub const THIRD: Self = Self(3);

    pub fn new(v: u8) -> ComposeResult<Self> {
        if (1..=3).contains(&v) {
            Ok(Self(v))
        } else {
            Err(ComposeError::invalid(format!(
                "layering order must be 1, 2 or 3 (got {v})"
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for LayeringOrder {
    type Error = ComposeError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl From<LayeringOrder> for u8 {
    fn from(v: LayeringOrder) -> Self {
        v.0
    }
}

/// Native geometry of a source raster, as reported by the image index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub uri: String,
    pub timestamp: DateTime<Utc>,
    pub width: u32,
    pub height: u32,
    /// Arcseconds per native pixel.
    pub native_scale: f64,
    /// Native-pixel offset of sun center from the raster's geometric center.
    pub sun_center_offset_x: f64,
    pub sun_center_offset_y: f64,
}

/// One fully resolved layer of a composite request.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerSpec {
    /// Watermark label, also used to attribute failures.
    pub label: String,
    pub key: InstrumentKey,
    pub profile: InstrumentProfile,
    pub source_uri: String,
    pub timestamp: DateTime<Utc>,
    pub native_width: u32,
    pub native_height: u32,
    pub native_scale: f64,
    pub sun_center_offset_x: f64,
    pub sun_center_offset_y: f64,
    pub desired_scale: f64,
    /// Shared request ROI in arcseconds, sun-center relative.
    pub roi: ArcsecRoi,
    /// 0..=100.
    pub opacity: u8,
    pub layering_order: LayeringOrder,
}

impl LayerSpec {
    /// Layer for `key` drawn from `source`, fully opaque, at the profile's default order.
    pub fn from_source(
        key: InstrumentKey,
        source: &SourceDescriptor,
        desired_scale: f64,
        roi: ArcsecRoi,
    ) -> Self {
        let profile = key.profile();
        Self {
            label: key.watermark_label(),
            profile,
            source_uri: source.uri.clone(),
            timestamp: source.timestamp,
            native_width: source.width,
            native_height: source.height,
            native_scale: source.native_scale,
            sun_center_offset_x: source.sun_center_offset_x,
            sun_center_offset_y: source.sun_center_offset_y,
            desired_scale,
            roi,
            opacity: 100,
            layering_order: profile.default_layering_order,
            key,
        }
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_layering_order(mut self, order: LayeringOrder) -> Self {
        self.layering_order = order;
        self
    }

    pub fn validate(&self) -> ComposeResult<()> {
        if !(self.desired_scale.is_finite() && self.desired_scale > 0.0) {
            return Err(ComposeError::invalid("desired scale must be positive"));
        }
        if !(self.native_scale.is_finite() && self.native_scale > 0.0) {
            return Err(ComposeError::invalid(format!(
                "native scale of '{}' must be positive",
                self.label
            )));
        }
        if self.native_width == 0 || self.native_height == 0 {
            return Err(ComposeError::invalid(format!(
                "source raster of '{}' has zero size",
                self.label
            )));
        }
        if !(self.sun_center_offset_x.is_finite() && self.sun_center_offset_y.is_finite()) {
            return Err(ComposeError::invalid(format!(
                "sun center offset of '{}' must be finite",
                self.label
            )));
        }
        if self.opacity > 100 {
            return Err(ComposeError::invalid("opacity must be in 0..=100"));
        }
        self.roi.validate()
    }

    /// Sun center x in native pixels.
    pub fn center_x(&self) -> f64 {
        f64::from(self.native_width) / 2.0 + self.sun_center_offset_x
    }

    /// Sun center y in native pixels.
    pub fn center_y(&self) -> f64 {
        f64::from(self.native_height) / 2.0 + self.sun_center_offset_y
    }

    /// Ratio of requested to native scale.
    pub fn desired_to_actual(&self) -> f64 {
        self.desired_scale / self.native_scale
    }

    /// Watermark timestamp: date and time to the minute, three spaces apart.
    pub fn watermark_timestamp(&self) -> String {
        self.timestamp.format("%Y-%m-%d   %H:%M").to_string()
    }
}
