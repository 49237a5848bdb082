use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::{ComposeError, ComposeResult},
    geometry::roi::ArcsecRoi,
    model::{instrument::InstrumentKey, layer::LayeringOrder},
};

/// Upper bound on layers in one composite.
pub const MAX_LAYERS: usize = 3;

/// Deliverable kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
    /// Single movie frame: written as PNG and also returned as an RGB buffer.
    #[serde(rename = "frame")]
    MovieFrame,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png | OutputFormat::MovieFrame => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::MovieFrame => "frame",
        }
    }
}

/// One requested layer, before it is resolved against the image index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerRequest {
    pub key: InstrumentKey,
    pub timestamp: DateTime<Utc>,
    #[serde(default = "full_opacity")]
    pub opacity: u8,
    /// Overrides the instrument's default stacking tier.
    #[serde(default)]
    pub layering_order: Option<LayeringOrder>,
}

fn full_opacity() -> u8 {
    100
}

impl LayerRequest {
    pub fn new(key: InstrumentKey, timestamp: DateTime<Utc>) -> Self {
        Self {
            key,
            timestamp,
            opacity: 100,
            layering_order: None,
        }
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }
}

/// A full composite request: up to three layers over one shared ROI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompositeRequest {
    pub layers: Vec<LayerRequest>,
    pub roi: ArcsecRoi,
    /// Output arcseconds per pixel.
    pub scale: f64,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub frame_number: Option<u32>,
}

impl CompositeRequest {
    pub fn new(layers: Vec<LayerRequest>, roi: ArcsecRoi, scale: f64) -> Self {
        Self {
            layers,
            roi,
            scale,
            format: OutputFormat::Png,
            frame_number: None,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Reject malformed requests before any I/O.
    pub fn validate(&self) -> ComposeResult<()> {
        if self.layers.is_empty() {
            return Err(ComposeError::invalid("at least one layer is required"));
        }
        if self.layers.len() > MAX_LAYERS {
            return Err(ComposeError::invalid(format!(
                "at most {MAX_LAYERS} layers are supported (got {})",
                self.layers.len()
            )));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(ComposeError::invalid("scale must be a positive number"));
        }
        self.roi.validate()?;
        if let Some(l) = self.layers.iter().find(|l| l.opacity > 100) {
            return Err(ComposeError::invalid(format!(
                "opacity of {} must be in 0..=100",
                l.key
            )));
        }
        Ok(())
    }

    /// Scale coarsened so the canvas fits within `max_width x max_height`.
    pub fn normalized_scale(&self, max_width: u32, max_height: u32) -> f64 {
        self.roi.limit_scale(self.scale, max_width, max_height)
    }
}
