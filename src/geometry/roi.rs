use serde::{Deserialize, Serialize};

use crate::foundation::error::{ComposeError, ComposeResult};

/// Magnitude below which computed coordinates are treated as exactly zero.
pub const SNAP_EPSILON: f64 = 0.001;

/// Snap values within [`SNAP_EPSILON`] of zero to exactly `0.0`.
pub fn snap_to_zero(v: f64) -> f64 {
    if v.abs() < SNAP_EPSILON { 0.0 } else { v }
}

/// Region of interest in arcseconds, relative to sun center.
///
/// `top < bottom` and `left < right`; y grows downwards as in raster space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArcsecRoi {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl ArcsecRoi {
    pub fn new(top: f64, left: f64, bottom: f64, right: f64) -> ComposeResult<Self> {
        let roi = Self {
            top,
            left,
            bottom,
            right,
        };
        roi.validate()?;
        Ok(roi)
    }

    /// Build from x/y ranges, the order used by request strings (`x1,x2,y1,y2`).
    pub fn from_ranges(x1: f64, x2: f64, y1: f64, y2: f64) -> ComposeResult<Self> {
        Self::new(y1, x1, y2, x2)
    }

    pub fn validate(&self) -> ComposeResult<()> {
        let all = [self.top, self.left, self.bottom, self.right];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(ComposeError::invalid("region of interest must be finite"));
        }
        if self.right <= self.left || self.bottom <= self.top {
            return Err(ComposeError::invalid(
                "region of interest must satisfy right > left and bottom > top",
            ));
        }
        Ok(())
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn pixel_width(&self, scale: f64) -> f64 {
        self.width() / scale
    }

    pub fn pixel_height(&self, scale: f64) -> f64 {
        self.height() / scale
    }

    /// Output canvas for this region at `scale` arcsec/px.
    pub fn canvas(&self, scale: f64) -> Canvas {
        Canvas {
            width: round_dim(self.pixel_width(scale)),
            height: round_dim(self.pixel_height(scale)),
        }
    }

    /// Coarsen `scale` until the canvas fits within `max_width x max_height`.
    pub fn limit_scale(&self, scale: f64, max_width: u32, max_height: u32) -> f64 {
        let w = self.pixel_width(scale);
        let h = self.pixel_height(scale);
        if w > f64::from(max_width) || h > f64::from(max_height) {
            let factor = (f64::from(max_width) / w).min(f64::from(max_height) / h);
            scale / factor
        } else {
            scale
        }
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

/// Region in a layer's native pixel grid, clamped to the raster bounds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelRoi {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl PixelRoi {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Integer window the decoder reads: floor on the leading edges, ceil on the trailing ones.
    pub fn decode_window(&self, native_width: u32, native_height: u32) -> DecodeWindow {
        let x0 = self.left.floor().max(0.0) as u32;
        let y0 = self.top.floor().max(0.0) as u32;
        let x1 = (self.right.ceil() as u32).min(native_width);
        let y1 = (self.bottom.ceil() as u32).min(native_height);
        DecodeWindow {
            x: x0.min(x1),
            y: y0.min(y1),
            width: x1.saturating_sub(x0),
            height: y1.saturating_sub(y0),
        }
    }
}

/// Integer native-pixel window handed to the decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecodeWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

fn round_dim(v: f64) -> u32 {
    (v.round().max(1.0)) as u32
}
