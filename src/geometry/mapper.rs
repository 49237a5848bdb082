//! Arcsecond ROI to native pixel ROI mapping.

use crate::{
    geometry::roi::{PixelRoi, snap_to_zero},
    model::layer::LayerSpec,
};

/// Power-of-two resolution reduction requested from the decoder.
///
/// Level `n` decodes at `1 / 2^n` of native resolution; level 0 decodes at native resolution and
/// leaves all scaling to the resize step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecodeLevel(pub u32);

impl DecodeLevel {
    /// `max(0, floor(log2(desired / native)))`.
    pub fn for_scales(desired_scale: f64, native_scale: f64) -> Self {
        let ratio = desired_scale / native_scale;
        let level = ratio.log2().floor();
        if level.is_finite() && level > 0.0 {
            Self(level as u32)
        } else {
            Self(0)
        }
    }

    /// Linear factor between native and decoded pixels (`2^level`).
    pub fn factor(self) -> u32 {
        1u32 << self.0.min(16)
    }
}

/// Whether a layer contributes any pixels to the requested region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    /// The clamped ROI is at most one pixel wide or tall; the layer is replaced by a transparent
    /// canvas instead of being decoded.
    NotVisible,
}

/// Result of mapping one layer onto its native pixel grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerGeometry {
    pub roi: PixelRoi,
    pub decode_level: DecodeLevel,
    pub visibility: Visibility,
}

impl LayerGeometry {
    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::Visible
    }

    /// Size the extracted subfield is resized to before padding.
    ///
    /// `round(subfield / desiredToActual)` on each axis, never below one pixel.
    pub fn target_size(&self, layer: &LayerSpec) -> (u32, u32) {
        let d2a = layer.desired_to_actual();
        let w = (self.roi.width() / d2a).round().max(1.0);
        let h = (self.roi.height() / d2a).round().max(1.0);
        (w as u32, h as u32)
    }
}

/// Pure mapping from a layer request to its pixel ROI and decode level.
#[derive(Clone, Copy, Debug, Default)]
pub struct CoordinateMapper;

impl CoordinateMapper {
    pub fn map(layer: &LayerSpec) -> LayerGeometry {
        let roi = Self::pixel_roi(layer);
        LayerGeometry {
            roi,
            decode_level: DecodeLevel::for_scales(layer.desired_scale, layer.native_scale),
            visibility: Self::classify(&roi),
        }
    }

    /// Convert the shared arcsecond ROI into this layer's native pixel space.
    pub fn pixel_roi(layer: &LayerSpec) -> PixelRoi {
        let w = f64::from(layer.native_width);
        let h = f64::from(layer.native_height);
        let cx = layer.center_x();
        let cy = layer.center_y();
        let s = layer.native_scale;

        let clamp = |v: f64, max: f64| snap_to_zero(v.clamp(0.0, max));

        PixelRoi {
            top: clamp(layer.roi.top / s + cy, h),
            left: clamp(layer.roi.left / s + cx, w),
            bottom: clamp(layer.roi.bottom / s + cy, h),
            right: clamp(layer.roi.right / s + cx, w),
        }
    }

    pub fn classify(roi: &PixelRoi) -> Visibility {
        if roi.height() <= 1.0 || roi.width() <= 1.0 {
            Visibility::NotVisible
        } else {
            Visibility::Visible
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/mapper.rs"]
mod tests;
