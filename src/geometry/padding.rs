//! Placement of an extracted layer raster inside the shared output canvas.

use serde::{Deserialize, Serialize};

use crate::{
    geometry::{
        mapper::CoordinateMapper,
        roi::{ArcsecRoi, Canvas, PixelRoi, snap_to_zero},
    },
    model::layer::LayerSpec,
};

/// Anchor the padding offsets are measured from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gravity {
    #[default]
    NorthWest,
}

/// Extent geometry for one layer: full canvas size plus a signed offset.
///
/// The offset follows the extent-geometry convention: the layer's resized content is placed at
/// `(-offset_x, -offset_y)` on the canvas, so a negative offset moves content right/down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Padding {
    pub gravity: Gravity,
    pub width: u32,
    pub height: u32,
    pub offset_x: i64,
    pub offset_y: i64,
}

impl Padding {
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Top-left corner of the layer content on the canvas.
    pub fn content_origin(&self) -> (i64, i64) {
        (-self.offset_x, -self.offset_y)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PaddingCalculator;

impl PaddingCalculator {
    /// Padding for `layer` against the shared ROI at `output_scale` arcsec/px.
    pub fn compute(layer: &LayerSpec, shared_roi: &ArcsecRoi, output_scale: f64) -> Padding {
        let pixel_roi = CoordinateMapper::pixel_roi(layer);
        Self::compute_for_roi(layer, &pixel_roi, shared_roi, output_scale)
    }

    /// Same as [`PaddingCalculator::compute`] with an already mapped pixel ROI.
    pub fn compute_for_roi(
        layer: &LayerSpec,
        pixel_roi: &PixelRoi,
        shared_roi: &ArcsecRoi,
        output_scale: f64,
    ) -> Padding {
        let canvas = shared_roi.canvas(output_scale);
        let ratio = layer.native_scale / output_scale;

        let rel_left = (pixel_roi.left - layer.center_x()) * ratio;
        let rel_top = (pixel_roi.top - layer.center_y()) * ratio;

        let offset_x = snap_to_zero(shared_roi.left / output_scale - rel_left).round();
        let offset_y = snap_to_zero(shared_roi.top / output_scale - rel_top).round();

        Padding {
            gravity: Gravity::NorthWest,
            width: canvas.width,
            height: canvas.height,
            offset_x: offset_x as i64,
            offset_y: offset_y as i64,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/padding.rs"]
mod tests;
