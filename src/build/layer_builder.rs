use std::path::PathBuf;

use chrono::{DateTime, Utc};
use image::{DynamicImage, RgbaImage};

use crate::{
    assets::mask::MaskFrame,
    build::{
        cache::{WriteError, write_atomic},
        plan::LayerPlan,
    },
    foundation::{
        config::EngineConfig,
        error::{ComposeError, ComposeResult, Stage},
    },
    model::layer::LayeringOrder,
    toolkit::{EncodeFormat, RasterToolkit},
};

/// How a layer raster came to exist on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Already cached; no toolkit work was done.
    Cached,
    /// Decoded and written.
    Built,
    /// Layer is not visible in the ROI; a transparent canvas was written.
    Placeholder,
}

/// A layer raster ready for compositing.
#[derive(Clone, Debug, PartialEq)]
pub struct BuiltLayer {
    pub label: String,
    pub timestamp: DateTime<Utc>,
    pub path: PathBuf,
    pub opacity: u8,
    pub layering_order: LayeringOrder,
    pub outcome: BuildOutcome,
}

/// Builds per-layer intermediate rasters into the layer cache.
pub struct LayerBuilder<'a> {
    toolkit: &'a dyn RasterToolkit,
    config: &'a EngineConfig,
}

impl<'a> LayerBuilder<'a> {
    pub fn new(toolkit: &'a dyn RasterToolkit, config: &'a EngineConfig) -> Self {
        Self { toolkit, config }
    }

    /// Build `plan.output_path` unless it already exists.
    ///
    /// Idempotent: with caching enabled, a second call for the same plan touches neither the
    /// toolkit nor the file.
    #[tracing::instrument(skip_all, fields(layer = %plan.spec.label))]
    pub fn build(&self, plan: &LayerPlan) -> ComposeResult<BuiltLayer> {
        let outcome = if self.config.caching && plan.output_path.is_file() {
            tracing::debug!(path = %plan.output_path.display(), "layer cache hit");
            BuildOutcome::Cached
        } else if !plan.geometry.is_visible() {
            tracing::debug!(roi = ?plan.geometry.roi, "layer not visible; writing placeholder");
            let canvas = plan.canvas();
            self.write(plan, RgbaImage::new(canvas.width, canvas.height))?;
            BuildOutcome::Placeholder
        } else {
            let raster = self.render(plan)?;
            self.write(plan, raster)?;
            BuildOutcome::Built
        };

        Ok(BuiltLayer {
            label: plan.spec.label.clone(),
            timestamp: plan.spec.timestamp,
            path: plan.output_path.clone(),
            opacity: plan.spec.opacity,
            layering_order: plan.spec.layering_order,
            outcome,
        })
    }

    fn render(&self, plan: &LayerPlan) -> ComposeResult<RgbaImage> {
        let spec = &plan.spec;
        let label = spec.label.as_str();
        let fail = |stage: Stage| {
            move |e: crate::toolkit::ToolkitError| {
                tracing::warn!(layer = label, %stage, error = %e, "layer build aborted");
                ComposeError::decode(label, stage, e)
            }
        };

        let window = plan
            .geometry
            .roi
            .decode_window(spec.native_width, spec.native_height);
        let source = self.config.source_path(&spec.source_uri);
        let gray = self
            .toolkit
            .decode_region(&source, window, plan.geometry.decode_level)
            .map_err(fail(Stage::Decode))?;
        if gray.width() == 0 || gray.height() == 0 {
            return Err(ComposeError::decode(label, Stage::Decode, "decoded region is empty"));
        }

        let mut rgba = self
            .toolkit
            .apply_palette(&gray, plan.color_table.as_ref())
            .map_err(fail(Stage::Colorize))?;

        if let Some(mask) = spec.profile.mask {
            let frame = MaskFrame {
                origin_x: f64::from(window.x),
                origin_y: f64::from(window.y),
                step_x: f64::from(window.width) / f64::from(rgba.width()),
                step_y: f64::from(window.height) / f64::from(rgba.height()),
                center_x: spec.center_x(),
                center_y: spec.center_y(),
                native_scale: spec.native_scale,
            };
            mask.apply(&mut rgba, &frame);
        }

        let (tw, th) = plan.geometry.target_size(spec);
        let resized = self
            .toolkit
            .resize(&rgba, tw, th)
            .map_err(fail(Stage::Resize))?;

        self.toolkit
            .extent(&resized, &plan.padding)
            .map_err(fail(Stage::Pad))
    }

    fn write(&self, plan: &LayerPlan, raster: RgbaImage) -> ComposeResult<()> {
        let img = DynamicImage::ImageRgba8(raster);
        let format = EncodeFormat::Png(self.config.png_compression);
        let res = write_atomic(&plan.output_path, |w| self.toolkit.encode(&img, format, w));
        match res {
            Ok(()) => {
                tracing::debug!(path = %plan.output_path.display(), "layer written");
                Ok(())
            }
            Err(WriteError::Produce(e)) => {
                tracing::error!(
                    path = %plan.output_path.display(),
                    error = %e,
                    "layer encode failed"
                );
                Err(ComposeError::encode(Some(plan.spec.label.as_str()), e))
            }
            Err(WriteError::Io(e)) => {
                tracing::error!(error = %e, "layer cache write failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/build/layer_builder.rs"]
mod tests;
