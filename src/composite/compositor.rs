use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbImage, RgbaImage};

use crate::{
    build::{
        cache::{WriteError, write_atomic},
        layer_builder::BuiltLayer,
    },
    foundation::{
        config::EngineConfig,
        error::{ComposeError, ComposeResult, Stage},
    },
    geometry::roi::Canvas,
    toolkit::{EncodeFormat, RasterToolkit, ToolkitError, blend},
};

/// Final deliverables are flattened onto black.
pub const BACKGROUND: [u8; 3] = [0, 0, 0];

/// Merges sorted layer rasters into one opaque frame.
pub struct Compositor<'a> {
    toolkit: &'a dyn RasterToolkit,
    config: &'a EngineConfig,
}

impl<'a> Compositor<'a> {
    pub fn new(toolkit: &'a dyn RasterToolkit, config: &'a EngineConfig) -> Self {
        Self { toolkit, config }
    }

    /// Cache path of the translucent variant of `raster` at `opacity` percent.
    pub fn translucent_path(&self, raster: &Path, opacity: u8) -> PathBuf {
        let stem = raster
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("layer");
        self.config
            .transparent_dir()
            .join(format!("{stem}-op{opacity}.png"))
    }

    /// Raster to draw for `layer`: its own path at full opacity, otherwise a cached translucent
    /// variant created on first use.
    pub fn raster_for(&self, layer: &BuiltLayer) -> ComposeResult<PathBuf> {
        if layer.opacity >= 100 {
            return Ok(layer.path.clone());
        }
        let path = self.translucent_path(&layer.path, layer.opacity);
        if self.config.caching && path.is_file() {
            tracing::debug!(path = %path.display(), "translucent variant cache hit");
            return Ok(path);
        }

        let base = self
            .toolkit
            .load(&layer.path)
            .map_err(fail(Stage::Composite))?;
        let faded = self
            .toolkit
            .set_opacity(&base, layer.opacity)
            .map_err(fail(Stage::Composite))?;
        let img = DynamicImage::ImageRgba8(faded);
        let format = EncodeFormat::Png(self.config.png_compression);
        match write_atomic(&path, |w| self.toolkit.encode(&img, format, w)) {
            Ok(()) => {
                tracing::debug!(
                    path = %path.display(),
                    opacity = layer.opacity,
                    "translucent variant written"
                );
                Ok(path)
            }
            Err(WriteError::Produce(e)) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "translucent variant encode failed"
                );
                Err(ComposeError::encode(Some(layer.label.as_str()), e))
            }
            Err(WriteError::Io(e)) => Err(e),
        }
    }

    /// Merge `sorted` back to front and flatten onto [`BACKGROUND`].
    ///
    /// Each later layer is drawn behind what is already there, so the first layer ends up on
    /// top. A single layer is flattened without compositing.
    #[tracing::instrument(
        skip_all,
        fields(layers = sorted.len(), width = canvas.width, height = canvas.height)
    )]
    pub fn compose(&self, sorted: &[BuiltLayer], canvas: Canvas) -> ComposeResult<RgbImage> {
        let Some((first, rest)) = sorted.split_first() else {
            return Err(ComposeError::composite(Stage::Composite, "no layers to composite"));
        };

        let mut acc = self.load_layer(first, canvas)?;
        for layer in rest {
            let src = self.load_layer(layer, canvas)?;
            self.toolkit.composite_dst_over(&mut acc, &src).map_err(|e| {
                tracing::error!(layer = %layer.label, error = %e, "composite step failed");
                ComposeError::composite(Stage::Composite, e)
            })?;
        }

        self.toolkit
            .flatten(&acc, BACKGROUND)
            .map_err(fail(Stage::Composite))
    }

    fn load_layer(&self, layer: &BuiltLayer, canvas: Canvas) -> ComposeResult<RgbaImage> {
        let path = self.raster_for(layer)?;
        let img = self.toolkit.load(&path).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "layer raster unreadable");
            ComposeError::composite(Stage::Composite, e)
        })?;
        if img.dimensions() != (canvas.width, canvas.height) {
            return Err(ComposeError::composite(
                Stage::Composite,
                format!(
                    "layer '{}' is {}x{}, canvas is {}x{}",
                    layer.label,
                    img.width(),
                    img.height(),
                    canvas.width,
                    canvas.height
                ),
            ));
        }
        Ok(img)
    }
}

/// Reduce `img` to `bits` per channel.
pub fn quantize(img: &mut RgbImage, bits: u8) {
    blend::quantize_in_place(img, bits);
}

fn fail(stage: Stage) -> impl Fn(ToolkitError) -> ComposeError {
    move |e| ComposeError::composite(stage, e)
}

#[cfg(test)]
#[path = "../../tests/unit/composite/compositor.rs"]
mod tests;
