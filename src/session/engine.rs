use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use image::{DynamicImage, RgbImage};
use rayon::prelude::*;

use crate::{
    assets::svg::SvgRenderer,
    build::{
        cache::{Fingerprint, StableHasher, WriteError, write_atomic},
        layer_builder::{BuildOutcome, BuiltLayer, LayerBuilder},
        plan::LayerPlan,
    },
    composite::{
        compositor::{Compositor, quantize},
        sorter::LayeringSorter,
        watermark::Watermarker,
    },
    foundation::{
        config::EngineConfig,
        error::{ComposeError, ComposeResult, Stage},
    },
    geometry::roi::Canvas,
    index::ImageIndex,
    model::{
        layer::LayerSpec,
        request::{CompositeRequest, OutputFormat},
    },
    toolkit::{EncodeFormat, ImageToolkit, RasterToolkit},
};

/// Bumped whenever composite assembly changes, invalidating old composites.
const COMPOSITE_RECIPE_VERSION: u32 = 1;

/// Outcome of one composite request.
#[derive(Clone, Debug)]
pub struct CompositeResult {
    /// Layers in compositing order (topmost first).
    ///
    /// On a composite cache hit nothing is built and every entry reports
    /// [`BuildOutcome::Cached`] with its planned raster path.
    pub layers: Vec<BuiltLayer>,
    pub output_path: PathBuf,
    pub canvas: Canvas,
    pub cache_hit: bool,
    /// RGB frame buffer, for [`OutputFormat::MovieFrame`] requests.
    pub frame: Option<RgbImage>,
}

/// End-to-end composite pipeline over one image index and one raster toolkit.
///
/// The engine holds no per-request state; concurrent `render` calls share only the on-disk
/// cache.
pub struct CompositeEngine {
    config: EngineConfig,
    index: Arc<dyn ImageIndex>,
    toolkit: Arc<dyn RasterToolkit>,
    svg: SvgRenderer,
}

impl CompositeEngine {
    /// Engine backed by [`ImageToolkit`].
    pub fn new(config: EngineConfig, index: Arc<dyn ImageIndex>) -> ComposeResult<Self> {
        Self::with_toolkit(config, index, Arc::new(ImageToolkit))
    }

    pub fn with_toolkit(
        config: EngineConfig,
        index: Arc<dyn ImageIndex>,
        toolkit: Arc<dyn RasterToolkit>,
    ) -> ComposeResult<Self> {
        config.validate()?;
        let svg = SvgRenderer::new(config.font_dir.as_deref());
        tracing::debug!(faces = svg.face_count(), "watermark fonts loaded");
        Ok(Self {
            config,
            index,
            toolkit,
            svg,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve and plan every layer of `request`, in request order.
    pub fn plan(&self, request: &CompositeRequest) -> ComposeResult<Vec<LayerPlan>> {
        request.validate()?;
        let scale = request.normalized_scale(self.config.max_width, self.config.max_height);
        if scale != request.scale {
            tracing::debug!(
                requested = request.scale,
                scale,
                "scale coarsened to fit pixel limits"
            );
        }

        request
            .layers
            .iter()
            .map(|l| {
                let source = self.index.resolve(l.timestamp, &l.key)?;
                let mut spec = LayerSpec::from_source(l.key.clone(), &source, scale, request.roi)
                    .with_opacity(l.opacity);
                if let Some(order) = l.layering_order {
                    spec = spec.with_layering_order(order);
                }
                LayerPlan::new(spec, &self.config)
            })
            .collect()
    }

    /// Produce the composite for `request`, reusing cached layers and composites.
    #[tracing::instrument(
        skip_all,
        fields(layers = request.layers.len(), format = request.format.as_str())
    )]
    pub fn render(&self, request: &CompositeRequest) -> ComposeResult<CompositeResult> {
        let plans = self.plan(request)?;
        let Some(canvas) = plans.first().map(LayerPlan::canvas) else {
            return Err(ComposeError::invalid("at least one layer is required"));
        };

        let labels: Vec<String> = plans.iter().map(|p| p.spec.label.clone()).collect();
        let timestamps: Vec<String> = plans
            .iter()
            .map(|p| p.spec.watermark_timestamp())
            .collect();

        let fingerprint = self.composite_fingerprint(request, &plans, canvas);
        let output_path = self.output_path(request, fingerprint);

        if self.config.caching && output_path.is_file() {
            tracing::debug!(path = %output_path.display(), "composite cache hit");
            let layers = plans
                .iter()
                .map(|p| BuiltLayer {
                    label: p.spec.label.clone(),
                    timestamp: p.spec.timestamp,
                    path: p.output_path.clone(),
                    opacity: p.spec.opacity,
                    layering_order: p.spec.layering_order,
                    outcome: BuildOutcome::Cached,
                })
                .collect();
            let frame = match request.format {
                OutputFormat::MovieFrame => Some(self.load_frame(&output_path)?),
                OutputFormat::Png | OutputFormat::Jpeg => None,
            };
            return Ok(CompositeResult {
                layers: LayeringSorter::sort(layers),
                output_path,
                canvas,
                cache_hit: true,
                frame,
            });
        }

        let built = self.build_layers(&plans)?;
        let sorted = LayeringSorter::sort(built);

        let mut frame = Compositor::new(&*self.toolkit, &self.config).compose(&sorted, canvas)?;
        if self.config.watermark {
            frame = Watermarker::new(&self.svg).annotate(frame, &labels, &timestamps, canvas)?;
        }
        quantize(&mut frame, self.config.bit_depth);

        let frame = self.write_output(request.format, frame, &output_path)?;
        tracing::info!(
            path = %output_path.display(),
            width = canvas.width,
            height = canvas.height,
            layers = sorted.len(),
            "composite written"
        );

        Ok(CompositeResult {
            layers: sorted,
            output_path,
            canvas,
            cache_hit: false,
            frame,
        })
    }

    fn build_layers(&self, plans: &[LayerPlan]) -> ComposeResult<Vec<BuiltLayer>> {
        let builder = LayerBuilder::new(&*self.toolkit, &self.config);
        if self.config.parallel_layer_builds && plans.len() > 1 {
            let results: Vec<ComposeResult<BuiltLayer>> =
                plans.par_iter().map(|p| builder.build(p)).collect();
            results.into_iter().collect()
        } else {
            plans.iter().map(|p| builder.build(p)).collect()
        }
    }

    fn composite_fingerprint(
        &self,
        request: &CompositeRequest,
        plans: &[LayerPlan],
        canvas: Canvas,
    ) -> Fingerprint {
        let mut h = StableHasher::new();
        h.write_u32(COMPOSITE_RECIPE_VERSION);
        h.write_u64(plans.len() as u64);
        for p in plans {
            h.write_u64(p.fingerprint.hi);
            h.write_u64(p.fingerprint.lo);
            h.write_u8(p.spec.opacity);
            h.write_u8(p.spec.layering_order.get());
            h.write_str(&p.spec.label);
            h.write_str(&p.spec.watermark_timestamp());
        }
        h.write_u32(canvas.width);
        h.write_u32(canvas.height);
        h.write_str(request.format.as_str());
        h.write_u8(self.config.jpeg_quality);
        h.write_u8(self.config.bit_depth);
        h.write_bool(self.config.watermark);
        h.finish()
    }

    fn output_path(&self, request: &CompositeRequest, fingerprint: Fingerprint) -> PathBuf {
        match request.format {
            OutputFormat::MovieFrame => self
                .config
                .frames_dir()
                .join(fingerprint.to_string())
                .join(format!("{}.png", request.frame_number.unwrap_or(0))),
            OutputFormat::Png | OutputFormat::Jpeg => self
                .config
                .composites_dir()
                .join(format!("{fingerprint}.{}", request.format.extension())),
        }
    }

    fn write_output(
        &self,
        format: OutputFormat,
        frame: RgbImage,
        path: &Path,
    ) -> ComposeResult<Option<RgbImage>> {
        let encode = match format {
            OutputFormat::Jpeg => EncodeFormat::Jpeg {
                quality: self.config.jpeg_quality,
            },
            OutputFormat::Png | OutputFormat::MovieFrame => {
                EncodeFormat::Png(self.config.png_compression)
            }
        };
        let img = DynamicImage::ImageRgb8(frame);
        match write_atomic(path, |w| self.toolkit.encode(&img, encode, w)) {
            Ok(()) => {}
            Err(WriteError::Produce(e)) => {
                tracing::error!(path = %path.display(), error = %e, "composite encode failed");
                return Err(ComposeError::encode(None, e));
            }
            Err(WriteError::Io(e)) => {
                tracing::error!(error = %e, "composite write failed");
                return Err(e);
            }
        }
        Ok(match format {
            OutputFormat::MovieFrame => Some(img.into_rgb8()),
            OutputFormat::Png | OutputFormat::Jpeg => None,
        })
    }

    fn load_frame(&self, path: &Path) -> ComposeResult<RgbImage> {
        let rgba = self
            .toolkit
            .load(path)
            .map_err(|e| ComposeError::composite(Stage::Composite, e))?;
        Ok(DynamicImage::ImageRgba8(rgba).into_rgb8())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/engine.rs"]
mod tests;
