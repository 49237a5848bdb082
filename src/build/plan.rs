use std::path::PathBuf;

use crate::{
    assets::color_table::ColorTable,
    build::cache::{Fingerprint, StableHasher, source_stem},
    foundation::{
        config::EngineConfig,
        error::{ComposeError, ComposeResult, Stage},
    },
    geometry::{
        mapper::{CoordinateMapper, LayerGeometry},
        padding::{Padding, PaddingCalculator},
        roi::Canvas,
    },
    model::layer::LayerSpec,
};

/// Bumped whenever the layer raster recipe changes, invalidating old cache entries.
const LAYER_RECIPE_VERSION: u32 = 1;

/// Everything needed to build one layer raster, derived up front from its [`LayerSpec`].
#[derive(Clone, Debug)]
pub struct LayerPlan {
    pub spec: LayerSpec,
    pub geometry: LayerGeometry,
    pub padding: Padding,
    pub color_table: Option<ColorTable>,
    pub fingerprint: Fingerprint,
    pub output_path: PathBuf,
}

impl LayerPlan {
    /// Map, pad and key `spec` against `config`.
    pub fn new(spec: LayerSpec, config: &EngineConfig) -> ComposeResult<Self> {
        spec.validate()?;
        let geometry = CoordinateMapper::map(&spec);
        let padding =
            PaddingCalculator::compute_for_roi(&spec, &geometry.roi, &spec.roi, spec.desired_scale);
        let color_table = spec
            .profile
            .color_table
            .map(|p| ColorTable::resolve(p, config.color_table_dir.as_deref()))
            .transpose()
            .map_err(|e| {
                let detail = format!("{e:#}");
                tracing::warn!(layer = %spec.label, error = %detail, "color table unusable");
                ComposeError::decode(&spec.label, Stage::Colorize, detail)
            })?;

        let fingerprint = layer_fingerprint(&spec, &geometry, &padding, color_table.as_ref());
        let stem = source_stem(&spec.source_uri);
        let output_path = config
            .layers_dir()
            .join(&stem)
            .join(format!("{stem}_{fingerprint}.png"));

        Ok(Self {
            spec,
            geometry,
            padding,
            color_table,
            fingerprint,
            output_path,
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.padding.canvas()
    }
}

fn layer_fingerprint(
    spec: &LayerSpec,
    geometry: &LayerGeometry,
    padding: &Padding,
    table: Option<&ColorTable>,
) -> Fingerprint {
    let mut h = StableHasher::new();
    h.write_u32(LAYER_RECIPE_VERSION);

    h.write_str(&spec.source_uri);
    h.write_u32(spec.native_width);
    h.write_u32(spec.native_height);
    h.write_f64(spec.native_scale);
    h.write_f64(spec.sun_center_offset_x);
    h.write_f64(spec.sun_center_offset_y);
    h.write_f64(spec.desired_scale);

    let roi = geometry.roi;
    for v in [roi.top, roi.left, roi.bottom, roi.right] {
        h.write_f64(v);
    }
    h.write_u32(geometry.decode_level.0);
    h.write_bool(geometry.is_visible());

    h.write_u32(padding.width);
    h.write_u32(padding.height);
    h.write_i64(padding.offset_x);
    h.write_i64(padding.offset_y);

    match table {
        Some(t) => {
            h.write_u8(1);
            for e in t.entries() {
                h.write_bytes(e);
            }
        }
        None => h.write_u8(0),
    }
    match spec.profile.mask {
        Some(m) => {
            h.write_u8(1);
            h.write_f64(m.inner);
            h.write_f64(m.outer);
        }
        None => h.write_u8(0),
    }
    h.finish()
}
