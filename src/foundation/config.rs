use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{ComposeError, ComposeResult};

/// PNG compression effort for cache and deliverable files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PngCompression {
    Fast,
    Default,
    #[default]
    Best,
}

/// Engine-wide settings, threaded explicitly through every component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Root of the on-disk cache (`layers/`, `transparent/`, `composites/`, `frames/`).
    pub cache_root: PathBuf,
    /// Root against which source descriptor URIs are resolved.
    pub source_root: PathBuf,
    /// Optional directory of 1x256 PNG color tables overriding the built-in palettes.
    pub color_table_dir: Option<PathBuf>,
    /// Optional extra font directory for watermark text.
    pub font_dir: Option<PathBuf>,
    /// When false every layer and composite is rebuilt and overwritten.
    pub caching: bool,
    pub watermark: bool,
    pub jpeg_quality: u8,
    pub png_compression: PngCompression,
    /// Bits per channel of the final deliverable (1..=8).
    pub bit_depth: u8,
    pub max_width: u32,
    pub max_height: u32,
    pub parallel_layer_builds: bool,
    /// Upper bound on the distance between the requested time and the closest image.
    pub closest_image_window_secs: Option<i64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_root: PathBuf::from("cache"),
            source_root: PathBuf::from("."),
            color_table_dir: None,
            font_dir: None,
            caching: true,
            watermark: true,
            jpeg_quality: 90,
            png_compression: PngCompression::Best,
            bit_depth: 8,
            max_width: 1920,
            max_height: 1080,
            parallel_layer_builds: true,
            closest_image_window_secs: None,
        }
    }
}

impl EngineConfig {
    /// Config rooted at `cache_root`, with everything else defaulted.
    pub fn with_cache_root(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            ..Self::default()
        }
    }

    pub fn from_json_file(path: &Path) -> ComposeResult<Self> {
        let f = File::open(path)
            .with_context(|| format!("open engine config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse engine config '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> ComposeResult<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ComposeError::invalid("jpeg_quality must be in 1..=100"));
        }
        if !(1..=8).contains(&self.bit_depth) {
            return Err(ComposeError::invalid("bit_depth must be in 1..=8"));
        }
        if self.max_width == 0 || self.max_height == 0 {
            return Err(ComposeError::invalid(
                "max_width/max_height must be non-zero",
            ));
        }
        if matches!(self.closest_image_window_secs, Some(w) if w < 0) {
            return Err(ComposeError::invalid(
                "closest_image_window_secs must be >= 0",
            ));
        }
        Ok(())
    }

    pub fn layers_dir(&self) -> PathBuf {
        self.cache_root.join("layers")
    }

    pub fn transparent_dir(&self) -> PathBuf {
        self.cache_root.join("transparent")
    }

    pub fn composites_dir(&self) -> PathBuf {
        self.cache_root.join("composites")
    }

    pub fn frames_dir(&self) -> PathBuf {
        self.cache_root.join("frames")
    }

    /// Resolve a source URI against `source_root` (absolute URIs pass through).
    pub fn source_path(&self, uri: &str) -> PathBuf {
        let p = Path::new(uri);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.source_root.join(p)
        }
    }
}
