//! helio-composite renders one aligned, watermarked raster from up to three solar image layers.
//!
//! Each layer comes from a different instrument with its own native scale and sun-center
//! offset. The engine maps a shared arcsecond region onto every layer's pixel grid, builds and
//! caches per-layer rasters, stacks them by layering tier and encodes the result:
//!
//! - Describe the output with a [`CompositeRequest`]
//! - Create a [`CompositeEngine`] over an [`ImageIndex`] (for example a [`CatalogIndex`])
//! - Call [`CompositeEngine::render`]
#![forbid(unsafe_code)]

pub mod assets;
pub mod build;
pub mod composite;
pub mod foundation;
pub mod geometry;
pub mod index;
pub mod model;
pub mod session;
pub mod toolkit;

pub use crate::foundation::config::{EngineConfig, PngCompression};
pub use crate::foundation::error::{ComposeError, ComposeResult, Stage};

pub use crate::build::layer_builder::{BuildOutcome, BuiltLayer, LayerBuilder};
pub use crate::build::plan::LayerPlan;
pub use crate::composite::{Compositor, LayeringSorter, Watermarker};
pub use crate::geometry::mapper::{CoordinateMapper, DecodeLevel, LayerGeometry, Visibility};
pub use crate::geometry::padding::{Padding, PaddingCalculator};
pub use crate::geometry::roi::{ArcsecRoi, Canvas, PixelRoi};
pub use crate::index::{CatalogEntry, CatalogIndex, ImageIndex};
pub use crate::model::instrument::{InstrumentKey, InstrumentKind, InstrumentProfile};
pub use crate::model::layer::{LayerSpec, LayeringOrder, SourceDescriptor};
pub use crate::model::request::{CompositeRequest, LayerRequest, OutputFormat};
pub use crate::model::selection::parse_layer_selection;
pub use crate::session::{CompositeEngine, CompositeResult};
pub use crate::toolkit::{CountingToolkit, ImageToolkit, RasterToolkit};
