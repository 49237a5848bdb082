//! Raster codec and pixel-operation seam.
//!
//! The engine never touches pixels directly: every decode, resample, blend and encode goes
//! through a [`RasterToolkit`]. [`ImageToolkit`] is the production implementation.

use std::{io::Write, path::Path};

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

use crate::{
    assets::color_table::ColorTable,
    foundation::config::PngCompression,
    geometry::{mapper::DecodeLevel, padding::Padding, roi::DecodeWindow},
};

pub mod blend;
pub mod counting;
pub mod image_toolkit;

pub use counting::{CountingToolkit, ToolkitCalls};
pub use image_toolkit::ImageToolkit;

/// Failure reported by a toolkit operation.
#[derive(thiserror::Error, Debug)]
pub enum ToolkitError {
    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Invalid(String),
}

impl ToolkitError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

pub type ToolkitResult<T> = Result<T, ToolkitError>;

/// Encoding of a file written by [`RasterToolkit::encode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodeFormat {
    Png(PngCompression),
    Jpeg { quality: u8 },
}

/// Pixel operations the engine needs from a raster library.
///
/// All rasters are 8-bit with straight (non-premultiplied) alpha. Each call is synchronous and
/// fails independently.
pub trait RasterToolkit: Send + Sync {
    /// Decode `window` of the source at `path`, reduced by `2^level` on each axis.
    fn decode_region(
        &self,
        path: &Path,
        window: DecodeWindow,
        level: DecodeLevel,
    ) -> ToolkitResult<GrayImage>;

    /// Map gray values through `table`, or replicate gray into RGB when there is none.
    fn apply_palette(
        &self,
        gray: &GrayImage,
        table: Option<&ColorTable>,
    ) -> ToolkitResult<RgbaImage>;

    fn resize(&self, img: &RgbaImage, width: u32, height: u32) -> ToolkitResult<RgbaImage>;

    /// Place `img` on a transparent canvas per `padding`.
    fn extent(&self, img: &RgbaImage, padding: &Padding) -> ToolkitResult<RgbaImage>;

    /// Copy of `img` with alpha scaled by `opacity` percent.
    fn set_opacity(&self, img: &RgbaImage, opacity: u8) -> ToolkitResult<RgbaImage>;

    /// Draw `src` behind `dst`.
    fn composite_dst_over(&self, dst: &mut RgbaImage, src: &RgbaImage) -> ToolkitResult<()>;

    /// Composite onto an opaque `background`, dropping alpha.
    fn flatten(&self, img: &RgbaImage, background: [u8; 3]) -> ToolkitResult<RgbImage>;

    /// Load a previously written raster.
    fn load(&self, path: &Path) -> ToolkitResult<RgbaImage>;

    fn encode(
        &self,
        img: &DynamicImage,
        format: EncodeFormat,
        out: &mut dyn Write,
    ) -> ToolkitResult<()>;
}
