//! Ordering, merging and annotation of built layer rasters.

pub mod compositor;
pub mod sorter;
pub mod watermark;

pub use compositor::Compositor;
pub use sorter::{Layered, LayeringSorter};
pub use watermark::{WatermarkLayout, Watermarker};
