use std::{
    io::Write,
    path::Path,
    sync::atomic::{AtomicU64, Ordering},
};

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

use crate::{
    assets::color_table::ColorTable,
    geometry::{mapper::DecodeLevel, padding::Padding, roi::DecodeWindow},
    toolkit::{EncodeFormat, RasterToolkit, ToolkitResult},
};

/// Per-operation call counts of a [`CountingToolkit`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ToolkitCalls {
    pub decode_region: u64,
    pub apply_palette: u64,
    pub resize: u64,
    pub extent: u64,
    pub set_opacity: u64,
    pub composite_dst_over: u64,
    pub flatten: u64,
    pub load: u64,
    pub encode: u64,
}

impl ToolkitCalls {
    pub fn total(&self) -> u64 {
        self.decode_region
            + self.apply_palette
            + self.resize
            + self.extent
            + self.set_opacity
            + self.composite_dst_over
            + self.flatten
            + self.load
            + self.encode
    }
}

#[derive(Debug, Default)]
struct Counters {
    decode_region: AtomicU64,
    apply_palette: AtomicU64,
    resize: AtomicU64,
    extent: AtomicU64,
    set_opacity: AtomicU64,
    composite_dst_over: AtomicU64,
    flatten: AtomicU64,
    load: AtomicU64,
    encode: AtomicU64,
}

/// Wraps a toolkit and counts every call made through it.
#[derive(Debug, Default)]
pub struct CountingToolkit<T> {
    inner: T,
    counters: Counters,
}

impl<T: RasterToolkit> CountingToolkit<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            counters: Counters::default(),
        }
    }

    pub fn calls(&self) -> ToolkitCalls {
        let c = &self.counters;
        let get = |a: &AtomicU64| a.load(Ordering::Relaxed);
        ToolkitCalls {
            decode_region: get(&c.decode_region),
            apply_palette: get(&c.apply_palette),
            resize: get(&c.resize),
            extent: get(&c.extent),
            set_opacity: get(&c.set_opacity),
            composite_dst_over: get(&c.composite_dst_over),
            flatten: get(&c.flatten),
            load: get(&c.load),
            encode: get(&c.encode),
        }
    }
}

fn bump(a: &AtomicU64) {
    a.fetch_add(1, Ordering::Relaxed);
}

impl<T: RasterToolkit> RasterToolkit for CountingToolkit<T> {
    fn decode_region(
        &self,
        path: &Path,
        window: DecodeWindow,
        level: DecodeLevel,
    ) -> ToolkitResult<GrayImage> {
        bump(&self.counters.decode_region);
        self.inner.decode_region(path, window, level)
    }

    fn apply_palette(
        &self,
        gray: &GrayImage,
        table: Option<&ColorTable>,
    ) -> ToolkitResult<RgbaImage> {
        bump(&self.counters.apply_palette);
        self.inner.apply_palette(gray, table)
    }

    fn resize(&self, img: &RgbaImage, width: u32, height: u32) -> ToolkitResult<RgbaImage> {
        bump(&self.counters.resize);
        self.inner.resize(img, width, height)
    }

    fn extent(&self, img: &RgbaImage, padding: &Padding) -> ToolkitResult<RgbaImage> {
        bump(&self.counters.extent);
        self.inner.extent(img, padding)
    }

    fn set_opacity(&self, img: &RgbaImage, opacity: u8) -> ToolkitResult<RgbaImage> {
        bump(&self.counters.set_opacity);
        self.inner.set_opacity(img, opacity)
    }

    fn composite_dst_over(&self, dst: &mut RgbaImage, src: &RgbaImage) -> ToolkitResult<()> {
        bump(&self.counters.composite_dst_over);
        self.inner.composite_dst_over(dst, src)
    }

    fn flatten(&self, img: &RgbaImage, background: [u8; 3]) -> ToolkitResult<RgbImage> {
        bump(&self.counters.flatten);
        self.inner.flatten(img, background)
    }

    fn load(&self, path: &Path) -> ToolkitResult<RgbaImage> {
        bump(&self.counters.load);
        self.inner.load(path)
    }

    fn encode(
        &self,
        img: &DynamicImage,
        format: EncodeFormat,
        out: &mut dyn Write,
    ) -> ToolkitResult<()> {
        bump(&self.counters.encode);
        self.inner.encode(img, format, out)
    }
}
