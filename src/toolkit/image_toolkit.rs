use std::{io::Write, path::Path};

use image::{
    DynamicImage, GrayImage, ImageEncoder as _, Luma, Rgb, RgbImage, RgbaImage,
    codecs::{
        jpeg::JpegEncoder,
        png::{self, PngEncoder},
    },
    imageops::{self, FilterType},
};

use crate::{
    assets::color_table::ColorTable,
    foundation::config::PngCompression,
    geometry::{mapper::DecodeLevel, padding::Padding, roi::DecodeWindow},
    toolkit::{EncodeFormat, RasterToolkit, ToolkitError, ToolkitResult, blend},
};

/// [`RasterToolkit`] backed by the `image` crate.
///
/// Sources are any raster format `image` can read; they are converted to 8-bit grayscale on
/// decode. Reduced decode levels are produced by box-averaging `2^level` square blocks.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageToolkit;

impl ImageToolkit {
    pub fn new() -> Self {
        Self
    }
}

impl RasterToolkit for ImageToolkit {
    fn decode_region(
        &self,
        path: &Path,
        window: DecodeWindow,
        level: DecodeLevel,
    ) -> ToolkitResult<GrayImage> {
        let src = image::open(path)?.to_luma8();
        let (w, h) = src.dimensions();
        if window.width == 0
            || window.height == 0
            || window.x.saturating_add(window.width) > w
            || window.y.saturating_add(window.height) > h
        {
            return Err(ToolkitError::invalid(format!(
                "decode window {}x{}+{}+{} outside {w}x{h} source",
                window.width, window.height, window.x, window.y
            )));
        }
        let region =
            imageops::crop_imm(&src, window.x, window.y, window.width, window.height).to_image();
        Ok(box_reduce(&region, level))
    }

    fn apply_palette(
        &self,
        gray: &GrayImage,
        table: Option<&ColorTable>,
    ) -> ToolkitResult<RgbaImage> {
        let out = RgbaImage::from_fn(gray.width(), gray.height(), |x, y| {
            let v = gray.get_pixel(x, y).0[0];
            let [r, g, b] = match table {
                Some(t) => t.lookup(v),
                None => [v, v, v],
            };
            image::Rgba([r, g, b, 255])
        });
        Ok(out)
    }

    fn resize(&self, img: &RgbaImage, width: u32, height: u32) -> ToolkitResult<RgbaImage> {
        if width == 0 || height == 0 {
            return Err(ToolkitError::invalid("resize target must be non-empty"));
        }
        if img.dimensions() == (width, height) {
            return Ok(img.clone());
        }
        // Resample premultiplied so transparent pixels do not bleed color.
        let mut premul = img.clone();
        for px in premul.pixels_mut() {
            px.0 = blend::premultiply(px.0);
        }
        let mut out = imageops::resize(&premul, width, height, FilterType::Triangle);
        for px in out.pixels_mut() {
            px.0 = blend::unpremultiply(px.0);
        }
        Ok(out)
    }

    fn extent(&self, img: &RgbaImage, padding: &Padding) -> ToolkitResult<RgbaImage> {
        if padding.width == 0 || padding.height == 0 {
            return Err(ToolkitError::invalid("extent canvas must be non-empty"));
        }
        let mut canvas = RgbaImage::new(padding.width, padding.height);
        let (x, y) = padding.content_origin();
        imageops::replace(&mut canvas, img, x, y);
        Ok(canvas)
    }

    fn set_opacity(&self, img: &RgbaImage, opacity: u8) -> ToolkitResult<RgbaImage> {
        if opacity > 100 {
            return Err(ToolkitError::invalid(format!(
                "opacity {opacity} outside 0..=100"
            )));
        }
        let mut out = img.clone();
        blend::scale_alpha_in_place(&mut out, opacity);
        Ok(out)
    }

    fn composite_dst_over(&self, dst: &mut RgbaImage, src: &RgbaImage) -> ToolkitResult<()> {
        if dst.dimensions() != src.dimensions() {
            return Err(ToolkitError::invalid(format!(
                "cannot composite {:?} behind {:?}",
                src.dimensions(),
                dst.dimensions()
            )));
        }
        blend::dst_over_in_place(dst, src).map_err(ToolkitError::invalid)
    }

    fn flatten(&self, img: &RgbaImage, background: [u8; 3]) -> ToolkitResult<RgbImage> {
        Ok(RgbImage::from_fn(img.width(), img.height(), |x, y| {
            Rgb(blend::flatten_pixel(img.get_pixel(x, y).0, background))
        }))
    }

    fn load(&self, path: &Path) -> ToolkitResult<RgbaImage> {
        Ok(image::open(path)?.to_rgba8())
    }

    fn encode(
        &self,
        img: &DynamicImage,
        format: EncodeFormat,
        out: &mut dyn Write,
    ) -> ToolkitResult<()> {
        match format {
            EncodeFormat::Png(level) => {
                let compression = match level {
                    PngCompression::Fast => png::CompressionType::Fast,
                    PngCompression::Default => png::CompressionType::Default,
                    PngCompression::Best => png::CompressionType::Best,
                };
                let enc = PngEncoder::new_with_quality(out, compression, png::FilterType::Adaptive);
                enc.write_image(
                    img.as_bytes(),
                    img.width(),
                    img.height(),
                    img.color().into(),
                )?;
            }
            EncodeFormat::Jpeg { quality } => {
                let rgb = img.to_rgb8();
                let enc = JpegEncoder::new_with_quality(out, quality.clamp(1, 100));
                enc.write_image(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    image::ExtendedColorType::Rgb8,
                )?;
            }
        }
        Ok(())
    }
}

/// Average `2^level` square blocks; edge blocks average only the pixels they cover.
fn box_reduce(src: &GrayImage, level: DecodeLevel) -> GrayImage {
    if level.0 == 0 {
        return src.clone();
    }
    let f = level.factor();
    let (w, h) = src.dimensions();
    let (ow, oh) = (w.div_ceil(f), h.div_ceil(f));
    GrayImage::from_fn(ow, oh, |ox, oy| {
        let (x0, y0) = (ox * f, oy * f);
        let (x1, y1) = ((x0 + f).min(w), (y0 + f).min(h));
        let mut sum = 0u64;
        for y in y0..y1 {
            for x in x0..x1 {
                sum += u64::from(src.get_pixel(x, y).0[0]);
            }
        }
        let n = u64::from((x1 - x0) * (y1 - y0));
        Luma([((sum + n / 2) / n) as u8])
    })
}

#[cfg(test)]
#[path = "../../tests/unit/toolkit/image_toolkit.rs"]
mod tests;
