//! Logo and layer caption overlay.
//!
//! The logo sits in the southeast corner at 60% strength. Layer names and observation times are
//! drawn in the southwest corner, one row per layer in request order, outlined in black so they
//! stay legible over bright coronae.

use std::fmt::Write as _;

use image::{RgbImage, RgbaImage};

use crate::{
    assets::{
        logo::{LOGO_BASE_WIDTH, LogoVariant},
        svg::{SvgRenderer, escape_xml},
    },
    foundation::error::{ComposeError, ComposeResult, Stage},
    geometry::roi::Canvas,
    toolkit::blend,
};

/// Distance of the logo from the right and bottom edges.
pub const LOGO_MARGIN: u32 = 10;
/// Logo strength in percent.
pub const LOGO_DISSOLVE: u8 = 60;
/// Canvases narrower than this get no caption.
pub const MIN_CAPTION_WIDTH: u32 = 235;

const NAME_X: u32 = 20;
const TIME_X: u32 = 125;
const ROW_HEIGHT: u32 = 12;
const BOTTOM_MARGIN: u32 = 8;
const FONT_SIZE: u32 = 11;

/// Where and how large the logo is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogoPlacement {
    pub variant: LogoVariant,
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Watermark geometry for one canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatermarkLayout {
    pub logo: LogoPlacement,
    /// Text baseline of each caption row, top to bottom. Empty when the caption is suppressed.
    pub baselines: Vec<i64>,
}

impl WatermarkLayout {
    pub fn for_canvas(canvas: Canvas, rows: usize) -> Self {
        let (variant, width, height) = if canvas.width < 2 * LOGO_BASE_WIDTH {
            let (nw, nh) = LogoVariant::Circle.native_size();
            let w = (f64::from(canvas.width) / 2.0).round().max(1.0);
            let h = (f64::from(nh) * w / f64::from(nw)).round().max(1.0);
            (LogoVariant::Circle, w as u32, h as u32)
        } else {
            let (w, h) = LogoVariant::Full.native_size();
            (LogoVariant::Full, w, h)
        };
        let logo = LogoPlacement {
            variant,
            x: i64::from(canvas.width) - i64::from(width) - i64::from(LOGO_MARGIN),
            y: i64::from(canvas.height) - i64::from(height) - i64::from(LOGO_MARGIN),
            width,
            height,
        };

        let baselines = if canvas.width < MIN_CAPTION_WIDTH {
            Vec::new()
        } else {
            let last = i64::from(canvas.height) - i64::from(BOTTOM_MARGIN);
            (0..rows)
                .map(|i| last - (rows - 1 - i) as i64 * i64::from(ROW_HEIGHT))
                .collect()
        };

        Self { logo, baselines }
    }
}

/// Draws the logo and caption onto finished composites.
#[derive(Clone, Debug)]
pub struct Watermarker<'a> {
    svg: &'a SvgRenderer,
}

impl<'a> Watermarker<'a> {
    pub fn new(svg: &'a SvgRenderer) -> Self {
        Self { svg }
    }

    /// Overlay the watermark on `raster`, which must be `canvas` sized.
    ///
    /// `labels[i]` and `timestamps[i]` form caption row `i`.
    #[tracing::instrument(
        skip_all,
        fields(width = canvas.width, height = canvas.height, rows = labels.len())
    )]
    pub fn annotate(
        &self,
        mut raster: RgbImage,
        labels: &[String],
        timestamps: &[String],
        canvas: Canvas,
    ) -> ComposeResult<RgbImage> {
        if labels.len() != timestamps.len() {
            return Err(ComposeError::composite(
                Stage::Watermark,
                format!(
                    "{} labels but {} timestamps",
                    labels.len(),
                    timestamps.len()
                ),
            ));
        }
        if raster.dimensions() != (canvas.width, canvas.height) {
            return Err(ComposeError::composite(
                Stage::Watermark,
                format!(
                    "raster is {}x{}, canvas is {}x{}",
                    raster.width(),
                    raster.height(),
                    canvas.width,
                    canvas.height
                ),
            ));
        }

        let layout = WatermarkLayout::for_canvas(canvas, labels.len());
        let placement = layout.logo;
        let logo = self.render(placement.variant.svg(), placement.width, placement.height)?;
        draw_over(&mut raster, &logo, placement.x, placement.y, LOGO_DISSOLVE);

        if layout.baselines.is_empty() {
            tracing::debug!("caption suppressed");
        } else {
            let svg = caption_svg(canvas, labels, timestamps, &layout.baselines);
            let caption = self.render(&svg, canvas.width, canvas.height)?;
            draw_over(&mut raster, &caption, 0, 0, 100);
        }
        Ok(raster)
    }

    fn render(&self, svg: &str, width: u32, height: u32) -> ComposeResult<RgbaImage> {
        let tree = self.svg.parse(svg).map_err(|e| {
            tracing::error!(error = %e, "watermark svg rejected");
            ComposeError::composite(Stage::Watermark, e)
        })?;
        self.svg.rasterize(&tree, width, height)
    }
}

/// Caption document: an outline pass, then a white fill pass on top.
pub fn caption_svg(
    canvas: Canvas,
    labels: &[String],
    timestamps: &[String],
    baselines: &[i64],
) -> String {
    let mut rows = String::new();
    for ((label, time), y) in labels.iter().zip(timestamps).zip(baselines) {
        let _ = write!(
            rows,
            r#"<text x="{NAME_X}" y="{y}">{}</text><text x="{TIME_X}" y="{y}">{}</text>"#,
            escape_xml(label),
            escape_xml(time)
        );
    }

    let (w, h) = (canvas.width, canvas.height);
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xml:space="preserve" "#,
            r#"width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r#"<g font-family="sans-serif" font-size="{fs}">"#,
            r##"<g fill="#000000" fill-opacity="0.8" stroke="#000000" stroke-opacity="0.8" stroke-width="2">{rows}</g>"##,
            r##"<g fill="#ffffff">{rows}</g>"##,
            "</g></svg>"
        ),
        w = w,
        h = h,
        fs = FONT_SIZE,
        rows = rows
    )
}

/// Blend straight-alpha `src` onto `dst` with its top-left at `(x, y)`, clipped to `dst`.
fn draw_over(dst: &mut RgbImage, src: &RgbaImage, x: i64, y: i64, strength: u8) {
    let (dw, dh) = (i64::from(dst.width()), i64::from(dst.height()));
    for (sx, sy, px) in src.enumerate_pixels() {
        let (tx, ty) = (x + i64::from(sx), y + i64::from(sy));
        if tx < 0 || ty < 0 || tx >= dw || ty >= dh {
            continue;
        }
        let mut rgba = px.0;
        blend::scale_alpha_in_place(&mut rgba, strength);
        if rgba[3] == 0 {
            continue;
        }
        let d = dst.get_pixel_mut(tx as u32, ty as u32);
        d.0 = blend::flatten_pixel(rgba, d.0);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composite/watermark.rs"]
mod tests;
