use super::*;

fn canvas(width: u32, height: u32) -> Canvas {
    Canvas { width, height }
}

fn strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[test]
fn wide_canvas_gets_full_logo_and_bottom_aligned_rows() {
    let layout = WatermarkLayout::for_canvas(canvas(1024, 1024), 3);
    assert_eq!(
        layout.logo,
        LogoPlacement {
            variant: LogoVariant::Full,
            x: 1024 - 300 - 10,
            y: 1024 - 48 - 10,
            width: 300,
            height: 48,
        }
    );
    assert_eq!(layout.baselines, vec![992, 1004, 1016]);
}

#[test]
fn narrow_canvas_gets_circle_at_half_width() {
    let layout = WatermarkLayout::for_canvas(canvas(400, 300), 2);
    assert_eq!(layout.logo.variant, LogoVariant::Circle);
    assert_eq!((layout.logo.width, layout.logo.height), (200, 200));
    assert_eq!((layout.logo.x, layout.logo.y), (190, 90));
    assert_eq!(layout.baselines, vec![280, 292]);
}

#[test]
fn logo_variant_switches_at_twice_the_logo_width() {
    let v = |w| WatermarkLayout::for_canvas(canvas(w, 400), 1).logo.variant;
    assert_eq!(v(599), LogoVariant::Circle);
    assert_eq!(v(600), LogoVariant::Full);
}

#[test]
fn caption_is_suppressed_below_minimum_width() {
    assert!(WatermarkLayout::for_canvas(canvas(234, 234), 3).baselines.is_empty());
    assert_eq!(
        WatermarkLayout::for_canvas(canvas(235, 235), 1).baselines,
        vec![227]
    );
}

#[test]
fn caption_document_escapes_and_keeps_spacing() {
    let svg = caption_svg(
        canvas(400, 400),
        &strings(&["A&B"]),
        &strings(&["2003-01-01   12:00"]),
        &[392],
    );
    assert!(svg.contains("A&amp;B"));
    assert!(svg.contains("2003-01-01   12:00"));
    assert!(svg.contains(r#"xml:space="preserve""#));
    // Outline pass and fill pass each carry every row.
    assert_eq!(svg.matches("A&amp;B").count(), 2);
    SvgRenderer::new(None).parse(&svg).unwrap();
}

#[test]
fn circle_logo_is_dissolved_into_the_southeast_corner() {
    let renderer = SvgRenderer::new(None);
    let out = Watermarker::new(&renderer)
        .annotate(
            RgbImage::new(400, 400),
            &strings(&["EIT 304"]),
            &strings(&["2003-01-01   12:00"]),
            canvas(400, 400),
        )
        .unwrap();
    // Logo center: the solid inner disk at 60% white over black.
    assert_eq!(out.get_pixel(290, 290).0, [153, 153, 153]);
    assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0]);
    assert_eq!(out.get_pixel(399, 0).0, [0, 0, 0]);
}

#[test]
fn full_logo_is_used_on_wide_frames() {
    let renderer = SvgRenderer::new(None);
    let out = Watermarker::new(&renderer)
        .annotate(RgbImage::new(800, 600), &[], &[], canvas(800, 600))
        .unwrap();
    // Emblem disk of the full logo, centered at (24, 24) of the 300x48 artwork.
    assert_eq!(out.get_pixel(490 + 24, 542 + 24).0, [153, 153, 153]);
}

#[test]
fn mismatched_rows_or_canvas_are_rejected() {
    let renderer = SvgRenderer::new(None);
    let wm = Watermarker::new(&renderer);

    let err = wm
        .annotate(
            RgbImage::new(300, 300),
            &strings(&["a", "b"]),
            &strings(&["t"]),
            canvas(300, 300),
        )
        .unwrap_err();
    assert_eq!(err.stage(), Stage::Watermark);

    let err = wm
        .annotate(RgbImage::new(300, 200), &[], &[], canvas(300, 300))
        .unwrap_err();
    assert_eq!(err.stage(), Stage::Watermark);
}
