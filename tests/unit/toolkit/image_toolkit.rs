use super::*;
use crate::geometry::padding::Gravity;

fn gradient(w: u32, h: u32) -> GrayImage {
    GrayImage::from_fn(w, h, |x, y| Luma([(x + y * w) as u8]))
}

fn write_png(img: &GrayImage) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("src.png");
    img.save(&path).unwrap();
    (dir, path)
}

fn padding(w: u32, h: u32, offset_x: i64, offset_y: i64) -> Padding {
    Padding {
        gravity: Gravity::NorthWest,
        width: w,
        height: h,
        offset_x,
        offset_y,
    }
}

#[test]
fn decode_crops_window_at_level_zero() {
    let (_dir, path) = write_png(&gradient(8, 8));
    let window = DecodeWindow {
        x: 2,
        y: 1,
        width: 3,
        height: 2,
    };
    let out = ImageToolkit
        .decode_region(&path, window, DecodeLevel(0))
        .unwrap();
    assert_eq!(out.dimensions(), (3, 2));
    assert_eq!(out.get_pixel(0, 0).0[0], 10);
    assert_eq!(out.get_pixel(2, 1).0[0], 20);
}

#[test]
fn decode_reduces_by_power_of_two_with_ceil_dims() {
    let img = GrayImage::from_fn(5, 4, |x, _| Luma([if x < 2 { 100 } else { 200 }]));
    let (_dir, path) = write_png(&img);
    let window = DecodeWindow {
        x: 0,
        y: 0,
        width: 5,
        height: 4,
    };
    let out = ImageToolkit
        .decode_region(&path, window, DecodeLevel(1))
        .unwrap();
    assert_eq!(out.dimensions(), (3, 2));
    assert_eq!(out.get_pixel(0, 0).0[0], 100);
    assert_eq!(out.get_pixel(1, 1).0[0], 200);
    // Last column covers a single source column.
    assert_eq!(out.get_pixel(2, 0).0[0], 200);
}

#[test]
fn decode_rejects_out_of_bounds_window() {
    let (_dir, path) = write_png(&gradient(4, 4));
    let window = DecodeWindow {
        x: 2,
        y: 0,
        width: 3,
        height: 4,
    };
    let err = ImageToolkit
        .decode_region(&path, window, DecodeLevel(0))
        .unwrap_err();
    assert!(matches!(err, ToolkitError::Invalid(_)));
}

#[test]
fn decode_reports_corrupt_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.png");
    std::fs::write(&path, b"not a png").unwrap();
    let window = DecodeWindow {
        x: 0,
        y: 0,
        width: 1,
        height: 1,
    };
    assert!(
        ImageToolkit
            .decode_region(&path, window, DecodeLevel(0))
            .is_err()
    );
}

#[test]
fn palette_maps_or_replicates_gray() {
    let gray = GrayImage::from_pixel(2, 1, Luma([128]));
    let plain = ImageToolkit.apply_palette(&gray, None).unwrap();
    assert_eq!(plain.get_pixel(0, 0).0, [128, 128, 128, 255]);

    let table = crate::assets::color_table::Palette::RedTemperature.builtin();
    let colored = ImageToolkit.apply_palette(&gray, Some(&table)).unwrap();
    let [r, g, b] = table.lookup(128);
    assert_eq!(colored.get_pixel(1, 0).0, [r, g, b, 255]);
}

#[test]
fn resize_hits_target_and_keeps_flat_color() {
    let img = RgbaImage::from_pixel(10, 6, image::Rgba([40, 80, 120, 255]));
    let out = ImageToolkit.resize(&img, 5, 3).unwrap();
    assert_eq!(out.dimensions(), (5, 3));
    assert!(out.pixels().all(|p| p.0 == [40, 80, 120, 255]));
    assert!(ImageToolkit.resize(&img, 0, 3).is_err());
}

#[test]
fn extent_places_content_at_negated_offset() {
    let img = RgbaImage::from_pixel(2, 2, image::Rgba([9, 9, 9, 255]));
    let out = ImageToolkit.extent(&img, &padding(6, 5, -3, -1)).unwrap();
    assert_eq!(out.dimensions(), (6, 5));
    assert_eq!(out.get_pixel(3, 1).0, [9, 9, 9, 255]);
    assert_eq!(out.get_pixel(4, 2).0, [9, 9, 9, 255]);
    assert_eq!(out.get_pixel(2, 1).0[3], 0);
    assert_eq!(out.get_pixel(0, 0).0[3], 0);
}

#[test]
fn extent_clips_content_past_the_canvas() {
    let img = RgbaImage::from_pixel(4, 4, image::Rgba([9, 9, 9, 255]));
    let out = ImageToolkit.extent(&img, &padding(3, 3, 2, 2)).unwrap();
    assert_eq!(out.get_pixel(0, 0).0[3], 255);
    assert_eq!(out.get_pixel(1, 1).0[3], 255);
    assert_eq!(out.get_pixel(2, 2).0[3], 0);
}

#[test]
fn set_opacity_scales_alpha_only() {
    let img = RgbaImage::from_pixel(1, 1, image::Rgba([10, 20, 30, 255]));
    let out = ImageToolkit.set_opacity(&img, 40).unwrap();
    assert_eq!(out.get_pixel(0, 0).0, [10, 20, 30, 102]);
    assert!(ImageToolkit.set_opacity(&img, 101).is_err());
}

#[test]
fn composite_requires_matching_sizes() {
    let mut dst = RgbaImage::new(2, 2);
    let src = RgbaImage::new(3, 2);
    assert!(ImageToolkit.composite_dst_over(&mut dst, &src).is_err());
}

#[test]
fn encode_png_and_jpeg() {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([200, 10, 10])));

    let mut png_bytes = Vec::new();
    ImageToolkit
        .encode(&img, EncodeFormat::Png(PngCompression::Fast), &mut png_bytes)
        .unwrap();
    let back = image::load_from_memory(&png_bytes).unwrap().to_rgb8();
    assert_eq!(back.get_pixel(1, 1).0, [200, 10, 10]);

    let mut jpg_bytes = Vec::new();
    ImageToolkit
        .encode(&img, EncodeFormat::Jpeg { quality: 90 }, &mut jpg_bytes)
        .unwrap();
    assert_eq!(
        image::guess_format(&jpg_bytes).unwrap(),
        image::ImageFormat::Jpeg
    );
}
