use chrono::{TimeZone as _, Utc};
use image::Rgba;

use super::*;
use crate::{
    build::layer_builder::BuildOutcome,
    model::layer::LayeringOrder,
    toolkit::{CountingToolkit, ImageToolkit},
};

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const CANVAS: Canvas = Canvas {
    width: 4,
    height: 4,
};

fn config(dir: &tempfile::TempDir) -> EngineConfig {
    let mut cfg = EngineConfig::with_cache_root(dir.path());
    cfg.png_compression = crate::foundation::config::PngCompression::Fast;
    cfg
}

fn layer(dir: &tempfile::TempDir, name: &str, img: &RgbaImage, opacity: u8) -> BuiltLayer {
    let path = dir.path().join(format!("{name}.png"));
    img.save(&path).unwrap();
    BuiltLayer {
        label: name.to_string(),
        timestamp: Utc.timestamp_opt(0, 0).unwrap(),
        path,
        opacity,
        layering_order: LayeringOrder::FIRST,
        outcome: BuildOutcome::Built,
    }
}

fn solid(px: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(4, 4, Rgba(px))
}

#[test]
fn first_layer_ends_up_on_top() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir);
    let top = layer(&dir, "top", &solid(RED), 100);
    let bottom = layer(&dir, "bottom", &solid(BLUE), 100);

    let out = Compositor::new(&ImageToolkit, &cfg)
        .compose(&[top, bottom], CANVAS)
        .unwrap();
    assert!(out.pixels().all(|p| p.0 == [255, 0, 0]));
}

#[test]
fn lower_layers_show_through_transparent_regions() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir);
    let mut holed = solid(RED);
    for y in 0..4 {
        for x in 0..2 {
            holed.put_pixel(x, y, Rgba([0, 0, 0, 0]));
        }
    }
    let top = layer(&dir, "top", &holed, 100);
    let bottom = layer(&dir, "bottom", &solid(BLUE), 100);

    let out = Compositor::new(&ImageToolkit, &cfg)
        .compose(&[top, bottom], CANVAS)
        .unwrap();
    assert_eq!(out.get_pixel(0, 0).0, [0, 0, 255]);
    assert_eq!(out.get_pixel(3, 3).0, [255, 0, 0]);
}

#[test]
fn single_layer_is_flattened_without_compositing() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir);
    let only = layer(&dir, "only", &solid([255, 255, 255, 0]), 100);

    let tk = CountingToolkit::new(ImageToolkit);
    let out = Compositor::new(&tk, &cfg).compose(&[only], CANVAS).unwrap();
    assert!(out.pixels().all(|p| p.0 == [0, 0, 0]));
    assert_eq!(tk.calls().composite_dst_over, 0);
    assert_eq!(tk.calls().flatten, 1);
}

#[test]
fn translucent_variant_is_built_once_and_reused() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir);
    let faded = layer(&dir, "c2_abc", &solid(RED), 40);

    let tk = CountingToolkit::new(ImageToolkit);
    let comp = Compositor::new(&tk, &cfg);
    let path = comp.raster_for(&faded).unwrap();
    assert_eq!(path, cfg.transparent_dir().join("c2_abc-op40.png"));
    let mtime = std::fs::metadata(&path).unwrap().modified().unwrap();
    assert_eq!(tk.calls().set_opacity, 1);

    let out = comp.compose(std::slice::from_ref(&faded), CANVAS).unwrap();
    assert_eq!(tk.calls().set_opacity, 1);
    assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), mtime);
    // 40% of full alpha is 102; red over black keeps that fraction.
    assert_eq!(out.get_pixel(0, 0).0, [102, 0, 0]);
}

#[test]
fn opaque_layers_are_drawn_from_their_own_raster() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir);
    let l = layer(&dir, "eit", &solid(RED), 100);
    let comp = Compositor::new(&ImageToolkit, &cfg);
    assert_eq!(comp.raster_for(&l).unwrap(), l.path);
    assert!(!cfg.transparent_dir().exists());
}

#[test]
fn mismatched_layer_size_is_a_composite_failure() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir);
    let a = layer(&dir, "a", &solid(RED), 100);
    let b = layer(&dir, "b", &RgbaImage::new(3, 4), 100);

    let err = Compositor::new(&ImageToolkit, &cfg)
        .compose(&[a, b], CANVAS)
        .unwrap_err();
    assert_eq!(err.stage(), Stage::Composite);
    assert!(matches!(err, ComposeError::CompositeFailure { .. }));
}

#[test]
fn missing_layer_raster_fails_the_composite() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir);
    let mut l = layer(&dir, "gone", &solid(RED), 100);
    l.path = dir.path().join("nope.png");

    let err = Compositor::new(&ImageToolkit, &cfg)
        .compose(&[l], CANVAS)
        .unwrap_err();
    assert_eq!(err.stage(), Stage::Composite);
}

#[test]
fn empty_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir);
    let err = Compositor::new(&ImageToolkit, &cfg)
        .compose(&[], CANVAS)
        .unwrap_err();
    assert_eq!(err.stage(), Stage::Composite);
}

#[test]
fn quantize_to_one_bit_leaves_extremes_only() {
    let mut img = RgbImage::from_fn(4, 1, |x, _| image::Rgb([(x * 80) as u8, 10, 250]));
    quantize(&mut img, 1);
    assert!(img.as_raw().iter().all(|&c| c == 0 || c == 255));
    assert_eq!(img.get_pixel(0, 0).0, [0, 0, 255]);
}
