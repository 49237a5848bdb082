use chrono::{TimeZone as _, Utc};

use super::*;
use crate::model::instrument::InstrumentKey;
use crate::model::layer::SourceDescriptor;

fn roi() -> ArcsecRoi {
    ArcsecRoi::new(-100.0, -100.0, 100.0, 100.0).unwrap()
}

fn layer(size: u32, native_scale: f64, offset: (f64, f64), desired_scale: f64) -> LayerSpec {
    let source = SourceDescriptor {
        uri: "src.png".to_string(),
        timestamp: Utc.with_ymd_and_hms(2011, 6, 7, 6, 30, 0).unwrap(),
        width: size,
        height: size,
        native_scale,
        sun_center_offset_x: offset.0,
        sun_center_offset_y: offset.1,
    };
    LayerSpec::from_source(
        InstrumentKey::new("SDO", "AIA", "AIA", "171"),
        &source,
        desired_scale,
        roi(),
    )
}

#[test]
fn matching_scale_and_roi_has_zero_offset() {
    let l = layer(200, 1.0, (0.0, 0.0), 1.0);
    let p = PaddingCalculator::compute(&l, &roi(), 1.0);
    assert_eq!(p.offset_x, 0);
    assert_eq!(p.offset_y, 0);
    assert_eq!((p.width, p.height), (200, 200));
    assert_eq!(p.gravity, Gravity::NorthWest);
    assert_eq!(p.content_origin(), (0, 0));
}

#[test]
fn small_raster_is_centered_in_larger_canvas() {
    let l = layer(100, 1.0, (0.0, 0.0), 1.0);
    let p = PaddingCalculator::compute(&l, &roi(), 1.0);
    assert_eq!((p.offset_x, p.offset_y), (-50, -50));
    assert_eq!(p.content_origin(), (50, 50));
}

#[test]
fn finer_native_scale_aligns_on_shared_frame() {
    let l = layer(400, 0.5, (0.0, 0.0), 1.0);
    let p = PaddingCalculator::compute(&l, &roi(), 1.0);
    assert_eq!((p.offset_x, p.offset_y), (0, 0));
    assert_eq!((p.width, p.height), (200, 200));
}

#[test]
fn sun_center_offset_moves_content_origin() {
    // Sun sits 10 px right and 4 px above the raster center.
    let l = layer(100, 1.0, (10.0, -4.0), 1.0);
    let p = PaddingCalculator::compute(&l, &roi(), 1.0);
    assert_eq!(p.content_origin(), (40, 54));
    // Sun center lands on the canvas center.
    let (ox, oy) = p.content_origin();
    assert_eq!(ox as f64 + l.center_x(), 100.0);
    assert_eq!(oy as f64 + l.center_y(), 100.0);
}

#[test]
fn offsets_are_rounded_not_truncated() {
    // Sun center at 50.6 px: exact offset is -49.4 -> -49.
    let l = layer(100, 1.0, (0.6, 0.0), 1.0);
    let p = PaddingCalculator::compute(&l, &roi(), 1.0);
    assert_eq!(p.offset_x, -49);

    // Exact offset -50.6 -> -51, where truncation would give -50.
    let l = layer(100, 1.0, (-0.6, 0.0), 1.0);
    let p = PaddingCalculator::compute(&l, &roi(), 1.0);
    assert_eq!(p.offset_x, -51);
}

#[test]
fn canvas_is_shared_across_layers() {
    let a = PaddingCalculator::compute(&layer(100, 1.0, (0.0, 0.0), 0.6), &roi(), 0.6);
    let b = PaddingCalculator::compute(&layer(1024, 2.5, (3.0, 1.0), 0.6), &roi(), 0.6);
    assert_eq!(a.canvas(), b.canvas());
    assert_eq!(a.width, 333);
}
