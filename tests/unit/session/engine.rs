use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, TimeZone as _, Utc};

use super::*;
use crate::{
    geometry::roi::ArcsecRoi,
    model::{
        instrument::InstrumentKey,
        layer::{LayeringOrder, SourceDescriptor},
        request::LayerRequest,
    },
};

/// Index that serves one fixed descriptor for every key except `missing`.
#[derive(Default)]
struct FixedIndex {
    lookups: AtomicUsize,
}

impl ImageIndex for FixedIndex {
    fn resolve(
        &self,
        timestamp: DateTime<Utc>,
        key: &InstrumentKey,
    ) -> ComposeResult<SourceDescriptor> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if key.measurement == "missing" {
            return Err(ComposeError::unavailable(
                key.watermark_label(),
                "no data available for source in requested window",
            ));
        }
        Ok(SourceDescriptor {
            uri: format!("{}.png", key.detector),
            timestamp,
            width: 1024,
            height: 1024,
            native_scale: 1.0,
            sun_center_offset_x: 0.0,
            sun_center_offset_y: 0.0,
        })
    }
}

fn when() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2011, 6, 7, 6, 30, 0).unwrap()
}

fn layer(det: &str, meas: &str) -> LayerRequest {
    LayerRequest::new(InstrumentKey::new("SOHO", "EIT", det, meas), when())
}

fn engine(index: Arc<FixedIndex>) -> (tempfile::TempDir, CompositeEngine) {
    let dir = tempfile::tempdir().unwrap();
    let engine = CompositeEngine::new(EngineConfig::with_cache_root(dir.path()), index).unwrap();
    (dir, engine)
}

fn roi(half: f64) -> ArcsecRoi {
    ArcsecRoi::new(-half, -half, half, half).unwrap()
}

#[test]
fn invalid_requests_fail_before_any_lookup() {
    let index = Arc::new(FixedIndex::default());
    let (_dir, engine) = engine(index.clone());

    let four = vec![layer("A", "1"), layer("B", "1"), layer("C", "1"), layer("D", "1")];
    let err = engine
        .render(&CompositeRequest::new(four, roi(100.0), 1.0))
        .unwrap_err();
    assert!(matches!(err, ComposeError::InvalidRequest(_)));

    let err = engine
        .render(&CompositeRequest::new(Vec::new(), roi(100.0), 1.0))
        .unwrap_err();
    assert!(matches!(err, ComposeError::InvalidRequest(_)));

    let err = engine
        .render(&CompositeRequest::new(vec![layer("A", "1")], roi(100.0), 0.0))
        .unwrap_err();
    assert!(matches!(err, ComposeError::InvalidRequest(_)));

    assert_eq!(index.lookups.load(Ordering::Relaxed), 0);
}

#[test]
fn unavailable_source_fails_the_whole_request() {
    let (dir, engine) = engine(Arc::new(FixedIndex::default()));
    let req = CompositeRequest::new(
        vec![layer("EIT", "304"), layer("EIT", "missing")],
        roi(100.0),
        1.0,
    );
    let err = engine.render(&req).unwrap_err();
    assert!(matches!(err, ComposeError::SourceUnavailable { .. }));
    assert_eq!(err.layer(), Some("EIT missing"));
    // Nothing was built.
    assert!(!dir.path().join("layers").exists());
    assert!(!dir.path().join("composites").exists());
}

#[test]
fn plan_shares_one_canvas_and_keeps_request_order() {
    let (_dir, engine) = engine(Arc::new(FixedIndex::default()));
    let mut second = layer("EIT", "195").with_opacity(40);
    second.layering_order = Some(LayeringOrder::THIRD);
    let req = CompositeRequest::new(vec![layer("EIT", "304"), second], roi(100.0), 1.0);

    let plans = engine.plan(&req).unwrap();
    assert_eq!(plans.len(), 2);
    assert_eq!(plans[0].spec.label, "EIT 304");
    assert_eq!(plans[1].spec.label, "EIT 195");
    assert_eq!(plans[1].spec.opacity, 40);
    assert_eq!(plans[1].spec.layering_order, LayeringOrder::THIRD);
    for p in &plans {
        assert_eq!(
            p.canvas(),
            Canvas {
                width: 200,
                height: 200
            }
        );
        assert_eq!(p.geometry.decode_level.0, 0);
    }
}

#[test]
fn oversized_requests_are_coarsened_to_the_pixel_limits() {
    let index = Arc::new(FixedIndex::default());
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = EngineConfig::with_cache_root(dir.path());
    cfg.max_width = 100;
    cfg.max_height = 50;
    let engine = CompositeEngine::new(cfg, index).unwrap();

    let req = CompositeRequest::new(vec![layer("EIT", "304")], roi(100.0), 1.0);
    let plans = engine.plan(&req).unwrap();
    // 200x200 at 1"/px is limited by height: scale 4"/px gives 50x50.
    assert_eq!(plans[0].spec.desired_scale, 4.0);
    assert_eq!(
        plans[0].canvas(),
        Canvas {
            width: 50,
            height: 50
        }
    );
    assert_eq!(plans[0].geometry.decode_level.0, 2);
}

#[test]
fn invalid_config_is_rejected_at_construction() {
    let mut cfg = EngineConfig::default();
    cfg.bit_depth = 9;
    assert!(CompositeEngine::new(cfg, Arc::new(FixedIndex::default())).is_err());
}
