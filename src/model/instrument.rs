use std::fmt;

use serde::{Deserialize, Serialize};

use crate::assets::{color_table::Palette, mask::OcculterMask};
use crate::model::layer::LayeringOrder;

/// Identifies one data source: observatory, instrument, detector and measurement.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstrumentKey {
    pub observatory: String,
    pub instrument: String,
    pub detector: String,
    pub measurement: String,
}

impl InstrumentKey {
    pub fn new(
        observatory: impl Into<String>,
        instrument: impl Into<String>,
        detector: impl Into<String>,
        measurement: impl Into<String>,
    ) -> Self {
        Self {
            observatory: observatory.into(),
            instrument: instrument.into(),
            detector: detector.into(),
            measurement: measurement.into(),
        }
    }

    pub fn profile(&self) -> InstrumentProfile {
        InstrumentProfile::lookup(self)
    }

    /// Name drawn in the watermark for layers of this source.
    pub fn watermark_label(&self) -> String {
        let det = strip_leading_zeros(&self.detector);
        let meas = strip_leading_zeros(&self.measurement);
        match self.profile().kind {
            InstrumentKind::Eit => format!("EIT {meas}"),
            InstrumentKind::Aia => format!("AIA {meas}"),
            InstrumentKind::Swap => format!("SWAP {meas}"),
            InstrumentKind::Hmi | InstrumentKind::Mdi => format!("{det} {meas}"),
            InstrumentKind::LascoC2 | InstrumentKind::LascoC3 => format!("LASCO {det}"),
            InstrumentKind::Cor1 | InstrumentKind::Cor2 => format!("SECCHI {det}"),
            InstrumentKind::Generic => {
                if self.instrument.eq_ignore_ascii_case(&self.detector) {
                    format!("{det} {meas}")
                } else {
                    format!("{} {det} {meas}", self.instrument)
                }
            }
        }
    }
}

impl fmt::Display for InstrumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.observatory, self.instrument, self.detector, self.measurement
        )
    }
}

fn strip_leading_zeros(s: &str) -> &str {
    let t = s.trim_start_matches('0');
    if t.is_empty() { s } else { t }
}

/// Closed set of instrument behaviors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstrumentKind {
    Eit,
    Aia,
    Hmi,
    Mdi,
    Swap,
    LascoC2,
    LascoC3,
    Cor1,
    Cor2,
    Generic,
}

/// Per-instrument rendering behavior.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InstrumentProfile {
    pub kind: InstrumentKind,
    pub color_table: Option<Palette>,
    pub mask: Option<OcculterMask>,
    pub default_layering_order: LayeringOrder,
}

struct ProfileRow {
    instrument: &'static str,
    /// `None` matches any detector.
    detector: Option<&'static str>,
    kind: InstrumentKind,
    mask: Option<OcculterMask>,
    order: LayeringOrder,
}

const PROFILE_TABLE: &[ProfileRow] = &[
    ProfileRow {
        instrument: "EIT",
        detector: None,
        kind: InstrumentKind::Eit,
        mask: None,
        order: LayeringOrder::FIRST,
    },
    ProfileRow {
        instrument: "AIA",
        detector: None,
        kind: InstrumentKind::Aia,
        mask: None,
        order: LayeringOrder::FIRST,
    },
    ProfileRow {
        instrument: "HMI",
        detector: None,
        kind: InstrumentKind::Hmi,
        mask: None,
        order: LayeringOrder::FIRST,
    },
    ProfileRow {
        instrument: "MDI",
        detector: None,
        kind: InstrumentKind::Mdi,
        mask: None,
        order: LayeringOrder::FIRST,
    },
    ProfileRow {
        instrument: "SWAP",
        detector: None,
        kind: InstrumentKind::Swap,
        mask: None,
        order: LayeringOrder::FIRST,
    },
    ProfileRow {
        instrument: "LASCO",
        detector: Some("C2"),
        kind: InstrumentKind::LascoC2,
        mask: Some(OcculterMask::new(2.2, 6.0)),
        order: LayeringOrder::SECOND,
    },
    ProfileRow {
        instrument: "LASCO",
        detector: Some("C3"),
        kind: InstrumentKind::LascoC3,
        mask: Some(OcculterMask::new(3.7, 30.0)),
        order: LayeringOrder::THIRD,
    },
    ProfileRow {
        instrument: "SECCHI",
        detector: Some("COR1"),
        kind: InstrumentKind::Cor1,
        mask: Some(OcculterMask::new(1.4, 4.0)),
        order: LayeringOrder::SECOND,
    },
    ProfileRow {
        instrument: "SECCHI",
        detector: Some("COR2"),
        kind: InstrumentKind::Cor2,
        mask: Some(OcculterMask::new(2.5, 15.0)),
        order: LayeringOrder::THIRD,
    },
];

impl InstrumentProfile {
    pub const GENERIC: Self = Self {
        kind: InstrumentKind::Generic,
        color_table: None,
        mask: None,
        default_layering_order: LayeringOrder::FIRST,
    };

    /// Select the profile for `key` from the static instrument table.
    pub fn lookup(key: &InstrumentKey) -> Self {
        let row = PROFILE_TABLE.iter().find(|r| {
            r.instrument.eq_ignore_ascii_case(&key.instrument)
                && r.detector
                    .is_none_or(|d| d.eq_ignore_ascii_case(&key.detector))
        });
        match row {
            Some(r) => Self {
                kind: r.kind,
                color_table: Palette::for_source(r.kind, &key.measurement),
                mask: r.mask,
                default_layering_order: r.order,
            },
            None => Self::GENERIC,
        }
    }
}
