//! Per-instrument color lookup tables.
//!
//! Built-in palettes are generated procedurally. A deployment can override any of them with a
//! `<name>.png` file in the configured color table directory; column 0 of rows `0..256` supplies
//! the 256 entries.

use std::path::Path;

use anyhow::Context as _;

use crate::{
    foundation::error::ComposeResult,
    model::instrument::InstrumentKind,
};

/// Identity of a color table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Palette {
    /// IDL table 3: black through red and orange to white.
    RedTemperature,
    /// IDL table 1: black through blue to white.
    BlueWhite,
    /// Linear black to green, then green to white.
    GreenWhite,
    /// Black to `rgb` over the lower half, `rgb` to white over the upper half.
    Tint { name: &'static str, rgb: [u8; 3] },
}

impl Palette {
    /// Palette for a source, or `None` for instruments delivered in grayscale.
    pub fn for_source(kind: InstrumentKind, measurement: &str) -> Option<Self> {
        let meas = measurement.trim_start_matches('0');
        match kind {
            InstrumentKind::LascoC2 | InstrumentKind::Cor2 => Some(Palette::RedTemperature),
            InstrumentKind::LascoC3 => Some(Palette::BlueWhite),
            InstrumentKind::Cor1 => Some(Palette::GreenWhite),
            InstrumentKind::Eit => match meas {
                "171" => Some(Palette::Tint {
                    name: "eit-171",
                    rgb: [60, 130, 230],
                }),
                "195" => Some(Palette::Tint {
                    name: "eit-195",
                    rgb: [70, 200, 90],
                }),
                "284" => Some(Palette::Tint {
                    name: "eit-284",
                    rgb: [230, 200, 40],
                }),
                "304" => Some(Palette::Tint {
                    name: "eit-304",
                    rgb: [240, 90, 30],
                }),
                _ => None,
            },
            InstrumentKind::Swap => match meas {
                "174" => Some(Palette::Tint {
                    name: "swap-174",
                    rgb: [230, 170, 60],
                }),
                _ => None,
            },
            InstrumentKind::Aia
            | InstrumentKind::Hmi
            | InstrumentKind::Mdi
            | InstrumentKind::Generic => None,
        }
    }

    /// Stable name, also the file stem of an override table.
    pub fn name(&self) -> &'static str {
        match self {
            Palette::RedTemperature => "idl-red-temperature",
            Palette::BlueWhite => "idl-blue-white",
            Palette::GreenWhite => "green-white-linear",
            Palette::Tint { name, .. } => *name,
        }
    }

    pub fn builtin(&self) -> ColorTable {
        let mut entries = [[0u8; 3]; 256];
        for (i, e) in entries.iter_mut().enumerate() {
            let v = i as f64;
            *e = match self {
                Palette::RedTemperature => [
                    ramp(v, 0.0, 176.0),
                    ramp(v, 120.0, 255.0),
                    ramp(v, 190.0, 255.0),
                ],
                Palette::BlueWhite => [
                    ramp(v, 128.0, 255.0),
                    ramp(v, 64.0, 255.0),
                    ramp(v, 0.0, 160.0),
                ],
                Palette::GreenWhite => [
                    ramp(v, 128.0, 255.0),
                    ramp(v, 0.0, 255.0),
                    ramp(v, 128.0, 255.0),
                ],
                Palette::Tint { rgb, .. } => rgb.map(|c| tint_channel(i as u8, c)),
            };
        }
        ColorTable { entries }
    }
}

/// Linear 0..=255 ramp between `lo` and `hi`, clamped on both ends.
fn ramp(v: f64, lo: f64, hi: f64) -> u8 {
    (((v - lo) / (hi - lo)).clamp(0.0, 1.0) * 255.0).round() as u8
}

fn tint_channel(i: u8, c: u8) -> u8 {
    let (i, c) = (u32::from(i), u32::from(c));
    let v = if i < 128 {
        (i * c + 63) / 127
    } else {
        c + ((255 - c) * (i - 127) + 64) / 128
    };
    v.min(255) as u8
}

/// Resolved 256-entry RGB lookup table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorTable {
    entries: [[u8; 3]; 256],
}

impl ColorTable {
    /// Override table from `dir` when present, else the built-in table.
    pub fn resolve(palette: Palette, dir: Option<&Path>) -> ComposeResult<Self> {
        if let Some(dir) = dir {
            let path = dir.join(format!("{}.png", palette.name()));
            if path.is_file() {
                tracing::debug!(
                    palette = palette.name(),
                    path = %path.display(),
                    "color table override"
                );
                return Self::from_png(&path);
            }
        }
        Ok(palette.builtin())
    }

    pub fn from_png(path: &Path) -> ComposeResult<Self> {
        let img = image::open(path)
            .with_context(|| format!("read color table '{}'", path.display()))?
            .to_rgb8();
        if img.height() < 256 {
            return Err(anyhow::anyhow!(
                "color table '{}' must have at least 256 rows (got {})",
                path.display(),
                img.height()
            )
            .into());
        }
        let mut entries = [[0u8; 3]; 256];
        for (row, e) in entries.iter_mut().enumerate() {
            *e = img.get_pixel(0, row as u32).0;
        }
        Ok(Self { entries })
    }

    pub fn lookup(&self, v: u8) -> [u8; 3] {
        self.entries[usize::from(v)]
    }

    pub fn entries(&self) -> &[[u8; 3]; 256] {
        &self.entries
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/color_table.rs"]
mod tests;
