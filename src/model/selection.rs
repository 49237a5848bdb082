//! Parsing of bracketed layer selection strings.
//!
//! A selection looks like `[SOHO,EIT,EIT,304,1,100],[SOHO,LASCO,C2,white-light,1,60]`: one
//! bracket group per layer holding observatory, instrument, detector, measurement, a visibility
//! flag and an opacity. Hidden or fully transparent layers are dropped.

use chrono::{DateTime, Utc};

use crate::{
    foundation::error::{ComposeError, ComposeResult},
    model::{instrument::InstrumentKey, request::LayerRequest},
};

/// Parse `selection` into layer requests, all at `timestamp`.
pub fn parse_layer_selection(
    selection: &str,
    timestamp: DateTime<Utc>,
) -> ComposeResult<Vec<LayerRequest>> {
    let mut out = Vec::new();
    for group in split_groups(selection)? {
        let fields: Vec<&str> = group.split(',').map(str::trim).collect();
        let [obs, inst, det, meas, visible, opacity] = fields.as_slice() else {
            return Err(ComposeError::invalid(format!(
                "layer '[{group}]' must have 6 fields (observatory,instrument,detector,measurement,visible,opacity)"
            )));
        };
        if [obs, inst, det, meas].iter().any(|f| f.is_empty()) {
            return Err(ComposeError::invalid(format!(
                "layer '[{group}]' has an empty identifier"
            )));
        }

        let visible = parse_flag(visible, group)?;
        let opacity: u8 = opacity.parse().map_err(|_| {
            ComposeError::invalid(format!("layer '[{group}]' has an invalid opacity"))
        })?;
        if opacity > 100 {
            return Err(ComposeError::invalid(format!(
                "layer '[{group}]' opacity must be in 0..=100"
            )));
        }
        if !visible || opacity == 0 {
            continue;
        }

        out.push(
            LayerRequest::new(InstrumentKey::new(*obs, *inst, *det, *meas), timestamp)
                .with_opacity(opacity),
        );
    }

    if out.is_empty() {
        return Err(ComposeError::invalid("no valid and visible layers"));
    }
    Ok(out)
}

fn split_groups(selection: &str) -> ComposeResult<Vec<&str>> {
    let mut groups = Vec::new();
    let mut rest = selection.trim();
    while !rest.is_empty() {
        let Some(body) = rest.strip_prefix('[') else {
            return Err(ComposeError::invalid(format!(
                "malformed layer selection near '{rest}'"
            )));
        };
        let Some(end) = body.find(']') else {
            return Err(ComposeError::invalid("unterminated layer group"));
        };
        groups.push(&body[..end]);
        rest = body[end + 1..].trim_start();
        rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
    }
    Ok(groups)
}

fn parse_flag(v: &str, group: &str) -> ComposeResult<bool> {
    match v {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(ComposeError::invalid(format!(
            "layer '[{group}]' has an invalid visibility flag"
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/selection.rs"]
mod tests;
