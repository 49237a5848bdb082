//! Per-pixel blend arithmetic on RGBA8 buffers.
//!
//! Rasters are stored with straight alpha; blending converts to premultiplied form, applies
//! source-over, and converts back.

pub type PremulRgba8 = [u8; 4];

/// `src` drawn over `dst`, both premultiplied.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    if src[3] == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255(u16::from(dst[i]), inv));
    }
    out
}

pub fn premultiply(px: [u8; 4]) -> PremulRgba8 {
    let a = u16::from(px[3]);
    [
        mul_div255(u16::from(px[0]), a),
        mul_div255(u16::from(px[1]), a),
        mul_div255(u16::from(px[2]), a),
        px[3],
    ]
}

pub fn unpremultiply(px: PremulRgba8) -> [u8; 4] {
    let a = u16::from(px[3]);
    if a == 0 {
        return [0, 0, 0, 0];
    }
    if a == 255 {
        return px;
    }
    let un = |c: u8| ((u16::from(c) * 255 + a / 2) / a).min(255) as u8;
    [un(px[0]), un(px[1]), un(px[2]), px[3]]
}

/// Straight-alpha dst-over: `dst` stays in front, `src` fills in behind it.
pub fn dst_over_in_place(dst: &mut [u8], src: &[u8]) -> Result<(), &'static str> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err("dst_over_in_place expects equal-length rgba8 buffers");
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let front = [d[0], d[1], d[2], d[3]];
        if front[3] == 255 {
            continue;
        }
        let back = premultiply([s[0], s[1], s[2], s[3]]);
        let out = unpremultiply(over(back, premultiply(front)));
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Scale alpha by `opacity` percent.
pub fn scale_alpha_in_place(rgba: &mut [u8], opacity: u8) {
    let op = u16::from(opacity.min(100));
    for px in rgba.chunks_exact_mut(4) {
        px[3] = ((u16::from(px[3]) * op + 50) / 100) as u8;
    }
}

/// Composite over an opaque background color, dropping alpha.
pub fn flatten_pixel(px: [u8; 4], bg: [u8; 3]) -> [u8; 3] {
    let a = u16::from(px[3]);
    let inv = 255 - a;
    let mix = |c: u8, b: u8| {
        mul_div255(u16::from(c), a).saturating_add(mul_div255(u16::from(b), inv))
    };
    [mix(px[0], bg[0]), mix(px[1], bg[1]), mix(px[2], bg[2])]
}

/// Reduce each channel to `bits` of precision, re-expanded to the 0..=255 range.
pub fn quantize_in_place(channels: &mut [u8], bits: u8) {
    if bits >= 8 {
        return;
    }
    let levels = (1u32 << bits.max(1)) - 1;
    for c in channels {
        let q = (u32::from(*c) * levels + 127) / 255;
        *c = ((q * 255 + levels / 2) / levels) as u8;
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/toolkit/blend.rs"]
mod tests;
