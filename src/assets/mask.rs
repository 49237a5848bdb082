use image::RgbaImage;

/// Solar radius in arcseconds.
pub const RSUN_ARCSEC: f64 = 959.705;

/// Annular occulter mask for coronagraph layers, in solar radii from sun center.
///
/// Pixels nearer than `inner` (the occulting disk) or farther than `outer` (the field stop) are
/// made fully transparent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OcculterMask {
    pub inner: f64,
    pub outer: f64,
}

/// Placement of a decoded raster on its layer's native pixel grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaskFrame {
    /// Native pixel of the decoded raster's top-left corner.
    pub origin_x: f64,
    pub origin_y: f64,
    /// Native pixels per decoded pixel on each axis.
    pub step_x: f64,
    pub step_y: f64,
    /// Sun center in native pixels.
    pub center_x: f64,
    pub center_y: f64,
    /// Arcseconds per native pixel.
    pub native_scale: f64,
}

impl OcculterMask {
    pub const fn new(inner: f64, outer: f64) -> Self {
        Self { inner, outer }
    }

    pub fn contains(&self, radius_rsun: f64) -> bool {
        radius_rsun >= self.inner && radius_rsun <= self.outer
    }

    /// Clear alpha of every pixel outside the annulus.
    pub fn apply(&self, raster: &mut RgbaImage, frame: &MaskFrame) {
        let k = frame.native_scale / RSUN_ARCSEC;
        for (x, y, px) in raster.enumerate_pixels_mut() {
            let nx = frame.origin_x + (f64::from(x) + 0.5) * frame.step_x;
            let ny = frame.origin_y + (f64::from(y) + 0.5) * frame.step_y;
            let r = (nx - frame.center_x).hypot(ny - frame.center_y) * k;
            if !self.contains(r) {
                px.0 = [0, 0, 0, 0];
            }
        }
    }
}
