//! Built-in watermark artwork.

/// Native width of both logo variants; scaling decisions are made relative to it.
pub const LOGO_BASE_WIDTH: u32 = 300;

/// Which logo variant to draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogoVariant {
    /// Sun emblem followed by the site URL.
    Full,
    /// Sun emblem only.
    Circle,
}

impl LogoVariant {
    pub fn svg(self) -> &'static str {
        match self {
            LogoVariant::Full => FULL_LOGO_SVG,
            LogoVariant::Circle => CIRCLE_LOGO_SVG,
        }
    }

    /// Native pixel size before any scaling.
    pub fn native_size(self) -> (u32, u32) {
        match self {
            LogoVariant::Full => (LOGO_BASE_WIDTH, 48),
            LogoVariant::Circle => (LOGO_BASE_WIDTH, LOGO_BASE_WIDTH),
        }
    }
}

const FULL_LOGO_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="300" height="48" viewBox="0 0 300 48">
  <circle cx="24" cy="24" r="20" fill="none" stroke="#ffffff" stroke-width="4"/>
  <circle cx="24" cy="24" r="11" fill="#ffffff"/>
  <text x="56" y="32" font-family="sans-serif" font-size="22" font-weight="bold" fill="#ffffff" stroke="#000000" stroke-opacity="0.8" stroke-width="1">helioviewer.org</text>
</svg>"##;

const CIRCLE_LOGO_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="300" height="300" viewBox="0 0 300 300">
  <circle cx="150" cy="150" r="130" fill="none" stroke="#ffffff" stroke-width="24"/>
  <circle cx="150" cy="150" r="72" fill="#ffffff"/>
</svg>"##;
