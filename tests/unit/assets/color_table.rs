use super::*;

#[test]
fn builtin_tables_start_black_and_end_white() {
    for p in [
        Palette::RedTemperature,
        Palette::BlueWhite,
        Palette::GreenWhite,
        Palette::Tint {
            name: "t",
            rgb: [240, 90, 30],
        },
    ] {
        let t = p.builtin();
        assert_eq!(t.lookup(0), [0, 0, 0], "{}", p.name());
        assert_eq!(t.lookup(255), [255, 255, 255], "{}", p.name());
    }
}

#[test]
fn tables_are_monotonic_per_channel() {
    for p in [
        Palette::RedTemperature,
        Palette::BlueWhite,
        Palette::GreenWhite,
    ] {
        let t = p.builtin();
        for i in 1..=255u8 {
            let (a, b) = (t.lookup(i - 1), t.lookup(i));
            for c in 0..3 {
                assert!(b[c] >= a[c], "{} channel {c} at {i}", p.name());
            }
        }
    }
}

#[test]
fn tint_passes_through_its_color_at_midpoint() {
    let t = Palette::Tint {
        name: "t",
        rgb: [240, 90, 30],
    }
    .builtin();
    assert_eq!(t.lookup(127), [240, 90, 30]);
}

#[test]
fn red_temperature_is_red_dominant() {
    let t = Palette::RedTemperature.builtin();
    let [r, g, b] = t.lookup(128);
    assert!(r > g && g > b);
}

#[test]
fn palettes_by_source() {
    assert_eq!(
        Palette::for_source(InstrumentKind::Eit, "304").map(|p| p.name()),
        Some("eit-304")
    );
    assert_eq!(
        Palette::for_source(InstrumentKind::Swap, "0174").map(|p| p.name()),
        Some("swap-174")
    );
    assert_eq!(Palette::for_source(InstrumentKind::Aia, "171"), None);
    assert_eq!(Palette::for_source(InstrumentKind::Eit, "999"), None);
}

#[test]
fn override_png_replaces_builtin() {
    let dir = tempfile::tempdir().unwrap();
    let mut img = image::RgbImage::new(1, 256);
    for y in 0..256u32 {
        img.put_pixel(0, y, image::Rgb([255 - y as u8, y as u8, 7]));
    }
    img.save(dir.path().join("idl-blue-white.png")).unwrap();

    let t = ColorTable::resolve(Palette::BlueWhite, Some(dir.path())).unwrap();
    assert_eq!(t.lookup(0), [255, 0, 7]);
    assert_eq!(t.lookup(200), [55, 200, 7]);

    // Other palettes keep their built-in tables.
    let t = ColorTable::resolve(Palette::GreenWhite, Some(dir.path())).unwrap();
    assert_eq!(t, Palette::GreenWhite.builtin());
}

#[test]
fn short_override_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    image::RgbImage::new(1, 16)
        .save(dir.path().join("green-white-linear.png"))
        .unwrap();
    assert!(ColorTable::resolve(Palette::GreenWhite, Some(dir.path())).is_err());
}
