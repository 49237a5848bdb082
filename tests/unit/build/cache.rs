use super::*;

#[test]
fn hasher_is_deterministic_and_order_sensitive() {
    let fp = |a: &str, b: &str| {
        let mut h = StableHasher::new();
        h.write_str(a);
        h.write_str(b);
        h.finish()
    };
    assert_eq!(fp("a", "b"), fp("a", "b"));
    assert_ne!(fp("a", "b"), fp("b", "a"));
    // Length prefixes keep "ab"+"" apart from "a"+"b".
    assert_ne!(fp("ab", ""), fp("a", "b"));
}

#[test]
fn negative_zero_hashes_like_zero() {
    let fp = |v: f64| {
        let mut h = StableHasher::new();
        h.write_f64(v);
        h.finish()
    };
    assert_eq!(fp(0.0), fp(-0.0));
    assert_ne!(fp(0.0), fp(1.0));
}

#[test]
fn fingerprint_displays_as_32_hex_digits() {
    let s = Fingerprint { hi: 1, lo: 0xabc }.to_string();
    assert_eq!(s.len(), 32);
    assert_eq!(s, "00000000000000010000000000000abc");
}

#[test]
fn source_stem_strips_directories_and_extension() {
    assert_eq!(source_stem("2003/10/28/eit_304.jp2"), "eit_304");
    assert_eq!(source_stem("C:\\data\\c2 frame.png"), "c2_frame");
    assert_eq!(source_stem("noext"), "noext");
    assert_eq!(source_stem(".hidden"), ".hidden");
    assert_eq!(source_stem("dir/"), "source");
}

#[test]
fn write_atomic_persists_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a/b/out.bin");
    write_atomic::<std::io::Error>(&path, |w| w.write_all(b"hello")).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"hello");

    // No temporary files are left behind.
    let names: Vec<_> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names.len(), 1);
}

#[test]
fn write_atomic_cleans_up_on_producer_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.bin");
    let res = write_atomic(&path, |w| {
        w.write_all(b"partial").map_err(|_| "io")?;
        Err("encoder exploded")
    });
    assert!(matches!(res, Err(WriteError::Produce("encoder exploded"))));
    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn ensure_dir_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("x/y");
    ensure_dir(&p).unwrap();
    ensure_dir(&p).unwrap();
    assert!(p.is_dir());
}

#[test]
fn ensure_dir_reports_path_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("file");
    std::fs::write(&file, b"x").unwrap();
    let err = ensure_dir(&file.join("sub")).unwrap_err();
    assert!(matches!(err, ComposeError::CacheWriteFailure { .. }));
    assert!(err.to_string().contains("sub"));
}
