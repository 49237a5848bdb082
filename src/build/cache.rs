//! Deterministic cache keys and atomic cache writes.
//!
//! A cache path is a pure function of everything that affects its pixels, so existence of the
//! file is the cache hit test. Writers go through a temporary file in the destination directory
//! and rename into place, so readers never observe a partial file.

use std::{
    fmt,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use xxhash_rust::xxh3::Xxh3;

use crate::foundation::error::{ComposeError, ComposeResult};

const XXH3_SEED: u64 = 0x5f3c_11a9_d2e4_7b08;

/// 128-bit content fingerprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub hi: u64,
    pub lo: u64,
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

/// Order-sensitive hasher with fixed-width little-endian encodings.
pub struct StableHasher {
    inner: Xxh3,
}

impl Default for StableHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl StableHasher {
    pub fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    pub fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.write_bytes(&v.to_le_bytes());
    }

    /// `-0.0` hashes like `0.0`.
    pub fn write_f64(&mut self, v: f64) {
        let v = if v == 0.0 { 0.0 } else { v };
        self.write_u64(v.to_bits());
    }

    /// Length-prefixed, so adjacent strings cannot alias.
    pub fn write_str(&mut self, s: &str) {
        self.write_u32(s.len() as u32);
        self.write_bytes(s.as_bytes());
    }

    pub fn finish(self) -> Fingerprint {
        let v = self.inner.digest128();
        Fingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

/// File stem of a source URI, made safe for use as a path segment.
pub fn source_stem(uri: &str) -> String {
    let name = uri.rsplit(['/', '\\']).next().unwrap_or(uri);
    let stem = match name.rfind('.') {
        Some(i) if i > 0 => &name[..i],
        _ => name,
    };
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "source".to_string()
    } else {
        cleaned
    }
}

/// Create `dir` and its parents; existing directories are fine.
pub fn ensure_dir(dir: &Path) -> ComposeResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| ComposeError::cache_write(dir, e))
}

/// Outcome of writing through [`write_atomic`].
#[derive(Debug)]
pub enum WriteError<E> {
    /// The producer failed; nothing was written.
    Produce(E),
    /// The filesystem failed.
    Io(ComposeError),
}

/// Write `path` by streaming `produce` into a sibling temporary file, then renaming it into
/// place. On any failure the temporary file is removed and `path` is left untouched.
pub fn write_atomic<E>(
    path: &Path,
    produce: impl FnOnce(&mut dyn Write) -> Result<(), E>,
) -> Result<(), WriteError<E>> {
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    ensure_dir(&dir).map_err(WriteError::Io)?;

    let tmp = tempfile::Builder::new()
        .prefix(".partial-")
        .tempfile_in(&dir)
        .map_err(|e| WriteError::Io(ComposeError::cache_write(&dir, e)))?;

    {
        let mut w = BufWriter::new(tmp.as_file());
        produce(&mut w).map_err(WriteError::Produce)?;
        w.flush()
            .map_err(|e| WriteError::Io(ComposeError::cache_write(tmp.path(), e)))?;
    }

    tmp.persist(path)
        .map_err(|e| WriteError::Io(ComposeError::cache_write(path, e.error)))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/build/cache.rs"]
mod tests;
