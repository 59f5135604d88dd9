//! SPDX-License-Identifier: GPL-3.0-or-later
//!
//! Content-addressed cache (spec §5): keyed by the source URL plus the
//! expected digest, or the URL plus size when no digest is known yet. A
//! cache hit is only ever returned after re-verifying the cached bytes, so
//! a corrupted or tampered cache entry can never silently win.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKeyAnchor {
    Digest(String),
    Size(u64),
}

pub struct Cache {
    root: PathBuf,
}

fn url_fingerprint(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

impl Cache {
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Cache { root: root.into() }
    }

    fn entry_dir(&self, url: &str, anchor: &CacheKeyAnchor) -> PathBuf {
        let anchor_part = match anchor {
            CacheKeyAnchor::Digest(d) => d.clone(),
            CacheKeyAnchor::Size(s) => s.to_string(),
        };
        self.root.join(format!("{}-{}", url_fingerprint(url), anchor_part))
    }

    fn bytes_path(dir: &Path) -> PathBuf {
        dir.join("bytes")
    }

    fn sidecar_path(dir: &Path) -> PathBuf {
        dir.join("verified-digest")
    }

    /// Returns cached bytes only if present *and* their sha256 still matches
    /// `expected_sha256` (re-verification on every read, per spec §5).
    pub fn get_reverified(&self, url: &str, anchor: &CacheKeyAnchor, expected_sha256: &str) -> Option<Vec<u8>> {
        let dir = self.entry_dir(url, anchor);
        let bytes = fs::read(Self::bytes_path(&dir)).ok()?;
        let recorded = fs::read_to_string(Self::sidecar_path(&dir)).ok()?;
        if recorded.trim() != expected_sha256 {
            return None;
        }

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let actual = hex::encode(hasher.finalize());
        if actual != expected_sha256.to_ascii_lowercase() {
            return None;
        }
        Some(bytes)
    }

    /// Populates the cache after a successful verification. Never called
    /// with unverified bytes.
    pub fn put(&self, url: &str, anchor: &CacheKeyAnchor, bytes: &[u8], verified_sha256: &str) -> Result<()> {
        let dir = self.entry_dir(url, anchor);
        fs::create_dir_all(&dir)?;
        fs::write(Self::bytes_path(&dir), bytes)?;
        fs::write(Self::sidecar_path(&dir), verified_sha256)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sha256_hex(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    #[test]
    fn put_then_get_reverified_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::at(dir.path());
        let bytes = b"release bytes";
        let digest = sha256_hex(bytes);
        let anchor = CacheKeyAnchor::Digest(digest.clone());

        cache.put("https://example.test/a", &anchor, bytes, &digest).unwrap();
        let got = cache.get_reverified("https://example.test/a", &anchor, &digest).unwrap();
        assert_eq!(got, bytes);
    }

    #[test]
    fn tampered_bytes_fail_reverification() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::at(dir.path());
        let bytes = b"release bytes";
        let digest = sha256_hex(bytes);
        let anchor = CacheKeyAnchor::Digest(digest.clone());
        cache.put("https://example.test/a", &anchor, bytes, &digest).unwrap();

        let entry_dir = cache.entry_dir("https://example.test/a", &anchor);
        fs::write(Cache::bytes_path(&entry_dir), b"tampered bytes").unwrap();

        assert!(cache
            .get_reverified("https://example.test/a", &anchor, &digest)
            .is_none());
    }

    #[test]
    fn miss_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::at(dir.path());
        let anchor = CacheKeyAnchor::Size(10);
        assert!(cache.get_reverified("https://example.test/a", &anchor, "deadbeef").is_none());
    }
}
