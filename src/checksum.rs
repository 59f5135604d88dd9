//! SPDX-License-Identifier: GPL-3.0-or-later
//!
//! Checksum manifest parser (spec §4.4): bare-digest, BSD (`DIGEST *FILE`)
//! and GNU (`DIGEST  FILE`) styles, tolerant of CRLF, comments and blank
//! lines.

use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use crate::error::{Result, VouchError};
use crate::model::HashAlgo;

/// The specific algorithm a manifest digest turned out to be, as opposed to
/// [`HashAlgo`] which is only the two modern algorithms an operator can
/// select. A legacy manifest entry still needs its own digest computed
/// against the asset bytes to be worth anything (spec §4.8's penalty is
/// only reachable if the comparison itself is real, not just length-shaped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgo {
    Sha256,
    Sha512,
    Sha1,
    Md5,
}

impl DigestAlgo {
    pub fn class(self) -> AlgoClass {
        match self {
            DigestAlgo::Sha256 | DigestAlgo::Sha512 => AlgoClass::Modern,
            DigestAlgo::Sha1 | DigestAlgo::Md5 => AlgoClass::Legacy,
        }
    }
}

/// Computes `bytes`'s digest under `algo`, lower-case hex encoded.
pub fn compute_digest(bytes: &[u8], algo: DigestAlgo) -> String {
    match algo {
        DigestAlgo::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(bytes);
            hex::encode(hasher.finalize())
        }
        DigestAlgo::Sha512 => {
            let mut hasher = Sha512::new();
            hasher.update(bytes);
            hex::encode(hasher.finalize())
        }
        DigestAlgo::Sha1 => {
            let mut hasher = Sha1::new();
            hasher.update(bytes);
            hex::encode(hasher.finalize())
        }
        DigestAlgo::Md5 => {
            let mut hasher = md5::Md5::new();
            hasher.update(bytes);
            hex::encode(hasher.finalize())
        }
    }
}

fn is_hex_of_len(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Strips a leading `*` used by BSD-style manifests to mark binary mode;
/// preserved intentionally per spec §9's "asterisk-filename quirk" note.
fn strip_leading_asterisk(field: &str) -> &str {
    field.strip_prefix('*').unwrap_or(field)
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Any hex length accepted for legacy-algorithm detection in the trust
/// scorer's sha1/md5 penalty (spec §4.8); sha256/sha512 remain the only
/// algorithms selectable via `RepoConfig.hash_algo`.
pub fn legacy_hex_len(s: &str) -> Option<&'static str> {
    match s.len() {
        40 if s.bytes().all(|b| b.is_ascii_hexdigit()) => Some("sha1"),
        32 if s.bytes().all(|b| b.is_ascii_hexdigit()) => Some("md5"),
        _ => None,
    }
}

fn scan_for_digest(trimmed: &str, expected_len: usize, asset_name: &str) -> Option<String> {
    if is_hex_of_len(trimmed, expected_len) {
        return Some(trimmed.to_ascii_lowercase());
    }

    for raw_line in trimmed.lines() {
        let line = raw_line.trim_end_matches('\r').trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let rest: Vec<&str> = line.split_whitespace().collect();
        if rest.len() < 2 {
            continue;
        }
        let digest_field = rest[0];
        if !is_hex_of_len(digest_field, expected_len) {
            continue;
        }
        let file_field = strip_leading_asterisk(rest[rest.len() - 1]);
        if basename(file_field) == asset_name {
            return Some(digest_field.to_ascii_lowercase());
        }
    }

    None
}

/// Extracts the digest for `asset_name` from a checksum manifest's bytes.
pub fn extract_checksum(bytes: &[u8], algo: HashAlgo, asset_name: &str) -> Result<String> {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(VouchError::EmptyChecksumFile);
    }

    scan_for_digest(trimmed, algo.hex_len(), asset_name)
        .ok_or_else(|| VouchError::ChecksumNotFound(asset_name.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgoClass {
    Modern,
    Legacy,
}

/// Extracts a digest the same way [`extract_checksum`] does, but falls back
/// to the legacy sha1 (40 hex) / md5 (32 hex) lengths when the configured
/// algorithm's length isn't found, so the trust scorer's legacy-algorithm
/// penalty (spec §4.8) is reachable even though `RepoConfig.hash_algo` only
/// ever selects sha256/sha512. The returned [`DigestAlgo`] tells the caller
/// which algorithm to hash the asset's own bytes with for the comparison.
pub fn extract_checksum_classified(bytes: &[u8], algo: HashAlgo, asset_name: &str) -> Result<(String, DigestAlgo)> {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(VouchError::EmptyChecksumFile);
    }

    if let Some(digest) = scan_for_digest(trimmed, algo.hex_len(), asset_name) {
        let digest_algo = match algo {
            HashAlgo::Sha256 => DigestAlgo::Sha256,
            HashAlgo::Sha512 => DigestAlgo::Sha512,
        };
        return Ok((digest, digest_algo));
    }

    for (legacy_len, digest_algo) in [(40usize, DigestAlgo::Sha1), (32usize, DigestAlgo::Md5)] {
        if let Some(digest) = scan_for_digest(trimmed, legacy_len, asset_name) {
            return Ok((digest, digest_algo));
        }
    }

    Err(VouchError::ChecksumNotFound(asset_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn bare_digest_form() {
        let got = extract_checksum(DIGEST.as_bytes(), HashAlgo::Sha256, "anything").unwrap();
        assert_eq!(got, DIGEST);
    }

    #[test]
    fn gnu_style_two_space() {
        let manifest = format!("{DIGEST}  tool_linux_amd64.tar.gz\n");
        let got = extract_checksum(manifest.as_bytes(), HashAlgo::Sha256, "tool_linux_amd64.tar.gz").unwrap();
        assert_eq!(got, DIGEST);
    }

    #[test]
    fn bsd_style_asterisk() {
        let manifest = format!("{DIGEST} *tool_linux_amd64.tar.gz\n");
        let got = extract_checksum(manifest.as_bytes(), HashAlgo::Sha256, "tool_linux_amd64.tar.gz").unwrap();
        assert_eq!(got, DIGEST);
    }

    #[test]
    fn tolerates_comments_blank_lines_and_crlf() {
        let manifest = format!("# comment\r\n\r\n{DIGEST}  tool.tar.gz\r\n");
        let got = extract_checksum(manifest.as_bytes(), HashAlgo::Sha256, "tool.tar.gz").unwrap();
        assert_eq!(got, DIGEST);
    }

    #[test]
    fn applies_basename_to_file_field() {
        let manifest = format!("{DIGEST}  dist/tool.tar.gz\n");
        let got = extract_checksum(manifest.as_bytes(), HashAlgo::Sha256, "tool.tar.gz").unwrap();
        assert_eq!(got, DIGEST);
    }

    #[test]
    fn rejects_wrong_length_hex() {
        let too_short = &DIGEST[..63];
        let manifest = format!("{too_short}  tool.tar.gz\n");
        let err = extract_checksum(manifest.as_bytes(), HashAlgo::Sha256, "tool.tar.gz").unwrap_err();
        assert!(matches!(err, VouchError::ChecksumNotFound(_)));
    }

    #[test]
    fn empty_file_is_an_error() {
        let err = extract_checksum(b"   \n  ", HashAlgo::Sha256, "tool.tar.gz").unwrap_err();
        assert!(matches!(err, VouchError::EmptyChecksumFile));
    }

    #[test]
    fn missing_entry_is_an_error() {
        let manifest = format!("{DIGEST}  other.tar.gz\n");
        let err = extract_checksum(manifest.as_bytes(), HashAlgo::Sha256, "tool.tar.gz").unwrap_err();
        assert!(matches!(err, VouchError::ChecksumNotFound(_)));
    }

    #[test]
    fn classified_extraction_reports_the_configured_algo_when_present() {
        let manifest = format!("{DIGEST}  tool.tar.gz\n");
        let (digest, algo) = extract_checksum_classified(manifest.as_bytes(), HashAlgo::Sha256, "tool.tar.gz").unwrap();
        assert_eq!(digest, DIGEST);
        assert_eq!(algo, DigestAlgo::Sha256);
        assert_eq!(algo.class(), AlgoClass::Modern);
    }

    #[test]
    fn classified_extraction_falls_back_to_legacy_lengths() {
        let sha1_digest = "da39a3ee5e6b4b0d3255bfef95601890afd80709";
        let manifest = format!("{sha1_digest}  tool.tar.gz\n");
        let (digest, algo) = extract_checksum_classified(manifest.as_bytes(), HashAlgo::Sha512, "tool.tar.gz").unwrap();
        assert_eq!(digest, sha1_digest);
        assert_eq!(algo, DigestAlgo::Sha1);
        assert_eq!(algo.class(), AlgoClass::Legacy);
    }

    #[test]
    fn compute_digest_matches_known_vectors() {
        assert_eq!(compute_digest(b"", DigestAlgo::Sha256), "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
        assert_eq!(compute_digest(b"", DigestAlgo::Sha1), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
        assert_eq!(compute_digest(b"", DigestAlgo::Md5), "d41d8cd98f00b204e9800998ecf8427e");
    }
}
