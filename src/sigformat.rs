//! SPDX-License-Identifier: GPL-3.0-or-later
//!
//! Signature format classifier (spec §4.5). Filename gives a first guess;
//! content sniffing is authoritative when the two disagree.

use crate::config::SignatureFormatSuffixes;
use crate::error::{Result, VouchError};
use crate::model::SignatureFormat;

/// Filename-only classification. Returns `None` when nothing matches.
pub fn classify_by_name(name: &str, formats: &SignatureFormatSuffixes) -> Option<SignatureFormat> {
    let lower = name.to_ascii_lowercase();

    if formats.minisign.iter().any(|s| lower.ends_with(&s.to_ascii_lowercase())) {
        return Some(SignatureFormat::Minisign);
    }
    if formats.pgp.iter().any(|s| lower.ends_with(&s.to_ascii_lowercase())) {
        return Some(SignatureFormat::Pgp);
    }
    if formats.ed25519.iter().any(|s| lower.ends_with(&s.to_ascii_lowercase())) {
        return Some(SignatureFormat::BinaryEd25519);
    }

    if let Some(base) = lower.strip_suffix(".sig") {
        if base.contains("sums") || base.contains("checksums") {
            return Some(SignatureFormat::Pgp);
        }
        return Some(SignatureFormat::BinaryEd25519);
    }

    None
}

/// Content-based classification, authoritative over the filename guess.
pub fn classify_by_content(bytes: &[u8]) -> Result<SignatureFormat> {
    let text_prefix = String::from_utf8_lossy(&bytes[..bytes.len().min(64)]);
    if text_prefix
        .trim_start()
        .starts_with("-----BEGIN PGP SIGNATURE-----")
    {
        return Ok(SignatureFormat::Pgp);
    }
    if text_prefix.starts_with("untrusted comment:") {
        return Ok(SignatureFormat::Minisign);
    }
    if bytes.len() == 64 {
        return Ok(SignatureFormat::BinaryEd25519);
    }

    let trimmed = std::str::from_utf8(bytes).ok().map(str::trim);
    if let Some(hex) = trimmed {
        if hex.len() == 128 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Ok(SignatureFormat::BinaryEd25519);
        }
    }

    Err(VouchError::UnsupportedSignatureFormat)
}

/// Classifies a signature, letting content override a filename guess when
/// they disagree. Falls back to the filename guess if content sniffing is
/// inconclusive but the filename produced a guess.
pub fn classify(name: &str, bytes: &[u8], formats: &SignatureFormatSuffixes) -> Result<SignatureFormat> {
    let by_name = classify_by_name(name, formats);
    match classify_by_content(bytes) {
        Ok(by_content) => Ok(by_content),
        Err(e) => by_name.ok_or(e),
    }
}
