//! SPDX-License-Identifier: GPL-3.0-or-later
//!
//! Cryptographic verification backends (spec §4.6), dispatched by
//! [`crate::model::SignatureFormat`].

pub mod ed25519;
pub mod minisign;
pub mod pgp;

use std::path::Path;

use crate::error::{Result, VouchError};
use crate::model::SignatureFormat;

/// A located signature artifact plus whatever a given format needs to check
/// it: minisign and ed25519 verify in memory, PGP needs real paths on disk
/// because it shells out to `gpg`.
pub enum SignatureMaterial<'a> {
    Minisign {
        sig_text: &'a str,
        public_key_text: &'a str,
    },
    Ed25519 {
        signature_bytes: &'a [u8],
        public_key_hex: &'a str,
    },
    Pgp {
        sig_path: &'a Path,
        public_key_path: &'a Path,
    },
}

/// Verifies `content` (already read into memory for the in-memory formats)
/// against the given signature material.
pub fn verify(content: &[u8], format: SignatureFormat, material: &SignatureMaterial) -> Result<()> {
    match (format, material) {
        (SignatureFormat::Minisign, SignatureMaterial::Minisign { sig_text, public_key_text }) => {
            minisign::verify_minisign(content, sig_text, public_key_text)
        }
        (SignatureFormat::BinaryEd25519, SignatureMaterial::Ed25519 { signature_bytes, public_key_hex }) => {
            ed25519::verify_ed25519(content, signature_bytes, public_key_hex)
        }
        (SignatureFormat::Pgp, SignatureMaterial::Pgp { sig_path, public_key_path }) => {
            let tmp = tempfile::NamedTempFile::new()?;
            std::fs::write(tmp.path(), content)?;
            pgp::verify_pgp(tmp.path(), sig_path, public_key_path)
        }
        _ => Err(VouchError::UnsupportedSignatureFormat),
    }
}
