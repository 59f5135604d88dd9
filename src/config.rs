//! SPDX-License-Identifier: GPL-3.0-or-later
//!
//! `RepoConfig` resolution: built-in defaults merged once per invocation with
//! a per-repository override (spec §3's "Merging rule"). Per-file templates
//! run before generic scoring heuristics; that ordering lives in `selector.rs`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetType {
    Archive,
    Raw,
    Package,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    TarXz,
    TarBz2,
    Tar,
    Zip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureFormatSuffixes {
    pub minisign: Vec<String>,
    pub pgp: Vec<String>,
    pub ed25519: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoConfig {
    pub binary_name: String,
    pub hash_algo: crate::model::HashAlgo,
    pub asset_type: AssetType,
    pub archive_format: ArchiveFormat,
    pub archive_extensions: Vec<String>,
    pub asset_patterns: Vec<String>,
    pub checksum_candidates: Vec<String>,
    pub checksum_sig_candidates: Vec<String>,
    pub signature_candidates: Vec<String>,
    pub signature_formats: SignatureFormatSuffixes,
    pub prefer_checksum_sig: bool,
    /// Trust anchor for raw ed25519 signatures (spec §4.6.2): unlike the
    /// minisign/PGP keys, this format has no self-describing key file to
    /// discover among release assets, so it is pinned per repository.
    pub ed25519_public_key_hex: Option<String>,
}

/// A sparse, per-repository override. Every field inherits from
/// [`RepoConfig::defaults`] when left `None`.
#[derive(Debug, Clone, Default)]
pub struct RepoConfigOverride {
    pub binary_name: Option<String>,
    pub hash_algo: Option<crate::model::HashAlgo>,
    pub asset_type: Option<AssetType>,
    pub archive_format: Option<ArchiveFormat>,
    pub archive_extensions: Option<Vec<String>>,
    pub asset_patterns: Option<Vec<String>>,
    pub checksum_candidates: Option<Vec<String>>,
    pub checksum_sig_candidates: Option<Vec<String>>,
    pub signature_candidates: Option<Vec<String>>,
    pub signature_formats: Option<SignatureFormatSuffixes>,
    /// Tri-state: `None` means unset (defaults to `true`).
    pub prefer_checksum_sig: Option<bool>,
    pub ed25519_public_key_hex: Option<String>,
}

impl RepoConfig {
    pub fn defaults(binary_name: &str) -> Self {
        RepoConfig {
            binary_name: binary_name.to_string(),
            hash_algo: crate::model::HashAlgo::Sha256,
            asset_type: AssetType::Archive,
            archive_format: ArchiveFormat::TarGz,
            archive_extensions: vec![
                ".tar.gz".to_string(),
                ".tar.xz".to_string(),
                ".tar.bz2".to_string(),
                ".tgz".to_string(),
                ".tar".to_string(),
                ".zip".to_string(),
            ],
            asset_patterns: Vec::new(),
            checksum_candidates: vec![
                "{{binary}}_checksums.txt".to_string(),
                "checksums.txt".to_string(),
                "SHA256SUMS".to_string(),
                "SHA512SUMS".to_string(),
            ],
            checksum_sig_candidates: vec![
                "checksums.txt.sig".to_string(),
                "checksums.txt.asc".to_string(),
                "checksums.txt.minisig".to_string(),
                "SHA256SUMS.minisig".to_string(),
                "SHA256SUMS.asc".to_string(),
                "SHA256SUMS.sig".to_string(),
            ],
            signature_candidates: vec![
                "{{asset}}.sig".to_string(),
                "{{asset}}.asc".to_string(),
                "{{asset}}.minisig".to_string(),
            ],
            signature_formats: SignatureFormatSuffixes {
                minisign: vec![".minisig".to_string()],
                pgp: vec![".asc".to_string(), ".gpg".to_string()],
                ed25519: vec![".sig.ed25519".to_string()],
            },
            prefer_checksum_sig: true,
            ed25519_public_key_hex: None,
        }
    }

    /// Applies `override_` over `self`; fields left unset in `override_`
    /// inherit from `self`.
    pub fn merge(self, override_: RepoConfigOverride) -> Self {
        RepoConfig {
            binary_name: override_.binary_name.unwrap_or(self.binary_name),
            hash_algo: override_.hash_algo.unwrap_or(self.hash_algo),
            asset_type: override_.asset_type.unwrap_or(self.asset_type),
            archive_format: override_.archive_format.unwrap_or(self.archive_format),
            archive_extensions: override_
                .archive_extensions
                .unwrap_or(self.archive_extensions),
            asset_patterns: override_.asset_patterns.unwrap_or(self.asset_patterns),
            checksum_candidates: override_
                .checksum_candidates
                .unwrap_or(self.checksum_candidates),
            checksum_sig_candidates: override_
                .checksum_sig_candidates
                .unwrap_or(self.checksum_sig_candidates),
            signature_candidates: override_
                .signature_candidates
                .unwrap_or(self.signature_candidates),
            signature_formats: override_.signature_formats.unwrap_or(self.signature_formats),
            prefer_checksum_sig: override_.prefer_checksum_sig.unwrap_or(self.prefer_checksum_sig),
            ed25519_public_key_hex: override_
                .ed25519_public_key_hex
                .or(self.ed25519_public_key_hex),
        }
    }
}

/// Known supplemental-artifact suffixes excluded from primary asset scoring
/// (spec §4.2 step 1).
pub const SUPPLEMENTAL_SUFFIXES: &[&str] = &[
    ".asc",
    ".sig",
    ".sig.ed25519",
    ".minisig",
    ".sha256",
    ".sha512",
    ".sha256.txt",
    ".sha512.txt",
    ".pub",
];

/// Known supplemental-artifact keyword substrings, matched case-insensitively
/// anywhere in the filename (spec §4.2 step 1).
pub const SUPPLEMENTAL_KEYWORDS: &[&str] =
    &["sha256", "sha512", "checksum", "checksums", "sums"];
