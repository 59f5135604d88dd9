//! SPDX-License-Identifier: GPL-3.0-or-later
//!
//! Core data model: releases, assets, checksum entries, signature formats,
//! trust reports and provenance records. Release/Asset are immutable
//! snapshots captured once from a `ReleaseSource`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Release {
    pub tag: String,
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Asset {
    pub name: String,
    pub download_url: String,
    pub size: u64,
}

impl Asset {
    /// Case-insensitive match against a rendered template or regex.
    pub fn name_eq_ignore_case(&self, other: &str) -> bool {
        self.name.eq_ignore_ascii_case(other)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumEntry {
    pub digest_hex: String,
    pub filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureFormat {
    Minisign,
    Pgp,
    BinaryEd25519,
}

impl std::fmt::Display for SignatureFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SignatureFormat::Minisign => "minisign",
            SignatureFormat::Pgp => "pgp",
            SignatureFormat::BinaryEd25519 => "binary-ed25519",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgo {
    Sha256,
    Sha512,
}

impl HashAlgo {
    /// Hex-character length of a digest produced by this algorithm.
    pub fn hex_len(self) -> usize {
        match self {
            HashAlgo::Sha256 => 64,
            HashAlgo::Sha512 => 128,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    Bypassed,
    Minimal,
    Low,
    Medium,
    High,
}

impl TrustLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0 => TrustLevel::Bypassed,
            1..=29 => TrustLevel::Minimal,
            30..=59 => TrustLevel::Low,
            60..=84 => TrustLevel::Medium,
            _ => TrustLevel::High,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustFactor {
    pub name: String,
    pub delta: i16,
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustReport {
    pub score: u8,
    pub level: TrustLevel,
    pub factors: Vec<TrustFactor>,
    pub warnings: Vec<String>,
}

impl TrustReport {
    /// Invariant I-1 from spec §3: `score == 0 <-> level == bypassed`.
    pub fn check_invariant(&self) -> bool {
        (self.score == 0) == (self.level == TrustLevel::Bypassed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Verified,
    Skipped,
    Absent,
    Plan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceAsset {
    pub name: String,
    pub size: u64,
    pub url: String,
    /// Set exactly when the asset bytes were fully read (invariant I-2);
    /// never forged from an upstream-claimed digest.
    pub sha256: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceRecord {
    pub schema_version: u32,
    pub tool: String,
    pub tool_version: String,
    pub source: String,
    pub release: String,
    pub asset: ProvenanceAsset,
    pub workflow: String,
    pub signature_status: CheckStatus,
    pub checksum_status: CheckStatus,
    pub trust: TrustReport,
    pub warnings: Vec<String>,
    pub redirect_chain: Vec<String>,
    #[serde(rename = "timestamp")]
    pub timestamp_iso8601: String,
    /// Retained for one minor cycle; superseded by `trust.level`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_level: Option<TrustLevel>,
}
