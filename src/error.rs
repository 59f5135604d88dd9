//! SPDX-License-Identifier: GPL-3.0-or-later
//!
//! Stable error taxonomy for the verification pipeline. Callers match on
//! variants, never on message text.

use std::path::PathBuf;
use thiserror::Error;

/// One workflow label, attached to an error at the workflow boundary so a
/// `Display`ed error always says which strategy was in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    A,
    B,
    C,
    None,
    Insecure,
}

impl std::fmt::Display for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Workflow::A => "A",
            Workflow::B => "B",
            Workflow::C => "C",
            Workflow::None => "none",
            Workflow::Insecure => "insecure",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum VouchError {
    // Selection
    #[error("no asset in the release matched the configured patterns or platform heuristics")]
    NoMatchingAsset,

    #[error("{0} and {1} are tied for asset selection; disambiguate with asset_patterns")]
    AmbiguousAsset(String, String),

    // Discovery
    #[error("no checksum artifact could be located for {0}")]
    ChecksumMissing(String),

    #[error("no signature artifact could be located for {0}")]
    SignatureMissing(String),

    #[error("no public key artifact could be located for {0}")]
    PublicKeyMissing(String),

    // Parsing
    #[error("checksum file is empty")]
    EmptyChecksumFile,

    #[error("no checksum entry found for {0}")]
    ChecksumNotFound(String),

    #[error("signature format could not be determined")]
    UnsupportedSignatureFormat,

    #[error("public key is not valid hex of the expected length")]
    InvalidHexKey,

    #[error("refusing to treat apparent private key material as a public key")]
    ProbablePrivateKeyMaterial,

    // Cryptography
    #[error("minisign verification failed: {0}")]
    MinisignVerifyFailed(String),

    #[error("PGP verification failed: {0}")]
    PGPVerifyFailed(String),

    #[error("ed25519 verification failed")]
    Ed25519VerifyFailed,

    #[error("checksum mismatch for {asset}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        asset: String,
        expected: String,
        actual: String,
    },

    // Policy
    #[error("--require-minisign was set but the chosen path was not minisign-verified")]
    MinisignRequired,

    #[error("a checksum file is required for non-minisign signature verification")]
    ChecksumRequiredForNonMinisign,

    #[error("trust score {score} is below the required minimum {minimum}")]
    TrustBelowMinimum { score: u8, minimum: u8 },

    #[error("run was bypassed via --insecure")]
    Bypassed,

    // Transport
    #[error("refusing plain HTTP for {0}; pass --allow-http to override")]
    HTTPNotAllowed(String),

    #[error("redirect to {0} refused; pass --follow-redirects to override")]
    RedirectRefused(String),

    #[error("exceeded the maximum of {0} redirects")]
    TooManyRedirects(usize),

    #[error("disallowed content type: {0}")]
    DisallowedContentType(String),

    #[error("operation canceled")]
    Canceled,

    // Filesystem
    #[error("destination is not writable: {0}")]
    DestinationNotWritable(PathBuf),

    #[error("path is on a noexec mount: {0}")]
    NoExecMount(PathBuf),

    #[error("cross-device rename from {from} to {to}")]
    CrossDevice { from: PathBuf, to: PathBuf },

    // Wrapping / transport plumbing
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("archive error: {0}")]
    Archive(String),
}

/// Wraps a lower-level [`VouchError`] with the workflow and stage active when
/// it surfaced, per spec §7's "wrapped once at the workflow boundary" rule.
#[derive(Debug, Error)]
#[error("workflow {workflow}, stage {stage}: {source}")]
pub struct WorkflowError {
    pub workflow: Workflow,
    pub stage: &'static str,
    #[source]
    pub source: VouchError,
}

impl VouchError {
    pub fn at(self, workflow: Workflow, stage: &'static str) -> WorkflowError {
        WorkflowError {
            workflow,
            stage,
            source: self,
        }
    }
}

pub type Result<T> = std::result::Result<T, VouchError>;
