//! SPDX-License-Identifier: GPL-3.0-or-later
//!
//! Provenance recorder (spec §4.10/§6): assembles the structured audit
//! record and writes it via write-then-rename so a reader never observes a
//! torn file.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::model::{CheckStatus, ProvenanceAsset, ProvenanceRecord, TrustReport};

/// Bumped whenever a required field is added or a meaning changes;
/// `trustLevel` is kept for one minor cycle per spec §6 and is not itself a
/// reason to bump this.
pub const SCHEMA_VERSION: u32 = 1;

pub struct ProvenanceInputs<'a> {
    pub source: &'a str,
    pub release: &'a str,
    pub asset: ProvenanceAsset,
    pub workflow: &'a str,
    pub signature_status: CheckStatus,
    pub checksum_status: CheckStatus,
    pub trust: TrustReport,
    pub warnings: Vec<String>,
    pub redirect_chain: Vec<String>,
    pub timestamp_iso8601: String,
}

/// Builds a [`ProvenanceRecord`] from the inputs the pipeline collected.
/// `trust_level` is carried alongside `trust.level` only for backward
/// compatibility (spec §6); new readers should use `trust.level`.
pub fn build_record(inputs: ProvenanceInputs) -> ProvenanceRecord {
    ProvenanceRecord {
        schema_version: SCHEMA_VERSION,
        tool: "vouch".to_string(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        source: inputs.source.to_string(),
        release: inputs.release.to_string(),
        asset: inputs.asset,
        workflow: inputs.workflow.to_string(),
        signature_status: inputs.signature_status,
        checksum_status: inputs.checksum_status,
        trust_level: Some(inputs.trust.level),
        trust: inputs.trust,
        warnings: inputs.warnings,
        redirect_chain: inputs.redirect_chain,
        timestamp_iso8601: inputs.timestamp_iso8601,
    }
}

/// Serializes `record` and writes it to `path` via write-to-temp-then-rename
/// in the same directory, so a reader never observes a partially written
/// file (spec §5).
pub fn write_provenance(path: &Path, record: &ProvenanceRecord) -> Result<()> {
    let json = serde_json::to_vec_pretty(record)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = tempfile::NamedTempFile::new_in(dir)?;
    fs::write(tmp.path(), &json)?;
    tmp.persist(path)
        .map_err(|e| crate::error::VouchError::Io(e.error))?;
    Ok(())
}
