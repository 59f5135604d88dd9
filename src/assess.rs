//! SPDX-License-Identifier: GPL-3.0-or-later
//!
//! Assessment / dry-run (spec §4.10, C12): runs the same selection and
//! discovery as the live pipeline, classifies whatever signature is found,
//! but never executes a cryptographic verifier and never downloads the
//! primary asset's bytes. Trust is computed optimistically, assuming a
//! verifiable check would have passed, so the report describes the *plan*
//! rather than a completed run. Skip/bypass/trust-minimum gating still
//! apply, matching the live path's policy surface.

use crate::checksum;
use crate::config::RepoConfig;
use crate::discovery::{self, Supplementals};
use crate::error::{Result, VouchError, Workflow, WorkflowError};
use crate::model::{Asset, CheckStatus, Release};
use crate::patterns;
use crate::platform::Platform;
use crate::release_source::{DownloadOptions, ReleaseSource};
use crate::selector;
use crate::sigformat;
use crate::trust::{self, ChecksumAlgoClass, TrustInputs};
use crate::urlgate::UrlGateConfig;
use crate::workflow::Flags;

pub struct PlanOutcome {
    pub release_tag: String,
    pub asset: Asset,
    pub workflow: Workflow,
    pub signature_status: CheckStatus,
    pub checksum_status: CheckStatus,
    pub trust: crate::model::TrustReport,
    pub warnings: Vec<String>,
}

fn choose_strategy(
    has_checksum_sig: bool,
    has_signature: bool,
    has_checksum: bool,
    effective_prefer_checksum_sig: bool,
) -> Workflow {
    match (has_checksum_sig, has_signature) {
        (true, true) => {
            if effective_prefer_checksum_sig {
                Workflow::A
            } else {
                Workflow::B
            }
        }
        (true, false) => Workflow::A,
        (false, true) => Workflow::B,
        (false, false) => {
            if has_checksum {
                Workflow::C
            } else {
                Workflow::None
            }
        }
    }
}

/// Downloads a supplemental artifact's bytes for *classification only*;
/// never the primary asset, and the bytes are discarded once classified.
fn fetch_for_classification(
    source: &dyn ReleaseSource,
    asset: &Asset,
    gate: &UrlGateConfig,
    workflow: Workflow,
) -> std::result::Result<Vec<u8>, WorkflowError> {
    source
        .download(&asset.download_url, &DownloadOptions { gate: gate.clone() })
        .map(|d| d.bytes)
        .map_err(|e| e.at(workflow, "download-for-classification"))
}

/// Runs the assessment against an already-fetched [`Release`].
pub fn assess_against_release(
    source: &dyn ReleaseSource,
    release: &Release,
    config: &RepoConfig,
    platform: Platform,
    gate: &UrlGateConfig,
    flags: &Flags,
) -> std::result::Result<PlanOutcome, WorkflowError> {
    let selected = selector::select_asset(&release.assets, config, platform)
        .map_err(|e| e.at(Workflow::None, "select-asset"))?
        .clone();

    let base = patterns::compute_base(&selected.name, &config.archive_extensions);
    let sup: Supplementals = discovery::discover_supplementals(&release.assets, config, platform, &selected, &base);

    let has_checksum_sig = sup.checksum_sig.is_some();
    let has_signature = sup.signature.is_some();
    let has_checksum = sup.checksum.is_some();
    let anything_verifiable = has_checksum_sig || has_signature || has_checksum;

    let effective_prefer_checksum_sig = if flags.prefer_per_asset {
        !config.prefer_checksum_sig
    } else {
        config.prefer_checksum_sig
    };

    let strategy = choose_strategy(has_checksum_sig, has_signature, has_checksum, effective_prefer_checksum_sig);

    if flags.insecure && anything_verifiable {
        let trust = trust::compute_trust(&TrustInputs {
            bypass: true,
            ..Default::default()
        });
        return finish(release, selected, Workflow::Insecure, CheckStatus::Plan, CheckStatus::Plan, trust, vec![
            "run would be bypassed via --insecure; authenticity unproven".to_string(),
        ]);
    }

    let mut warnings = Vec::new();
    let mut inputs = TrustInputs::default();
    let mut signature_status = CheckStatus::Absent;
    let mut checksum_status = CheckStatus::Absent;

    match strategy {
        Workflow::A => {
            let checksum_sig_asset = sup.checksum_sig.expect("strategy A implies a checksum signature");
            if flags.skip_sig {
                inputs.signature_skipped = true;
                signature_status = CheckStatus::Skipped;
            } else {
                let sig_bytes = fetch_for_classification(source, checksum_sig_asset, gate, Workflow::A)?;
                sigformat::classify(&checksum_sig_asset.name, &sig_bytes, &config.signature_formats)
                    .map_err(|e| e.at(Workflow::A, "classify-signature"))?;
                inputs.signature_validated = true;
                signature_status = CheckStatus::Plan;
            }
            if !flags.skip_checksum {
                inputs.checksum_validated = true;
                inputs.checksum_algo_class = Some(ChecksumAlgoClass::Modern);
                checksum_status = CheckStatus::Plan;
            } else {
                inputs.checksum_skipped = true;
                checksum_status = CheckStatus::Skipped;
            }
        }
        Workflow::B => {
            let signature_asset = sup.signature.expect("strategy B implies a signature");
            let sig_bytes = if flags.skip_sig {
                None
            } else {
                Some(fetch_for_classification(source, signature_asset, gate, Workflow::B)?)
            };

            let format = match &sig_bytes {
                Some(bytes) => Some(
                    sigformat::classify(&signature_asset.name, bytes, &config.signature_formats)
                        .map_err(|e| e.at(Workflow::B, "classify-signature"))?,
                ),
                None => None,
            };

            if flags.skip_sig {
                inputs.signature_skipped = true;
                signature_status = CheckStatus::Skipped;
            } else {
                inputs.signature_validated = true;
                signature_status = CheckStatus::Plan;
            }

            let is_minisign = matches!(format, Some(crate::model::SignatureFormat::Minisign));
            if !is_minisign && !flags.skip_sig {
                if sup.checksum.is_none() {
                    return Err(VouchError::ChecksumRequiredForNonMinisign.at(Workflow::B, "locate-checksum"));
                }
                if flags.skip_checksum {
                    inputs.checksum_skipped = true;
                    checksum_status = CheckStatus::Skipped;
                } else {
                    inputs.checksum_validated = true;
                    inputs.checksum_algo_class = Some(ChecksumAlgoClass::Modern);
                    checksum_status = CheckStatus::Plan;
                }
            } else if sup.checksum.is_some() && !flags.skip_checksum {
                inputs.checksum_validated = true;
                inputs.checksum_algo_class = Some(ChecksumAlgoClass::Modern);
                checksum_status = CheckStatus::Plan;
            }
        }
        Workflow::C => {
            let checksum_asset = sup.checksum.expect("strategy C implies a checksum file");
            if flags.skip_checksum {
                inputs.checksum_skipped = true;
                checksum_status = CheckStatus::Skipped;
            } else {
                let checksum_bytes = fetch_for_classification(source, checksum_asset, gate, Workflow::C)?;
                // Confirm the manifest at least parses (spec §4.4); the
                // specific asset's digest isn't compared since the asset
                // itself is never downloaded during assessment.
                if checksum::extract_checksum(&checksum_bytes, config.hash_algo, &selected.name).is_ok() {
                    inputs.checksum_validated = true;
                    inputs.checksum_algo_class = Some(ChecksumAlgoClass::Modern);
                    checksum_status = CheckStatus::Plan;
                }
            }
            warnings.push("No signature available; authenticity cannot be proven".to_string());
        }
        Workflow::None => {
            warnings.push("authenticity unproven".to_string());
        }
        Workflow::Insecure => unreachable!("handled above"),
    }

    let trust = trust::compute_trust(&inputs);
    finish(release, selected, strategy, signature_status, checksum_status, trust, warnings)
}

fn finish(
    release: &Release,
    asset: Asset,
    workflow: Workflow,
    signature_status: CheckStatus,
    checksum_status: CheckStatus,
    trust: crate::model::TrustReport,
    warnings: Vec<String>,
) -> std::result::Result<PlanOutcome, WorkflowError> {
    Ok(PlanOutcome {
        release_tag: release.tag.clone(),
        asset,
        workflow,
        signature_status,
        checksum_status,
        trust,
        warnings,
    })
}

/// Fetches the release before delegating to [`assess_against_release`].
pub fn assess(
    source: &dyn ReleaseSource,
    repo: &str,
    tag: &str,
    config: &RepoConfig,
    platform: Platform,
    gate: &UrlGateConfig,
    flags: &Flags,
) -> std::result::Result<PlanOutcome, WorkflowError> {
    let release = source
        .fetch_release(repo, tag)
        .map_err(|e| e.at(Workflow::None, "fetch-release"))?;
    assess_against_release(source, &release, config, platform, gate, flags)
}
