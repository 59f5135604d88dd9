//! SPDX-License-Identifier: GPL-3.0-or-later
//!
//! Workflow orchestrator (spec §4.7): composes the selector, discovery,
//! checksum parser, signature classifier and verifiers into workflow A/B/C,
//! enforcing the ordering and failure semantics spec §4.7 and §5 describe.
//! This module owns the one state machine the whole pipeline runs through;
//! it never runs a verifier itself, only decides which one to call and in
//! what order.

use sha2::{Digest, Sha256};

use crate::cache::{Cache, CacheKeyAnchor};
use crate::checksum::{self, DigestAlgo};
use crate::config::RepoConfig;
use crate::discovery::{self, Supplementals};
use crate::error::{Result, VouchError, Workflow, WorkflowError};
use crate::model::SignatureFormat;
use crate::model::{Asset, CheckStatus, Release, TrustReport};
use crate::patterns;
use crate::platform::Platform;
use crate::release_source::{DownloadOptions, ReleaseSource};
use crate::selector;
use crate::sigformat;
use crate::trust::{self, ChecksumAlgoClass, TrustInputs};
use crate::urlgate::UrlGateConfig;
use crate::verify::{self, SignatureMaterial};

/// Flags that change workflow selection or enforcement, one field per
/// CLI knob spec §4.7/§4.9 names.
#[derive(Debug, Clone, Default)]
pub struct Flags {
    pub insecure: bool,
    pub skip_sig: bool,
    pub skip_checksum: bool,
    pub require_minisign: bool,
    pub prefer_per_asset: bool,
    pub trust_minimum: u8,
}

pub struct PipelineOutcome {
    pub release_tag: String,
    pub asset: Asset,
    pub asset_bytes: Vec<u8>,
    pub asset_sha256: String,
    pub workflow: Workflow,
    pub signature_status: CheckStatus,
    pub checksum_status: CheckStatus,
    pub trust: TrustReport,
    pub warnings: Vec<String>,
    pub redirect_chain: Vec<String>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Decides the strategy from artifact presence alone (spec §4.7's diagram).
/// `effective_prefer_checksum_sig` already folds in `--prefer-per-asset`.
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

fn download(
    source: &dyn ReleaseSource,
    asset: &Asset,
    gate: &UrlGateConfig,
    redirect_chain: &mut Vec<String>,
    stage: &'static str,
    workflow: Workflow,
) -> std::result::Result<Vec<u8>, WorkflowError> {
    let downloaded = source
        .download(&asset.download_url, &DownloadOptions { gate: gate.clone() })
        .map_err(|e| e.at(workflow, stage))?;
    redirect_chain.extend(downloaded.redirect_chain);
    Ok(downloaded.bytes)
}

/// Downloads `asset`, short-circuiting through `cache` when an expected
/// sha256 is already known (spec §5's "URL plus expected digest" key) —
/// only reachable in workflows where a checksum manifest is fetched before
/// the asset it covers.
fn fetch_asset_cached(
    source: &dyn ReleaseSource,
    asset: &Asset,
    gate: &UrlGateConfig,
    cache: Option<&Cache>,
    known_sha256: Option<&str>,
    redirect_chain: &mut Vec<String>,
    stage: &'static str,
    workflow: Workflow,
) -> std::result::Result<Vec<u8>, WorkflowError> {
    if let (Some(cache), Some(digest)) = (cache, known_sha256) {
        if let Some(bytes) = cache.get_reverified(&asset.download_url, &CacheKeyAnchor::Digest(digest.to_string()), digest) {
            return Ok(bytes);
        }
    }
    download(source, asset, gate, redirect_chain, stage, workflow)
}

fn resolve_minisign_key(
    source: &dyn ReleaseSource,
    assets: &[Asset],
    gate: &UrlGateConfig,
    workflow: Workflow,
) -> std::result::Result<String, WorkflowError> {
    let key_asset = discovery::discover_minisign_public_key(assets).ok_or_else(|| {
        VouchError::PublicKeyMissing("minisign public key".to_string()).at(workflow, "locate-public-key")
    })?;
    let mut ignored_chain = Vec::new();
    let bytes = download(source, key_asset, gate, &mut ignored_chain, "download-public-key", workflow)?;
    String::from_utf8(bytes).map_err(|_| VouchError::InvalidHexKey.at(workflow, "decode-public-key"))
}

fn resolve_pgp_key(
    source: &dyn ReleaseSource,
    assets: &[Asset],
    gate: &UrlGateConfig,
    workflow: Workflow,
) -> std::result::Result<Vec<u8>, WorkflowError> {
    let candidates = discovery::discover_pgp_public_key_candidates(assets);
    let mut ignored_chain = Vec::new();
    for candidate in &candidates {
        let bytes = download(source, candidate, gate, &mut ignored_chain, "download-public-key", workflow)?;
        if discovery::looks_like_pgp_public_key(&bytes) {
            return Ok(bytes);
        }
    }
    Err(VouchError::PublicKeyMissing("PGP public key".to_string()).at(workflow, "locate-public-key"))
}

/// Verifies `content` against `sig_bytes` (already downloaded) using the
/// classified format, resolving whatever trust anchor that format needs.
fn verify_signature(
    source: &dyn ReleaseSource,
    config: &RepoConfig,
    assets: &[Asset],
    gate: &UrlGateConfig,
    content: &[u8],
    sig_name: &str,
    sig_bytes: &[u8],
    workflow: Workflow,
) -> std::result::Result<SignatureFormat, WorkflowError> {
    let format = sigformat::classify(sig_name, sig_bytes, &config.signature_formats)
        .map_err(|e| e.at(workflow, "classify-signature"))?;

    match format {
        SignatureFormat::Minisign => {
            let sig_text = std::str::from_utf8(sig_bytes)
                .map_err(|_| VouchError::UnsupportedSignatureFormat.at(workflow, "decode-signature"))?;
            let key_text = resolve_minisign_key(source, assets, gate, workflow)?;
            verify::verify(
                content,
                format,
                &SignatureMaterial::Minisign {
                    sig_text,
                    public_key_text: &key_text,
                },
            )
            .map_err(|e| e.at(workflow, "verify-signature"))?;
        }
        SignatureFormat::BinaryEd25519 => {
            let key_hex = config.ed25519_public_key_hex.as_deref().ok_or_else(|| {
                VouchError::PublicKeyMissing("ed25519 public key".to_string()).at(workflow, "locate-public-key")
            })?;
            verify::verify(
                content,
                format,
                &SignatureMaterial::Ed25519 {
                    signature_bytes: sig_bytes,
                    public_key_hex: key_hex,
                },
            )
            .map_err(|e| e.at(workflow, "verify-signature"))?;
        }
        SignatureFormat::Pgp => {
            let key_bytes = resolve_pgp_key(source, assets, gate, workflow)?;
            let content_file =
                tempfile::NamedTempFile::new().map_err(|e| VouchError::from(e).at(workflow, "stage-pgp-material"))?;
            let sig_file =
                tempfile::NamedTempFile::new().map_err(|e| VouchError::from(e).at(workflow, "stage-pgp-material"))?;
            let key_file =
                tempfile::NamedTempFile::new().map_err(|e| VouchError::from(e).at(workflow, "stage-pgp-material"))?;
            std::fs::write(content_file.path(), content).map_err(|e| VouchError::from(e).at(workflow, "stage-pgp-material"))?;
            std::fs::write(sig_file.path(), sig_bytes).map_err(|e| VouchError::from(e).at(workflow, "stage-pgp-material"))?;
            std::fs::write(key_file.path(), &key_bytes).map_err(|e| VouchError::from(e).at(workflow, "stage-pgp-material"))?;
            crate::verify::pgp::verify_pgp(content_file.path(), sig_file.path(), key_file.path())
                .map_err(|e| e.at(workflow, "verify-signature"))?;
        }
    }

    Ok(format)
}

#[allow(clippy::too_many_arguments)]
fn finish(
    release_tag: &str,
    asset: Asset,
    asset_bytes: Vec<u8>,
    asset_sha256: String,
    workflow: Workflow,
    signature_status: CheckStatus,
    checksum_status: CheckStatus,
    inputs: TrustInputs,
    warnings: Vec<String>,
    redirect_chain: Vec<String>,
    flags: &Flags,
    sig_format_used: Option<SignatureFormat>,
    cache: Option<&Cache>,
) -> std::result::Result<PipelineOutcome, WorkflowError> {
    if flags.require_minisign && sig_format_used != Some(SignatureFormat::Minisign) {
        return Err(VouchError::MinisignRequired.at(workflow, "enforce-policy"));
    }

    let trust = trust::compute_trust(&inputs);
    log::debug!("trust score {} ({:?}) for workflow {workflow}", trust.score, trust.level);
    enforce_trust_minimum(flags, &trust, workflow)?;

    if let Some(cache) = cache {
        if matches!(signature_status, CheckStatus::Verified) || matches!(checksum_status, CheckStatus::Verified) {
            let _ = cache.put(&asset.download_url, &CacheKeyAnchor::Digest(asset_sha256.clone()), &asset_bytes, &asset_sha256);
        }
    }

    Ok(PipelineOutcome {
        release_tag: release_tag.to_string(),
        asset,
        asset_bytes,
        asset_sha256,
        workflow,
        signature_status,
        checksum_status,
        trust,
        warnings,
        redirect_chain,
    })
}

fn enforce_trust_minimum(flags: &Flags, trust: &TrustReport, workflow: Workflow) -> std::result::Result<(), WorkflowError> {
    if flags.trust_minimum > 0 && trust.score < flags.trust_minimum {
        return Err(VouchError::TrustBelowMinimum {
            score: trust.score,
            minimum: flags.trust_minimum,
        }
        .at(workflow, "enforce-trust-minimum"));
    }
    Ok(())
}

/// Verifies `asset_bytes` against a checksum manifest. The manifest's
/// digest may be in any of [`DigestAlgo`]'s four lengths; the asset is
/// re-hashed with whichever algorithm that length implies rather than
/// always compared against the cached sha256 (which would never match a
/// sha512 manifest, let alone a legacy sha1/md5 one).
fn verify_checksum(
    checksum_bytes: &[u8],
    hash_algo: crate::model::HashAlgo,
    asset_name: &str,
    asset_bytes: &[u8],
    asset_sha256: &str,
    workflow: Workflow,
) -> std::result::Result<(ChecksumAlgoClass, String), WorkflowError> {
    let (expected, digest_algo) = checksum::extract_checksum_classified(checksum_bytes, hash_algo, asset_name)
        .map_err(|e| e.at(workflow, "parse-checksum"))?;
    let actual = if digest_algo == DigestAlgo::Sha256 {
        asset_sha256.to_string()
    } else {
        checksum::compute_digest(asset_bytes, digest_algo)
    };
    if expected != actual {
        return Err(VouchError::ChecksumMismatch {
            asset: asset_name.to_string(),
            expected,
            actual,
        }
        .at(workflow, "compare-digest"));
    }
    let class = match digest_algo.class() {
        crate::checksum::AlgoClass::Modern => ChecksumAlgoClass::Modern,
        crate::checksum::AlgoClass::Legacy => ChecksumAlgoClass::Legacy,
    };
    Ok((class, expected))
}

/// Runs the full verification pipeline against a single already-fetched
/// [`Release`], mirroring spec §4.7's state machine exactly. Splitting the
/// release fetch out of this function lets both the live pipeline and the
/// dry-run assessment (C12) share the same decision logic. `cache`, when
/// given, is consulted whenever a digest is already known before the asset
/// download (workflow A only, per spec §5) and populated after any
/// successful verification regardless of which workflow ran.
pub fn run_against_release(
    source: &dyn ReleaseSource,
    release: &Release,
    config: &RepoConfig,
    platform: Platform,
    gate: &UrlGateConfig,
    flags: &Flags,
    cache: Option<&Cache>,
) -> std::result::Result<PipelineOutcome, WorkflowError> {
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
    log::info!("selected asset {} for release {}, workflow {strategy}", selected.name, release.tag);

    if flags.insecure && anything_verifiable {
        log::warn!("--insecure set; bypassing verification for {}", selected.name);
        let mut redirect_chain = Vec::new();
        let asset_bytes = download(source, &selected, gate, &mut redirect_chain, "download-asset", Workflow::Insecure)?;
        let asset_sha256 = sha256_hex(&asset_bytes);
        let trust = trust::compute_trust(&TrustInputs {
            bypass: true,
            ..Default::default()
        });
        enforce_trust_minimum(flags, &trust, Workflow::Insecure)?;
        return Ok(PipelineOutcome {
            release_tag: release.tag.clone(),
            asset: selected,
            asset_bytes,
            asset_sha256,
            workflow: Workflow::Insecure,
            signature_status: CheckStatus::Absent,
            checksum_status: CheckStatus::Absent,
            trust,
            warnings: vec!["run was bypassed via --insecure; authenticity unproven".to_string()],
            redirect_chain,
        });
    }

    let mut redirect_chain = Vec::new();
    let mut warnings = Vec::new();
    let mut inputs = TrustInputs::default();
    let mut signature_status = CheckStatus::Absent;
    let mut checksum_status = CheckStatus::Absent;
    let mut sig_format_used: Option<SignatureFormat> = None;

    match strategy {
        Workflow::A => {
            let checksum_asset = sup
                .checksum
                .ok_or_else(|| VouchError::ChecksumMissing(selected.name.clone()).at(Workflow::A, "locate-checksum"))?;
            let checksum_sig_asset = sup.checksum_sig.expect("strategy A implies a checksum signature");

            let checksum_bytes = download(source, checksum_asset, gate, &mut redirect_chain, "download-checksum", Workflow::A)?;
            let sig_bytes = download(
                source,
                checksum_sig_asset,
                gate,
                &mut redirect_chain,
                "download-checksum-signature",
                Workflow::A,
            )?;

            if flags.skip_sig {
                warnings.push("signature check skipped by --skip-sig".to_string());
                inputs.signature_skipped = true;
                signature_status = CheckStatus::Skipped;
            } else {
                sig_format_used = Some(verify_signature(
                    source,
                    config,
                    &release.assets,
                    gate,
                    &checksum_bytes,
                    &checksum_sig_asset.name,
                    &sig_bytes,
                    Workflow::A,
                )?);
                inputs.signature_validated = true;
                signature_status = CheckStatus::Verified;
            }

            // The checksum manifest is already in hand, so a digest for the
            // selected asset may be known before it's downloaded; when so,
            // a cache hit can stand in for the download entirely.
            let known_digest = checksum::extract_checksum(&checksum_bytes, config.hash_algo, &selected.name).ok();
            let asset_bytes = fetch_asset_cached(
                source,
                &selected,
                gate,
                cache,
                known_digest.as_deref(),
                &mut redirect_chain,
                "download-asset",
                Workflow::A,
            )?;
            let asset_sha256 = sha256_hex(&asset_bytes);

            if flags.skip_checksum {
                warnings.push("checksum check skipped by --skip-checksum".to_string());
                inputs.checksum_skipped = true;
                checksum_status = CheckStatus::Skipped;
            } else {
                let (class, _) = verify_checksum(&checksum_bytes, config.hash_algo, &selected.name, &asset_bytes, &asset_sha256, Workflow::A)?;
                inputs.checksum_validated = true;
                inputs.checksum_algo_class = Some(class);
                checksum_status = CheckStatus::Verified;
            }

            finish(
                &release.tag,
                selected,
                asset_bytes,
                asset_sha256,
                Workflow::A,
                signature_status,
                checksum_status,
                inputs,
                warnings,
                redirect_chain,
                flags,
                sig_format_used,
                cache,
            )
        }
        Workflow::B => {
            let signature_asset = sup.signature.expect("strategy B implies a signature");
            let asset_bytes = download(source, &selected, gate, &mut redirect_chain, "download-asset", Workflow::B)?;
            let asset_sha256 = sha256_hex(&asset_bytes);
            let sig_bytes = download(source, signature_asset, gate, &mut redirect_chain, "download-signature", Workflow::B)?;

            if flags.skip_sig {
                warnings.push("signature check skipped by --skip-sig".to_string());
                inputs.signature_skipped = true;
                signature_status = CheckStatus::Skipped;
            } else {
                sig_format_used = Some(verify_signature(
                    source,
                    config,
                    &release.assets,
                    gate,
                    &asset_bytes,
                    &signature_asset.name,
                    &sig_bytes,
                    Workflow::B,
                )?);
                inputs.signature_validated = true;
                signature_status = CheckStatus::Verified;
            }

            // Non-minisign signatures require a checksum file (spec §4.7's "B"
            // rule); a minisign signature over the asset is sufficient on its
            // own, and a checksum file present alongside it is only advisory.
            let is_minisign = matches!(sig_format_used, Some(SignatureFormat::Minisign));

            if !is_minisign && !flags.skip_sig {
                let checksum_asset = sup
                    .checksum
                    .ok_or_else(|| VouchError::ChecksumRequiredForNonMinisign.at(Workflow::B, "locate-checksum"))?;
                if flags.skip_checksum {
                    warnings.push("checksum check skipped by --skip-checksum".to_string());
                    inputs.checksum_skipped = true;
                    checksum_status = CheckStatus::Skipped;
                } else {
                    let checksum_bytes = download(source, checksum_asset, gate, &mut redirect_chain, "download-checksum", Workflow::B)?;
                    let (class, _) = verify_checksum(&checksum_bytes, config.hash_algo, &selected.name, &asset_bytes, &asset_sha256, Workflow::B)?;
                    inputs.checksum_validated = true;
                    inputs.checksum_algo_class = Some(class);
                    checksum_status = CheckStatus::Verified;
                }
            } else if let (Some(checksum_asset), false) = (sup.checksum, flags.skip_checksum) {
                // Advisory-only: a minisign signature already sufficed, but a
                // checksum file is present too, so fold it in when it matches.
                if let Ok(checksum_bytes) = download(source, checksum_asset, gate, &mut redirect_chain, "download-checksum", Workflow::B) {
                    if let Ok((class, _)) = verify_checksum(&checksum_bytes, config.hash_algo, &selected.name, &asset_bytes, &asset_sha256, Workflow::B) {
                        inputs.checksum_validated = true;
                        inputs.checksum_algo_class = Some(class);
                        checksum_status = CheckStatus::Verified;
                    }
                }
            }

            finish(
                &release.tag,
                selected,
                asset_bytes,
                asset_sha256,
                Workflow::B,
                signature_status,
                checksum_status,
                inputs,
                warnings,
                redirect_chain,
                flags,
                sig_format_used,
                cache,
            )
        }
        Workflow::C => {
            let checksum_asset = sup.checksum.expect("strategy C implies a checksum file");
            let asset_bytes = download(source, &selected, gate, &mut redirect_chain, "download-asset", Workflow::C)?;
            let asset_sha256 = sha256_hex(&asset_bytes);

            if flags.skip_checksum {
                warnings.push("checksum check skipped by --skip-checksum".to_string());
                inputs.checksum_skipped = true;
                checksum_status = CheckStatus::Skipped;
            } else {
                let checksum_bytes = download(source, checksum_asset, gate, &mut redirect_chain, "download-checksum", Workflow::C)?;
                let (class, _) = verify_checksum(&checksum_bytes, config.hash_algo, &selected.name, &asset_bytes, &asset_sha256, Workflow::C)?;
                inputs.checksum_validated = true;
                inputs.checksum_algo_class = Some(class);
                checksum_status = CheckStatus::Verified;
                warnings.push("No signature available; authenticity cannot be proven".to_string());
            }

            finish(
                &release.tag,
                selected,
                asset_bytes,
                asset_sha256,
                Workflow::C,
                signature_status,
                checksum_status,
                inputs,
                warnings,
                redirect_chain,
                flags,
                sig_format_used,
                cache,
            )
        }
        Workflow::None => {
            let asset_bytes = download(source, &selected, gate, &mut redirect_chain, "download-asset", Workflow::None)?;
            let asset_sha256 = sha256_hex(&asset_bytes);
            warnings.push("authenticity unproven".to_string());

            finish(
                &release.tag,
                selected,
                asset_bytes,
                asset_sha256,
                Workflow::None,
                signature_status,
                checksum_status,
                inputs,
                warnings,
                redirect_chain,
                flags,
                sig_format_used,
                cache,
            )
        }
        Workflow::Insecure => unreachable!("handled above before `strategy` is otherwise consulted"),
    }
}

/// Fetches the release from `source` before delegating to
/// [`run_against_release`]; the split exists so tests and the dry-run path
/// can supply a [`Release`] they already have in hand.
pub fn run_pipeline(
    source: &dyn ReleaseSource,
    repo: &str,
    tag: &str,
    config: &RepoConfig,
    platform: Platform,
    gate: &UrlGateConfig,
    flags: &Flags,
    cache: Option<&Cache>,
) -> std::result::Result<PipelineOutcome, WorkflowError> {
    let release = source
        .fetch_release(repo, tag)
        .map_err(|e| e.at(Workflow::None, "fetch-release"))?;
    run_against_release(source, &release, config, platform, gate, flags, cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepoConfig;
    use crate::model::{Asset, HashAlgo};
    use crate::platform::{ArchToken, OsToken};
    use crate::release_source::Downloaded;
    use base64::{engine::general_purpose::STANDARD, Engine};
    use ed25519_dalek::{Signer, SigningKey};
    use rand::rngs::OsRng;
    use sha2::{Digest, Sha256};
    use std::collections::HashMap;

    struct FakeSource {
        release: Release,
        files: HashMap<String, Vec<u8>>,
    }

    impl ReleaseSource for FakeSource {
        fn fetch_release(&self, _repo: &str, _tag: &str) -> Result<Release> {
            Ok(self.release.clone())
        }

        fn download(&self, url: &str, _options: &DownloadOptions) -> Result<Downloaded> {
            let bytes = self
                .files
                .get(url)
                .cloned()
                .ok_or_else(|| VouchError::Archive(format!("no fixture for {url}")))?;
            Ok(Downloaded {
                bytes,
                redirect_chain: Vec::new(),
                content_type: None,
            })
        }
    }

    fn asset(name: &str) -> Asset {
        Asset {
            name: name.to_string(),
            download_url: format!("https://example.test/{name}"),
            size: 10,
        }
    }

    fn linux_amd64() -> Platform {
        Platform {
            os: OsToken::Linux,
            arch: ArchToken::Amd64,
        }
    }

    fn sha256_hex(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    fn encode_minisign_public_key(signing: &SigningKey) -> String {
        let mut blob = Vec::with_capacity(42);
        blob.extend_from_slice(b"Ed");
        blob.extend_from_slice(&[0u8; 8]);
        blob.extend_from_slice(signing.verifying_key().as_bytes());
        format!("untrusted comment: test key\n{}\n", STANDARD.encode(blob))
    }

    fn sign_minisign(signing: &SigningKey, content: &[u8]) -> String {
        let sig = signing.sign(content);
        let mut blob = Vec::with_capacity(74);
        blob.extend_from_slice(b"Ed");
        blob.extend_from_slice(&[0u8; 8]);
        blob.extend_from_slice(&sig.to_bytes());
        format!("untrusted comment: test sig\n{}\n", STANDARD.encode(blob))
    }

    #[test]
    fn scenario_1_minisign_workflow_a_scores_100() {
        let archive = asset("tool_linux_amd64.tar.gz");
        let checksum = asset("SHA256SUMS");
        let checksum_sig = asset("SHA256SUMS.minisig");
        let pubkey = asset("tool-minisign.pub");

        let archive_bytes = b"archive payload".to_vec();
        let archive_digest = sha256_hex(&archive_bytes);
        let checksum_text = format!("{archive_digest}  tool_linux_amd64.tar.gz\n");

        let signing = SigningKey::generate(&mut OsRng);
        let sig_text = sign_minisign(&signing, checksum_text.as_bytes());
        let key_text = encode_minisign_public_key(&signing);

        let mut files = HashMap::new();
        files.insert(archive.download_url.clone(), archive_bytes);
        files.insert(checksum.download_url.clone(), checksum_text.into_bytes());
        files.insert(checksum_sig.download_url.clone(), sig_text.into_bytes());
        files.insert(pubkey.download_url.clone(), key_text.into_bytes());

        let release = Release {
            tag: "v1.0.0".to_string(),
            assets: vec![archive, checksum, checksum_sig, pubkey],
        };
        let source = FakeSource { release: release.clone(), files };

        let outcome = run_against_release(
            &source,
            &release,
            &RepoConfig::defaults("tool"),
            linux_amd64(),
            &UrlGateConfig::default(),
            &Flags::default(),
            None,
        )
        .unwrap();

        assert_eq!(outcome.workflow, Workflow::A);
        assert_eq!(outcome.trust.score, 100);
        assert_eq!(outcome.trust.level, crate::model::TrustLevel::High);
    }

    #[test]
    fn scenario_2_minisign_workflow_b_without_checksum_scores_70() {
        let archive = asset("minisign-0.12-macos.zip");
        let archive_bytes = b"zip payload".to_vec();
        let signing = SigningKey::generate(&mut OsRng);
        let sig_text = sign_minisign(&signing, &archive_bytes);
        let sig = asset("minisign-0.12-macos.zip.minisig");
        let pubkey = asset("minisign-0.12-macos.pub");
        let key_text = encode_minisign_public_key(&signing);

        let mut files = HashMap::new();
        files.insert(archive.download_url.clone(), archive_bytes);
        files.insert(sig.download_url.clone(), sig_text.into_bytes());
        files.insert(pubkey.download_url.clone(), key_text.into_bytes());

        let release = Release {
            tag: "0.12".to_string(),
            assets: vec![archive, sig, pubkey],
        };
        let source = FakeSource { release: release.clone(), files };

        let mut config = RepoConfig::defaults("minisign");
        config.signature_candidates = vec!["{{asset}}.minisig".to_string()];

        let outcome = run_against_release(
            &source,
            &release,
            &config,
            Platform {
                os: OsToken::Darwin,
                arch: ArchToken::Amd64,
            },
            &UrlGateConfig::default(),
            &Flags::default(),
            None,
        )
        .unwrap();

        assert_eq!(outcome.workflow, Workflow::B);
        assert_eq!(outcome.trust.score, 70);
        assert_eq!(outcome.trust.level, crate::model::TrustLevel::Medium);
    }

    #[test]
    fn scenario_3_pgp_workflow_b_without_checksum_fails() {
        let archive = asset("tool-v1.0-linux-amd64.tar.gz");
        let sig = asset("tool-v1.0-linux-amd64.tar.gz.asc");

        let mut files = HashMap::new();
        files.insert(archive.download_url.clone(), b"payload".to_vec());
        files.insert(
            sig.download_url.clone(),
            b"-----BEGIN PGP SIGNATURE-----\nabc\n-----END PGP SIGNATURE-----\n".to_vec(),
        );

        let release = Release {
            tag: "v1.0".to_string(),
            assets: vec![archive, sig],
        };
        let source = FakeSource { release: release.clone(), files };

        let err = run_against_release(
            &source,
            &release,
            &RepoConfig::defaults("tool"),
            linux_amd64(),
            &UrlGateConfig::default(),
            &Flags::default(),
            None,
        )
        .unwrap_err();

        assert!(matches!(err.source, VouchError::ChecksumRequiredForNonMinisign));
        assert_eq!(err.workflow, Workflow::B);
    }

    #[test]
    fn scenario_4_checksum_only_workflow_c_scores_45() {
        let archive = asset("tool.tar.gz");
        let archive_bytes = b"payload".to_vec();
        let digest = sha256_hex(&archive_bytes);
        let checksum_text = format!("{digest}  tool.tar.gz\n");
        let checksum = asset("tool.tar.gz.sha256");

        let mut files = HashMap::new();
        files.insert(archive.download_url.clone(), archive_bytes);
        files.insert(checksum.download_url.clone(), checksum_text.into_bytes());

        let release = Release {
            tag: "v1.0".to_string(),
            assets: vec![archive, checksum],
        };
        let source = FakeSource { release: release.clone(), files };

        let mut config = RepoConfig::defaults("tool");
        config.checksum_candidates = vec!["{{asset}}.sha256".to_string()];

        let outcome = run_against_release(
            &source,
            &release,
            &config,
            linux_amd64(),
            &UrlGateConfig::default(),
            &Flags::default(),
            None,
        )
        .unwrap();

        assert_eq!(outcome.workflow, Workflow::C);
        assert_eq!(outcome.trust.score, 45);
        assert_eq!(outcome.trust.level, crate::model::TrustLevel::Low);
        assert!(outcome.warnings.iter().any(|w| w.contains("authenticity")));
    }

    #[test]
    fn scenario_5_insecure_bypasses_verification() {
        let archive = asset("tool_linux_amd64.tar.gz");
        let checksum = asset("SHA256SUMS");
        let checksum_sig = asset("SHA256SUMS.minisig");
        let pubkey = asset("tool-minisign.pub");

        let mut files = HashMap::new();
        files.insert(archive.download_url.clone(), b"payload".to_vec());
        files.insert(checksum.download_url.clone(), b"will not be parsed".to_vec());
        files.insert(checksum_sig.download_url.clone(), b"will not be verified".to_vec());
        files.insert(pubkey.download_url.clone(), b"unused".to_vec());

        let release = Release {
            tag: "v1.0.0".to_string(),
            assets: vec![archive, checksum, checksum_sig, pubkey],
        };
        let source = FakeSource { release: release.clone(), files };

        let flags = Flags {
            insecure: true,
            ..Default::default()
        };

        let outcome = run_against_release(
            &source,
            &release,
            &RepoConfig::defaults("tool"),
            linux_amd64(),
            &UrlGateConfig::default(),
            &flags,
            None,
        )
        .unwrap();

        assert_eq!(outcome.workflow, Workflow::Insecure);
        assert_eq!(outcome.trust.score, 0);
        assert_eq!(outcome.trust.level, crate::model::TrustLevel::Bypassed);
    }

    #[test]
    fn scenario_5b_insecure_with_trust_minimum_fails_gating() {
        let archive = asset("tool_linux_amd64.tar.gz");
        let checksum = asset("SHA256SUMS");
        let checksum_sig = asset("SHA256SUMS.minisig");

        let mut files = HashMap::new();
        files.insert(archive.download_url.clone(), b"payload".to_vec());
        files.insert(checksum.download_url.clone(), b"x".to_vec());
        files.insert(checksum_sig.download_url.clone(), b"x".to_vec());

        let release = Release {
            tag: "v1.0.0".to_string(),
            assets: vec![archive, checksum, checksum_sig],
        };
        let source = FakeSource { release: release.clone(), files };

        let flags = Flags {
            insecure: true,
            trust_minimum: 1,
            ..Default::default()
        };

        let err = run_against_release(
            &source,
            &release,
            &RepoConfig::defaults("tool"),
            linux_amd64(),
            &UrlGateConfig::default(),
            &flags,
            None,
        )
        .unwrap_err();

        assert!(matches!(err.source, VouchError::TrustBelowMinimum { .. }));
    }

    #[test]
    fn scenario_6_ambiguous_selection_fails_before_any_download() {
        let release = Release {
            tag: "v1.0.0".to_string(),
            assets: vec![asset("tool_linux_amd64.tar.gz"), asset("tool_linux_amd64.zip")],
        };
        let source = FakeSource {
            release: release.clone(),
            files: HashMap::new(),
        };

        let err = run_against_release(
            &source,
            &release,
            &RepoConfig::defaults("tool"),
            linux_amd64(),
            &UrlGateConfig::default(),
            &Flags::default(),
            None,
        )
        .unwrap_err();

        assert!(matches!(err.source, VouchError::AmbiguousAsset(_, _)));
    }

    #[test]
    fn require_minisign_rejects_a_pgp_only_workflow() {
        // Non-minisign Workflow B normally fails on the missing checksum first;
        // here we give it a checksum too, so the `--require-minisign` policy is
        // what trips instead.
        let archive = asset("tool-v1.0-linux-amd64.tar.gz");
        let sig = asset("tool-v1.0-linux-amd64.tar.gz.sig.ed25519");
        let checksum = asset("tool-v1.0-linux-amd64.tar.gz.sha256");

        let archive_bytes = b"payload".to_vec();
        let digest = sha256_hex(&archive_bytes);
        let checksum_text = format!("{digest}  tool-v1.0-linux-amd64.tar.gz\n");

        let signing = SigningKey::generate(&mut OsRng);
        let signature = signing.sign(&archive_bytes);
        let key_hex = hex::encode(signing.verifying_key().as_bytes());

        let mut files = HashMap::new();
        files.insert(archive.download_url.clone(), archive_bytes);
        files.insert(sig.download_url.clone(), signature.to_bytes().to_vec());
        files.insert(checksum.download_url.clone(), checksum_text.into_bytes());

        let release = Release {
            tag: "v1.0".to_string(),
            assets: vec![archive, sig, checksum],
        };
        let source = FakeSource { release: release.clone(), files };

        let mut config = RepoConfig::defaults("tool");
        config.checksum_candidates = vec!["{{asset}}.sha256".to_string()];
        config.signature_candidates = vec!["{{asset}}.sig.ed25519".to_string()];
        config.hash_algo = HashAlgo::Sha256;
        config.ed25519_public_key_hex = Some(key_hex);

        let flags = Flags {
            require_minisign: true,
            ..Default::default()
        };

        let err = run_against_release(&source, &release, &config, linux_amd64(), &UrlGateConfig::default(), &flags, None).unwrap_err();
        assert!(matches!(err.source, VouchError::MinisignRequired));
    }
}
