//! SPDX-License-Identifier: GPL-3.0-or-later
//!
//! Supplemental-artifact discovery (spec §4.3): locates checksum files,
//! checksum-signature files, per-asset signature files, and public keys
//! alongside a selected asset.

use crate::config::RepoConfig;
use crate::model::Asset;
use crate::patterns::{compile_exact, TemplateContext};
use crate::platform::Platform;

const CHECKSUM_KEYWORDS: &[&str] = &["sha256", "sha512", "sums", "checksum"];
const SIGNATURE_KEYWORDS: &[&str] = &["sig", "asc", "minisig"];

#[derive(Debug, Default)]
pub struct Supplementals<'a> {
    pub checksum: Option<&'a Asset>,
    pub checksum_sig: Option<&'a Asset>,
    pub signature: Option<&'a Asset>,
}

fn ctx_for<'a>(config: &'a RepoConfig, platform: Platform, asset: &'a Asset, base: &'a str) -> TemplateContext<'a> {
    TemplateContext {
        binary_name: &config.binary_name,
        platform,
        asset_name: Some(&asset.name),
        base: Some(base),
    }
}

fn find_by_templates<'a>(
    assets: &'a [Asset],
    templates: &[String],
    ctx: &TemplateContext,
) -> Option<&'a Asset> {
    for template in templates {
        let Ok(re) = compile_exact(template, ctx) else {
            continue;
        };
        if let Some(found) = assets.iter().find(|a| re.is_match(&a.name)) {
            return Some(found);
        }
    }
    None
}

fn is_generic_aggregate(lower: &str) -> bool {
    lower.starts_with("sha256sum")
        || lower.starts_with("sha512sum")
        || lower.contains("checksums")
}

fn keyword_fallback<'a>(
    assets: &'a [Asset],
    binary_name: &str,
    base: &str,
    keywords: &[&str],
) -> Option<&'a Asset> {
    let binary_lower = binary_name.to_ascii_lowercase();
    let base_lower = base.to_ascii_lowercase();

    assets.iter().find(|a| {
        let lower = a.name.to_ascii_lowercase();
        let has_keyword = keywords.iter().any(|kw| lower.contains(kw));
        if !has_keyword {
            return false;
        }
        lower.contains(&binary_lower) || lower.contains(&base_lower) || is_generic_aggregate(&lower)
    })
}

/// Locates the checksum file, checksum-signature file, and per-asset
/// signature file for `selected`, in that order of spec precedence.
pub fn discover_supplementals<'a>(
    assets: &'a [Asset],
    config: &RepoConfig,
    platform: Platform,
    selected: &'a Asset,
    base: &'a str,
) -> Supplementals<'a> {
    let ctx = ctx_for(config, platform, selected, base);

    let checksum = find_by_templates(assets, &config.checksum_candidates, &ctx)
        .or_else(|| keyword_fallback(assets, &config.binary_name, base, CHECKSUM_KEYWORDS));

    let checksum_sig = find_by_templates(assets, &config.checksum_sig_candidates, &ctx).or_else(|| {
        keyword_fallback(
            assets,
            &config.binary_name,
            base,
            &["minisig", "sig", "asc"],
        )
        .filter(|a| {
            let lower = a.name.to_ascii_lowercase();
            is_generic_aggregate(&lower) && SIGNATURE_KEYWORDS.iter().any(|kw| lower.contains(kw))
        })
    });

    let signature = find_by_templates(assets, &config.signature_candidates, &ctx)
        .or_else(|| keyword_fallback(assets, &config.binary_name, base, SIGNATURE_KEYWORDS));

    Supplementals {
        checksum,
        checksum_sig,
        signature,
    }
}

/// Name-based shortlist of minisign public-key candidates (spec §4.3 step 3).
pub fn discover_minisign_public_key<'a>(assets: &'a [Asset]) -> Option<&'a Asset> {
    assets.iter().find(|a| {
        let lower = a.name.to_ascii_lowercase();
        lower.contains("minisign") && lower.ends_with(".pub")
    })
}

/// Name-based shortlist of PGP public-key candidates. `*-signing-key.asc` is
/// unambiguous by name; a bare `*.asc` requires the caller to confirm the
/// armor block declares a public key via [`looks_like_pgp_public_key`] once
/// downloaded.
pub fn discover_pgp_public_key_candidates<'a>(assets: &'a [Asset]) -> Vec<&'a Asset> {
    assets
        .iter()
        .filter(|a| {
            let lower = a.name.to_ascii_lowercase();
            lower.ends_with("-signing-key.asc") || lower.ends_with(".asc")
        })
        .collect()
}

/// Confirms an armor block declares PGP PUBLIC KEY material rather than a
/// detached signature.
pub fn looks_like_pgp_public_key(bytes: &[u8]) -> bool {
    let text = String::from_utf8_lossy(bytes);
    text.trim_start()
        .starts_with("-----BEGIN PGP PUBLIC KEY BLOCK-----")
}
