//! SPDX-License-Identifier: GPL-3.0-or-later
//!
//! Asset selector (spec §4.2): filters out supplemental artifacts, tries the
//! repo's per-file `asset_patterns` templates, and falls back to
//! platform-aware heuristic scoring. Ties are always surfaced, never broken
//! arbitrarily (spec invariant I-5).

use crate::config::{RepoConfig, SUPPLEMENTAL_KEYWORDS, SUPPLEMENTAL_SUFFIXES};
use crate::error::{Result, VouchError};
use crate::model::Asset;
use crate::patterns::{compile_pattern, TemplateContext};
use crate::platform::Platform;

/// True when `name` looks like a checksum/signature/key file rather than a
/// primary release asset.
pub fn is_supplemental(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    if SUPPLEMENTAL_SUFFIXES
        .iter()
        .any(|suffix| lower.ends_with(suffix))
    {
        return true;
    }
    SUPPLEMENTAL_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

fn contains_token(lower_name: &str, token_lower: &str) -> bool {
    if token_lower.is_empty() {
        return false;
    }
    lower_name.contains(token_lower)
}

fn is_separator(byte: u8) -> bool {
    !byte.is_ascii_alphanumeric()
}

/// True when `token_lower` occurs in `lower_name` as a separator-delimited
/// token (spec §4.2 step 3), not merely as a substring — `tool` matches
/// `my-tool_v1` but not `toolbox` or `mytool`.
fn contains_token_bounded(lower_name: &str, token_lower: &str) -> bool {
    if token_lower.is_empty() {
        return false;
    }
    let haystack = lower_name.as_bytes();
    let needle = token_lower.as_bytes();
    let mut start = 0;
    while let Some(offset) = lower_name[start..].find(token_lower) {
        let idx = start + offset;
        let before_ok = idx == 0 || is_separator(haystack[idx - 1]);
        let end = idx + needle.len();
        let after_ok = end == haystack.len() || is_separator(haystack[end]);
        if before_ok && after_ok {
            return true;
        }
        start = idx + 1;
    }
    false
}

fn score_heuristic(asset: &Asset, config: &RepoConfig, platform: Platform) -> u32 {
    let lower = asset.name.to_ascii_lowercase();
    let mut score = 0u32;

    let os = platform.os;
    let arch = platform.arch;

    if contains_token(&lower, os.canonical()) {
        score += 5;
    } else if os.aliases().iter().any(|a| contains_token(&lower, a)) {
        score += 3;
    }

    if contains_token(&lower, arch.canonical()) {
        score += 5;
    } else if arch.aliases().iter().any(|a| contains_token(&lower, a)) {
        score += 3;
    }

    let binary_lower = config.binary_name.to_ascii_lowercase();
    if contains_token_bounded(&lower, &binary_lower) {
        score += 3;
    }

    if config
        .archive_extensions
        .iter()
        .any(|ext| lower.ends_with(&ext.to_ascii_lowercase()))
    {
        score += 2;
    }

    score
}

/// Selects the single best-matching asset out of `assets`.
///
/// Deterministic and order-independent: shuffling `assets` yields the same
/// winner, or the same [`VouchError::AmbiguousAsset`].
pub fn select_asset<'a>(
    assets: &'a [Asset],
    config: &RepoConfig,
    platform: Platform,
) -> Result<&'a Asset> {
    let candidates: Vec<&Asset> = assets
        .iter()
        .filter(|a| !is_supplemental(&a.name))
        .collect();

    // Template pass: first configured pattern with a match wins outright,
    // in pattern order, then in listing order among assets.
    for template in &config.asset_patterns {
        let ctx = TemplateContext {
            binary_name: &config.binary_name,
            platform,
            asset_name: None,
            base: None,
        };
        let Ok(re) = compile_pattern(template, &ctx) else {
            continue;
        };
        if let Some(asset) = candidates.iter().find(|a| re.is_match(&a.name)) {
            return Ok(asset);
        }
    }

    // Heuristic scoring pass.
    let mut scored: Vec<(u32, &Asset)> = candidates
        .iter()
        .map(|a| (score_heuristic(a, config, platform), *a))
        .filter(|(score, _)| *score > 0)
        .collect();

    if scored.is_empty() {
        return Err(VouchError::NoMatchingAsset);
    }

    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.name.cmp(&b.1.name)));
    let top_score = scored[0].0;
    let winners: Vec<&Asset> = scored
        .iter()
        .filter(|(score, _)| *score == top_score)
        .map(|(_, a)| *a)
        .collect();

    if winners.len() > 1 {
        return Err(VouchError::AmbiguousAsset(
            winners[0].name.clone(),
            winners[1].name.clone(),
        ));
    }

    Ok(winners[0])
}
