//! SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;

use docopt::Docopt;
use serde::Deserialize;

use vouch::assess;
use vouch::cache::Cache;
use vouch::config::{RepoConfig, RepoConfigOverride};
use vouch::error::VouchError;
use vouch::hostenv;
use vouch::install;
use vouch::model::ProvenanceAsset;
use vouch::platform::Platform;
use vouch::provenance::{self, ProvenanceInputs};
use vouch::release_source::GitHubReleaseSource;
use vouch::urlgate::UrlGateConfig;
use vouch::workflow::{self, Flags};
use vouch::archive;

const USAGE: &str = r#"
vouch: a verifiable, auditable replacement for `curl | sh` release installers.

Usage:
  vouch <repo> <tag> [--binary-name NAME] [--install PATH] [--provenance PATH]
        [--hash-algo ALGO] [--github-token TOKEN] [--github-timeout-secs N]
        [--insecure] [--skip-sig] [--skip-checksum] [--require-minisign]
        [--prefer-per-asset] [--trust-minimum N] [--allow-http]
        [--follow-redirects] [--max-redirects N] [--allow-unknown-content-type]
        [--dry-run]
  vouch (--help | -h)
  vouch (--version | -v)

Arguments:
  <repo>                        GitHub repository in "owner/name" form.
  <tag>                          Release tag, or `latest`.

Options:
  --binary-name NAME            Binary name to select/extract [default: derived from repo].
  --install PATH                Install the extracted binary to PATH.
  --provenance PATH             Write the provenance JSON record to PATH.
  --hash-algo ALGO               sha256 or sha512 [default: sha256].
  --github-token TOKEN          GitHub API token (falls back to $GITHUB_TOKEN).
  --github-timeout-secs N        HTTP timeout seconds [default: 20].
  --insecure                    Bypass verification entirely; authenticity unproven.
  --skip-sig                    Skip signature verification.
  --skip-checksum                Skip checksum verification.
  --require-minisign             Fail unless the verified path used minisign.
  --prefer-per-asset              Invert the checksum-signature-vs-signature preference.
  --trust-minimum N               Fail if the computed trust score is below N [default: 0].
  --allow-http                   Allow plain HTTP downloads.
  --follow-redirects              Follow redirects (bounded, credential-stripped per hop).
  --max-redirects N                Maximum redirect hops [default: 5].
  --allow-unknown-content-type    Skip the Content-Type allow-list check.
  --dry-run                     Plan the run without downloading or installing the asset.
  --version, -v                  Show tool version.
  --help, -h                     Show this screen.
"#;

#[derive(Debug, Deserialize)]
struct Args {
    arg_repo: String,
    arg_tag: String,
    flag_binary_name: Option<String>,
    flag_install: Option<String>,
    flag_provenance: Option<String>,
    flag_hash_algo: String,
    flag_github_token: Option<String>,
    flag_github_timeout_secs: u64,
    flag_insecure: bool,
    flag_skip_sig: bool,
    flag_skip_checksum: bool,
    flag_require_minisign: bool,
    flag_prefer_per_asset: bool,
    flag_trust_minimum: u8,
    flag_allow_http: bool,
    flag_follow_redirects: bool,
    flag_max_redirects: usize,
    flag_allow_unknown_content_type: bool,
    flag_dry_run: bool,
}

fn main() {
    env_logger::init();

    let version = format!("{}, version: {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let args: Args = Docopt::new(USAGE)
        .map(|d| d.help(true))
        .map(|d| d.version(Some(version)))
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    std::process::exit(run(&args));
}

fn binary_name_from_repo(owner_repo: &str) -> &str {
    owner_repo.rsplit('/').next().unwrap_or(owner_repo)
}

fn hash_algo_from_flag(flag: &str) -> Result<vouch::model::HashAlgo, ()> {
    match flag.to_ascii_lowercase().as_str() {
        "sha256" => Ok(vouch::model::HashAlgo::Sha256),
        "sha512" => Ok(vouch::model::HashAlgo::Sha512),
        _ => Err(()),
    }
}

fn run(args: &Args) -> i32 {
    let Ok(hash_algo) = hash_algo_from_flag(&args.flag_hash_algo) else {
        eprintln!("error: --hash-algo must be sha256 or sha512");
        return 1;
    };

    let binary_name = args
        .flag_binary_name
        .clone()
        .unwrap_or_else(|| binary_name_from_repo(&args.arg_repo).to_string());

    let config = RepoConfig::defaults(&binary_name).merge(RepoConfigOverride {
        hash_algo: Some(hash_algo),
        ..Default::default()
    });

    let Some(platform) = Platform::detect() else {
        eprintln!("error: unsupported platform {}/{}", std::env::consts::OS, std::env::consts::ARCH);
        return 1;
    };

    let github_token = args.flag_github_token.clone().or_else(|| std::env::var("GITHUB_TOKEN").ok());
    let source = match GitHubReleaseSource::new(args.flag_github_timeout_secs, github_token, "vouch") {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };

    let gate = UrlGateConfig {
        allow_http: args.flag_allow_http,
        follow_redirects: args.flag_follow_redirects,
        max_redirects: args.flag_max_redirects,
        allow_unknown_content_type: args.flag_allow_unknown_content_type,
    };

    let flags = Flags {
        insecure: args.flag_insecure,
        skip_sig: args.flag_skip_sig,
        skip_checksum: args.flag_skip_checksum,
        require_minisign: args.flag_require_minisign,
        prefer_per_asset: args.flag_prefer_per_asset,
        trust_minimum: args.flag_trust_minimum,
    };

    if args.flag_dry_run {
        return run_dry(&source, args, &config, platform, &gate, &flags);
    }

    run_live(&source, args, &config, platform, &gate, &flags)
}

fn run_dry(
    source: &GitHubReleaseSource,
    args: &Args,
    config: &RepoConfig,
    platform: Platform,
    gate: &UrlGateConfig,
    flags: &Flags,
) -> i32 {
    match assess::assess(source, &args.arg_repo, &args.arg_tag, config, platform, gate, flags) {
        Ok(plan) => {
            println!("release    : {}", plan.release_tag);
            println!("asset      : {}", plan.asset.name);
            println!("workflow   : {}", plan.workflow);
            println!("signature  : {:?}", plan.signature_status);
            println!("checksum   : {:?}", plan.checksum_status);
            println!("trust      : {} ({:?})", plan.trust.score, plan.trust.level);
            for warning in &plan.warnings {
                println!("warning    : {warning}");
            }
            0
        }
        Err(err) => {
            eprintln!("error: {err}");
            exit_code_for(&err.source)
        }
    }
}

fn run_live(
    source: &GitHubReleaseSource,
    args: &Args,
    config: &RepoConfig,
    platform: Platform,
    gate: &UrlGateConfig,
    flags: &Flags,
) -> i32 {
    let cache = Cache::at(std::env::temp_dir().join("vouch-cache"));
    let outcome = match workflow::run_pipeline(source, &args.arg_repo, &args.arg_tag, config, platform, gate, flags, Some(&cache)) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("error: {err}");
            return exit_code_for(&err.source);
        }
    };

    println!("release    : {}", outcome.release_tag);
    println!("asset      : {}", outcome.asset.name);
    println!("workflow   : {}", outcome.workflow);
    println!("sha256     : {}", outcome.asset_sha256);
    println!("signature  : {:?}", outcome.signature_status);
    println!("checksum   : {:?}", outcome.checksum_status);
    println!("trust      : {} ({:?})", outcome.trust.score, outcome.trust.level);
    for factor in &outcome.trust.factors {
        println!("  factor   : {:+} {} ({})", factor.delta, factor.name, factor.note);
    }
    for warning in &outcome.warnings {
        println!("warning    : {warning}");
    }

    if let Some(path) = &args.flag_provenance {
        let timestamp = humantime_like_now();
        let record = provenance::build_record(ProvenanceInputs {
            source: &args.arg_repo,
            release: &outcome.release_tag,
            asset: ProvenanceAsset {
                name: outcome.asset.name.clone(),
                size: outcome.asset.size,
                url: outcome.asset.download_url.clone(),
                sha256: Some(outcome.asset_sha256.clone()),
            },
            workflow: &outcome.workflow.to_string(),
            signature_status: outcome.signature_status,
            checksum_status: outcome.checksum_status,
            trust: outcome.trust.clone(),
            warnings: outcome.warnings.clone(),
            redirect_chain: outcome.redirect_chain.clone(),
            timestamp_iso8601: timestamp,
        });
        if let Err(e) = provenance::write_provenance(&PathBuf::from(path), &record) {
            eprintln!("error: failed to write provenance: {e}");
            return 1;
        }
    }

    if let Some(dest) = &args.flag_install {
        if let Err(code) = install_binary(&outcome, config, dest) {
            return code;
        }
    }

    0
}

fn install_binary(outcome: &workflow::PipelineOutcome, config: &RepoConfig, dest: &str) -> Result<(), i32> {
    let staging_candidates = vec![std::env::temp_dir()];
    let staging_dir = hostenv::pick_staging_dir(&staging_candidates).map_err(|e| {
        eprintln!("error: {e}");
        1
    })?;

    let extract_dir = tempfile::tempdir().map_err(|e| {
        eprintln!("error: {e}");
        1
    })?;

    let extracted = if config.asset_type == vouch::config::AssetType::Archive {
        archive::extract(&outcome.asset_bytes, config.archive_format, &config.binary_name, extract_dir.path())
            .map_err(|e| {
                eprintln!("error: {e}");
                1
            })?
    } else {
        // Raw/package assets are installed verbatim: the downloaded bytes
        // already are the binary.
        let path = extract_dir.path().join(&config.binary_name);
        std::fs::write(&path, &outcome.asset_bytes).map_err(|e| {
            eprintln!("error: {e}");
            1
        })?;
        path
    };

    let bytes = std::fs::read(&extracted).map_err(|e| {
        eprintln!("error: {e}");
        1
    })?;

    install::install_executable(&bytes, std::path::Path::new(dest), &staging_dir).map_err(|e| {
        eprintln!("error: failed to install: {e}");
        1
    })?;

    println!("installed  : {dest}");
    Ok(())
}

/// Exit codes per spec §6: selection/I-O failures are generic (1), a failed
/// cryptographic check is 2, a policy/gating failure is 3, and a URL-safety
/// rejection is 4.
fn exit_code_for(err: &VouchError) -> i32 {
    match err {
        VouchError::MinisignVerifyFailed(_)
        | VouchError::PGPVerifyFailed(_)
        | VouchError::Ed25519VerifyFailed
        | VouchError::ChecksumMismatch { .. } => 2,

        VouchError::MinisignRequired | VouchError::ChecksumRequiredForNonMinisign | VouchError::TrustBelowMinimum { .. } => 3,

        VouchError::HTTPNotAllowed(_)
        | VouchError::RedirectRefused(_)
        | VouchError::TooManyRedirects(_)
        | VouchError::DisallowedContentType(_) => 4,

        _ => 1,
    }
}

/// A fixed-format UTC timestamp without reaching for a clock dependency the
/// teacher's own stack doesn't carry for this purpose; `chrono` is already a
/// dependency for release-date parsing, so its `Utc::now` is the natural
/// source here.
fn humantime_like_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_name_derives_from_repo_slug() {
        assert_eq!(binary_name_from_repo("example/tool"), "tool");
        assert_eq!(binary_name_from_repo("tool"), "tool");
    }

    #[test]
    fn hash_algo_flag_rejects_unknown_values() {
        assert!(hash_algo_from_flag("sha256").is_ok());
        assert!(hash_algo_from_flag("sha1").is_err());
    }

    #[test]
    fn exit_code_mapping_matches_spec_buckets() {
        assert_eq!(exit_code_for(&VouchError::ChecksumMismatch {
            asset: "a".to_string(),
            expected: "x".to_string(),
            actual: "y".to_string(),
        }), 2);
        assert_eq!(exit_code_for(&VouchError::MinisignRequired), 3);
        assert_eq!(exit_code_for(&VouchError::HTTPNotAllowed("x".to_string())), 4);
        assert_eq!(exit_code_for(&VouchError::NoMatchingAsset), 1);
    }
}
