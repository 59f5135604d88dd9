//! SPDX-License-Identifier: GPL-3.0-or-later
//!
//! PGP verification (spec §4.6.3): shells out to a system `gpg` binary
//! against a freshly created, scoped keyring directory so no caller's
//! default keyring is ever consulted or polluted.

use std::path::Path;
use std::process::{Command, Output};

use crate::error::{Result, VouchError};

/// Safety heuristic, not a hard protocol limit (spec §9 open question):
/// captured `gpg` output is truncated before being placed in any error
/// message, to keep key material that might leak into stderr out of logs.
pub const PGP_OUTPUT_TRUNCATION_LIMIT: usize = 2048;

fn fail(msg: String) -> VouchError {
    VouchError::PGPVerifyFailed(msg)
}

fn truncate_combined(output: &Output) -> String {
    let mut combined = Vec::with_capacity(output.stdout.len() + output.stderr.len());
    combined.extend_from_slice(&output.stdout);
    combined.extend_from_slice(&output.stderr);
    combined.truncate(PGP_OUTPUT_TRUNCATION_LIMIT);
    String::from_utf8_lossy(&combined).into_owned()
}

/// Verifies a detached signature `sig_path` over `asset_path` using the
/// public key at `public_key_path`. The keyring is created fresh in a
/// temporary directory and released when this function returns, on every
/// exit path, including early errors.
pub fn verify_pgp(asset_path: &Path, sig_path: &Path, public_key_path: &Path) -> Result<()> {
    let keyring_dir = tempfile::tempdir()?;

    let import = Command::new("gpg")
        .arg("--homedir")
        .arg(keyring_dir.path())
        .arg("--batch")
        .arg("--quiet")
        .arg("--import")
        .arg(public_key_path)
        .output()
        .map_err(|e| fail(format!("failed to invoke gpg for import: {e}")))?;

    if !import.status.success() {
        return Err(fail(truncate_combined(&import)));
    }

    let verify = Command::new("gpg")
        .arg("--homedir")
        .arg(keyring_dir.path())
        .arg("--batch")
        .arg("--verify")
        .arg(sig_path)
        .arg(asset_path)
        .output()
        .map_err(|e| fail(format!("failed to invoke gpg for verify: {e}")))?;

    if verify.status.success() {
        Ok(())
    } else {
        Err(fail(truncate_combined(&verify)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_combined_output_to_the_named_limit() {
        let output = Output {
            status: std::process::ExitStatus::default(),
            stdout: vec![b'a'; PGP_OUTPUT_TRUNCATION_LIMIT + 500],
            stderr: Vec::new(),
        };
        assert_eq!(truncate_combined(&output).len(), PGP_OUTPUT_TRUNCATION_LIMIT);
    }
}
