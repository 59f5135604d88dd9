//! SPDX-License-Identifier: GPL-3.0-or-later
//!
//! Atomic install (spec §1's "deliberately out of scope" collaborator,
//! needed for a runnable tool): write-to-temp-then-rename on the same
//! filesystem, falling back to byte-copy + rename on `EXDEV` (spec §5).

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::hostenv;

/// Installs `bytes` at `dest`, executable, atomically with respect to any
/// concurrent reader of `dest`. `staging_dir` should have already passed
/// [`hostenv::pick_staging_dir`].
pub fn install_executable(bytes: &[u8], dest: &Path, staging_dir: &Path) -> Result<()> {
    let tmp = staging_dir.join(format!(".vouch-install-{}", std::process::id()));
    fs::write(&tmp, bytes)?;
    fs::set_permissions(&tmp, fs::Permissions::from_mode(0o755))?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    match fs::rename(&tmp, dest) {
        Ok(()) => Ok(()),
        Err(e) if hostenv::is_cross_device(&e) => copy_then_rename(&tmp, dest),
        Err(e) => Err(e.into()),
    }
}

/// `EXDEV` fallback: copy the staged file onto the destination's own
/// filesystem under a sibling temp name, then rename within that
/// filesystem, and finally remove the original staged copy.
fn copy_then_rename(staged: &Path, dest: &Path) -> Result<()> {
    let sibling_tmp = sibling_temp_path(dest);
    fs::copy(staged, &sibling_tmp)?;
    fs::set_permissions(&sibling_tmp, fs::Permissions::from_mode(0o755))?;
    let rename_result = fs::rename(&sibling_tmp, dest);
    let _ = fs::remove_file(staged);
    Ok(rename_result?)
}

fn sibling_temp_path(dest: &Path) -> PathBuf {
    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    let name = dest
        .file_name()
        .map(|n| format!(".{}.vouch-tmp-{}", n.to_string_lossy(), std::process::id()))
        .unwrap_or_else(|| format!(".vouch-tmp-{}", std::process::id()));
    parent.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installs_executable_bytes_atomically() {
        let staging = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let dest = dest_dir.path().join("tool");

        install_executable(b"#!/bin/sh\necho hi\n", &dest, staging.path()).unwrap();

        let meta = fs::metadata(&dest).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o755);
        assert_eq!(fs::read(&dest).unwrap(), b"#!/bin/sh\necho hi\n");
    }

    #[test]
    fn creates_missing_destination_parent_directories() {
        let staging = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let dest = dest_dir.path().join("nested").join("tool");

        install_executable(b"data", &dest, staging.path()).unwrap();
        assert!(dest.exists());
    }
}
