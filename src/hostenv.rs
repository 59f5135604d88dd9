//! SPDX-License-Identifier: GPL-3.0-or-later
//!
//! Host environment probe (spec §4.13/C13): detects `noexec` mounts and
//! picks a writable staging directory, and classifies `EXDEV` so the
//! installer can fall back to copy-then-rename across mount boundaries.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Result, VouchError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPoint {
    pub device: String,
    pub mount_point: String,
    pub fs_type: String,
    pub options: Vec<String>,
}

/// Parses the `/proc/self/mounts` format: `device mount_point fs_type
/// options dump pass`, one entry per line.
pub fn parse_proc_mounts(contents: &str) -> Vec<MountPoint> {
    contents
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let device = fields.next()?.to_string();
            let mount_point = fields.next()?.to_string();
            let fs_type = fields.next()?.to_string();
            let options = fields.next()?.split(',').map(str::to_string).collect();
            Some(MountPoint {
                device,
                mount_point,
                fs_type,
                options,
            })
        })
        .collect()
}

/// Longest mount-point-prefix match, the same rule the kernel resolves a
/// path against.
pub fn find_mount<'a>(path: &Path, mounts: &'a [MountPoint]) -> Option<&'a MountPoint> {
    let path_str = path.to_string_lossy();
    mounts
        .iter()
        .filter(|m| path_str.starts_with(m.mount_point.as_str()))
        .max_by_key(|m| m.mount_point.len())
}

pub fn is_noexec(mount: &MountPoint) -> bool {
    mount.options.iter().any(|o| o == "noexec")
}

/// Rejects `path` if it resolves to a mount carrying the `noexec` option.
/// A path not covered by any parsed entry is assumed executable, matching
/// the common case of `/proc/self/mounts` omitting bind-mount overlaps.
pub fn check_not_noexec(path: &Path) -> Result<()> {
    let contents = fs::read_to_string("/proc/self/mounts")?;
    let mounts = parse_proc_mounts(&contents);
    if let Some(mount) = find_mount(path, &mounts) {
        if is_noexec(mount) {
            return Err(VouchError::NoExecMount(path.to_path_buf()));
        }
    }
    Ok(())
}

/// True when `err` is the kernel's cross-device-link error, the trigger for
/// the installer's copy-then-rename fallback.
pub fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EXDEV)
}

/// Confirms `dir` is writable by probing with a throwaway file, since a
/// read-only bind mount or a permission-denied directory look identical
/// from `stat` alone.
pub fn check_writable(dir: &Path) -> Result<()> {
    let probe = dir.join(format!(".vouch-probe-{}", std::process::id()));
    match fs::write(&probe, []) {
        Ok(()) => {
            let _ = fs::remove_file(&probe);
            Ok(())
        }
        Err(_) => Err(VouchError::DestinationNotWritable(dir.to_path_buf())),
    }
}

/// Picks the first of `candidates`, in order, that is both writable and not
/// mounted `noexec`.
pub fn pick_staging_dir(candidates: &[PathBuf]) -> Result<PathBuf> {
    let mut last_err = None;
    for candidate in candidates {
        if let Err(e) = check_writable(candidate) {
            last_err = Some(e);
            continue;
        }
        if let Err(e) = check_not_noexec(candidate) {
            last_err = Some(e);
            continue;
        }
        return Ok(candidate.clone());
    }
    Err(last_err.unwrap_or_else(|| VouchError::DestinationNotWritable(PathBuf::from("(no candidates)"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_proc_mounts_format() {
        let contents = "/dev/sda1 / ext4 rw,relatime 0 0\ntmpfs /tmp tmpfs rw,noexec,nosuid 0 0\n";
        let mounts = parse_proc_mounts(contents);
        assert_eq!(mounts.len(), 2);
        assert_eq!(mounts[1].mount_point, "/tmp");
        assert!(is_noexec(&mounts[1]));
        assert!(!is_noexec(&mounts[0]));
    }

    #[test]
    fn find_mount_prefers_longest_prefix() {
        let mounts = parse_proc_mounts(
            "/dev/sda1 / ext4 rw 0 0\n/dev/sda2 /home ext4 rw 0 0\n",
        );
        let found = find_mount(Path::new("/home/user/bin"), &mounts).unwrap();
        assert_eq!(found.mount_point, "/home");
    }

    #[test]
    fn writable_dir_passes_probe() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_writable(dir.path()).is_ok());
    }

    #[test]
    fn unwritable_dir_is_rejected() {
        let err = check_writable(Path::new("/proc/vouch-does-not-exist")).unwrap_err();
        assert!(matches!(err, VouchError::DestinationNotWritable(_)));
    }
}
