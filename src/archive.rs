//! SPDX-License-Identifier: GPL-3.0-or-later
//!
//! Archive extraction (spec §1's "deliberately out of scope" collaborator,
//! needed for a runnable tool): a thin dispatcher over `tar`+`flate2`/`xz2`/
//! `bzip2` and `zip`, selected by `RepoConfig.archive_format`.

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use crate::config::ArchiveFormat;
use crate::error::{Result, VouchError};

fn extract_tar(mut reader: impl Read, binary_name: &str, dest_dir: &Path) -> Result<PathBuf> {
    let mut archive = tar::Archive::new(&mut reader);
    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();
        let matches = path
            .file_name()
            .map(|n| n.to_string_lossy() == binary_name)
            .unwrap_or(false);
        if !matches {
            continue;
        }
        let dest = dest_dir.join(binary_name);
        entry.unpack(&dest)?;
        return Ok(dest);
    }
    Err(VouchError::Archive(format!(
        "no entry named {binary_name} found in archive"
    )))
}

fn extract_zip(bytes: &[u8], binary_name: &str, dest_dir: &Path) -> Result<PathBuf> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| VouchError::Archive(e.to_string()))?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| VouchError::Archive(e.to_string()))?;
        let matches = Path::new(file.name())
            .file_name()
            .map(|n| n.to_string_lossy() == binary_name)
            .unwrap_or(false);
        if !matches {
            continue;
        }
        let dest = dest_dir.join(binary_name);
        let mut out = fs::File::create(&dest)?;
        std::io::copy(&mut file, &mut out)?;
        return Ok(dest);
    }
    Err(VouchError::Archive(format!(
        "no entry named {binary_name} found in zip"
    )))
}

/// Extracts `binary_name` from `bytes` (interpreted per `format`) into
/// `dest_dir`, returning the extracted file's path. Permission bits are the
/// caller's concern (the installer sets the executable bit atomically).
pub fn extract(bytes: &[u8], format: ArchiveFormat, binary_name: &str, dest_dir: &Path) -> Result<PathBuf> {
    match format {
        ArchiveFormat::Tar => extract_tar(Cursor::new(bytes), binary_name, dest_dir),
        ArchiveFormat::TarGz => {
            extract_tar(flate2::read::GzDecoder::new(Cursor::new(bytes)), binary_name, dest_dir)
        }
        ArchiveFormat::TarXz => {
            extract_tar(xz2::read::XzDecoder::new(Cursor::new(bytes)), binary_name, dest_dir)
        }
        ArchiveFormat::TarBz2 => {
            extract_tar(bzip2::read::BzDecoder::new(Cursor::new(bytes)), binary_name, dest_dir)
        }
        ArchiveFormat::Zip => extract_zip(bytes, binary_name, dest_dir),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_tar_gz(entry_name: &str, content: &[u8]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, entry_name, content).unwrap();
        let tar_bytes = builder.into_inner().unwrap();

        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        std::io::Write::write_all(&mut encoder, &tar_bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn extracts_named_binary_from_tar_gz() {
        let bytes = make_tar_gz("tool", b"#!/bin/sh\necho hi\n");
        let dest = tempfile::tempdir().unwrap();
        let path = extract(&bytes, ArchiveFormat::TarGz, "tool", dest.path()).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"#!/bin/sh\necho hi\n");
    }

    #[test]
    fn missing_entry_is_an_error() {
        let bytes = make_tar_gz("other", b"data");
        let dest = tempfile::tempdir().unwrap();
        assert!(extract(&bytes, ArchiveFormat::TarGz, "tool", dest.path()).is_err());
    }
}
