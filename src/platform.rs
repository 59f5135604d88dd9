//! SPDX-License-Identifier: GPL-3.0-or-later
//!
//! Canonical OS/arch tokens and their alias sets (spec §3).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsToken {
    Linux,
    Darwin,
    Windows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchToken {
    Amd64,
    Arm64,
    I386,
}

impl OsToken {
    pub fn canonical(self) -> &'static str {
        match self {
            OsToken::Linux => "linux",
            OsToken::Darwin => "darwin",
            OsToken::Windows => "windows",
        }
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            OsToken::Linux => &[],
            OsToken::Darwin => &["macos", "macosx", "osx", "apple"],
            OsToken::Windows => &["win", "win32", "win64", "mingw"],
        }
    }

    pub fn from_go_os(&self) -> &'static str {
        // Go's GOOS spelling, used by the {{goos}} family of template tokens.
        match self {
            OsToken::Linux => "linux",
            OsToken::Darwin => "darwin",
            OsToken::Windows => "windows",
        }
    }
}

impl ArchToken {
    pub fn canonical(self) -> &'static str {
        match self {
            ArchToken::Amd64 => "amd64",
            ArchToken::Arm64 => "arm64",
            ArchToken::I386 => "386",
        }
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            ArchToken::Amd64 => &["x86_64", "x64"],
            ArchToken::Arm64 => &["aarch64"],
            ArchToken::I386 => &["x86", "i386", "i686"],
        }
    }

    pub fn from_go_arch(&self) -> &'static str {
        match self {
            ArchToken::Amd64 => "amd64",
            ArchToken::Arm64 => "arm64",
            ArchToken::I386 => "386",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: OsToken,
    pub arch: ArchToken,
}

impl Platform {
    /// Detect from `std::env::consts`, the same source the teacher tool used
    /// for its own-architecture lookups.
    pub fn detect() -> Option<Self> {
        let os = match std::env::consts::OS {
            "linux" => OsToken::Linux,
            "macos" => OsToken::Darwin,
            "windows" => OsToken::Windows,
            _ => return None,
        };
        let arch = match std::env::consts::ARCH {
            "x86_64" => ArchToken::Amd64,
            "aarch64" => ArchToken::Arm64,
            "x86" => ArchToken::I386,
            _ => return None,
        };
        Some(Platform { os, arch })
    }
}
