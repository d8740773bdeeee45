//! Host platform gate for the EDirect pipeline
//!
//! EDirect is a Unix toolchain. On Windows it runs through WSL; anywhere else
//! the client refuses before spawning anything.

use std::path::Path;

use crate::error::{PubMedError, Result};

/// How the EDirect binaries will be invoked on this host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    /// Linux or macOS: run the binaries directly
    Unix,
    /// Windows: delegate to WSL
    WindowsWsl,
}

impl HostPlatform {
    /// Detect the current host, failing for operating systems EDirect
    /// cannot run on.
    pub fn detect() -> Result<Self> {
        Self::from_os(std::env::consts::OS)
    }

    pub(crate) fn from_os(os: &str) -> Result<Self> {
        match os {
            "linux" | "macos" => Ok(Self::Unix),
            "windows" => Ok(Self::WindowsWsl),
            other => Err(PubMedError::UnsupportedPlatform {
                os: other.to_string(),
            }),
        }
    }
}

/// Translate a Windows path to its WSL mount point
/// (`C:\Users\me\edirect` becomes `/mnt/c/Users/me/edirect`).
pub(crate) fn to_wsl_path(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");

    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(drive), Some(':')) if drive.is_ascii_alphabetic() => {
            let rest: String = chars.collect();
            format!("/mnt/{}{}", drive.to_ascii_lowercase(), rest)
        }
        _ => raw,
    }
}
