//! EDirect toolkit provisioning
//!
//! Downloads and unpacks the NCBI Entrez Direct archives into a local folder
//! so [`EDirectClient`](crate::EDirectClient) has binaries to run. Preparing
//! an already-provisioned folder is a no-op.

use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use futures_util::StreamExt;
use reqwest::Client;
use tar::Archive;
use tokio::{fs as tokio_fs, io::AsyncWriteExt};
use tracing::{debug, info, instrument};

use crate::error::{PubMedError, Result};

const DEFAULT_ARCHIVE_BASE_URL: &str = "https://ftp.ncbi.nlm.nih.gov/entrez/entrezdirect";
const EDIRECT_ARCHIVE: &str = "edirect.tar.gz";
const XTRACT_ARCHIVE: &str = "xtract.Linux.gz";

/// Idempotent installer for the Entrez Direct toolkit.
///
/// # Example
///
/// ```no_run
/// use pubmed_tools::EDirectInstaller;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let installer = EDirectInstaller::new();
///     installer.prepare("/opt/edirect").await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct EDirectInstaller {
    client: Client,
    archive_base_url: String,
}

impl EDirectInstaller {
    /// Installer fetching from the NCBI archive host
    pub fn new() -> Self {
        Self::with_archive_base_url(DEFAULT_ARCHIVE_BASE_URL)
    }

    /// Installer fetching from a different host (used by tests)
    pub fn with_archive_base_url(archive_base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            archive_base_url: archive_base_url.into(),
        }
    }

    /// Ensure the EDirect binaries exist in `install_dir`.
    ///
    /// When `<install_dir>/esearch` is already present this returns
    /// immediately without touching the network. Otherwise it downloads the
    /// EDirect archive and the `xtract` binary, unpacks both into
    /// `install_dir`, and removes the downloaded archives.
    #[instrument(skip(self, install_dir), fields(dir = %install_dir.as_ref().display()))]
    pub async fn prepare<P: AsRef<Path>>(&self, install_dir: P) -> Result<()> {
        let dir = install_dir.as_ref();

        if dir.join("esearch").is_file() {
            info!("EDirect already present, nothing to do");
            return Ok(());
        }

        info!("Downloading and extracting EDirect");
        tokio_fs::create_dir_all(dir)
            .await
            .map_err(|e| PubMedError::IoError {
                message: format!("Failed to create {}: {e}", dir.display()),
            })?;

        // The main toolkit: a tar.gz whose entries live under "edirect/"
        let archive_path = dir.join(EDIRECT_ARCHIVE);
        self.download_to(EDIRECT_ARCHIVE, &archive_path).await?;
        extract_edirect_archive(&archive_path, dir)?;
        tokio_fs::remove_file(&archive_path)
            .await
            .map_err(|e| PubMedError::IoError {
                message: format!("Failed to remove {}: {e}", archive_path.display()),
            })?;

        // The xtract helper ships separately as a gzipped binary
        let xtract_gz_path = dir.join(XTRACT_ARCHIVE);
        self.download_to(XTRACT_ARCHIVE, &xtract_gz_path).await?;
        let xtract_path = dir.join("xtract");
        gunzip_to(&xtract_gz_path, &xtract_path)?;
        mark_executable(&xtract_path)?;
        tokio_fs::remove_file(&xtract_gz_path)
            .await
            .map_err(|e| PubMedError::IoError {
                message: format!("Failed to remove {}: {e}", xtract_gz_path.display()),
            })?;

        info!("EDirect ready");
        Ok(())
    }

    /// Stream an archive from the base URL to a local file
    async fn download_to(&self, archive_name: &str, dest: &Path) -> Result<()> {
        let url = format!("{}/{archive_name}", self.archive_base_url);
        debug!("Downloading {url}");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(PubMedError::ApiError {
                status: response.status().as_u16(),
                message: format!("Failed to download {url}"),
            });
        }

        let mut file = tokio_fs::File::create(dest)
            .await
            .map_err(|e| PubMedError::IoError {
                message: format!("Failed to create {}: {e}", dest.display()),
            })?;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(PubMedError::from)?;
            file.write_all(&chunk)
                .await
                .map_err(|e| PubMedError::IoError {
                    message: format!("Failed to write {}: {e}", dest.display()),
                })?;
        }

        file.flush().await.map_err(|e| PubMedError::IoError {
            message: format!("Failed to flush {}: {e}", dest.display()),
        })?;

        debug!("Downloaded to {}", dest.display());
        Ok(())
    }
}

impl Default for EDirectInstaller {
    fn default() -> Self {
        Self::new()
    }
}

/// Unpack the EDirect tar.gz into `dest`, stripping the leading `edirect/`
/// path component so the binaries land directly in the install folder.
fn extract_edirect_archive(archive_path: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let tar_file = File::open(archive_path).map_err(|e| PubMedError::IoError {
        message: format!("Failed to open {}: {e}", archive_path.display()),
    })?;

    let mut archive = Archive::new(GzDecoder::new(tar_file));
    let mut extracted = Vec::new();

    for entry in archive.entries().map_err(|e| PubMedError::IoError {
        message: format!("Failed to read archive entries: {e}"),
    })? {
        let mut entry = entry.map_err(|e| PubMedError::IoError {
            message: format!("Failed to read archive entry: {e}"),
        })?;

        let path = entry
            .path()
            .map_err(|e| PubMedError::IoError {
                message: format!("Failed to read entry path: {e}"),
            })?
            .into_owned();

        let stripped = path.strip_prefix("edirect").unwrap_or(&path);
        if stripped.as_os_str().is_empty() {
            continue;
        }

        let output_path = dest.join(stripped);
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PubMedError::IoError {
                message: format!("Failed to create {}: {e}", parent.display()),
            })?;
        }

        entry
            .unpack(&output_path)
            .map_err(|e| PubMedError::IoError {
                message: format!("Failed to extract {}: {e}", output_path.display()),
            })?;

        debug!("Extracted {}", output_path.display());
        extracted.push(output_path);
    }

    Ok(extracted)
}

/// Decompress a single gzipped file
fn gunzip_to(src: &Path, dest: &Path) -> Result<()> {
    let gz_file = File::open(src).map_err(|e| PubMedError::IoError {
        message: format!("Failed to open {}: {e}", src.display()),
    })?;
    let mut decoder = GzDecoder::new(gz_file);

    let mut out = File::create(dest).map_err(|e| PubMedError::IoError {
        message: format!("Failed to create {}: {e}", dest.display()),
    })?;

    std::io::copy(&mut decoder, &mut out).map_err(|e| PubMedError::IoError {
        message: format!("Failed to decompress {}: {e}", src.display()),
    })?;

    Ok(())
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(|e| {
        PubMedError::IoError {
            message: format!("Failed to set permissions on {}: {e}", path.display()),
        }
    })
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_gunzip_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let gz_path = dir.path().join("data.gz");
        let out_path = dir.path().join("data");

        let mut encoder = GzEncoder::new(File::create(&gz_path).unwrap(), Compression::default());
        encoder.write_all(b"xtract binary contents").unwrap();
        encoder.finish().unwrap();

        gunzip_to(&gz_path, &out_path).unwrap();
        assert_eq!(
            std::fs::read(&out_path).unwrap(),
            b"xtract binary contents"
        );
    }

    #[test]
    fn test_extract_strips_leading_component() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("edirect.tar.gz");

        let encoder = GzEncoder::new(File::create(&archive_path).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let script = b"#!/bin/sh\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(script.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header.clone(), "edirect/esearch", &script[..])
            .unwrap();
        builder
            .append_data(&mut header, "edirect/efetch", &script[..])
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let extracted = extract_edirect_archive(&archive_path, dir.path()).unwrap();
        assert_eq!(extracted.len(), 2);
        assert!(dir.path().join("esearch").is_file());
        assert!(dir.path().join("efetch").is_file());
        assert!(!dir.path().join("edirect").exists());
    }
}
