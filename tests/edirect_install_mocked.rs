//! Mocked archive-host tests for the EDirect installer
//!
//! A wiremock server serves a miniature `edirect.tar.gz` and `xtract.Linux.gz`
//! built in-test, so provisioning runs end to end without NCBI. Download
//! expectations verify idempotency: an already-prepared folder triggers no
//! network traffic.

use std::fs;
use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use pubmed_tools::EDirectInstaller;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A tar.gz holding stub binaries under the `edirect/` prefix, as NCBI ships it
fn edirect_archive() -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let script = b"#!/bin/sh\n";
    for name in ["edirect/esearch", "edirect/efetch", "edirect/nquire"] {
        let mut header = tar::Header::new_gnu();
        header.set_size(script.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, name, &script[..]).unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}

/// A gzipped stand-in for the xtract binary
fn xtract_archive() -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"xtract binary").unwrap();
    encoder.finish().unwrap()
}

async fn mount_archives(server: &MockServer, expected_downloads: u64) {
    Mock::given(method("GET"))
        .and(path("/edirect.tar.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(edirect_archive()))
        .expect(expected_downloads)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/xtract.Linux.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(xtract_archive()))
        .expect(expected_downloads)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_prepare_downloads_and_extracts_the_toolkit() {
    let server = MockServer::start().await;
    mount_archives(&server, 1).await;

    let dir = TempDir::new().unwrap();
    let install_dir = dir.path().join("edirect");

    let installer = EDirectInstaller::with_archive_base_url(server.uri());
    installer.prepare(&install_dir).await.unwrap();

    // Binaries land directly in the install folder, not under edirect/edirect
    for name in ["esearch", "efetch", "nquire", "xtract"] {
        assert!(install_dir.join(name).is_file(), "missing {name}");
    }
    assert!(!install_dir.join("edirect").exists());
    assert_eq!(fs::read(install_dir.join("xtract")).unwrap(), b"xtract binary");

    // Downloaded archives are cleaned up
    assert!(!install_dir.join("edirect.tar.gz").exists());
    assert!(!install_dir.join("xtract.Linux.gz").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_extracted_binaries_are_executable() {
    use std::os::unix::fs::PermissionsExt;

    let server = MockServer::start().await;
    mount_archives(&server, 1).await;

    let dir = TempDir::new().unwrap();
    let installer = EDirectInstaller::with_archive_base_url(server.uri());
    installer.prepare(dir.path()).await.unwrap();

    for name in ["esearch", "xtract"] {
        let mode = fs::metadata(dir.path().join(name)).unwrap().permissions().mode();
        assert_ne!(mode & 0o111, 0, "{name} is not executable");
    }
}

#[tokio::test]
async fn test_prepare_twice_downloads_only_once() {
    let server = MockServer::start().await;
    // The expect(1) mocks fail the test if the second run downloads anything
    mount_archives(&server, 1).await;

    let dir = TempDir::new().unwrap();
    let installer = EDirectInstaller::with_archive_base_url(server.uri());

    installer.prepare(dir.path()).await.unwrap();
    installer.prepare(dir.path()).await.unwrap();

    assert!(dir.path().join("esearch").is_file());
}

#[tokio::test]
async fn test_prepare_is_a_noop_when_toolkit_is_already_present() {
    let server = MockServer::start().await;
    mount_archives(&server, 0).await;

    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("esearch"), "#!/bin/sh\n").unwrap();

    let installer = EDirectInstaller::with_archive_base_url(server.uri());
    installer.prepare(dir.path()).await.unwrap();
}

#[tokio::test]
async fn test_download_failure_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/edirect.tar.gz"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let installer = EDirectInstaller::with_archive_base_url(server.uri());
    let result = installer.prepare(dir.path()).await;

    assert!(matches!(
        result,
        Err(pubmed_tools::PubMedError::ApiError { status: 404, .. })
    ));
}
