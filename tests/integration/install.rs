//! Install pipeline tests.

use crate::common::{ARTIFACT_URL, FakeDownloader, FakeResolver, release_for};
use iris_installer::core::IrisError;
use iris_installer::upgrade::{ArtifactInstaller, Installer, ReleaseInfo};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tempfile::TempDir;

const PAYLOAD: &[u8] = b"PK\x03\x04 pretend this is an apk";

fn artifact_path(temp: &TempDir) -> PathBuf {
    temp.path().join("Iris.apk")
}

fn installer(
    temp: &TempDir,
    resolver: FakeResolver,
    downloader: FakeDownloader,
) -> Installer<FakeResolver, FakeDownloader> {
    Installer::new(resolver, downloader, artifact_path(temp), "Iris.apk")
}

fn root_cause(err: &anyhow::Error) -> Option<&IrisError> {
    err.downcast_ref::<IrisError>()
}

#[tokio::test]
async fn test_install_with_matching_digest() {
    let temp = TempDir::new().unwrap();
    let installer = installer(
        &temp,
        FakeResolver::returning(release_for(PAYLOAD)),
        FakeDownloader::returning(PAYLOAD),
    );

    let release = installer.install().await.unwrap();

    assert_eq!(release.display_name, "Iris v1.0.0");
    assert_eq!(std::fs::read(artifact_path(&temp)).unwrap(), PAYLOAD);
    assert!(!temp.path().join("Iris.apk.tmp").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_installed_artifact_is_read_execute_only() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let installer = installer(
        &temp,
        FakeResolver::returning(release_for(PAYLOAD)),
        FakeDownloader::returning(PAYLOAD),
    );
    installer.install().await.unwrap();

    let mode = std::fs::metadata(artifact_path(&temp)).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o555);
}

#[tokio::test]
async fn test_install_replaces_previous_artifact() {
    let temp = TempDir::new().unwrap();
    let first = installer(
        &temp,
        FakeResolver::returning(release_for(b"old release")),
        FakeDownloader::returning(b"old release"),
    );
    first.install().await.unwrap();

    let second = installer(
        &temp,
        FakeResolver::returning(release_for(PAYLOAD)),
        FakeDownloader::returning(PAYLOAD),
    );
    second.install().await.unwrap();

    assert_eq!(std::fs::read(artifact_path(&temp)).unwrap(), PAYLOAD);
}

#[tokio::test]
async fn test_digest_mismatch_leaves_existing_artifact() {
    let temp = TempDir::new().unwrap();
    std::fs::write(artifact_path(&temp), b"previous install").unwrap();

    let installer = installer(
        &temp,
        FakeResolver::returning(release_for(b"something else entirely")),
        FakeDownloader::returning(PAYLOAD),
    );

    let err = installer.install().await.unwrap_err();
    match root_cause(&err) {
        Some(IrisError::DigestMismatch { expected, actual }) => {
            assert_eq!(expected, &release_for(b"something else entirely").digest);
            assert_eq!(actual, &release_for(PAYLOAD).digest);
        }
        other => panic!("Expected DigestMismatch, got {other:?}"),
    }
    assert_eq!(std::fs::read(artifact_path(&temp)).unwrap(), b"previous install");
}

#[tokio::test]
async fn test_digest_mismatch_with_no_artifact_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let installer = installer(
        &temp,
        FakeResolver::returning(release_for(b"something else entirely")),
        FakeDownloader::returning(PAYLOAD),
    );

    assert!(installer.install().await.is_err());
    assert!(!installer.is_installed());
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_empty_download_fails_before_verification() {
    let temp = TempDir::new().unwrap();
    // A digest this installer cannot read would fail verification first
    let release = ReleaseInfo {
        digest: "md5:d41d8cd98f00b204e9800998ecf8427e".to_string(),
        ..release_for(b"")
    };
    let installer = installer(&temp, FakeResolver::returning(release), FakeDownloader::returning(b""));

    let err = installer.install().await.unwrap_err();
    match root_cause(&err) {
        Some(IrisError::EmptyArtifact { url }) => assert_eq!(url, ARTIFACT_URL),
        other => panic!("Expected EmptyArtifact, got {other:?}"),
    }
    assert!(!installer.is_installed());
}

#[tokio::test]
async fn test_unsupported_digest_format() {
    let temp = TempDir::new().unwrap();
    let release = ReleaseInfo {
        digest: "sha512:abcdef".to_string(),
        ..release_for(PAYLOAD)
    };
    let installer =
        installer(&temp, FakeResolver::returning(release), FakeDownloader::returning(PAYLOAD));

    let err = installer.install().await.unwrap_err();
    assert!(matches!(root_cause(&err), Some(IrisError::UnsupportedDigestFormat { .. })));
    assert!(!installer.is_installed());
}

#[tokio::test]
async fn test_missing_artifact_stops_before_download() {
    let temp = TempDir::new().unwrap();
    let resolver = FakeResolver::failing(IrisError::ArtifactNotFound {
        name: "Iris.apk".to_string(),
    });
    let downloader = FakeDownloader::returning(PAYLOAD);
    let installer = Installer::new(&resolver, &downloader, artifact_path(&temp), "Iris.apk");

    let err = installer.install().await.unwrap_err();

    assert!(matches!(root_cause(&err), Some(IrisError::ArtifactNotFound { .. })));
    assert!(format!("{err:#}").starts_with("Failed to resolve the latest release"));
    assert_eq!(downloader.calls.load(Ordering::SeqCst), 0);
    assert!(!installer.is_installed());
}

#[tokio::test]
async fn test_download_failure_is_wrapped() {
    let temp = TempDir::new().unwrap();
    let installer = installer(
        &temp,
        FakeResolver::returning(release_for(PAYLOAD)),
        FakeDownloader::failing(IrisError::UnexpectedStatus {
            url: ARTIFACT_URL.to_string(),
            status: 404,
        }),
    );

    let err = installer.install().await.unwrap_err();

    assert!(matches!(root_cause(&err), Some(IrisError::UnexpectedStatus { status: 404, .. })));
    assert_eq!(err.to_string(), "Failed to download Iris.apk");
}

#[tokio::test]
async fn test_resolves_and_downloads_exactly_once() {
    let temp = TempDir::new().unwrap();
    let resolver = FakeResolver::returning(release_for(PAYLOAD));
    let downloader = FakeDownloader::returning(PAYLOAD);
    let installer = Installer::new(&resolver, &downloader, artifact_path(&temp), "Iris.apk");

    installer.install().await.unwrap();

    assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    assert_eq!(downloader.calls.load(Ordering::SeqCst), 1);
    assert_eq!(downloader.last_url.lock().unwrap().as_deref(), Some(ARTIFACT_URL));
}
