//! HTTP archive downloads.
//!
//! Downloads stream to `<name>.part` next to the target and are renamed into
//! place only once complete (and, when a checksum is configured, verified).
//! A file at the target path is therefore always a whole download.

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Downloads archives over HTTP/HTTPS.
pub struct HttpFetcher {
    client: Client,
    connect_timeout: Duration,
}

/// Result of a completed download.
#[derive(Debug)]
pub struct DownloadResponse {
    /// Bytes written to disk.
    pub bytes: u64,
    /// Lowercase hex SHA-256 of the downloaded content.
    pub sha256: String,
}

impl HttpFetcher {
    /// Create a fetcher with a 30-second connect timeout.
    ///
    /// There is no overall request timeout; archives can be large.
    pub fn new() -> Result<Self> {
        Self::with_connect_timeout(Duration::from_secs(30))
    }

    /// Create a fetcher with a custom connect timeout.
    pub fn with_connect_timeout(connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("depfetch/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .timeout(None)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            connect_timeout,
        })
    }

    #[cfg(test)]
    pub(crate) fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Download `url` to `target`.
    ///
    /// When `expected_sha256` is given, a mismatching download is discarded
    /// and reported as an error.
    pub fn download(
        &self,
        url: &str,
        target: &Path,
        expected_sha256: Option<&str>,
    ) -> Result<DownloadResponse> {
        tracing::debug!(
            "Downloading {} into {} (connect timeout {:?})",
            url,
            target.display(),
            self.connect_timeout
        );

        let mut response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Request to {} failed", url))?;

        if !response.status().is_success() {
            bail!("HTTP {} fetching {}", response.status(), url);
        }

        let part = partial_path(target);
        let file = File::create(&part)
            .with_context(|| format!("Failed to create {}", part.display()))?;
        let mut writer = HashingWriter::new(BufWriter::new(file));

        let copied = response
            .copy_to(&mut writer)
            .with_context(|| format!("Failed to read body of {}", url))
            .and_then(|bytes| {
                writer.flush()?;
                Ok(bytes)
            });

        let bytes = match copied {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = std::fs::remove_file(&part);
                return Err(e);
            }
        };

        let sha256 = writer.hex_digest();
        drop(writer);

        if let Some(expected) = expected_sha256 {
            if !expected.trim().eq_ignore_ascii_case(&sha256) {
                let _ = std::fs::remove_file(&part);
                bail!(
                    "Checksum mismatch for {}: expected {}, got {}",
                    url,
                    expected.trim(),
                    sha256
                );
            }
        }

        std::fs::rename(&part, target).with_context(|| {
            format!(
                "Failed to move {} to {}",
                part.display(),
                target.display()
            )
        })?;

        tracing::debug!("Downloaded {} bytes from {} (sha256 {})", bytes, url, sha256);

        Ok(DownloadResponse { bytes, sha256 })
    }
}

/// Path of the in-progress download for `target`.
pub fn partial_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    target.with_file_name(name)
}

/// Writer that hashes everything passing through it.
struct HashingWriter<W: Write> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    fn hex_digest(&self) -> String {
        let digest = self.hasher.clone().finalize();
        hex::encode(&digest[..])
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use tempfile::TempDir;

    const BODY: &str = "archive-bytes";

    fn body_sha() -> String {
        hex::encode(&Sha256::digest(BODY.as_bytes())[..])
    }

    #[test]
    fn default_connect_timeout_is_30_seconds() {
        let fetcher = HttpFetcher::new().unwrap();
        assert_eq!(fetcher.connect_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn custom_connect_timeout() {
        let fetcher = HttpFetcher::with_connect_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(fetcher.connect_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("/deps/boost.tgz")),
            PathBuf::from("/deps/boost.tgz.part")
        );
    }

    #[test]
    fn download_writes_target_and_reports_digest() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/lib.zip");
            then.status(200).body(BODY);
        });

        let temp = TempDir::new().unwrap();
        let target = temp.path().join("lib.zip");
        let fetcher = HttpFetcher::new().unwrap();

        let response = fetcher
            .download(&server.url("/lib.zip"), &target, None)
            .unwrap();

        mock.assert();
        assert_eq!(response.bytes, BODY.len() as u64);
        assert_eq!(response.sha256, body_sha());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), BODY);
        assert!(!partial_path(&target).exists());
    }

    #[test]
    fn download_accepts_matching_checksum() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/lib.zip");
            then.status(200).body(BODY);
        });

        let temp = TempDir::new().unwrap();
        let target = temp.path().join("lib.zip");
        let expected = body_sha().to_uppercase();

        HttpFetcher::new()
            .unwrap()
            .download(&server.url("/lib.zip"), &target, Some(&expected))
            .unwrap();

        assert!(target.exists());
    }

    #[test]
    fn download_rejects_checksum_mismatch() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/lib.zip");
            then.status(200).body(BODY);
        });

        let temp = TempDir::new().unwrap();
        let target = temp.path().join("lib.zip");

        let err = HttpFetcher::new()
            .unwrap()
            .download(&server.url("/lib.zip"), &target, Some("00ff"))
            .unwrap_err();

        assert!(err.to_string().contains("Checksum mismatch"));
        assert!(!target.exists());
        assert!(!partial_path(&target).exists());
    }

    #[test]
    fn download_returns_error_on_404() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing.tgz");
            then.status(404).body("Not Found");
        });

        let temp = TempDir::new().unwrap();
        let target = temp.path().join("missing.tgz");

        let err = HttpFetcher::new()
            .unwrap()
            .download(&server.url("/missing.tgz"), &target, None)
            .unwrap_err();

        assert!(err.to_string().contains("404"), "Error should mention 404: {}", err);
        assert!(!target.exists());
        assert!(!partial_path(&target).exists());
    }

    #[test]
    fn download_returns_error_when_unreachable() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("x.zip");

        // Port 9 (discard) is not listening on loopback in test environments.
        let result = HttpFetcher::with_connect_timeout(Duration::from_secs(2))
            .unwrap()
            .download("http://127.0.0.1:9/x.zip", &target, None);

        assert!(result.is_err());
        assert!(!target.exists());
    }
}
