//! Idempotent media downloader.
//!
//! A destination file that already exists with non-zero length is treated as
//! done and returned without touching the network, which is what makes
//! repeated sync runs cheap. New downloads are streamed into a `.part`
//! sibling and renamed into place only after the whole body is on disk.
//!
//! Failures never escape: every error is logged and reported as `None` so a
//! caller iterating over many items keeps going.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest::{Client, StatusCode};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::MediaError;
use crate::fallback::{first_success, Attempt};
use crate::resolver::{infer_extension, UrlResolver};

/// Bytes buffered before each write to the destination file.
const CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub referer: String,
    pub media_host: String,
    /// Pause after every successful download.
    pub delay_ms: u64,
    /// Upper bound on in-flight downloads in [`MediaFetcher::fetch_all`].
    pub max_concurrent: usize,
}

impl From<&postvault_core::AppConfig> for FetcherConfig {
    fn from(config: &postvault_core::AppConfig) -> Self {
        Self {
            timeout_secs: config.fetch_timeout_secs,
            user_agent: config.user_agent.clone(),
            referer: config.referer.clone(),
            media_host: config.media_host.clone(),
            delay_ms: config.fetch_delay_ms,
            max_concurrent: config.max_concurrent_fetches,
        }
    }
}

/// One item for [`MediaFetcher::fetch_all`], saved as `{key}_{index}{ext}`.
#[derive(Debug, Clone)]
pub struct FetchJob {
    pub url: String,
    pub key: String,
    pub index: usize,
}

pub struct MediaFetcher {
    client: Client,
    resolver: UrlResolver,
    delay: Duration,
    max_concurrent: usize,
}

impl MediaFetcher {
    /// Builds the shared HTTP client with the configured timeout and the
    /// browser-like `User-Agent`/`Referer` pair the media host expects.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::Client`] if the `reqwest::Client` cannot be
    /// constructed, or [`MediaError::InvalidHeader`] if the referer is not a
    /// valid header value.
    pub fn new(config: &FetcherConfig) -> Result<Self, MediaError> {
        let referer =
            HeaderValue::from_str(&config.referer).map_err(|e| MediaError::InvalidHeader {
                name: "Referer",
                reason: e.to_string(),
            })?;
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, referer);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            resolver: UrlResolver::new(&config.media_host),
            delay: Duration::from_millis(config.delay_ms),
            max_concurrent: config.max_concurrent.max(1),
        })
    }

    /// Downloads `url` into `dest_dir` as `{key}_{index}{ext}`.
    pub async fn fetch_indexed(
        &self,
        url: &str,
        dest_dir: &Path,
        key: &str,
        index: usize,
    ) -> Option<PathBuf> {
        self.fetch_named(url, dest_dir, &format!("{key}_{index}"))
            .await
    }

    /// Downloads `url` into `dest_dir` as `{stem}{ext}`, where `ext` is
    /// inferred from the canonical URL.
    ///
    /// Returns the local path on success (including when the file was already
    /// present), `None` on any failure.
    pub async fn fetch_named(&self, url: &str, dest_dir: &Path, stem: &str) -> Option<PathBuf> {
        if url.is_empty() {
            return None;
        }

        let canonical = self.resolver.canonicalize(url);
        let dest = dest_dir.join(format!("{stem}{}", infer_extension(&canonical)));

        if already_saved(&dest).await {
            tracing::debug!(path = %dest.display(), "media already on disk, skipping");
            return Some(dest);
        }

        match self.download(url, &dest).await {
            Ok(true) => {
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                Some(dest)
            }
            Ok(false) => {
                tracing::warn!(url, "media unavailable from every candidate URL");
                None
            }
            Err(err) => {
                tracing::warn!(url, error = %err, "media download failed");
                None
            }
        }
    }

    /// Fetches every job with at most `max_concurrent` downloads in flight.
    /// Results line up with `jobs` by position.
    pub async fn fetch_all(&self, jobs: Vec<FetchJob>, dest_dir: &Path) -> Vec<Option<PathBuf>> {
        stream::iter(jobs)
            .map(|job| async move {
                self.fetch_indexed(&job.url, dest_dir, &job.key, job.index)
                    .await
            })
            .buffered(self.max_concurrent)
            .collect()
            .await
    }

    /// Walks the fallback chain for `url`, writing the first 200 response to
    /// `dest`. `Ok(false)` means every candidate answered with another status.
    async fn download(&self, url: &str, dest: &Path) -> Result<bool, MediaError> {
        let candidates = self.resolver.candidate_urls(url);
        let saved = first_success(&candidates, |candidate| async move {
            let response = self
                .client
                .get(&candidate)
                .send()
                .await
                .map_err(|source| MediaError::Request {
                    url: candidate.clone(),
                    source,
                })?;

            let status = response.status();
            if status != StatusCode::OK {
                return Ok(Attempt::Rejected {
                    status: status.as_u16(),
                });
            }

            write_body(response, &candidate, dest).await?;
            Ok::<_, MediaError>(Attempt::Done(()))
        })
        .await?;
        Ok(saved.is_some())
    }
}

async fn already_saved(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file() && meta.len() > 0)
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

async fn write_body(
    response: reqwest::Response,
    url: &str,
    dest: &Path,
) -> Result<(), MediaError> {
    let part = part_path(dest);
    let result = stream_to(response, url, &part).await;
    match result {
        Ok(()) => tokio::fs::rename(&part, dest)
            .await
            .map_err(|source| MediaError::Io {
                path: dest.to_path_buf(),
                source,
            }),
        Err(err) => {
            if let Err(cleanup) = tokio::fs::remove_file(&part).await {
                tracing::debug!(path = %part.display(), error = %cleanup, "partial file cleanup failed");
            }
            Err(err)
        }
    }
}

async fn stream_to(
    mut response: reqwest::Response,
    url: &str,
    part: &Path,
) -> Result<(), MediaError> {
    let io_err = |source| MediaError::Io {
        path: part.to_path_buf(),
        source,
    };

    let file = tokio::fs::File::create(part).await.map_err(io_err)?;
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);

    while let Some(chunk) = response.chunk().await.map_err(|source| MediaError::Body {
        url: url.to_string(),
        source,
    })? {
        writer.write_all(&chunk).await.map_err(io_err)?;
    }
    writer.flush().await.map_err(io_err)?;
    writer.into_inner().sync_all().await.map_err(io_err)?;
    Ok(())
}
