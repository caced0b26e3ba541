//! Merges one snapshot into its account's persisted dataset.
//!
//! Steps, in order: load the existing dataset (missing or corrupt counts as
//! empty), update the profile history, merge posts, download any media still
//! referenced by remote URL, advance `last_updated` if content changed, and
//! write the dataset back.
//!
//! Media that fails to download keeps its remote URL, so the next run picks
//! it up again.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDateTime;
use postvault_core::{
    format_timestamp, is_remote, Clock, Dataset, DatasetMeta, Post, Snapshot, UserInfo,
};
use postvault_media::{FetchJob, MediaFetcher};

use crate::error::SyncError;
use crate::history::update_profile_history;
use crate::merge::{merge_posts, MergeOutcome};
use crate::store::{file_safe, DatasetPaths};

/// Posts walked between progress log lines.
const PROGRESS_EVERY: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub target_user: String,
    pub data_file: PathBuf,
    pub new_posts: usize,
    pub total_posts: usize,
    /// Media entries resolved to a local path during this run.
    pub media_saved: usize,
    /// Media entries left as remote URLs for a later run.
    pub media_failed: usize,
    pub profile_changed: bool,
    pub last_updated: String,
}

#[derive(Debug, Default, Clone, Copy)]
struct MediaTally {
    saved: usize,
    failed: usize,
}

pub struct Synchronizer {
    output_dir: PathBuf,
    fetcher: MediaFetcher,
    clock: Arc<dyn Clock>,
}

impl Synchronizer {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, fetcher: MediaFetcher, clock: Arc<dyn Clock>) -> Self {
        Self {
            output_dir: output_dir.into(),
            fetcher,
            clock,
        }
    }

    /// Reads, parses and syncs the snapshot at `path`.
    ///
    /// # Errors
    ///
    /// - [`SyncError::ReadSnapshot`] / [`SyncError::ParseSnapshot`] if the
    ///   snapshot is unreadable or malformed (including a post without `id`).
    /// - Any error from [`Self::sync_snapshot_data`].
    pub async fn sync_snapshot(&self, path: &Path) -> Result<SyncReport, SyncError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SyncError::ReadSnapshot {
                path: path.to_path_buf(),
                source,
            })?;
        let snapshot = Snapshot::parse(&raw).map_err(|source| SyncError::ParseSnapshot {
            path: path.to_path_buf(),
            source,
        })?;
        self.sync_snapshot_data(snapshot).await
    }

    /// Syncs an already-parsed snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Io`] if the media directory cannot be created or
    /// the dataset cannot be written, and [`SyncError::Serialize`] if it
    /// cannot be encoded. Per-item download failures are not errors.
    pub async fn sync_snapshot_data(&self, snapshot: Snapshot) -> Result<SyncReport, SyncError> {
        let target = snapshot.meta.target.clone();
        let paths = DatasetPaths::for_target(&self.output_dir, &target);
        paths.prepare().await?;

        let existing = paths.load(&target, self.clock.as_ref()).await;
        let previous_updated = existing.meta.last_updated.clone();

        let info = UserInfo::from_value(&snapshot.meta.user_info);
        let profile = update_profile_history(
            existing.meta.profile_history,
            &info,
            &paths,
            &self.fetcher,
            self.clock.as_ref(),
        )
        .await;

        let MergeOutcome {
            mut posts,
            new_count,
        } = merge_posts(existing.posts, snapshot.posts);
        tracing::info!(
            target_user = %target,
            new_posts = new_count,
            total_posts = posts.len(),
            "merged posts"
        );

        let tally = self.localize_media(&mut posts, &paths).await;

        let last_updated = next_last_updated(
            previous_updated,
            new_count,
            profile.changed(),
            self.clock.now(),
        );

        let dataset = Dataset {
            meta: DatasetMeta {
                target_user: target.clone(),
                last_updated: Some(last_updated.clone()),
                total_posts_retrieved: posts.len(),
                profile_history: profile.history,
                user_info: snapshot.meta.user_info,
            },
            posts,
        };
        paths.save(&dataset).await?;

        tracing::info!(
            target_user = %target,
            path = %paths.data_file.display(),
            media_saved = tally.saved,
            media_failed = tally.failed,
            "dataset written"
        );

        Ok(SyncReport {
            target_user: target,
            data_file: paths.data_file,
            new_posts: new_count,
            total_posts: dataset.posts.len(),
            media_saved: tally.saved,
            media_failed: tally.failed,
            profile_changed: profile.change.is_change(),
            last_updated,
        })
    }

    /// Replaces remote media URLs with local paths, in batches of posts so
    /// progress can be reported. Posts without remote entries are skipped.
    async fn localize_media(&self, posts: &mut [Post], paths: &DatasetPaths) -> MediaTally {
        let mut tally = MediaTally::default();
        let total = posts.len();
        let pending: Vec<usize> = posts
            .iter()
            .enumerate()
            .filter(|(_, p)| p.has_remote_media())
            .map(|(i, _)| i)
            .collect();

        if pending.is_empty() {
            return tally;
        }
        tracing::info!(posts_with_remote_media = pending.len(), "downloading media");

        for batch in pending.chunks(PROGRESS_EVERY) {
            if let Some(&first) = batch.first() {
                tracing::info!(position = first, total, "media download progress");
            }

            let mut slots: Vec<(usize, usize)> = Vec::new();
            let mut jobs: Vec<FetchJob> = Vec::new();
            for &post_idx in batch {
                let post = &posts[post_idx];
                for (media_idx, entry) in post.media().iter().enumerate() {
                    if is_remote(entry) {
                        slots.push((post_idx, media_idx));
                        jobs.push(FetchJob {
                            url: entry.clone(),
                            key: file_safe(&post.id),
                            index: media_idx,
                        });
                    }
                }
            }

            let results = self.fetcher.fetch_all(jobs, &paths.image_dir).await;
            for ((post_idx, media_idx), result) in slots.into_iter().zip(results) {
                match result {
                    Some(local) => {
                        if let Some(images) = posts[post_idx].media_mut() {
                            images[media_idx] = paths.to_stored(&local);
                        }
                        tally.saved += 1;
                    }
                    None => tally.failed += 1,
                }
            }
        }

        tally
    }
}

/// The dataset's `last_updated` after a run.
///
/// Advances to `now` only if a new post arrived, the profile changed, or no
/// previous value exists; otherwise the previous value is returned unchanged.
#[must_use]
pub fn next_last_updated(
    previous: Option<String>,
    new_posts: usize,
    profile_changed: bool,
    now: NaiveDateTime,
) -> String {
    match previous {
        Some(prev) if new_posts == 0 && !profile_changed => prev,
        _ => format_timestamp(now),
    }
}
