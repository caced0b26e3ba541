//! `sync` command: process every snapshot, one at a time.
//!
//! A snapshot that cannot be read or parsed is logged and skipped so one bad
//! file does not abort the rest of the run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use postvault_core::{AppConfig, SystemClock};
use postvault_media::{FetcherConfig, MediaFetcher};
use postvault_sync::Synchronizer;

use crate::SyncArgs;

/// Suffix the capture step gives snapshot files.
const SNAPSHOT_SUFFIX: &str = "_tweets_raw.json";

/// # Errors
///
/// Returns an error if no snapshots are found, the input directory cannot be
/// listed, the HTTP client cannot be built, or every snapshot failed.
pub(crate) async fn run_sync(config: &AppConfig, args: SyncArgs) -> anyhow::Result<()> {
    let input_dir = args.input_dir.unwrap_or_else(|| config.input_dir.clone());
    let output_dir = args.output_dir.unwrap_or_else(|| config.output_dir.clone());

    let snapshots = if args.snapshots.is_empty() {
        discover_snapshots(&input_dir)
            .with_context(|| format!("listing snapshots in {}", input_dir.display()))?
    } else {
        args.snapshots
    };

    if snapshots.is_empty() {
        anyhow::bail!(
            "no *{SNAPSHOT_SUFFIX} files found in {}",
            input_dir.display()
        );
    }

    tokio::fs::create_dir_all(&output_dir)
        .await
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let fetcher = MediaFetcher::new(&FetcherConfig::from(config))?;
    let synchronizer = Synchronizer::new(&output_dir, fetcher, Arc::new(SystemClock));

    let total = snapshots.len();
    let mut failed = 0usize;
    for path in &snapshots {
        tracing::info!(snapshot = %path.display(), "processing snapshot");
        match synchronizer.sync_snapshot(path).await {
            Ok(report) => {
                tracing::info!(
                    target_user = %report.target_user,
                    dataset = %report.data_file.display(),
                    new_posts = report.new_posts,
                    total_posts = report.total_posts,
                    media_saved = report.media_saved,
                    media_pending = report.media_failed,
                    profile_changed = report.profile_changed,
                    "snapshot synced"
                );
            }
            Err(err) => {
                failed += 1;
                tracing::error!(snapshot = %path.display(), error = %err, "snapshot skipped");
            }
        }
    }

    if failed > 0 {
        tracing::warn!(failed, total, "some snapshots failed");
    }
    if failed == total {
        anyhow::bail!("all {failed} snapshots failed");
    }

    tracing::info!(processed = total - failed, "all snapshots processed");
    Ok(())
}

/// Snapshot files directly inside `dir`, sorted by name.
fn discover_snapshots(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut found: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(SNAPSHOT_SUFFIX))
        })
        .collect();
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn discover_snapshots_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in [
            "zed_tweets_raw.json",
            "alice_tweets_raw.json",
            "alice_data.json",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }
        std::fs::create_dir(dir.path().join("dir_tweets_raw.json")).unwrap();

        let found = discover_snapshots(dir.path()).unwrap();

        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["alice_tweets_raw.json", "zed_tweets_raw.json"]);
    }

    #[test]
    fn discover_snapshots_errors_on_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(discover_snapshots(&dir.path().join("missing")).is_err());
    }
}
