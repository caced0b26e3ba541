//! On-disk layout and persistence of one account's dataset.
//!
//! ```text
//! {output_dir}/{target}_data.json
//! {output_dir}/{target}_images/{post_id}_{index}{ext}
//! {output_dir}/{target}_images/profile/icon_{timestamp}{ext}
//! ```
//!
//! Media paths are stored in the dataset relative to `output_dir` so the
//! archive can be moved as a whole.

use std::path::{Path, PathBuf};

use postvault_core::{Clock, Dataset};

use crate::error::SyncError;

#[derive(Debug, Clone)]
pub struct DatasetPaths {
    pub root: PathBuf,
    pub data_file: PathBuf,
    pub image_dir: PathBuf,
    pub profile_dir: PathBuf,
}

impl DatasetPaths {
    #[must_use]
    pub fn for_target(output_dir: &Path, target: &str) -> Self {
        let name = file_safe(target);
        let image_dir = output_dir.join(format!("{name}_images"));
        Self {
            root: output_dir.to_path_buf(),
            data_file: output_dir.join(format!("{name}_data.json")),
            profile_dir: image_dir.join("profile"),
            image_dir,
        }
    }

    /// Creates the media directory. The `profile/` directory is created on
    /// demand by the profile tracker.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Io`] if the directory cannot be created.
    pub async fn prepare(&self) -> Result<(), SyncError> {
        tokio::fs::create_dir_all(&self.image_dir)
            .await
            .map_err(|source| SyncError::Io {
                path: self.image_dir.clone(),
                source,
            })
    }

    /// Form written into the dataset for a file under `root`.
    #[must_use]
    pub fn to_stored(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }

    /// Inverse of [`Self::to_stored`].
    #[must_use]
    pub fn from_stored(&self, stored: &str) -> PathBuf {
        self.root.join(stored)
    }

    /// Reads the persisted dataset.
    ///
    /// A missing file yields an empty dataset. A file that cannot be read or
    /// parsed is moved aside to `{data_file}.corrupt-{timestamp}` and also
    /// yields an empty dataset, so it is never silently overwritten.
    pub async fn load(&self, target: &str, clock: &dyn Clock) -> Dataset {
        let raw = match tokio::fs::read_to_string(&self.data_file).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.data_file.display(), "no existing dataset, starting fresh");
                return Dataset::empty(target);
            }
            Err(err) => {
                tracing::warn!(path = %self.data_file.display(), error = %err, "existing dataset unreadable");
                self.quarantine(clock).await;
                return Dataset::empty(target);
            }
        };

        match Dataset::parse(&raw) {
            Ok(dataset) => dataset,
            Err(err) => {
                tracing::warn!(path = %self.data_file.display(), error = %err, "existing dataset is corrupt");
                self.quarantine(clock).await;
                Dataset::empty(target)
            }
        }
    }

    /// Writes `dataset` to a temporary sibling and renames it over the data
    /// file.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Serialize`] or [`SyncError::Io`].
    pub async fn save(&self, dataset: &Dataset) -> Result<(), SyncError> {
        let json = dataset
            .to_pretty_json()
            .map_err(|source| SyncError::Serialize {
                target: dataset.meta.target_user.clone(),
                source,
            })?;

        let tmp = sibling(&self.data_file, ".tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|source| SyncError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &self.data_file)
            .await
            .map_err(|source| SyncError::Io {
                path: self.data_file.clone(),
                source,
            })
    }

    async fn quarantine(&self, clock: &dyn Clock) {
        let stamp = clock.now().format("%Y%m%d_%H%M%S").to_string();
        let aside = sibling(&self.data_file, &format!(".corrupt-{stamp}"));
        match tokio::fs::rename(&self.data_file, &aside).await {
            Ok(()) => {
                tracing::warn!(path = %aside.display(), "moved corrupt dataset aside");
            }
            Err(err) => {
                tracing::warn!(path = %self.data_file.display(), error = %err, "could not move corrupt dataset aside");
            }
        }
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

/// Account and post identifiers become file-name prefixes; anything outside
/// `[A-Za-z0-9_.-]` is replaced.
pub(crate) fn file_safe(target: &str) -> String {
    let cleaned: String = target
        .trim()
        .trim_start_matches('@')
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "unknown".to_string()
    } else {
        cleaned
    }
}
