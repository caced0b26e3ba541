//! Incremental archive sync: merges captured snapshots into a persisted
//! per-account dataset and localizes the media they reference.

pub mod error;
pub mod history;
pub mod merge;
pub mod store;
pub mod synchronizer;

pub use error::SyncError;
pub use history::{apply_candidate, update_profile_history, ProfileChange, ProfileUpdate};
pub use merge::{merge_posts, MergeOutcome};
pub use store::DatasetPaths;
pub use synchronizer::{next_last_updated, SyncReport, Synchronizer};
