pub mod app_config;
pub mod clock;
pub mod config;
pub mod dataset;
pub mod post;
pub mod profile;

pub use app_config::AppConfig;
pub use clock::{format_timestamp, Clock, FixedClock, SystemClock};
pub use config::{load_app_config, load_app_config_from_env};
pub use dataset::{Dataset, DatasetMeta, Snapshot, SnapshotMeta};
pub use post::{decode_posts, is_remote, Post};
pub use profile::{value_to_text, ProfileEntry, UserInfo};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("post at index {index} has no id")]
    MissingPostId { index: usize },

    #[error("post at index {index} is not a JSON object")]
    PostNotObject { index: usize },

    #[error("post at index {index} has an invalid {field}: {reason}")]
    InvalidPostField {
        index: usize,
        field: &'static str,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
