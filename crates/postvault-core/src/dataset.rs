//! Snapshot input and persisted dataset documents.
//!
//! ## Snapshot (`{target}_tweets_raw.json`)
//!
//! ```json
//! { "meta": { "target": "alice", "exported_at": "...", "user_info": { ... } },
//!   "posts": [ { "id": "...", "date": "...", "images": ["https://..."] } ] }
//! ```
//!
//! ## Dataset (`{target}_data.json`)
//!
//! ```json
//! { "meta": { "target_user": "alice", "last_updated": "...",
//!             "total_posts_retrieved": 1, "profile_history": [ ... ],
//!             "user_info": { ... } },
//!   "posts": [ ... ] }
//! ```
//!
//! `user_info` is kept as the raw JSON blob from the latest snapshot so
//! downstream viewers see exactly what was captured.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::post::{decode_posts, Post};
use crate::profile::ProfileEntry;
use crate::CoreError;

fn unknown_target() -> String {
    "unknown".to_string()
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotMeta {
    #[serde(default = "unknown_target")]
    pub target: String,
    #[serde(default)]
    pub exported_at: Option<String>,
    #[serde(default = "empty_object")]
    pub user_info: Value,
}

impl Default for SnapshotMeta {
    fn default() -> Self {
        Self {
            target: unknown_target(),
            exported_at: None,
            user_info: empty_object(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub meta: SnapshotMeta,
    pub posts: Vec<Post>,
}

#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    meta: SnapshotMeta,
    #[serde(default)]
    posts: Vec<Value>,
}

impl Snapshot {
    /// Parse a snapshot document.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Json`] for malformed JSON or a wrongly shaped
    /// document, and a post-level [`CoreError`] for any undecodable post.
    pub fn parse(json: &str) -> Result<Self, CoreError> {
        let raw: RawSnapshot = serde_json::from_str(json)?;
        Ok(Self {
            meta: raw.meta,
            posts: decode_posts(raw.posts)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMeta {
    #[serde(default = "unknown_target")]
    pub target_user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub total_posts_retrieved: usize,
    #[serde(default)]
    pub profile_history: Vec<ProfileEntry>,
    #[serde(default = "empty_object")]
    pub user_info: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub meta: DatasetMeta,
    pub posts: Vec<Post>,
}

#[derive(Deserialize)]
struct RawDataset {
    meta: DatasetMeta,
    #[serde(default)]
    posts: Vec<Value>,
}

impl Dataset {
    /// A dataset with no history, no posts and no `last_updated`.
    #[must_use]
    pub fn empty(target_user: &str) -> Self {
        Self {
            meta: DatasetMeta {
                target_user: target_user.to_string(),
                last_updated: None,
                total_posts_retrieved: 0,
                profile_history: Vec::new(),
                user_info: empty_object(),
            },
            posts: Vec::new(),
        }
    }

    /// Parse a persisted dataset document.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Json`] or a post-level [`CoreError`].
    pub fn parse(json: &str) -> Result<Self, CoreError> {
        let raw: RawDataset = serde_json::from_str(json)?;
        Ok(Self {
            meta: raw.meta,
            posts: decode_posts(raw.posts)?,
        })
    }

    /// Serialize with 4-space indentation; non-ASCII text is kept literal.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Json`] if a payload value cannot be serialized.
    pub fn to_pretty_json(&self) -> Result<String, CoreError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        // serde_json only ever emits UTF-8.
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}
