//! Captured posts.
//!
//! A post has three fields the archive understands (`id`, `date`, `images`);
//! everything else the capture step recorded (`text`, `url`, `poll`,
//! `metrics`, ...) is carried in [`Post::extra`] and written back verbatim.
//!
//! Posts are decoded from raw JSON values rather than straight through
//! `serde` so a row without an `id` is reported with its position instead of
//! failing the whole document with a generic message.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::CoreError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: String,

    /// ISO-8601 capture timestamp, e.g. `2024-01-05T12:00:00.000Z`.
    /// `Some(None)` is an explicit `null`, written back as such.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<Option<String>>,

    /// Remote media URLs, or local paths once downloaded.
    /// `Some(None)` is an explicit `null`, written back as such.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Option<Vec<String>>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Post {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            date: None,
            images: None,
            extra: Map::new(),
        }
    }

    /// Capture timestamp, if one is set.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.date.as_ref().and_then(|d| d.as_deref())
    }

    /// Media entries, empty when the post carries none.
    #[must_use]
    pub fn media(&self) -> &[String] {
        self.images
            .as_ref()
            .and_then(|i| i.as_deref())
            .unwrap_or(&[])
    }

    pub fn media_mut(&mut self) -> Option<&mut Vec<String>> {
        self.images.as_mut().and_then(Option::as_mut)
    }

    /// `true` if any media entry is still a remote URL.
    #[must_use]
    pub fn has_remote_media(&self) -> bool {
        self.media().iter().any(|m| is_remote(m))
    }

    /// Field-wise overwrite: every field present on `incoming`, including an
    /// explicit `null`, replaces the one on `self`; fields `incoming` lacks
    /// are kept.
    pub fn overwrite_with(&mut self, incoming: Post) {
        if incoming.date.is_some() {
            self.date = incoming.date;
        }
        if incoming.images.is_some() {
            self.images = incoming.images;
        }
        self.extra.extend(incoming.extra);
    }

    /// Decode one post from a raw JSON value. `index` is only used for error
    /// reporting.
    ///
    /// Numeric ids are accepted and stored as their decimal string. An
    /// explicit `null` for `date` or `images` is kept apart from absence so
    /// it still overwrites during a merge.
    ///
    /// # Errors
    ///
    /// - [`CoreError::PostNotObject`] if `value` is not a JSON object.
    /// - [`CoreError::MissingPostId`] if there is no usable `id`.
    /// - [`CoreError::InvalidPostField`] if `date` or `images` has the wrong shape.
    pub fn from_value(index: usize, value: Value) -> Result<Self, CoreError> {
        let Value::Object(mut fields) = value else {
            return Err(CoreError::PostNotObject { index });
        };

        let id = match fields.shift_remove("id") {
            Some(Value::String(s)) if !s.is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(CoreError::MissingPostId { index }),
        };

        let date = match fields.shift_remove("date") {
            None => None,
            Some(Value::Null) => Some(None),
            Some(Value::String(s)) => Some(Some(s)),
            Some(other) => {
                return Err(CoreError::InvalidPostField {
                    index,
                    field: "date",
                    reason: format!("expected string, got {other}"),
                })
            }
        };

        let images = match fields.shift_remove("images") {
            None => None,
            Some(Value::Null) => Some(None),
            Some(Value::Array(items)) => Some(Some(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(s) => Ok(s),
                        other => Err(CoreError::InvalidPostField {
                            index,
                            field: "images",
                            reason: format!("expected string entry, got {other}"),
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            Some(other) => {
                return Err(CoreError::InvalidPostField {
                    index,
                    field: "images",
                    reason: format!("expected array, got {other}"),
                })
            }
        };

        Ok(Self {
            id,
            date,
            images,
            extra: fields,
        })
    }
}

/// `true` for entries that still point at the network.
#[must_use]
pub fn is_remote(entry: &str) -> bool {
    entry.starts_with("http")
}

/// Decode a sequence of raw posts, failing on the first bad row.
///
/// # Errors
///
/// Returns the [`CoreError`] of the first row that cannot be decoded.
pub fn decode_posts(values: Vec<Value>) -> Result<Vec<Post>, CoreError> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| Post::from_value(index, value))
        .collect()
}
