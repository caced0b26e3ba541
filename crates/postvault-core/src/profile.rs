//! Account identity and statistics.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Profile block captured alongside a snapshot (`meta.user_info`).
///
/// Read leniently: the capture step sometimes omits counters or emits them
/// as numbers, so every field falls back to a default instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub avatar_url: String,
    pub name: String,
    pub screen_name: String,
    pub following: String,
    pub followers: String,
}

impl UserInfo {
    #[must_use]
    pub fn from_value(raw: &Value) -> Self {
        let text = |key: &str| raw.get(key).map(value_to_text).unwrap_or_default();
        let counter = |key: &str| {
            raw.get(key)
                .filter(|v| !v.is_null())
                .map_or_else(|| "0".to_string(), value_to_text)
        };

        Self {
            avatar_url: text("avatarUrl"),
            name: text("name"),
            screen_name: text("screenName"),
            following: counter("following"),
            followers: counter("followers"),
        }
    }
}

/// One point in an account's history. The newest entry is always first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEntry {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub screen_name: String,
    /// Local path of the avatar saved at this point, or empty.
    #[serde(default)]
    pub avatar: String,
    #[serde(default = "zero", deserialize_with = "text_or_number")]
    pub following: String,
    #[serde(default = "zero", deserialize_with = "text_or_number")]
    pub followers: String,
}

impl ProfileEntry {
    /// Name or handle differs.
    #[must_use]
    pub fn is_structural_change_from(&self, previous: &ProfileEntry) -> bool {
        self.name != previous.name || self.screen_name != previous.screen_name
    }

    /// Counters or avatar differ.
    #[must_use]
    pub fn is_cosmetic_change_from(&self, previous: &ProfileEntry) -> bool {
        self.following != previous.following
            || self.followers != previous.followers
            || self.avatar != previous.avatar
    }
}

fn zero() -> String {
    "0".to_string()
}

/// Render a JSON scalar as text: strings as-is, `null` as empty, anything
/// else through its JSON form.
#[must_use]
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(if raw.is_null() {
        zero()
    } else {
        value_to_text(&raw)
    })
}
