//! Profile history tracking.
//!
//! The history is newest-first. Each run builds a candidate entry from the
//! snapshot's profile block and compares it with the newest stored entry:
//!
//! | Difference                        | Action                         |
//! |-----------------------------------|--------------------------------|
//! | history empty                     | push candidate                 |
//! | `name` or `screen_name`           | prepend candidate (structural) |
//! | `following`, `followers`, avatar  | overwrite newest (cosmetic)    |
//! | nothing                           | leave untouched                |
//!
//! The structural check always runs first.

use std::path::Path;

use postvault_core::{format_timestamp, Clock, ProfileEntry, UserInfo};
use postvault_media::MediaFetcher;

use crate::store::DatasetPaths;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileChange {
    First,
    Structural,
    Cosmetic,
    Unchanged,
}

impl ProfileChange {
    #[must_use]
    pub fn is_change(self) -> bool {
        !matches!(self, ProfileChange::Unchanged)
    }
}

#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub history: Vec<ProfileEntry>,
    pub change: ProfileChange,
}

impl ProfileUpdate {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.change.is_change()
    }
}

/// Saves the current avatar and folds `info` into `history`.
///
/// The avatar goes to `profile/icon_{timestamp}{ext}`. A failed download
/// leaves the candidate's avatar empty and classification proceeds anyway.
/// When the new avatar is byte-identical to the one the newest entry already
/// points at, the fresh copy is discarded and the stored path reused, so an
/// unchanged avatar does not register as a cosmetic change.
pub async fn update_profile_history(
    history: Vec<ProfileEntry>,
    info: &UserInfo,
    paths: &DatasetPaths,
    fetcher: &MediaFetcher,
    clock: &dyn Clock,
) -> ProfileUpdate {
    let now = clock.now();
    let avatar = save_avatar(info, history.first(), paths, fetcher, &now).await;

    let candidate = ProfileEntry {
        date: format_timestamp(now),
        name: info.name.clone(),
        screen_name: info.screen_name.clone(),
        avatar,
        following: info.following.clone(),
        followers: info.followers.clone(),
    };

    let update = apply_candidate(history, candidate);
    match update.change {
        ProfileChange::First => tracing::info!("recorded first profile entry"),
        ProfileChange::Structural => {
            tracing::info!(
                name = %info.name,
                screen_name = %info.screen_name,
                "profile identity changed, added history entry"
            );
        }
        ProfileChange::Cosmetic => tracing::debug!("profile stats updated in place"),
        ProfileChange::Unchanged => tracing::debug!("profile unchanged"),
    }
    update
}

/// Pure classification step of [`update_profile_history`].
#[must_use]
pub fn apply_candidate(mut history: Vec<ProfileEntry>, candidate: ProfileEntry) -> ProfileUpdate {
    if history.is_empty() {
        history.push(candidate);
        return ProfileUpdate {
            history,
            change: ProfileChange::First,
        };
    }

    let newest = &mut history[0];

    let change = if candidate.is_structural_change_from(newest) {
        history.insert(0, candidate);
        ProfileChange::Structural
    } else if candidate.is_cosmetic_change_from(newest) {
        *newest = candidate;
        ProfileChange::Cosmetic
    } else {
        ProfileChange::Unchanged
    };

    ProfileUpdate { history, change }
}

async fn save_avatar(
    info: &UserInfo,
    newest: Option<&ProfileEntry>,
    paths: &DatasetPaths,
    fetcher: &MediaFetcher,
    now: &chrono::NaiveDateTime,
) -> String {
    if info.avatar_url.is_empty() {
        return String::new();
    }
    if let Err(err) = tokio::fs::create_dir_all(&paths.profile_dir).await {
        tracing::warn!(path = %paths.profile_dir.display(), error = %err, "cannot create profile directory");
        return String::new();
    }

    let stem = format!("icon_{}", now.format("%Y%m%d_%H%M%S"));
    let Some(saved) = fetcher
        .fetch_named(&info.avatar_url, &paths.profile_dir, &stem)
        .await
    else {
        return String::new();
    };

    if let Some(previous) = newest.filter(|e| !e.avatar.is_empty()) {
        let previous_path = paths.from_stored(&previous.avatar);
        if previous_path != saved && same_contents(&previous_path, &saved).await {
            if let Err(err) = tokio::fs::remove_file(&saved).await {
                tracing::debug!(path = %saved.display(), error = %err, "duplicate avatar cleanup failed");
            }
            return previous.avatar.clone();
        }
    }

    paths.to_stored(&saved)
}

async fn same_contents(a: &Path, b: &Path) -> bool {
    match (tokio::fs::read(a).await, tokio::fs::read(b).await) {
        (Ok(left), Ok(right)) => left == right,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, screen_name: &str, followers: &str, avatar: &str) -> ProfileEntry {
        ProfileEntry {
            date: "2024-01-01T00:00:00.000000".to_string(),
            name: name.to_string(),
            screen_name: screen_name.to_string(),
            avatar: avatar.to_string(),
            following: "10".to_string(),
            followers: followers.to_string(),
        }
    }

    #[test]
    fn first_entry_is_always_a_change() {
        let update = apply_candidate(Vec::new(), entry("Alice", "@alice", "1", ""));
        assert_eq!(update.change, ProfileChange::First);
        assert!(update.changed());
        assert_eq!(update.history.len(), 1);
    }

    #[test]
    fn follower_change_overwrites_in_place() {
        let history = vec![entry("Alice", "@alice", "1", "")];
        let mut candidate = entry("Alice", "@alice", "2", "");
        candidate.date = "2024-02-01T00:00:00.000000".to_string();

        let update = apply_candidate(history, candidate.clone());

        assert_eq!(update.change, ProfileChange::Cosmetic);
        assert!(update.changed());
        assert_eq!(update.history, vec![candidate]);
    }

    #[test]
    fn avatar_change_is_cosmetic() {
        let history = vec![entry("Alice", "@alice", "1", "a/icon_1.jpg")];
        let update = apply_candidate(history, entry("Alice", "@alice", "1", "a/icon_2.jpg"));
        assert_eq!(update.change, ProfileChange::Cosmetic);
        assert_eq!(update.history[0].avatar, "a/icon_2.jpg");
    }

    #[test]
    fn handle_change_prepends_entry() {
        let history = vec![entry("Alice", "@alice", "1", "")];
        let update = apply_candidate(history, entry("Alice", "@alice_new", "1", ""));
        assert_eq!(update.change, ProfileChange::Structural);
        assert_eq!(update.history.len(), 2);
        assert_eq!(update.history[0].screen_name, "@alice_new");
        assert_eq!(update.history[1].screen_name, "@alice");
    }

    #[test]
    fn structural_takes_precedence_over_cosmetic() {
        let history = vec![entry("Alice", "@alice", "1", "")];
        let update = apply_candidate(history, entry("Alicia", "@alice", "999", ""));
        assert_eq!(update.change, ProfileChange::Structural);
        assert_eq!(update.history.len(), 2);
        assert_eq!(update.history[1].followers, "1", "old entry must be untouched");
    }

    #[test]
    fn identical_input_is_not_a_change() {
        let history = vec![entry("Alice", "@alice", "1", "")];
        let mut candidate = entry("Alice", "@alice", "1", "");
        candidate.date = "2030-01-01T00:00:00.000000".to_string();

        let update = apply_candidate(history.clone(), candidate);

        assert_eq!(update.change, ProfileChange::Unchanged);
        assert!(!update.changed());
        assert_eq!(update.history, history, "date must not be refreshed");
    }

    #[test]
    fn only_newest_entry_is_compared() {
        let history = vec![
            entry("Alice", "@alice_new", "5", ""),
            entry("Alice", "@alice", "1", ""),
        ];
        let update = apply_candidate(history, entry("Alice", "@alice", "1", ""));
        assert_eq!(update.change, ProfileChange::Structural);
        assert_eq!(update.history.len(), 3);
    }
}
