//! Reconciles a persisted post list with a freshly captured one.
//!
//! Posts are keyed by `id`. An incoming post with an unseen id is appended;
//! one with a known id overwrites the stored record field by field (fields
//! the incoming record lacks are kept). Nothing is ever removed.
//!
//! The result is ordered by `date`, newest first. Posts whose date is missing
//! or unparseable sort last. Ties keep first-seen order: existing posts in
//! their stored order, then new posts in capture order.

use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use postvault_core::Post;

#[derive(Debug)]
pub struct MergeOutcome {
    pub posts: Vec<Post>,
    /// Incoming posts whose id was not present before.
    pub new_count: usize,
}

#[must_use]
pub fn merge_posts(existing: Vec<Post>, incoming: Vec<Post>) -> MergeOutcome {
    let mut posts: Vec<Post> = Vec::with_capacity(existing.len() + incoming.len());
    let mut by_id: HashMap<String, usize> = HashMap::with_capacity(posts.capacity());

    for post in existing {
        if let Some(&slot) = by_id.get(&post.id) {
            // Duplicate id in stored data: the later row wins outright.
            posts[slot] = post;
        } else {
            by_id.insert(post.id.clone(), posts.len());
            posts.push(post);
        }
    }

    let mut new_count = 0;
    for post in incoming {
        if let Some(&slot) = by_id.get(&post.id) {
            posts[slot].overwrite_with(post);
        } else {
            by_id.insert(post.id.clone(), posts.len());
            posts.push(post);
            new_count += 1;
        }
    }

    posts.sort_by_cached_key(|p| Reverse(sort_key(p.date())));

    MergeOutcome { posts, new_count }
}

/// `None` sorts below every real date.
fn sort_key(date: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = date?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
