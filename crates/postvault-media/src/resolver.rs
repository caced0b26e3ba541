//! Media URL canonicalization and file-extension inference.
//!
//! Nothing here returns an error: a URL that cannot be parsed is passed
//! through unchanged and an extension that cannot be inferred defaults to
//! `.jpg`.

use std::sync::LazyLock;

use reqwest::Url;

/// Markers identifying video assets, which are never quality-upgraded.
const VIDEO_MARKERS: &[&str] = &[".mp4"];

const DEFAULT_EXTENSION: &str = ".jpg";

/// Base used to read relative or scheme-less strings as URLs.
static RELATIVE_BASE: LazyLock<Option<Url>> =
    LazyLock::new(|| Url::parse("http://relative.invalid/").ok());

#[derive(Debug, Clone)]
pub struct UrlResolver {
    media_host: String,
}

impl UrlResolver {
    /// `media_host` is matched against the URL host exactly or as a
    /// dot-separated suffix (`twimg.com` matches `pbs.twimg.com`).
    #[must_use]
    pub fn new(media_host: &str) -> Self {
        Self {
            media_host: media_host.trim().trim_start_matches('.').to_ascii_lowercase(),
        }
    }

    /// Highest-quality variant of `url`.
    ///
    /// Image URLs on the media host that carry a `format` query parameter get
    /// `name=orig` (added, or replacing an existing `name`). Everything else
    /// is returned as given.
    #[must_use]
    pub fn canonicalize(&self, url: &str) -> String {
        if is_video(url) {
            return url.to_string();
        }
        let Ok(mut parsed) = Url::parse(url) else {
            return url.to_string();
        };
        if !self.is_media_host(&parsed) {
            return url.to_string();
        }

        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        if !pairs.iter().any(|(k, _)| k == "format") {
            return url.to_string();
        }

        let mut saw_name = false;
        let mut rebuilt: Vec<(String, String)> = Vec::with_capacity(pairs.len() + 1);
        for (key, value) in pairs {
            if key == "name" {
                if !saw_name {
                    rebuilt.push((key, "orig".to_string()));
                    saw_name = true;
                }
            } else {
                rebuilt.push((key, value));
            }
        }
        if !saw_name {
            rebuilt.push(("name".to_string(), "orig".to_string()));
        }

        parsed.query_pairs_mut().clear().extend_pairs(rebuilt);
        parsed.to_string()
    }

    /// `url` with `.{format}` appended to its path and the query dropped, for
    /// hosts that refuse query-string format delivery. `None` when there is no
    /// `format` parameter.
    #[must_use]
    pub fn path_format_url(&self, url: &str) -> Option<String> {
        let mut parsed = Url::parse(url).ok()?;
        let format = format_param(&parsed)?;
        let path = format!("{}.{format}", parsed.path());
        parsed.set_query(None);
        parsed.set_fragment(None);
        parsed.set_path(&path);
        Some(parsed.to_string())
    }

    /// Ordered download attempts for `url`: the canonical URL, then the
    /// original when it differs, then the path-appended format variant.
    /// Videos only ever get the canonical URL.
    #[must_use]
    pub fn candidate_urls(&self, url: &str) -> Vec<String> {
        let canonical = self.canonicalize(url);
        let mut candidates = vec![canonical];
        if is_video(url) {
            return candidates;
        }
        if candidates[0] != url {
            candidates.push(url.to_string());
        }
        if let Some(path_url) = self.path_format_url(url) {
            if !candidates.contains(&path_url) {
                candidates.push(path_url);
            }
        }
        candidates
    }

    fn is_media_host(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        host == self.media_host
            || host
                .strip_suffix(self.media_host.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    }
}

#[must_use]
pub fn is_video(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    VIDEO_MARKERS.iter().any(|m| lower.contains(m))
}

/// File extension (with leading dot) for `url`.
///
/// Prefers the extension on the last path segment, then `.{format}` from the
/// query string, then `.jpg`.
#[must_use]
pub fn infer_extension(url: &str) -> String {
    let parsed = Url::parse(url).ok().or_else(|| {
        RELATIVE_BASE
            .as_ref()
            .and_then(|base| base.join(url).ok())
    });
    let Some(parsed) = parsed else {
        return DEFAULT_EXTENSION.to_string();
    };

    if let Some(ext) = path_extension(parsed.path()) {
        return ext;
    }
    if let Some(format) = format_param(&parsed) {
        return format!(".{format}");
    }
    DEFAULT_EXTENSION.to_string()
}

fn path_extension(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next()?;
    let stem_len = file_name.trim_start_matches('.').len();
    if stem_len == 0 {
        return None;
    }
    let leading_dots = file_name.len() - stem_len;
    let dot = file_name[leading_dots..].rfind('.')? + leading_dots;
    if dot + 1 == file_name.len() {
        return None;
    }
    Some(file_name[dot..].to_string())
}

fn format_param(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(k, v)| k == "format" && !v.is_empty())
        .map(|(_, v)| v.into_owned())
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
