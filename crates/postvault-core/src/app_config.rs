use std::path::PathBuf;

/// Runtime settings for a sync run, resolved from `POSTVAULT_*` variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// Directory scanned for `*_tweets_raw.json` snapshots.
    pub input_dir: PathBuf,
    /// Directory holding `{target}_data.json` and `{target}_images/`.
    pub output_dir: PathBuf,
    /// Host suffix whose image URLs are upgraded to `name=orig`.
    pub media_host: String,
    pub fetch_timeout_secs: u64,
    /// Pause after every successful download.
    pub fetch_delay_ms: u64,
    pub max_concurrent_fetches: usize,
    pub user_agent: String,
    pub referer: String,
}
