//! Media URL resolution and best-effort downloading.

pub mod error;
pub mod fallback;
pub mod fetcher;
pub mod resolver;

pub use error::MediaError;
pub use fetcher::{FetchJob, FetcherConfig, MediaFetcher};
pub use resolver::UrlResolver;
