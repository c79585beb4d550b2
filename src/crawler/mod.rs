//! Crawler module for page fetching and session orchestration
//!
//! This module contains the core fetching logic, including:
//! - HTTP fetching with retry logic and charset normalization
//! - Rolling-window rate limiting shared by every request of a session
//! - The FIFO job queue and bounded concurrent fetching
//! - The [`Scraper`] session that ties them together

mod concurrent;
mod coordinator;
mod encoding;
mod fetcher;
mod rate_limiter;
mod scheduler;

pub use concurrent::{ConcurrentFetcher, DEFAULT_MAX_CONCURRENT};
pub use coordinator::{DocumentListener, Scraper};
pub use encoding::{
    charset_from_content_type, charset_from_meta, detect_charset, normalize_to_utf8,
    DetectedCharset,
};
pub use fetcher::{build_http_client, FetchResult, Fetcher, Params};
pub use rate_limiter::RateLimiter;
pub use scheduler::{DocumentSource, Job, JobOutput, QueueResults, QueueScheduler, Transform};
