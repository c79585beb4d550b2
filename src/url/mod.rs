//! URL handling module for Pagesift
//!
//! This module resolves references found in documents against the document base URL
//! and derives origin-level locations such as robots.txt.

mod resolve;

pub use resolve::{origin_key, resolve_href, robots_url, ResolvedHref};
