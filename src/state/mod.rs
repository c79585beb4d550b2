//! State module for tracking session progress
//!
//! # Components
//!
//! - `SessionState`: whether a scraping session is idle, fetching, or holding a document

mod session_state;

pub use session_state::SessionState;
