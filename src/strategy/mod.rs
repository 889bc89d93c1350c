//! Scan Strategy Module
//!
//! - Streaming: single-pass record scanner with bounded memory
//! - Parallel: independent queries over one source on the rayon pool

pub mod parallel;
pub mod streaming;

pub use streaming::{Capture, StreamingScanner};
