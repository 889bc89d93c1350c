//! XML Reader Module
//!
//! Streaming input layer:
//! - BufferedReader: bounded read-ahead over any `Read`
//! - StreamReader: pull parser producing owned element events
//! - Events: XML event types for pull parsing

pub mod buffered;
pub mod events;
pub mod stream;
