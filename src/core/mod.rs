//! Core XML lexing primitives
//!
//! This module contains the building blocks the streaming scan sits on:
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Tokenizer: chunk-aware state machine for XML token extraction
//! - Entities: XML entity decoding with Cow (zero-copy when possible)
//! - Attributes: strict attribute parsing
//! - Encoding: UTF-16 detection and streaming conversion to UTF-8

pub mod attributes;
pub mod encoding;
pub mod entities;
pub mod scanner;
pub mod tokenizer;
