//! srcmap-extract: per-language extraction of code nodes from source bytes.
//!
//! One extractor per supported language: Go via tree-sitter, Java via
//! brace-counted line scanning, Python via indentation-scoped line scanning.
//! Extractors are pure: bytes in, nodes out, no repository or filesystem
//! access.

pub mod extractor;
pub mod languages;

pub use extractor::LanguageExtractor;
