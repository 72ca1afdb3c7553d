//! LanguageExtractor trait implemented by each language backend.

use srcmap_core::{CodeNode, SrcmapError};

/// Turns the raw bytes of one source file into code nodes.
///
/// Implementations must be pure: deterministic for identical input (up to id
/// generation), no I/O, no repository access. The file path is only recorded
/// on the emitted nodes.
pub trait LanguageExtractor: Send + Sync {
    /// Language tag stamped on emitted nodes (e.g. "go").
    fn language(&self) -> &'static str;

    /// File extensions this extractor handles, lowercased with the leading
    /// dot (e.g. `&[".go"]`).
    fn extensions(&self) -> &'static [&'static str];

    /// Extract all code nodes from the file, with unresolved call
    /// references populated for later cross-file resolution.
    fn scan(&self, file_path: &str, content: &[u8]) -> Result<Vec<CodeNode>, SrcmapError>;
}
