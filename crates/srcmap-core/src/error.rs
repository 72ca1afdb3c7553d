/// Unified error type for srcmap.
#[derive(Debug, thiserror::Error)]
pub enum SrcmapError {
    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("invalid nextToken: {0}")]
    BadCursor(String),

    #[error("invalid base64 content: {0}")]
    InvalidContent(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("archive extraction failed: {0}")]
    Archive(String),

    #[error("invalid node type: {0}")]
    InvalidNodeType(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SrcmapError {
    /// Whether the error is the caller's fault (malformed input) rather than
    /// an internal failure. The HTTP shell maps this to 400 vs 500.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedExtension(_)
                | Self::BadCursor(_)
                | Self::InvalidContent(_)
                | Self::InvalidNodeType(_)
        )
    }
}
