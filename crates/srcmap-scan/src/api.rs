//! Wire shapes and query helpers consumed by the external HTTP shell.
//!
//! The shell itself lives outside this workspace; these types pin the
//! request/response contract it serves.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use srcmap_core::{CodeNode, SrcmapError};

/// Single-file scan request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanFileRequest {
    pub file_path: String,
    /// Base64-encoded file bytes.
    pub content: String,
}

impl ScanFileRequest {
    /// Decode the base64 payload into raw bytes.
    pub fn decode_content(&self) -> Result<Vec<u8>, SrcmapError> {
        STANDARD
            .decode(&self.content)
            .map_err(|e| SrcmapError::InvalidContent(e.to_string()))
    }
}

/// Directory scan request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanDirectoryRequest {
    pub dir_path: String,
}

/// Response for single-file, directory, and zip scans.
#[derive(Debug, Clone, Serialize)]
pub struct NodesResponse {
    pub nodes: Vec<CodeNode>,
    pub count: usize,
}

impl NodesResponse {
    pub fn new(nodes: Vec<CodeNode>) -> Self {
        let count = nodes.len();
        Self { nodes, count }
    }
}

/// Response for the paginated read. An empty `nextToken` signals end of
/// stream.
#[derive(Debug, Clone, Serialize)]
pub struct PagedNodesResponse {
    pub nodes: Vec<CodeNode>,
    #[serde(rename = "nextToken")]
    pub next_token: String,
    pub count: usize,
}

impl PagedNodesResponse {
    pub fn new(nodes: Vec<CodeNode>, next_token: String) -> Self {
        let count = nodes.len();
        Self {
            nodes,
            next_token,
            count,
        }
    }
}

/// Parse a `limit` query value; absent or non-positive falls back to 100.
pub fn parse_limit(raw: Option<&str>) -> usize {
    raw.and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0)
        .map(|v| v as usize)
        .unwrap_or(100)
}

/// Split a comma-separated filter list; empty input yields no filters.
pub fn parse_filter_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|s| s.to_string()).collect()
}
