use std::path::Path;

use crate::{CodeNode, SrcmapError};

// ── Collaborator Traits ─────────────────────────────────────────────────────

/// Thread-safe node store with insertion-ordered, filtered, paginated reads.
///
/// Insertion order is the canonical iteration order; an upsert of an existing
/// id keeps the node's original position.
pub trait GraphRepository: Send + Sync {
    /// Upsert by id. New ids are appended to the iteration order.
    fn save(&self, node: CodeNode);

    /// Point lookup.
    fn get(&self, id: &str) -> Option<CodeNode>;

    /// Snapshot of all nodes in insertion order.
    fn get_all(&self) -> Vec<CodeNode>;

    /// Walk the ordered sequence from `offset`, dropping nodes whose
    /// extension matches `skip_exts` (case-insensitive, including the dot)
    /// or whose path contains a `skip_dirs` basename as a full segment.
    /// Collects up to `limit` nodes and returns them together with the next
    /// scan index (one past the last examined position).
    fn get_paginated(
        &self,
        offset: usize,
        limit: usize,
        skip_exts: &[String],
        skip_dirs: &[String],
    ) -> (Vec<CodeNode>, usize);

    /// Atomically drop all nodes and ordering state.
    fn clear(&self);
}

/// External archive expansion collaborator.
///
/// The orchestrator writes the uploaded archive to disk and hands expansion
/// off through this seam; implementations live outside the core.
pub trait ArchiveExtractor: Send + Sync {
    /// Expand `archive_path` into `dest_dir`.
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> Result<(), SrcmapError>;
}
