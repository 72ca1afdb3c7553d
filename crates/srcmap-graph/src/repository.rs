//! In-memory node store keyed by id, with an append-only insertion order
//! used for stable cursor pagination.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use srcmap_core::{file_extension, CodeNode, GraphRepository};

#[derive(Default)]
struct Inner {
    nodes: HashMap<String, CodeNode>,
    ordered_ids: Vec<String>,
}

/// Multi-reader / single-writer store. Writers exclude readers and each
/// other; readers proceed in parallel.
#[derive(Default)]
pub struct InMemoryGraphRepository {
    inner: RwLock<Inner>,
}

impl InMemoryGraphRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphRepository for InMemoryGraphRepository {
    fn save(&self, node: CodeNode) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !inner.nodes.contains_key(&node.id) {
            inner.ordered_ids.push(node.id.clone());
        }
        inner.nodes.insert(node.id.clone(), node);
    }

    fn get(&self, id: &str) -> Option<CodeNode> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.nodes.get(id).cloned()
    }

    fn get_all(&self) -> Vec<CodeNode> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .ordered_ids
            .iter()
            .filter_map(|id| inner.nodes.get(id).cloned())
            .collect()
    }

    fn get_paginated(
        &self,
        offset: usize,
        limit: usize,
        skip_exts: &[String],
        skip_dirs: &[String],
    ) -> (Vec<CodeNode>, usize) {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);

        let skip_exts: Vec<String> = skip_exts.iter().map(|e| e.to_lowercase()).collect();

        if offset >= inner.ordered_ids.len() {
            return (Vec::new(), inner.ordered_ids.len());
        }

        let mut nodes = Vec::new();
        let mut current = offset;
        while current < inner.ordered_ids.len() && nodes.len() < limit {
            let id = &inner.ordered_ids[current];
            if let Some(node) = inner.nodes.get(id) {
                if !should_skip(node, &skip_exts, skip_dirs) {
                    nodes.push(node.clone());
                }
            }
            current += 1;
        }

        (nodes, current)
    }

    fn clear(&self) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.nodes.clear();
        inner.ordered_ids.clear();
    }
}

fn should_skip(node: &CodeNode, skip_exts: &[String], skip_dirs: &[String]) -> bool {
    let ext = file_extension(&node.file_path);
    if skip_exts.iter().any(|e| *e == ext) {
        return true;
    }

    // Basenames must match whole path segments: "my_venv" is not "venv".
    let cleaned = node.file_path.replace('\\', "/");
    for dir in skip_dirs {
        if cleaned.contains(&format!("/{dir}/")) || cleaned.starts_with(&format!("{dir}/")) {
            return true;
        }
    }

    false
}
