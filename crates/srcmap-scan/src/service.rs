//! Scan orchestration over repository, extractors, and resolver.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ignore::WalkBuilder;

use srcmap_core::{
    file_extension, ArchiveExtractor, CodeNode, GraphRepository, ScanConfig, SrcmapError,
};
use srcmap_extract::{languages, LanguageExtractor};
use srcmap_graph::DependencyResolver;

/// Hidden tool directories pruned during a walk; other dotted directories
/// are descended into.
const SKIPPED_TOOL_DIRS: &[&str] = &[".git", ".idea", ".vscode"];

/// An uploaded archive: original file name plus raw bytes.
#[derive(Debug, Clone)]
pub struct ZipUpload {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Orchestrates scanning: per-extension dispatch, concurrent directory
/// walks, zip ingestion, and paginated reads over the repository.
pub struct ScanService {
    repo: Arc<dyn GraphRepository>,
    extractors: HashMap<String, Arc<dyn LanguageExtractor>>,
    archive: Arc<dyn ArchiveExtractor>,
    config: ScanConfig,
}

impl ScanService {
    pub fn new(repo: Arc<dyn GraphRepository>, archive: Arc<dyn ArchiveExtractor>) -> Self {
        Self::with_config(repo, archive, ScanConfig::default())
    }

    pub fn with_config(
        repo: Arc<dyn GraphRepository>,
        archive: Arc<dyn ArchiveExtractor>,
        config: ScanConfig,
    ) -> Self {
        // The dispatch map is built once and read-only thereafter.
        let mut extractors: HashMap<String, Arc<dyn LanguageExtractor>> = HashMap::new();
        for extractor in languages::all_extractors() {
            for ext in extractor.extensions() {
                extractors.insert((*ext).to_string(), Arc::clone(&extractor));
            }
        }
        Self {
            repo,
            extractors,
            archive,
            config,
        }
    }

    /// Scan a single file and save the emitted nodes. Fails on an
    /// unregistered extension; cross-file resolution does not run here.
    pub fn scan_file(&self, file_path: &str, content: &[u8]) -> Result<Vec<CodeNode>, SrcmapError> {
        let ext = file_extension(file_path);
        let extractor = self
            .extractors
            .get(&ext)
            .ok_or_else(|| SrcmapError::UnsupportedExtension(ext.clone()))?;

        let nodes = extractor.scan(file_path, content)?;
        for node in &nodes {
            self.repo.save(node.clone());
        }
        Ok(nodes)
    }

    /// Walk a directory tree concurrently, scan every supported file, then
    /// resolve cross-file dependencies over the whole batch.
    ///
    /// Unreadable files and extractor failures skip that file; the walk
    /// continues. Node order across files follows worker completion and is
    /// not deterministic between runs.
    pub fn scan_directory(&self, dir_path: &Path) -> Result<Vec<CodeNode>, SrcmapError> {
        let accumulator: Mutex<Vec<CodeNode>> = Mutex::new(Vec::new());
        let (tx, rx) = crossbeam_channel::bounded::<PathBuf>(self.config.queue_capacity);

        std::thread::scope(|scope| {
            for _ in 0..self.config.max_workers {
                let rx = rx.clone();
                let accumulator = &accumulator;
                scope.spawn(move || {
                    for path in rx.iter() {
                        let content = match std::fs::read(&path) {
                            Ok(bytes) => bytes,
                            Err(err) => {
                                tracing::warn!("failed to read {}: {err}", path.display());
                                continue;
                            }
                        };
                        let path_str = path.to_string_lossy().into_owned();
                        match self.scan_file(&path_str, &content) {
                            Ok(nodes) if !nodes.is_empty() => {
                                accumulator
                                    .lock()
                                    .unwrap_or_else(PoisonError::into_inner)
                                    .extend(nodes);
                            }
                            Ok(_) => {}
                            Err(err) => tracing::warn!("failed to scan {path_str}: {err}"),
                        }
                    }
                });
            }

            let walker = WalkBuilder::new(dir_path)
                .standard_filters(false)
                .filter_entry(|entry| {
                    let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                    let name = entry.file_name().to_string_lossy();
                    !(is_dir && SKIPPED_TOOL_DIRS.contains(&name.as_ref()))
                })
                .build();

            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        tracing::warn!("walk error under {}: {err}", dir_path.display());
                        continue;
                    }
                };
                if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                    continue;
                }
                let path = entry.into_path();
                if self
                    .extractors
                    .contains_key(&file_extension(&path.to_string_lossy()))
                {
                    // A full queue blocks here, backpressuring enumeration.
                    let _ = tx.send(path);
                }
            }
            drop(tx);
        });

        let mut nodes = accumulator
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);

        let mut resolver = DependencyResolver::new();
        resolver.build_registry(&nodes);
        resolver.resolve_all(&mut nodes);

        // The repository holds its own copies; re-save so they carry the
        // resolved edges. The upsert keeps each node's original position.
        for node in &nodes {
            self.repo.save(node.clone());
        }

        tracing::info!(
            "scanned {}: {} nodes, registry of {} names",
            dir_path.display(),
            nodes.len(),
            resolver.registry_len()
        );

        Ok(nodes)
    }

    /// Stage an uploaded archive under `<dest_root>/<file_name>_<epoch>/`,
    /// expand it through the archive-extractor seam, and scan the result.
    /// Extracted artifacts are kept on success.
    pub fn process_zip_upload(
        &self,
        upload: &ZipUpload,
        dest_root: &Path,
    ) -> Result<Vec<CodeNode>, SrcmapError> {
        if !dest_root.exists() {
            std::fs::create_dir_all(dest_root)?;
        }

        let folder_name = format!("{}_{}", upload.file_name, chrono::Utc::now().timestamp());
        let target_dir = dest_root.join(folder_name);
        std::fs::create_dir(&target_dir)?;

        let archive_path = target_dir.join(&upload.file_name);
        std::fs::write(&archive_path, &upload.content)?;

        self.archive.extract(&archive_path, &target_dir)?;

        self.scan_directory(&target_dir)
    }

    /// Cursor-paginated read. An empty token starts from the beginning; the
    /// successor token is returned only while pages come back full.
    pub fn get_nodes(
        &self,
        limit: usize,
        next_token: &str,
        skip_exts: &[String],
        skip_dirs: &[String],
    ) -> Result<(Vec<CodeNode>, String), SrcmapError> {
        let offset = decode_cursor(next_token)?;
        let limit = if limit == 0 {
            self.config.default_page_limit
        } else {
            limit
        };

        let (nodes, next_index) = self.repo.get_paginated(offset, limit, skip_exts, skip_dirs);

        let next_token = if nodes.len() == limit {
            encode_cursor(next_index)
        } else {
            String::new()
        };
        Ok((nodes, next_token))
    }

    /// Snapshot of the whole repository in insertion order.
    pub fn get_all_nodes(&self) -> Vec<CodeNode> {
        self.repo.get_all()
    }
}

// ── Cursor Codec ──────────────────────────────────────────────────────────

/// Encode a scan index as an opaque cursor: base64 of the decimal index.
pub fn encode_cursor(index: usize) -> String {
    STANDARD.encode(index.to_string())
}

/// Decode an opaque cursor. Empty means the start; anything that is not
/// base64 over a decimal index is malformed.
pub fn decode_cursor(token: &str) -> Result<usize, SrcmapError> {
    if token.is_empty() {
        return Ok(0);
    }
    let bytes = STANDARD
        .decode(token)
        .map_err(|e| SrcmapError::BadCursor(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|e| SrcmapError::BadCursor(e.to_string()))?;
    text.trim()
        .parse::<usize>()
        .map_err(|e| SrcmapError::BadCursor(e.to_string()))
}
