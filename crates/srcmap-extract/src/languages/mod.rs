//! Language backends and their registration.

pub mod go;
pub mod java;
pub mod python;

use std::sync::Arc;

use crate::extractor::LanguageExtractor;

/// All registered language extractors. The set is closed; the dispatch map
/// built from it at orchestrator construction is read-only thereafter.
pub fn all_extractors() -> Vec<Arc<dyn LanguageExtractor>> {
    vec![
        Arc::new(go::GoExtractor::new()),
        Arc::new(java::JavaExtractor::new()),
        Arc::new(python::PythonExtractor::new()),
    ]
}
