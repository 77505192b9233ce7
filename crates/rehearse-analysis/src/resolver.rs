//! Filesystem module loading

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rehearse_symbols::{ModuleExports, ModuleResolver};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{Analyzer, AnalyzerConfig};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cannot read module {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("module {} does not parse", .path.display())]
    Unparseable { path: PathBuf },
}

impl ResolveError {
    pub fn path(&self) -> &Path {
        match self {
            ResolveError::Io { path, .. } | ResolveError::Unparseable { path } => path,
        }
    }
}

/// Loads imported documents from disk and remembers the result per path,
/// failures included.
#[derive(Debug, Default)]
pub struct FsResolver {
    cache: Mutex<HashMap<PathBuf, Option<ModuleExports>>>,
}

impl FsResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and analyze the module at `path`
    pub fn load(&self, path: &Path) -> Result<ModuleExports, ResolveError> {
        let source = fs::read_to_string(path).map_err(|source| ResolveError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        // Imports of the module itself are not followed
        let config = AnalyzerConfig::default().with_validation(false);
        let file = Analyzer::new(config).analyze(Some(path), &source);
        if file.parse_error.is_some() && file.symbols.queries.is_empty() {
            return Err(ResolveError::Unparseable {
                path: path.to_path_buf(),
            });
        }

        Ok(ModuleExports {
            queries: file.symbols.queries.keys().cloned().collect(),
        })
    }
}

impl ModuleResolver for FsResolver {
    fn load_module(&self, path: &Path) -> Option<ModuleExports> {
        let Ok(mut cache) = self.cache.lock() else {
            return self.load(path).ok();
        };
        if let Some(cached) = cache.get(path) {
            return cached.clone();
        }

        let exports = match self.load(path) {
            Ok(exports) => {
                debug!(path = %path.display(), queries = exports.queries.len(), "loaded module");
                Some(exports)
            }
            Err(err) => {
                warn!(path = %err.path().display(), error = %err, "failed to load module");
                None
            }
        };
        cache.insert(path.to_path_buf(), exports.clone());
        exports
    }
}
