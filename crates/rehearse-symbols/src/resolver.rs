//! Import resolution seam
//!
//! Loading imported files is owned by the host. The table builder only needs
//! to turn an import path into a location and to learn which queries the
//! module there defines.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// What an imported module makes available
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleExports {
    pub queries: Vec<String>,
}

pub trait ModuleResolver: Send + Sync {
    /// Location of `rel` as imported from the document at `base`
    fn resolve_import_path(&self, base: Option<&Path>, rel: &str) -> PathBuf {
        resolve_relative(base, rel)
    }

    /// `None` when the module cannot be loaded
    fn load_module(&self, path: &Path) -> Option<ModuleExports>;
}

/// Join `rel` onto the directory containing `base`
pub fn resolve_relative(base: Option<&Path>, rel: &str) -> PathBuf {
    let rel = Path::new(rel);
    if rel.is_absolute() {
        return rel.to_path_buf();
    }
    match base.and_then(Path::parent) {
        Some(dir) => dir.join(rel),
        None => rel.to_path_buf(),
    }
}
