use std::fs;
use std::path::{Path, PathBuf};

/// Path to a suite file under tests/fixtures/
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Load a suite file from tests/fixtures/
pub fn load_fixture(name: &str) -> String {
    let path = fixture_path(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Every `.rh` fixture, sorted by name
pub fn all_fixtures() -> Vec<PathBuf> {
    let dir = fixture_path("");
    let mut paths: Vec<_> = fs::read_dir(&dir)
        .expect("Failed to read fixtures directory")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("rh"))
        .collect();
    paths.sort();
    paths
}
