use std::path::{Path, PathBuf};

/// Finds an included file: first next to the file doing the including, then
/// relative to the working directory.
pub fn resolve(file: &str, including_file: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = including_file.and_then(Path::parent) {
        let candidate = dir.join(file);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    let fallback = PathBuf::from(file);
    fallback.is_file().then_some(fallback)
}
