// Storage path utilities.
// Resolves where the persisted store lives on this platform.

use std::path::PathBuf;

use directories::ProjectDirs;

/// Get the base data directory (~/.local/share/reqgate on Linux).
fn data_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "reqgate").map(|dirs| dirs.data_dir().to_path_buf())
}

/// Path to the persisted key-value store file.
pub fn storage_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("storage.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_path() {
        // Only checks path construction, nothing is created
        if let Some(path) = storage_path() {
            assert!(path.ends_with("storage.json"));
            assert!(path.starts_with(data_dir().unwrap()));
        }
    }
}
