//! Data-directory resolution.

use std::path::PathBuf;

/// Resolve the Ayla data directory: `AYLA_DATA_DIR` when set, otherwise
/// `~/.ayla`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("AYLA_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".ayla")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_data_dir_is_absolute_or_relative_fallback() {
        let dir = resolve_data_dir();
        assert!(dir.to_string_lossy().contains(".ayla") || dir.is_absolute());
    }
}
