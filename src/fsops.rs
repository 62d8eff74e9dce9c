//! Small filesystem helpers shared by the pipelines.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Extension carried by the application archives this tool reads and writes.
pub const ARCHIVE_EXT: &str = "apk";

/// Whether `path` carries the application-archive extension.
pub fn has_archive_extension(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(ARCHIVE_EXT)
}

/// Derive the extraction target for an archive: same parent directory, base
/// name with the extension stripped. `some/dir/app.apk` -> `some/dir/app`.
pub fn extract_dir_for(archive: &Path) -> PathBuf {
    archive.with_extension("")
}

/// Remove `path` recursively if it exists; absent is not an error.
pub fn remove_dir_if_present(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("removing directory '{}'", path.display()))?;
    }
    Ok(())
}

/// Replace `path` with a fresh empty directory, removing any previous
/// contents first.
pub fn recreate_dir(path: &Path) -> Result<()> {
    remove_dir_if_present(path)?;
    fs::create_dir_all(path).with_context(|| format!("creating directory '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn archive_extension_check() {
        assert!(has_archive_extension(Path::new("app.apk")));
        assert!(has_archive_extension(Path::new("/a/b/app.apk")));
        assert!(!has_archive_extension(Path::new("app.zip")));
        assert!(!has_archive_extension(Path::new("app.APK")));
        assert!(!has_archive_extension(Path::new("apk")));
    }

    #[test]
    fn extract_dir_strips_extension_in_place() {
        assert_eq!(extract_dir_for(Path::new("/tmp/app.apk")), Path::new("/tmp/app"));
        assert_eq!(extract_dir_for(Path::new("app.apk")), Path::new("app"));
    }

    #[test]
    fn recreate_dir_replaces_existing_contents() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("src");
        fs::create_dir_all(dir.join("old")).unwrap();
        fs::write(dir.join("old/stale.java"), "x").unwrap();

        recreate_dir(&dir).unwrap();

        assert!(dir.exists());
        assert!(!dir.join("old").exists());
    }

    #[test]
    fn remove_dir_if_present_tolerates_missing() {
        let temp = TempDir::new().unwrap();
        remove_dir_if_present(&temp.path().join("never-created")).unwrap();
    }
}
