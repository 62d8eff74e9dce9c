//! Materialization of bundled helper tools into a per-operation working
//! directory.
//!
//! Each pipeline run owns exactly one `Workspace`. The directory is created
//! lazily on first tool need, populated from the compiled-in asset table,
//! and removed in full when the operation finishes, on success and failure
//! alike (`TempDir` drop is the backstop behind [`Workspace::close`]).

use anyhow::{bail, Context, Result};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::archive;

/// One compiled-in helper-tool file. The table itself is generated by
/// `build.rs` from the `assets/` tree.
pub struct BundledAsset {
    pub rel_path: &'static str,
    pub contents: &'static [u8],
}

include!(concat!(env!("OUT_DIR"), "/bundled_assets.rs"));

/// A helper-tool file to materialize, either compiled in or supplied by the
/// caller (tests build synthetic tool sets this way).
#[derive(Clone)]
pub struct Asset {
    rel_path: Cow<'static, str>,
    contents: Cow<'static, [u8]>,
}

impl Asset {
    pub fn new(rel_path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            rel_path: Cow::Owned(rel_path.into()),
            contents: Cow::Owned(contents.into()),
        }
    }
}

/// Name of the directory created for the decoder's framework data.
const FRAMEWORK_DIR: &str = "framework";

/// The working directory holding materialized helper tools for one
/// operation. Never shared between operations: two concurrent pipelines get
/// two distinct directories.
pub struct Workspace {
    assets: Vec<Asset>,
    root: Option<TempDir>,
}

impl Workspace {
    /// Workspace over the compiled-in asset table. No filesystem side
    /// effects until the first tool is needed.
    pub fn new() -> Self {
        let assets = BUNDLED_ASSETS
            .iter()
            .map(|asset| Asset {
                rel_path: Cow::Borrowed(asset.rel_path),
                contents: Cow::Borrowed(asset.contents),
            })
            .collect();
        Self { assets, root: None }
    }

    /// Workspace over a caller-supplied asset set.
    pub fn with_assets(assets: Vec<Asset>) -> Self {
        Self { assets, root: None }
    }

    /// The working directory, if it has been created yet.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_ref().map(|dir| dir.path())
    }

    /// Create the working directory and write every bundled asset into it,
    /// marking shell scripts executable. Idempotent: later calls return the
    /// same directory without re-extracting.
    pub fn ensure_materialized(&mut self) -> Result<&Path> {
        let dir = match self.root.take() {
            Some(dir) => dir,
            None => materialize(&self.assets)?,
        };
        Ok(self.root.insert(dir).path())
    }

    /// Absolute path of a materialized resource, creating the working
    /// directory first if needed.
    pub fn tool_path(&mut self, rel_path: &str) -> Result<PathBuf> {
        let root = self.ensure_materialized()?;
        Ok(root.join(rel_path))
    }

    /// Extract the members of a materialized resource (itself a ZIP archive)
    /// whose names match `pattern` into `dest_rel` under the workspace root,
    /// preserving relative paths. Returns the number of files written.
    pub fn extract_from_bundle(
        &mut self,
        bundled_rel: &str,
        pattern: &str,
        dest_rel: &str,
    ) -> Result<usize> {
        let root = self.ensure_materialized()?.to_path_buf();
        let archive_path = root.join(bundled_rel);
        if !archive_path.is_file() {
            bail!(
                "bundled archive '{}' is not materialized in '{}'",
                bundled_rel,
                root.display()
            );
        }
        archive::extract_matching(&archive_path, pattern, &root.join(dest_rel))
    }

    /// Remove the working directory. Safe to call when nothing was ever
    /// materialized.
    pub fn close(mut self) -> Result<()> {
        match self.root.take() {
            Some(dir) => dir.close().context("removing tool working directory"),
            None => Ok(()),
        }
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

fn materialize(assets: &[Asset]) -> Result<TempDir> {
    let dir = tempfile::Builder::new()
        .prefix("apkforge-")
        .tempdir()
        .context("creating tool working directory")?;

    for asset in assets {
        let dest = dir.path().join(asset.rel_path.as_ref());
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating directory '{}'", parent.display()))?;
        }
        fs::write(&dest, asset.contents.as_ref())
            .with_context(|| format!("writing bundled tool '{}'", dest.display()))?;
        mark_script_executable(&dest)?;
    }

    // The decoder expects its framework directory to exist even when no
    // framework data is bundled.
    fs::create_dir_all(dir.path().join(FRAMEWORK_DIR))
        .context("creating framework directory")?;

    Ok(dir)
}

#[cfg(unix)]
fn mark_script_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if path.extension().and_then(|ext| ext.to_str()) == Some("sh") {
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("marking '{}' executable", path.display()))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn mark_script_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_assets() -> Vec<Asset> {
        vec![
            Asset::new("jars/decoder.jar", b"jar bytes".to_vec()),
            Asset::new("tools/dex-tools/d2j.sh", b"#!/bin/sh\nexit 0\n".to_vec()),
        ]
    }

    #[test]
    fn no_directory_until_first_use() {
        let ws = Workspace::with_assets(sample_assets());
        assert!(ws.root().is_none());
    }

    #[test]
    fn materialization_writes_assets_and_framework_dir() {
        let mut ws = Workspace::with_assets(sample_assets());
        let root = ws.ensure_materialized().unwrap().to_path_buf();

        assert!(root.join("jars/decoder.jar").is_file());
        assert!(root.join("tools/dex-tools/d2j.sh").is_file());
        assert!(root.join("framework").is_dir());
        ws.close().unwrap();
    }

    #[test]
    fn materialization_is_idempotent() {
        let mut ws = Workspace::with_assets(sample_assets());
        let first = ws.ensure_materialized().unwrap().to_path_buf();
        let second = ws.ensure_materialized().unwrap().to_path_buf();

        assert_eq!(first, second);
        assert!(second.join("jars/decoder.jar").is_file());
        ws.close().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn shell_scripts_are_marked_executable() {
        use std::os::unix::fs::PermissionsExt;

        let mut ws = Workspace::with_assets(sample_assets());
        let root = ws.ensure_materialized().unwrap().to_path_buf();

        let script = fs::metadata(root.join("tools/dex-tools/d2j.sh")).unwrap();
        assert_eq!(script.permissions().mode() & 0o111, 0o111);
        let jar = fs::metadata(root.join("jars/decoder.jar")).unwrap();
        assert_eq!(jar.permissions().mode() & 0o111, 0);
        ws.close().unwrap();
    }

    #[test]
    fn close_removes_the_directory() {
        let mut ws = Workspace::with_assets(sample_assets());
        let root = ws.ensure_materialized().unwrap().to_path_buf();
        assert!(root.exists());

        ws.close().unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn close_without_materialization_is_safe() {
        Workspace::with_assets(sample_assets()).close().unwrap();
        Workspace::with_assets(Vec::new()).close().unwrap();
    }

    #[test]
    fn drop_removes_the_directory_on_early_exit() {
        let root = {
            let mut ws = Workspace::with_assets(sample_assets());
            ws.ensure_materialized().unwrap().to_path_buf()
        };
        assert!(!root.exists());
    }

    #[test]
    fn concurrent_workspaces_get_distinct_roots() {
        let mut a = Workspace::with_assets(sample_assets());
        let mut b = Workspace::with_assets(sample_assets());

        let root_a = a.ensure_materialized().unwrap().to_path_buf();
        let root_b = b.ensure_materialized().unwrap().to_path_buf();
        assert_ne!(root_a, root_b);

        a.close().unwrap();
        b.close().unwrap();
    }

    #[test]
    fn tool_path_materializes_first() {
        let mut ws = Workspace::with_assets(sample_assets());
        let path = ws.tool_path("jars/decoder.jar").unwrap();
        assert!(path.is_file());
        ws.close().unwrap();
    }

    #[test]
    fn extract_from_bundle_requires_materialized_archive() {
        let mut ws = Workspace::with_assets(Vec::new());
        let err = ws
            .extract_from_bundle("jars/decoder.jar", "prebuilt/*", ".")
            .unwrap_err();
        assert!(err.to_string().contains("decoder.jar"));
        ws.close().unwrap();
    }
}
