//! Reverse conversion: editable resource tree -> APK.
//!
//! The decoder jar doubles as the builder; the platform packaging binary it
//! needs is pulled out of the jar itself on first use. Tool working-directory
//! teardown runs whatever the outcome.

use anyhow::{bail, Context, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::console;
use crate::fsops;
use crate::invoke::{ToolKind, ToolRunner};
use crate::workspace::Workspace;

/// Metadata file the decoder writes at decode time and requires at build
/// time; its presence marks a buildable tree.
pub const DECODER_METADATA: &str = "apktool.yml";

/// Members of the decoder jar holding the per-platform packaging binaries.
const PACKAGING_PATTERN: &str = "prebuilt/aapt/*";

/// Drives one repackaging run.
pub struct Packer<'a> {
    config: &'a Config,
    runner: &'a dyn ToolRunner,
}

impl<'a> Packer<'a> {
    pub fn new(config: &'a Config, runner: &'a dyn ToolRunner) -> Self {
        Self { config, runner }
    }

    /// Build `output_apk` from the tree under `source_dir`.
    pub fn pack(&self, source_dir: &Path, output_apk: &Path) -> Result<()> {
        self.pack_with(Workspace::new(), source_dir, output_apk)
    }

    /// Same, with a caller-supplied workspace. The workspace is consumed:
    /// its directory is removed before this returns, whatever the outcome.
    pub fn pack_with(
        &self,
        mut workspace: Workspace,
        source_dir: &Path,
        output_apk: &Path,
    ) -> Result<()> {
        let outcome = self.drive(&mut workspace, source_dir, output_apk);
        let teardown = workspace.close();
        outcome.and(teardown)
    }

    fn drive(
        &self,
        workspace: &mut Workspace,
        source_dir: &Path,
        output_apk: &Path,
    ) -> Result<()> {
        if !source_dir.exists() {
            bail!("source directory does not exist: '{}'", source_dir.display());
        }
        if !fsops::has_archive_extension(output_apk) {
            bail!(
                "output file '{}' must have the .{} extension",
                output_apk.display(),
                fsops::ARCHIVE_EXT
            );
        }

        console::status(&format!(
            "[+] Building APK from '{}' into '{}'",
            source_dir.display(),
            output_apk.display()
        ));

        let build_root = resolve_build_root(source_dir)?;
        let packaging_binary = self.ensure_packaging_binary(workspace)?;

        self.runner
            .run(
                workspace,
                ToolKind::ResourceDecoder,
                &[
                    OsStr::new("-aapt"),
                    packaging_binary.as_os_str(),
                    OsStr::new("b"),
                    build_root.as_os_str(),
                    OsStr::new("-o"),
                    output_apk.as_os_str(),
                ],
            )
            .context("building the archive with the resource decoder")?;

        console::status(&format!("[+] Built '{}'", output_apk.display()));
        Ok(())
    }

    /// Resolve the platform packaging binary inside the workspace,
    /// extracting it from the bundled decoder jar when not yet present.
    fn ensure_packaging_binary(&self, workspace: &mut Workspace) -> Result<PathBuf> {
        let rel = &self.config.packaging_binary;
        let path = workspace.tool_path(rel)?;
        if path.is_file() {
            return Ok(path);
        }

        let extracted = workspace
            .extract_from_bundle(&self.config.decoder_jar, PACKAGING_PATTERN, ".")
            .context("extracting the packaging binary from the bundled decoder")?;
        if extracted == 0 || !path.is_file() {
            bail!(
                "packaging binary '{}' is not present in the bundled decoder archive",
                rel
            );
        }
        Ok(path)
    }
}

/// The directory actually handed to the decoder: an extraction root's
/// `unpacked/` subtree when that holds the decoder metadata, or `source_dir`
/// itself when it does.
fn resolve_build_root(source_dir: &Path) -> Result<PathBuf> {
    let nested = source_dir.join(super::unpack::RESOURCE_SUBDIR);
    if nested.join(DECODER_METADATA).is_file() {
        return Ok(nested);
    }
    if source_dir.join(DECODER_METADATA).is_file() {
        return Ok(source_dir.to_path_buf());
    }
    bail!(
        "no {} found in '{}' or '{}'",
        DECODER_METADATA,
        source_dir.display(),
        nested.display()
    );
}
