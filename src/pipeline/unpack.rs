//! Forward conversion: APK -> decoded resources + decompiled source.
//!
//! The run is an explicit stage walk. Each stage depends on the filesystem
//! effects of the previous one, so a failing stage aborts the walk; there is
//! no recovery transition and completed stages are not rolled back. The tool
//! working directory is torn down on every exit path.

use anyhow::{bail, Context, Result};
use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use crate::archive;
use crate::console;
use crate::fsops;
use crate::invoke::{ToolKind, ToolRunner};
use crate::workspace::Workspace;

/// Decoded resources and manifest land here, under the extraction target.
pub const RESOURCE_SUBDIR: &str = "unpacked";
/// Decompiled source lands here, recreated from scratch each run.
pub const SOURCE_SUBDIR: &str = "src";
/// Bytecode member name in current archives.
pub const PRIMARY_BYTECODE: &str = "classes.dex";
/// Bytecode member name used by some legacy archives.
pub const LEGACY_BYTECODE: &str = "class.dex";
/// Intermediate jar produced by conversion, consumed by decompilation.
pub const INTERMEDIATE_ARCHIVE: &str = "classes.jar";

/// The ordered stages of an extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    ExtractingResources,
    ExtractingBytecode,
    ConvertingToIntermediate,
    Decompiling,
    Done,
}

impl Stage {
    /// The successor stage. `Done` is terminal.
    pub fn next(self) -> Stage {
        match self {
            Stage::Validating => Stage::ExtractingResources,
            Stage::ExtractingResources => Stage::ExtractingBytecode,
            Stage::ExtractingBytecode => Stage::ConvertingToIntermediate,
            Stage::ConvertingToIntermediate => Stage::Decompiling,
            Stage::Decompiling => Stage::Done,
            Stage::Done => Stage::Done,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Stage::Validating => "validating input",
            Stage::ExtractingResources => "extracting resources",
            Stage::ExtractingBytecode => "extracting bytecode",
            Stage::ConvertingToIntermediate => "converting bytecode to jar",
            Stage::Decompiling => "decompiling classes",
            Stage::Done => "finished",
        }
    }
}

/// Drives one extraction run.
pub struct Unpacker<'a> {
    runner: &'a dyn ToolRunner,
}

impl<'a> Unpacker<'a> {
    pub fn new(runner: &'a dyn ToolRunner) -> Self {
        Self { runner }
    }

    /// Unpack `apk_path` into a sibling directory named after it.
    pub fn unpack(&self, apk_path: &Path) -> Result<()> {
        self.unpack_with(Workspace::new(), apk_path)
    }

    /// Same, with a caller-supplied workspace. The workspace is consumed:
    /// its directory is removed before this returns, whatever the outcome.
    pub fn unpack_with(&self, mut workspace: Workspace, apk_path: &Path) -> Result<()> {
        let outcome = self.drive(&mut workspace, apk_path);
        let teardown = workspace.close();
        outcome.and(teardown)
    }

    fn drive(&self, workspace: &mut Workspace, apk_path: &Path) -> Result<()> {
        let target = fsops::extract_dir_for(apk_path);

        let mut stage = Stage::Validating;
        while stage != Stage::Done {
            self.execute(stage, workspace, apk_path, &target)
                .with_context(|| format!("{} for '{}'", stage.describe(), apk_path.display()))?;
            stage = stage.next();
        }

        console::status("");
        console::status(&format!(
            "[+] Resources and manifest are in '{}'",
            target.join(RESOURCE_SUBDIR).display()
        ));
        console::status(&format!(
            "[+] Decompiled classes are in '{}'",
            target.join(SOURCE_SUBDIR).display()
        ));
        Ok(())
    }

    fn execute(
        &self,
        stage: Stage,
        workspace: &mut Workspace,
        apk_path: &Path,
        target: &Path,
    ) -> Result<()> {
        match stage {
            Stage::Validating => validate(apk_path, target),
            Stage::ExtractingResources => self.extract_resources(workspace, apk_path, target),
            Stage::ExtractingBytecode => extract_bytecode(apk_path, target),
            Stage::ConvertingToIntermediate => self.convert_bytecode(workspace, target),
            Stage::Decompiling => self.decompile(workspace, target),
            Stage::Done => Ok(()),
        }
    }

    fn extract_resources(
        &self,
        workspace: &mut Workspace,
        apk_path: &Path,
        target: &Path,
    ) -> Result<()> {
        console::status("[+] Extracting resources");
        let unpacked = target.join(RESOURCE_SUBDIR);
        self.runner.run(
            workspace,
            ToolKind::ResourceDecoder,
            &[
                OsStr::new("d"),
                apk_path.as_os_str(),
                OsStr::new("-o"),
                unpacked.as_os_str(),
            ],
        )
    }

    fn convert_bytecode(&self, workspace: &mut Workspace, target: &Path) -> Result<()> {
        console::status("[+] Converting classes.dex to jar");
        let dex = target.join(PRIMARY_BYTECODE);
        let jar = target.join(INTERMEDIATE_ARCHIVE);
        self.runner.run(
            workspace,
            ToolKind::BytecodeConverter,
            &[dex.as_os_str(), OsStr::new("-o"), jar.as_os_str()],
        )?;
        fs::remove_file(&dex)
            .with_context(|| format!("removing consumed '{}'", dex.display()))?;
        Ok(())
    }

    fn decompile(&self, workspace: &mut Workspace, target: &Path) -> Result<()> {
        console::status("[+] Decompiling classes");
        let src = target.join(SOURCE_SUBDIR);
        let jar = target.join(INTERMEDIATE_ARCHIVE);
        fsops::recreate_dir(&src)?;
        self.runner.run(
            workspace,
            ToolKind::Decompiler,
            &[
                OsStr::new("-jar"),
                jar.as_os_str(),
                OsStr::new("-o"),
                src.as_os_str(),
            ],
        )?;
        fs::remove_file(&jar)
            .with_context(|| format!("removing consumed '{}'", jar.display()))?;
        Ok(())
    }
}

fn validate(apk_path: &Path, target: &Path) -> Result<()> {
    if !fsops::has_archive_extension(apk_path) {
        bail!(
            "'{}' must have the .{} extension",
            apk_path.display(),
            fsops::ARCHIVE_EXT
        );
    }
    if !apk_path.exists() {
        bail!("APK file does not exist: '{}'", apk_path.display());
    }
    if target.exists() {
        bail!(
            "directory '{}' already exists; remove or rename it and retry",
            target.display()
        );
    }
    console::status(&format!("[+] Extracting under '{}'", target.display()));
    Ok(())
}

/// Pull the bytecode member out of the archive, falling back to the legacy
/// member name. The primary name wins when both are present; neither present
/// fails the stage.
fn extract_bytecode(apk_path: &Path, target: &Path) -> Result<()> {
    console::status(&format!("[+] Extracting {}", PRIMARY_BYTECODE));
    if archive::extract_member(apk_path, PRIMARY_BYTECODE, target).is_ok() {
        return Ok(());
    }
    let legacy = archive::extract_member(apk_path, LEGACY_BYTECODE, target).with_context(|| {
        format!(
            "archive contains neither '{}' nor '{}'",
            PRIMARY_BYTECODE, LEGACY_BYTECODE
        )
    })?;
    fs::rename(&legacy, target.join(PRIMARY_BYTECODE)).with_context(|| {
        format!("renaming '{}' to '{}'", LEGACY_BYTECODE, PRIMARY_BYTECODE)
    })?;
    Ok(())
}
