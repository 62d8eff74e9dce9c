//! Subprocess execution of the external tools.
//!
//! The pipelines never build command lines themselves: they name a
//! [`ToolKind`] and pass arguments, and the invoker resolves the tool inside
//! the workspace and runs it. Child stdout/stderr are inherited so tool
//! output streams straight to the operator; the exit status is the only
//! signal the pipelines consume.

use anyhow::{bail, Context, Result};
use std::ffi::OsStr;
use std::process::Command;

use crate::config::Config;
use crate::workspace::Workspace;

/// The external tools the pipelines can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// Resource decoder/builder jar, launched on the managed runtime with
    /// the framework directory wired in.
    ResourceDecoder,
    /// Standalone bytecode-to-jar converter script.
    BytecodeConverter,
    /// Decompiler jar, launched on the managed runtime.
    Decompiler,
    /// An arbitrary executable: the first argument is the program.
    Raw,
}

impl ToolKind {
    pub fn describe(self) -> &'static str {
        match self {
            ToolKind::ResourceDecoder => "resource decoder",
            ToolKind::BytecodeConverter => "bytecode converter",
            ToolKind::Decompiler => "decompiler",
            ToolKind::Raw => "raw executable",
        }
    }
}

/// The seam between the pipelines and subprocess execution. Pipelines are
/// generic over this so tests can substitute a scripted runner.
pub trait ToolRunner {
    fn run(&self, workspace: &mut Workspace, kind: ToolKind, args: &[&OsStr]) -> Result<()>;
}

/// Runs tools as real subprocesses, blocking until the child exits. No
/// timeout is imposed; a surrounding system owns any deadline.
pub struct SubprocessRunner {
    config: Config,
}

impl SubprocessRunner {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn command_for(
        &self,
        workspace: &mut Workspace,
        kind: ToolKind,
        args: &[&OsStr],
    ) -> Result<Command> {
        match kind {
            ToolKind::ResourceDecoder => {
                let jar = workspace.tool_path(&self.config.decoder_jar)?;
                let framework = workspace.tool_path(&self.config.framework_dir)?;
                let mut cmd = Command::new(&self.config.java_cmd);
                cmd.arg("-jar").arg(jar).arg("--frame-path").arg(framework);
                cmd.args(args);
                Ok(cmd)
            }
            ToolKind::Decompiler => {
                let jar = workspace.tool_path(&self.config.decompiler_jar)?;
                let mut cmd = Command::new(&self.config.java_cmd);
                cmd.arg("-jar").arg(jar);
                cmd.args(args);
                Ok(cmd)
            }
            ToolKind::BytecodeConverter => {
                let script = workspace.tool_path(&self.config.converter_script)?;
                let mut cmd = Command::new(script);
                cmd.args(args);
                Ok(cmd)
            }
            ToolKind::Raw => {
                let Some((program, rest)) = args.split_first() else {
                    bail!("raw tool invocation requires an executable path");
                };
                let mut cmd = Command::new(program);
                cmd.args(rest);
                Ok(cmd)
            }
        }
    }
}

impl ToolRunner for SubprocessRunner {
    fn run(&self, workspace: &mut Workspace, kind: ToolKind, args: &[&OsStr]) -> Result<()> {
        let mut cmd = self.command_for(workspace, kind, args)?;
        let rendered = render_command(&cmd);

        let status = cmd
            .status()
            .with_context(|| format!("launching {}: {}", kind.describe(), rendered))?;

        if !status.success() {
            bail!(
                "{} exited with status {}: {}",
                kind.describe(),
                status.code().unwrap_or(-1),
                rendered
            );
        }
        Ok(())
    }
}

fn render_command(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|arg| arg.to_string_lossy().into_owned()));
    parts.join(" ")
}
