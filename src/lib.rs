//! Convert Android application packages into editable trees and back.
//!
//! The forward pipeline (`unpack`) turns an APK into decoded resources plus
//! decompiled source; the reverse pipeline (`pack`) rebuilds an APK from
//! such a tree. All format work is done by external tools run as
//! subprocesses; this crate owns the orchestration:
//!
//! - **Workspace** - bundled helper tools materialized into a private
//!   working directory, removed in full when the operation ends
//! - **Tool invocation** - one subprocess contract shared by every tool,
//!   with output streamed through and the exit status as the only signal
//! - **Pipelines** - ordered stages where each step depends on the
//!   filesystem effects of the previous one, failing fast on the first error
//!
//! Operations are strictly sequential on a single control thread; concurrent
//! operations must use independent workspaces and disjoint extraction
//! targets.

pub mod archive;
pub mod config;
pub mod console;
pub mod fsops;
pub mod invoke;
pub mod pipeline;
pub mod preflight;
pub mod workspace;

pub use config::Config;
pub use invoke::{SubprocessRunner, ToolKind, ToolRunner};
pub use pipeline::pack::Packer;
pub use pipeline::unpack::{Stage, Unpacker};
pub use workspace::{Asset, Workspace};
