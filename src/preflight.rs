//! Host checks run before a pipeline starts, so a missing runtime fails
//! with an actionable message instead of a mid-pipeline launch error.

use anyhow::{bail, Result};
use std::path::Path;

use crate::config::Config;

/// Verify the managed runtime command can be found. Absolute paths are
/// checked directly; bare commands are resolved through `PATH`.
pub fn check_runtime(config: &Config) -> Result<()> {
    let cmd = Path::new(&config.java_cmd);
    if cmd.is_absolute() {
        if cmd.is_file() {
            return Ok(());
        }
        bail!("Java runtime '{}' does not exist", cmd.display());
    }

    if which::which(&config.java_cmd).is_ok() {
        return Ok(());
    }
    bail!(
        "Java runtime '{}' not found in PATH\n  \
         The resource decoder and decompiler run on the JVM.\n  \
         Install a JRE, or set JAVA_HOME / java_cmd in the config file.",
        config.java_cmd
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_cmd(cmd: &str) -> Config {
        Config {
            java_cmd: cmd.to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn resolvable_command_passes() {
        // 'ls' exists on any Unix PATH.
        check_runtime(&config_with_cmd("ls")).unwrap();
    }

    #[test]
    fn unresolvable_command_fails() {
        let err = check_runtime(&config_with_cmd("definitely_not_a_runtime_9z")).unwrap_err();
        assert!(err.to_string().contains("definitely_not_a_runtime_9z"));
    }

    #[test]
    fn absolute_path_is_checked_directly() {
        assert!(check_runtime(&config_with_cmd("/nonexistent/bin/java")).is_err());
    }
}
