//! Per-invocation pipeline configuration.
//!
//! A `Config` is resolved once per command and read-only afterwards: the
//! workspace-relative paths of the bundled tools, the command used to launch
//! the Java runtime, and the platform packaging binary. Defaults can be
//! overridden with a TOML file pointed at by `APKFORGE_CONFIG`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Environment variable naming an optional TOML config override file.
pub const CONFIG_ENV: &str = "APKFORGE_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Command used to launch the Java runtime for the jar-based tools.
    pub java_cmd: String,
    /// Resource decoder/builder jar, relative to the workspace root.
    pub decoder_jar: String,
    /// Decompiler jar, relative to the workspace root.
    pub decompiler_jar: String,
    /// Bytecode converter entry script, relative to the workspace root.
    pub converter_script: String,
    /// Framework data directory handed to the decoder via `--frame-path`.
    pub framework_dir: String,
    /// Platform packaging binary, relative to the workspace root.
    pub packaging_binary: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            java_cmd: resolve_java_cmd(),
            decoder_jar: "jars/apktool.jar".to_string(),
            decompiler_jar: "jars/procyon-decompiler-v0.6.1.jar".to_string(),
            converter_script: "tools/dex-tools-v2.4/d2j-dex2jar.sh".to_string(),
            framework_dir: "framework".to_string(),
            packaging_binary: packaging_binary_for(env::consts::OS).to_string(),
        }
    }
}

impl Config {
    /// Resolve the configuration for one command: defaults, or the file
    /// named by `APKFORGE_CONFIG` when set.
    pub fn load() -> Result<Self> {
        match env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// Load a TOML config file. Absent keys keep their default values;
    /// unknown keys are rejected.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config '{}'", path.display()))?;
        let parsed: Config = toml::from_str(&raw)
            .with_context(|| format!("parsing config '{}'", path.display()))?;
        Ok(parsed)
    }
}

/// Map an operating-system identifier to the packaging binary bundled for it
/// inside the decoder jar. Unrecognized systems get the linux binary.
pub fn packaging_binary_for(os: &str) -> &'static str {
    match os {
        "macos" => "prebuilt/aapt/macosx/aapt",
        "linux" => "prebuilt/aapt/linux/aapt",
        _ => "prebuilt/aapt/linux/aapt",
    }
}

/// Locate the Java runtime: `JAVA_HOME/bin/java` when it exists, then
/// whatever `PATH` offers, then the bare command for the OS to resolve.
fn resolve_java_cmd() -> String {
    if let Some(home) = env::var_os("JAVA_HOME") {
        let candidate = Path::new(&home).join("bin").join("java");
        if candidate.is_file() {
            return candidate.to_string_lossy().into_owned();
        }
    }
    if let Ok(found) = which::which("java") {
        return found.to_string_lossy().into_owned();
    }
    "java".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packaging_binary_covers_known_platforms() {
        assert_eq!(packaging_binary_for("linux"), "prebuilt/aapt/linux/aapt");
        assert_eq!(packaging_binary_for("macos"), "prebuilt/aapt/macosx/aapt");
    }

    #[test]
    fn packaging_binary_defaults_for_unrecognized_platforms() {
        assert_eq!(packaging_binary_for("freebsd"), "prebuilt/aapt/linux/aapt");
        assert_eq!(packaging_binary_for(""), "prebuilt/aapt/linux/aapt");
    }

    #[test]
    fn partial_config_file_keeps_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("apkforge.toml");
        std::fs::write(&path, "java_cmd = \"/opt/jdk/bin/java\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.java_cmd, "/opt/jdk/bin/java");
        assert_eq!(config.decoder_jar, "jars/apktool.jar");
        assert_eq!(config.framework_dir, "framework");
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("apkforge.toml");
        std::fs::write(&path, "no_such_key = true\n").unwrap();

        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(Config::from_file(Path::new("/nonexistent/apkforge.toml")).is_err());
    }
}
