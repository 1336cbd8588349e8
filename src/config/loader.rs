// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_ARTIFACT_PREFIX, DEFAULT_COMPILER, DEFAULT_EDITION, DEFAULT_FUEL_LEVEL,
    DEFAULT_OUTPUT_CAPACITY, DEFAULT_TARGET, DEFAULT_TRUSTED_SCHEMES, DEFAULT_WORKSPACE_PREFIX,
    MAX_ARTIFACT_SIZE, MAX_FUEL_LEVEL, MIN_FUEL_LEVEL,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure for the gateway.
///
/// Every section is optional; an empty document yields the defaults in
/// [`crate::config::consts`].
///
/// # Example
/// ```yaml
/// trust:
///   trusted_schemes: [file]
/// compiler:
///   program: rustc
///   target: wasm32-wasip1
///   all_errors: false
///   runtime_library: /opt/scriptgate/runtime
/// wasm:
///   fuel:
///     default: 1000000000
/// workspace:
///   keep_artifacts: false
/// ```
#[derive(Debug, Deserialize, Default, Clone)]
pub struct GatewayConfig {
    #[serde(default)]
    pub trust: TrustConfig,
    #[serde(default)]
    pub compiler: CompilerConfig,
    #[serde(default)]
    pub wasm: WasmConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
}

/// Which caller origins may use privileged entry points.
#[derive(Debug, Deserialize, Clone)]
pub struct TrustConfig {
    #[serde(default = "default_trusted_schemes")]
    pub trusted_schemes: Vec<String>,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            trusted_schemes: default_trusted_schemes(),
        }
    }
}

fn default_trusted_schemes() -> Vec<String> {
    DEFAULT_TRUSTED_SCHEMES.iter().map(|s| s.to_string()).collect()
}

/// External compiler settings.
///
/// # Fields
/// * `program` - Compiler executable (looked up on `PATH` when relative)
/// * `target` - Target triple passed to the compiler
/// * `edition` - Language edition for translated units
/// * `all_errors` - Report every diagnostic instead of only the first
/// * `runtime_library` - Directory of the runtime's own library, added to the classpath
/// * `extra_args` - Appended verbatim after the standard flags
#[derive(Debug, Deserialize, Clone)]
pub struct CompilerConfig {
    #[serde(default = "default_compiler")]
    pub program: String,
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default = "default_edition")]
    pub edition: String,
    #[serde(default)]
    pub all_errors: bool,
    #[serde(default)]
    pub runtime_library: Option<PathBuf>,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: default_compiler(),
            target: default_target(),
            edition: default_edition(),
            all_errors: false,
            runtime_library: None,
            extra_args: Vec::new(),
        }
    }
}

impl CompilerConfig {
    /// Classpath handed to every compilation: the runtime library, if any.
    pub fn classpath(&self) -> Vec<PathBuf> {
        self.runtime_library.iter().cloned().collect()
    }
}

fn default_compiler() -> String {
    DEFAULT_COMPILER.to_string()
}

fn default_target() -> String {
    DEFAULT_TARGET.to_string()
}

fn default_edition() -> String {
    DEFAULT_EDITION.to_string()
}

/// WASM-specific configuration options.
#[derive(Debug, Deserialize, Clone)]
pub struct WasmConfig {
    #[serde(default)]
    pub fuel: FuelConfig,
    #[serde(default = "default_max_artifact_bytes")]
    pub max_artifact_bytes: usize,
    /// Bytes of guest stderr kept for failure reports. Guest stdout is
    /// streamed to the console and not bounded here.
    #[serde(default = "default_output_capacity")]
    pub output_capacity: usize,
}

impl Default for WasmConfig {
    fn default() -> Self {
        Self {
            fuel: FuelConfig::default(),
            max_artifact_bytes: default_max_artifact_bytes(),
            output_capacity: default_output_capacity(),
        }
    }
}

fn default_max_artifact_bytes() -> usize {
    MAX_ARTIFACT_SIZE
}

fn default_output_capacity() -> usize {
    DEFAULT_OUTPUT_CAPACITY
}

/// Fuel consumption configuration for artifact execution.
///
/// Fuel bounds runaway loops by limiting the number of instructions a guest
/// may execute per `run()`.
///
/// # Example
/// ```yaml
/// fuel:
///   default: 1000000000   # 1 billion instructions
///   minimum: 1000000      # 1 million instructions
///   maximum: 20000000000  # hard limit
/// ```
#[derive(Debug, Deserialize, Default, Clone)]
pub struct FuelConfig {
    pub default: Option<u64>,
    pub minimum: Option<u64>,
    pub maximum: Option<u64>,
}

impl FuelConfig {
    pub fn get_default(&self) -> u64 {
        self.default.unwrap_or(DEFAULT_FUEL_LEVEL)
    }

    pub fn get_minimum(&self) -> u64 {
        self.minimum.unwrap_or(MIN_FUEL_LEVEL)
    }

    pub fn get_maximum(&self) -> u64 {
        self.maximum.unwrap_or(MAX_FUEL_LEVEL)
    }

    /// Validate and clamp a fuel level to configured bounds.
    ///
    /// # Example
    /// ```
    /// use the_scriptgate::config::FuelConfig;
    ///
    /// let config = FuelConfig::default();
    /// let fuel = config.validate_and_clamp(u64::MAX);
    /// assert_eq!(fuel, 20_000_000_000);
    /// ```
    pub fn validate_and_clamp(&self, requested: u64) -> u64 {
        let min = self.get_minimum();
        let max = self.get_maximum().max(min);
        let clamped = requested.clamp(min, max);
        if clamped != requested {
            tracing::warn!(
                "Requested fuel level {} is outside [{}, {}]; using {}",
                requested,
                min,
                max,
                clamped
            );
        }
        clamped
    }

    /// The fuel level each execution actually starts with.
    pub fn effective(&self) -> u64 {
        self.validate_and_clamp(self.get_default())
    }
}

/// Per-request compile workspaces.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkspaceConfig {
    #[serde(default = "default_workspace_prefix")]
    pub temp_prefix: String,
    #[serde(default = "default_artifact_prefix")]
    pub artifact_prefix: String,
    /// Leave compile directories on disk when the gateway shuts down
    #[serde(default)]
    pub keep_artifacts: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            temp_prefix: default_workspace_prefix(),
            artifact_prefix: default_artifact_prefix(),
            keep_artifacts: false,
        }
    }
}

fn default_workspace_prefix() -> String {
    DEFAULT_WORKSPACE_PREFIX.to_string()
}

fn default_artifact_prefix() -> String {
    DEFAULT_ARTIFACT_PREFIX.to_string()
}

/// Load a config from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<GatewayConfig> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse a config from YAML text. An empty document yields the defaults.
pub fn parse_config(yaml: &str) -> anyhow::Result<GatewayConfig> {
    if yaml.trim().is_empty() {
        return Ok(GatewayConfig::default());
    }
    let cfg: GatewayConfig = serde_yaml::from_str(yaml)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_document_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.trust.trusted_schemes, vec!["file".to_string()]);
        assert_eq!(cfg.compiler.program, "rustc");
        assert_eq!(cfg.compiler.target, "wasm32-wasip1");
        assert!(!cfg.compiler.all_errors);
        assert!(cfg.compiler.classpath().is_empty());
        assert_eq!(cfg.wasm.fuel.effective(), DEFAULT_FUEL_LEVEL);
        assert_eq!(cfg.workspace.artifact_prefix, "snippet_");
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
trust:
  trusted_schemes: [file, https]
compiler:
  program: /usr/local/bin/rustc
  all_errors: true
  runtime_library: /opt/runtime
  extra_args: ["-C", "opt-level=1"]
wasm:
  fuel:
    default: 5000000
  max_artifact_bytes: 1024
workspace:
  keep_artifacts: true
"#;
        let cfg = parse_config(yaml).unwrap();
        assert_eq!(cfg.trust.trusted_schemes.len(), 2);
        assert_eq!(cfg.compiler.program, "/usr/local/bin/rustc");
        assert!(cfg.compiler.all_errors);
        assert_eq!(cfg.compiler.classpath(), vec![PathBuf::from("/opt/runtime")]);
        assert_eq!(cfg.compiler.extra_args.len(), 2);
        assert_eq!(cfg.wasm.fuel.effective(), 5_000_000);
        assert_eq!(cfg.wasm.max_artifact_bytes, 1024);
        assert_eq!(cfg.wasm.output_capacity, DEFAULT_OUTPUT_CAPACITY);
        assert!(cfg.workspace.keep_artifacts);
        assert_eq!(cfg.workspace.temp_prefix, DEFAULT_WORKSPACE_PREFIX);
    }

    #[test]
    fn test_fuel_is_clamped() {
        let fuel = FuelConfig {
            default: Some(10),
            minimum: None,
            maximum: None,
        };
        assert_eq!(fuel.effective(), MIN_FUEL_LEVEL);
        assert_eq!(FuelConfig::default().validate_and_clamp(u64::MAX), MAX_FUEL_LEVEL);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "compiler:\n  target: wasm32-wasip2").unwrap();
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.compiler.target, "wasm32-wasip2");
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(parse_config("compiler: [unterminated").is_err());
    }
}
