// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::CompilerConfig;
use crate::errors::{ToolchainError, ToolchainResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Everything a toolchain needs for one run.
#[derive(Debug, Clone)]
pub struct ToolchainInvocation<'a> {
    /// Crate root first, then any further modules it includes.
    pub sources: &'a [PathBuf],
    pub classpath: &'a [PathBuf],
    pub output: &'a Path,
    pub debug_info: bool,
    pub suppress_warnings: bool,
}

/// Raw result of a toolchain run, before any transcript processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    pub diagnostics: String,
}

impl ToolchainOutput {
    pub fn succeeded(&self) -> bool {
        self.status == Some(0)
    }
}

pub trait Toolchain: Send + Sync {
    /// Name used in logs and errors.
    fn program(&self) -> &str;

    fn invoke(&self, invocation: &ToolchainInvocation<'_>) -> ToolchainResult<ToolchainOutput>;
}

/// `rustc` producing a `cdylib` WebAssembly module.
#[derive(Debug, Clone)]
pub struct RustcToolchain {
    program: String,
    target: String,
    edition: String,
    extra_args: Vec<String>,
}

impl RustcToolchain {
    pub fn new(config: &CompilerConfig) -> Self {
        Self {
            program: config.program.clone(),
            target: config.target.clone(),
            edition: config.edition.clone(),
            extra_args: config.extra_args.clone(),
        }
    }

    pub fn arguments(&self, invocation: &ToolchainInvocation<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--crate-type".into(),
            "cdylib".into(),
            "--target".into(),
            self.target.as_str().into(),
            "--edition".into(),
            self.edition.as_str().into(),
            "--crate-name".into(),
            crate_name(invocation.output).into(),
        ];
        if invocation.debug_info {
            args.push("-g".into());
        }
        if invocation.suppress_warnings {
            args.push("-A".into());
            args.push("warnings".into());
        }
        args.push("-o".into());
        args.push(invocation.output.as_os_str().to_owned());
        if let Some(root) = invocation.sources.first() {
            args.push(root.as_os_str().to_owned());
        }
        for entry in invocation.classpath {
            args.push("-L".into());
            args.push(entry.as_os_str().to_owned());
        }
        args.extend(self.extra_args.iter().map(OsString::from));
        args
    }
}

impl Toolchain for RustcToolchain {
    fn program(&self) -> &str {
        &self.program
    }

    fn invoke(&self, invocation: &ToolchainInvocation<'_>) -> ToolchainResult<ToolchainOutput> {
        let output = Command::new(&self.program)
            .args(self.arguments(invocation))
            .output()
            .map_err(|source| ToolchainError::Unavailable {
                program: self.program.clone(),
                source,
            })?;

        let mut diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            diagnostics.push_str(&stdout);
        }

        let status = output.status.code();
        if status.is_none() && diagnostics.trim().is_empty() {
            return Err(ToolchainError::Crashed(format!(
                "{} {}",
                self.program, output.status
            )));
        }

        Ok(ToolchainOutput {
            status,
            diagnostics,
        })
    }
}

/// Crate names must be identifiers; derive one from the artifact file stem.
pub fn crate_name(output: &Path) -> String {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation<'a>(
        sources: &'a [PathBuf],
        classpath: &'a [PathBuf],
        output: &'a Path,
    ) -> ToolchainInvocation<'a> {
        ToolchainInvocation {
            sources,
            classpath,
            output,
            debug_info: true,
            suppress_warnings: true,
        }
    }

    #[test]
    fn test_arguments_map_standard_flags() {
        let toolchain = RustcToolchain::new(&CompilerConfig::default());
        let sources = vec![PathBuf::from("/ws/snippet_4.rs")];
        let classpath = vec![PathBuf::from("/opt/runtime")];
        let output = PathBuf::from("/ws/snippet_4.wasm");
        let args: Vec<String> = toolchain
            .arguments(&invocation(&sources, &classpath, &output))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        let joined = args.join(" ");
        assert!(joined.starts_with("--crate-type cdylib --target wasm32-wasip1 --edition 2021"));
        assert!(joined.contains("--crate-name snippet_4"));
        assert!(joined.contains("-g -A warnings"));
        assert!(joined.contains("-o /ws/snippet_4.wasm /ws/snippet_4.rs"));
        assert!(joined.ends_with("-L /opt/runtime"));
    }

    #[test]
    fn test_extra_args_come_last() {
        let config = CompilerConfig {
            extra_args: vec!["-C".to_string(), "opt-level=1".to_string()],
            ..CompilerConfig::default()
        };
        let toolchain = RustcToolchain::new(&config);
        let sources = vec![PathBuf::from("a.rs")];
        let output = PathBuf::from("a.wasm");
        let mut inv = invocation(&sources, &[], &output);
        inv.debug_info = false;
        inv.suppress_warnings = false;
        let args = toolchain.arguments(&inv);
        assert_eq!(args[args.len() - 2], OsString::from("-C"));
        assert!(!args.contains(&OsString::from("-g")));
    }

    #[test]
    fn test_crate_name_is_an_identifier() {
        assert_eq!(crate_name(Path::new("/x/snippet_1.wasm")), "snippet_1");
        assert_eq!(crate_name(Path::new("/x/my-prog.wasm")), "my_prog");
        assert_eq!(crate_name(Path::new("/x/1st.wasm")), "_1st");
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let config = CompilerConfig {
            program: "scriptgate-no-such-compiler".to_string(),
            ..CompilerConfig::default()
        };
        let toolchain = RustcToolchain::new(&config);
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![dir.path().join("a.rs")];
        let output = dir.path().join("a.wasm");
        let result = toolchain.invoke(&invocation(&sources, &[], &output));
        assert!(matches!(result, Err(ToolchainError::Unavailable { .. })));
    }
}
