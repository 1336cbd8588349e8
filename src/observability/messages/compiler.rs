// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for compiler invocation events.

use std::fmt::{Display, Formatter};

/// Compiler invocation started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_scriptgate::observability::messages::compiler::CompilationStarted;
///
/// let msg = CompilationStarted {
///     program: "rustc",
///     file_count: 1,
///     classpath_count: 0,
///     all_errors: false,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct CompilationStarted<'a> {
    pub program: &'a str,
    pub file_count: usize,
    pub classpath_count: usize,
    pub all_errors: bool,
}

impl Display for CompilationStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Invoking {} on {} file(s) with {} classpath entries (all_errors={})",
            self.program, self.file_count, self.classpath_count, self.all_errors
        )
    }
}

/// Compiler invocation finished and the transcript was post-processed.
///
/// # Log Level
/// `info!` on success, `debug!` on a diagnostic failure
pub struct CompilationFinished<'a> {
    pub program: &'a str,
    pub success: bool,
    pub raw_len: usize,
    pub transcript_len: usize,
}

impl Display for CompilationFinished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} finished: success={}, raw diagnostics={} bytes, transcript={} bytes",
            self.program, self.success, self.raw_len, self.transcript_len
        )
    }
}

/// Compilation request carried no files; the toolchain was not invoked.
pub struct CompilationSkipped;

impl Display for CompilationSkipped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Compilation request has no source files; toolchain not invoked")
    }
}

/// The compiler could not be run at all.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ToolchainFailed<'a> {
    pub program: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ToolchainFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Toolchain '{}' failed: {}", self.program, self.error)
    }
}
