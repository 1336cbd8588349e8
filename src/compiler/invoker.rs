// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::diagnostics::DiagnosticRewriter;
use super::toolchain::{Toolchain, ToolchainInvocation};
use crate::config::consts::ARTIFACT_EXTENSION;
use crate::errors::{ToolchainError, ToolchainResult};
use crate::observability::messages::compiler::{
    CompilationFinished, CompilationSkipped, CompilationStarted, ToolchainFailed,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Source files to compile, in order, plus the classpath they compile against.
#[derive(Debug, Clone)]
pub struct CompilationRequest {
    files: Vec<PathBuf>,
    classpath: Vec<PathBuf>,
    all_errors: bool,
}

impl CompilationRequest {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files,
            classpath: Vec::new(),
            all_errors: false,
        }
    }

    pub fn with_classpath(mut self, classpath: Vec<PathBuf>) -> Self {
        self.classpath = classpath;
        self
    }

    pub fn with_all_errors(mut self, all_errors: bool) -> Self {
        self.all_errors = all_errors;
        self
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn classpath(&self) -> &[PathBuf] {
        &self.classpath
    }

    pub fn all_errors(&self) -> bool {
        self.all_errors
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationResult {
    pub success: bool,
    /// Learner-facing diagnostics, empty on success.
    pub transcript: String,
    /// Set only when `success` is true.
    pub artifact: Option<PathBuf>,
}

impl CompilationResult {
    fn failure(transcript: impl Into<String>) -> Self {
        Self {
            success: false,
            transcript: transcript.into(),
            artifact: None,
        }
    }
}

/// Runs a [`Toolchain`] and turns its output into a [`CompilationResult`].
pub struct CompilerInvoker {
    toolchain: Arc<dyn Toolchain>,
    rewriter: DiagnosticRewriter,
}

impl CompilerInvoker {
    pub fn new(toolchain: Arc<dyn Toolchain>) -> Self {
        Self {
            toolchain,
            rewriter: DiagnosticRewriter::default(),
        }
    }

    pub fn with_rewriter(mut self, rewriter: DiagnosticRewriter) -> Self {
        self.rewriter = rewriter;
        self
    }

    /// The artifact a source file compiles to: same directory, same stem.
    pub fn artifact_path_for(source: &Path) -> PathBuf {
        source.with_extension(ARTIFACT_EXTENSION)
    }

    pub fn compile(&self, request: &CompilationRequest) -> ToolchainResult<CompilationResult> {
        let Some(root) = request.files.first() else {
            tracing::debug!("{}", CompilationSkipped);
            return Ok(CompilationResult::failure("there is no source file to compile"));
        };

        let program = self.toolchain.program();
        tracing::info!(
            "{}",
            CompilationStarted {
                program,
                file_count: request.files.len(),
                classpath_count: request.classpath.len(),
                all_errors: request.all_errors,
            }
        );

        let output_path = Self::artifact_path_for(root);
        let invocation = ToolchainInvocation {
            sources: &request.files,
            classpath: &request.classpath,
            output: &output_path,
            debug_info: true,
            suppress_warnings: true,
        };

        let output = self.toolchain.invoke(&invocation).map_err(|e| {
            tracing::error!("{}", ToolchainFailed { program, error: &e });
            e
        })?;

        let mut transcript =
            self.rewriter
                .process(&output.diagnostics, &request.files, request.all_errors);
        if !output.succeeded() && transcript.is_empty() {
            transcript = match output.status {
                Some(code) => format!("compiler exited with status {}", code),
                None => "compiler was terminated".to_string(),
            };
        }
        let success = transcript.is_empty();

        let finished = CompilationFinished {
            program,
            success,
            raw_len: output.diagnostics.len(),
            transcript_len: transcript.len(),
        };
        if success {
            tracing::info!("{}", finished);
        } else {
            tracing::debug!("{}", finished);
        }

        if !success {
            return Ok(CompilationResult::failure(transcript));
        }
        if !output_path.is_file() {
            let error = ToolchainError::MissingArtifact(output_path);
            tracing::error!("{}", ToolchainFailed { program, error: &error });
            return Err(error);
        }
        Ok(CompilationResult {
            success: true,
            transcript,
            artifact: Some(output_path),
        })
    }
}
