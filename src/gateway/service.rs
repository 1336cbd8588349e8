// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::mailbox::ErrorMailbox;
use super::trust::{OperatorNotifier, TrustState, UNTRUSTED_ORIGIN_WARNING};
use crate::capture::{Console, OutputCapture, OutputSink, RequestConsole};
use crate::compiler::{CompilationRequest, CompilerInvoker};
use crate::config::consts::{EXEC_THREAD_NAME, SOURCE_EXTENSION};
use crate::config::GatewayConfig;
use crate::errors::{GatewayError, GatewayResult};
use crate::files::FileStore;
use crate::loader::IsolatedLoader;
use crate::observability::messages::gateway::{
    BackgroundExecutionStarted, PhaseEntered, SecurityViolation, WorkspaceCleanupFailed,
    WorkspaceReleased,
};
use crate::translate::Translator;
use std::any::Any;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

/// Lifecycle of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Idle,
    Translating,
    Compiling,
    Loading,
    Running,
    Succeeded,
    Failed,
}

impl RequestPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestPhase::Idle => "Idle",
            RequestPhase::Translating => "Translating",
            RequestPhase::Compiling => "Compiling",
            RequestPhase::Loading => "Loading",
            RequestPhase::Running => "Running",
            RequestPhase::Succeeded => "Succeeded",
            RequestPhase::Failed => "Failed",
        }
    }
}

impl Display for RequestPhase {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutcome {
    pub success: bool,
    /// Set only on success.
    pub artifact_path: Option<PathBuf>,
    /// What this request printed: the diagnostic transcript on failure.
    pub console: String,
}

#[derive(Debug, Clone)]
pub struct ExecOutcome {
    pub success: bool,
    /// Exactly what the artifact printed.
    pub console: String,
    /// A load or runtime failure, already contained.
    pub failure: Option<GatewayError>,
}

impl ExecOutcome {
    /// The failure as text, empty on success.
    pub fn error_text(&self) -> String {
        self.failure
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}

pub(super) struct GatewayInner {
    pub(super) config: GatewayConfig,
    pub(super) trust: TrustState,
    pub(super) notifier: Arc<dyn OperatorNotifier>,
    pub(super) mailbox: ErrorMailbox,
    pub(super) translator: Arc<dyn Translator>,
    pub(super) invoker: CompilerInvoker,
    pub(super) files: Arc<dyn FileStore>,
    pub(super) loader: IsolatedLoader,
    pub(super) console: Arc<Console>,
    pub(super) session: Option<OutputCapture>,
    pub(super) workspaces: Mutex<Vec<PathBuf>>,
    pub(super) next_request: AtomicU64,
}

impl Drop for GatewayInner {
    fn drop(&mut self) {
        if let Some(session) = &self.session {
            session.stop_listening();
        }
        if self.config.workspace.keep_artifacts {
            return;
        }
        let workspaces = self
            .workspaces
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for dir in workspaces.drain(..) {
            remove_workspace(&dir);
        }
    }
}

fn remove_workspace(dir: &Path) {
    let path = dir.display().to_string();
    match std::fs::remove_dir_all(dir) {
        Ok(()) => tracing::debug!("{}", WorkspaceReleased { path: &path }),
        Err(error) => {
            tracing::warn!("{}", WorkspaceCleanupFailed { path: &path, error: &error })
        }
    }
}

/// Compiles and runs untrusted programs on behalf of a caller that can only
/// exchange flat records and poll for errors.
///
/// Every privileged entry point is refused when the caller's origin is not
/// trusted; the refusal is recorded in the error mailbox and the operator is
/// warned once. Anything that fails inside an artifact is contained and
/// reported as data.
///
/// Cloning is cheap and clones share all state.
#[derive(Clone)]
pub struct Gateway {
    pub(super) inner: Arc<GatewayInner>,
}

impl Gateway {
    /// Translate, save and compile `code`.
    ///
    /// Translation and diagnostic failures come back as `success == false`
    /// with the message in `console`. Only an unusable toolchain or a
    /// workspace I/O failure is an `Err` (and is also left in the mailbox).
    pub fn compile(&self, code: &str) -> GatewayResult<CompileOutcome> {
        self.assert_safe_usage("compile")?;
        let id = self.next_request_id();
        self.privileged(|| self.compile_unchecked(id, code))
    }

    /// Like [`compile`](Self::compile), reading the program from a path or URI first.
    pub fn compile_file(&self, location: &str) -> GatewayResult<CompileOutcome> {
        self.assert_safe_usage("compileFile")?;
        let id = self.next_request_id();
        self.privileged(|| {
            let code = self.inner.files.load(location)?;
            self.compile_unchecked(id, &code)
        })
    }

    /// Load and run an artifact on the calling thread.
    ///
    /// Only a security refusal is an `Err`; load and runtime failures are in
    /// the outcome.
    pub fn exec(&self, artifact_path: &Path) -> GatewayResult<ExecOutcome> {
        self.assert_safe_usage("exec")?;
        let id = self.next_request_id();
        Ok(self.run_artifact(id, artifact_path))
    }

    /// Run an artifact on a dedicated worker thread and return at once.
    ///
    /// A load or runtime failure ends up in the mailbox.
    pub fn exec_in_background(&self, artifact_path: &Path) -> GatewayResult<JoinHandle<()>> {
        self.assert_safe_usage("execInBackground")?;
        let id = self.next_request_id();
        let path_text = artifact_path.display().to_string();
        tracing::info!(
            "{}",
            BackgroundExecutionStarted {
                request_id: id,
                artifact_path: &path_text,
            }
        );

        let gateway = self.clone();
        let path = artifact_path.to_path_buf();
        self.privileged(|| {
            std::thread::Builder::new()
                .name(format!("{}-{}", EXEC_THREAD_NAME, id))
                .spawn(move || {
                    let outcome = gateway.run_artifact(id, &path);
                    if let Some(failure) = outcome.failure {
                        gateway.inner.mailbox.push(failure);
                    }
                })
                .map_err(|e| GatewayError::Worker(e.to_string()))
        })
    }

    /// Take the pending failure, if any. A second call returns `None`.
    pub fn pop_error(&self) -> Option<GatewayError> {
        self.inner.mailbox.pop()
    }

    /// Wait for the next failure instead of polling.
    pub async fn next_error(&self) -> GatewayError {
        self.inner.mailbox.next().await
    }

    pub fn is_locked(&self) -> bool {
        self.inner.trust.is_locked()
    }

    pub fn origin(&self) -> &str {
        self.inner.trust.origin()
    }

    pub fn console(&self) -> &Arc<Console> {
        &self.inner.console
    }

    pub fn loader(&self) -> &IsolatedLoader {
        &self.inner.loader
    }

    /// Everything the session capture saw, when one was started.
    pub fn session_output(&self) -> Option<String> {
        self.inner.session.as_ref().map(OutputCapture::result)
    }

    /// End the session capture. Further output reaches only the base sink.
    pub fn stop(&self) {
        if let Some(session) = &self.inner.session {
            session.stop_listening();
        }
    }

    /// Compile directories still on disk: compiled but not yet loaded, or
    /// all of them when artifacts are kept.
    pub fn workspaces(&self) -> Vec<PathBuf> {
        self.inner
            .workspaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next_request_id(&self) -> u64 {
        let id = self.inner.next_request.fetch_add(1, Ordering::Relaxed);
        self.enter(id, RequestPhase::Idle);
        id
    }

    fn enter(&self, request_id: u64, phase: RequestPhase) {
        let msg = PhaseEntered {
            request_id,
            phase: phase.as_str(),
        };
        match phase {
            RequestPhase::Succeeded | RequestPhase::Failed => tracing::info!("{}", msg),
            _ => tracing::debug!("{}", msg),
        }
    }

    fn assert_safe_usage(&self, operation: &str) -> GatewayResult<()> {
        let trust = &self.inner.trust;
        if !trust.is_locked() {
            return Ok(());
        }
        if trust.claim_warning() {
            self.inner.notifier.warn(trust.origin(), UNTRUSTED_ORIGIN_WARNING);
        }
        tracing::warn!(
            "{}",
            SecurityViolation {
                origin: trust.origin(),
                operation,
            }
        );
        let error = GatewayError::Security(format!(
            "'{}' is not allowed for a program loaded from '{}'",
            operation,
            trust.origin()
        ));
        self.inner.mailbox.push(error.clone());
        Err(error)
    }

    /// Run a privileged body; an error it returns is also left in the mailbox.
    fn privileged<T>(&self, body: impl FnOnce() -> GatewayResult<T>) -> GatewayResult<T> {
        body().map_err(|error| {
            self.inner.mailbox.push(error.clone());
            error
        })
    }

    fn compile_unchecked(&self, id: u64, code: &str) -> GatewayResult<CompileOutcome> {
        let inner = &self.inner;
        let mut out = RequestConsole::new(Arc::clone(&inner.console));

        self.enter(id, RequestPhase::Translating);
        let translation = match inner.translator.translate(code) {
            Ok(translation) => translation,
            Err(error) => {
                writeln!(out, "{}", error)?;
                self.enter(id, RequestPhase::Failed);
                return Ok(CompileOutcome {
                    success: false,
                    artifact_path: None,
                    console: out.text(),
                });
            }
        };

        let dir = inner
            .files
            .create_temp_dir(&inner.config.workspace.temp_prefix)?;
        inner
            .workspaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(dir.clone());
        let source = dir.join(format!("{}.{}", translation.artifact_name, SOURCE_EXTENSION));
        inner.files.save(&source, &translation.unit)?;

        self.enter(id, RequestPhase::Compiling);
        let request = CompilationRequest::new(vec![source])
            .with_classpath(inner.config.compiler.classpath())
            .with_all_errors(inner.config.compiler.all_errors);
        let result = match inner.invoker.compile(&request) {
            Ok(result) => result,
            Err(error) => {
                self.release_workspace(&dir);
                self.enter(id, RequestPhase::Failed);
                return Err(error.into());
            }
        };

        if !result.success {
            self.release_workspace(&dir);
            writeln!(out, "{}", result.transcript)?;
        }
        self.enter(
            id,
            if result.success {
                RequestPhase::Succeeded
            } else {
                RequestPhase::Failed
            },
        );
        Ok(CompileOutcome {
            success: result.success,
            artifact_path: result.artifact,
            console: out.text(),
        })
    }

    /// Remove a compile directory this gateway created, unless artifacts are
    /// kept. Directories it did not create are never touched.
    fn release_workspace(&self, dir: &Path) {
        if self.inner.config.workspace.keep_artifacts {
            return;
        }
        let tracked = {
            let mut workspaces = self
                .inner
                .workspaces
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match workspaces.iter().position(|known| known == dir) {
                Some(index) => {
                    workspaces.swap_remove(index);
                    true
                }
                None => false,
            }
        };
        if tracked {
            remove_workspace(dir);
        }
    }

    fn run_artifact(&self, id: u64, artifact_path: &Path) -> ExecOutcome {
        let inner = &self.inner;

        self.enter(id, RequestPhase::Loading);
        let runnable = match inner.loader.load(artifact_path) {
            Ok(runnable) => runnable,
            Err(error) => {
                self.enter(id, RequestPhase::Failed);
                return ExecOutcome {
                    success: false,
                    console: String::new(),
                    failure: Some(error.into()),
                };
            }
        };

        // The cache now answers for this name; its compile directory is no longer needed.
        if let (Some(dir), Ok(name)) = (
            artifact_path.parent(),
            IsolatedLoader::artifact_name(artifact_path),
        ) {
            if inner.loader.is_cached(&name) {
                self.release_workspace(dir);
            }
        }

        self.enter(id, RequestPhase::Running);
        let out = Arc::new(RequestConsole::new(Arc::clone(&inner.console)));
        let sink: Arc<dyn OutputSink> = out.clone();
        let result = panic::catch_unwind(AssertUnwindSafe(|| runnable.run(sink)));
        let message = match result {
            Ok(Ok(())) => None,
            Ok(Err(error)) => Some(error.to_string()),
            Err(payload) => Some(panic_message(payload)),
        };
        let console = out.text();

        match message {
            None => {
                self.enter(id, RequestPhase::Succeeded);
                ExecOutcome {
                    success: true,
                    console,
                    failure: None,
                }
            }
            Some(message) => {
                self.enter(id, RequestPhase::Failed);
                ExecOutcome {
                    success: false,
                    console,
                    failure: Some(GatewayError::Runtime {
                        artifact: runnable.origin().to_string(),
                        message,
                    }),
                }
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    let detail = if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "no message".to_string()
    };
    format!("panicked: {}", detail)
}
