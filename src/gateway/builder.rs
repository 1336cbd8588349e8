// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::mailbox::ErrorMailbox;
use super::service::{Gateway, GatewayInner};
use super::trust::{LogNotifier, OperatorNotifier, TrustState};
use crate::capture::{Console, OutputCapture, OutputListener};
use crate::compiler::{CompilerInvoker, DiagnosticRewriter, RustcToolchain, Toolchain};
use crate::config::GatewayConfig;
use crate::files::{FileStore, LocalFileStore};
use crate::loader::{HostResolver, IsolatedLoader, WasmResolver};
use crate::observability::messages::gateway::GatewayReady;
use crate::traits::{HostArtifacts, Runnable};
use crate::translate::{ScriptTranslator, Translator};
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex};

/// Assembles a [`Gateway`]. Anything not set falls back to the defaults
/// derived from the configuration.
pub struct GatewayBuilder {
    origin: String,
    config: GatewayConfig,
    translator: Option<Arc<dyn Translator>>,
    toolchain: Option<Arc<dyn Toolchain>>,
    rewriter: Option<DiagnosticRewriter>,
    files: Option<Arc<dyn FileStore>>,
    notifier: Option<Arc<dyn OperatorNotifier>>,
    console: Option<Arc<Console>>,
    host_artifacts: HostArtifacts,
    listener: Option<Arc<dyn OutputListener>>,
}

impl GatewayBuilder {
    /// `origin` is where the calling program was loaded from, as a URI.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            config: GatewayConfig::default(),
            translator: None,
            toolchain: None,
            rewriter: None,
            files: None,
            notifier: None,
            console: None,
            host_artifacts: HostArtifacts::new(),
            listener: None,
        }
    }

    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn toolchain(mut self, toolchain: Arc<dyn Toolchain>) -> Self {
        self.toolchain = Some(toolchain);
        self
    }

    pub fn rewriter(mut self, rewriter: DiagnosticRewriter) -> Self {
        self.rewriter = Some(rewriter);
        self
    }

    pub fn files(mut self, files: Arc<dyn FileStore>) -> Self {
        self.files = Some(files);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn OperatorNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Console to print to instead of the process-wide one.
    pub fn console(mut self, console: Arc<Console>) -> Self {
        self.console = Some(console);
        self
    }

    /// Register a trusted entry point that shadows any artifact named `name`.
    pub fn host_artifact(mut self, name: impl Into<String>, runnable: Arc<dyn Runnable>) -> Self {
        self.host_artifacts.insert(name, runnable);
        self
    }

    /// Start a session capture on build that forwards all console text to
    /// `listener` until the gateway is stopped.
    pub fn listener(mut self, listener: Arc<dyn OutputListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn build(self) -> anyhow::Result<Gateway> {
        let config = self.config;

        let trust = TrustState::from_origin(&self.origin, &config.trust.trusted_schemes);
        let translator = self.translator.unwrap_or_else(|| {
            Arc::new(ScriptTranslator::new(config.workspace.artifact_prefix.clone()))
        });
        let toolchain = self
            .toolchain
            .unwrap_or_else(|| Arc::new(RustcToolchain::new(&config.compiler)));
        let invoker =
            CompilerInvoker::new(toolchain).with_rewriter(self.rewriter.unwrap_or_default());
        let loader = IsolatedLoader::new(
            Arc::new(HostResolver::new(self.host_artifacts)),
            Arc::new(WasmResolver::new(&config.wasm)?),
        )
        .with_max_artifact_bytes(config.wasm.max_artifact_bytes);
        let console = self.console.unwrap_or_else(Console::global);

        let session = self.listener.map(|listener| {
            let capture = OutputCapture::attached_to(Arc::clone(&console));
            capture.start_listening(Some(listener));
            capture
        });

        tracing::info!(
            "{}",
            GatewayReady {
                origin: &self.origin,
                locked: trust.is_locked(),
            }
        );

        Ok(Gateway {
            inner: Arc::new(GatewayInner {
                config,
                trust,
                notifier: self.notifier.unwrap_or_else(|| Arc::new(LogNotifier)),
                mailbox: ErrorMailbox::new(),
                translator,
                invoker,
                files: self.files.unwrap_or_else(|| Arc::new(LocalFileStore)),
                loader,
                console,
                session,
                workspaces: Mutex::new(Vec::new()),
                next_request: AtomicU64::new(1),
            }),
        })
    }
}

impl Gateway {
    pub fn builder(origin: impl Into<String>) -> GatewayBuilder {
        GatewayBuilder::new(origin)
    }
}
