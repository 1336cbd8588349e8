// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! WebAssembly materialization.
//!
//! A compiled artifact is a core module exporting `run: [] -> []`. The
//! contract is checked once, when the bytes are materialized. Every call to
//! `run()` then gets a fresh store and WASI context with in-memory stdio and
//! no filesystem access.

use crate::capture::OutputSink;
use crate::config::WasmConfig;
use crate::errors::{LoadError, LoadResult, RunError};
use crate::traits::{ArtifactResolver, Runnable};
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;
use wasmparser::{Encoding, Parser, Payload};
use wasmtime::{Config, Engine, ExternType, InstancePre, Linker, Module, Store, Trap};
use wasmtime_wasi::cli::{IsTerminal, StdoutStream};
use wasmtime_wasi::p1::WasiP1Ctx;
use wasmtime_wasi::p2::pipe::MemoryOutputPipe;
use wasmtime_wasi::p2::{OutputStream, Pollable, StreamError, StreamResult};
use wasmtime_wasi::{I32Exit, WasiCtxBuilder};
use wasmtime_wasi_io::bytes::Bytes;

/// Export every runnable artifact must provide.
pub const ENTRY_POINT: &str = "run";
/// Reactor initializer, called before the entry point when present.
pub const INITIALIZER: &str = "_initialize";

/// Write budget advertised to the guest per `check_write`.
const STDOUT_WRITE_BUDGET: usize = 64 * 1024;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinaryKind {
    CoreModule,
    Component,
}

/// Classify a binary by its version header using a spec-compliant parse.
///
/// Version-1 binaries carrying a `component` custom section are legacy
/// components and are reported as such.
pub fn detect_binary_kind(bytes: &[u8]) -> Result<BinaryKind, String> {
    let mut encoding = None;
    let mut has_component_section = false;

    for payload in Parser::new(0).parse_all(bytes) {
        match payload.map_err(|e| e.to_string())? {
            Payload::Version { encoding: enc, .. } => encoding = Some(enc),
            Payload::CustomSection(reader) if reader.name() == "component" => {
                has_component_section = true;
            }
            _ => {}
        }
    }

    match encoding {
        None => Err("not a WebAssembly binary".to_string()),
        Some(Encoding::Component) => Ok(BinaryKind::Component),
        Some(Encoding::Module) if has_component_section => Ok(BinaryKind::Component),
        Some(Encoding::Module) => Ok(BinaryKind::CoreModule),
    }
}

/// Engine for untrusted artifacts: fuel metering on, post-MVP proposals that
/// widen the attack surface off.
pub fn create_engine() -> wasmtime::Result<Engine> {
    let mut config = Config::new();

    config.wasm_threads(false);
    config.wasm_simd(false);
    config.wasm_relaxed_simd(false);
    config.wasm_multi_memory(false);
    config.wasm_memory64(false);
    config.wasm_component_model(false);

    config.consume_fuel(true);
    config.epoch_interruption(false);

    Engine::new(&config)
}

/// Check the export table for a zero-argument, zero-result `run`.
fn check_entry_point(module: &Module) -> Result<bool, String> {
    match module.get_export(ENTRY_POINT) {
        Some(ExternType::Func(func)) if func.params().len() == 0 && func.results().len() == 0 => {}
        Some(ExternType::Func(func)) => {
            return Err(format!(
                "export '{}' must take no arguments and return nothing, found {} parameter(s) and {} result(s)",
                ENTRY_POINT,
                func.params().len(),
                func.results().len()
            ))
        }
        Some(_) => return Err(format!("export '{}' is not a function", ENTRY_POINT)),
        None => return Err(format!("no '{}' export", ENTRY_POINT)),
    }
    let has_initializer = matches!(
        module.get_export(INITIALIZER),
        Some(ExternType::Func(func)) if func.params().len() == 0 && func.results().len() == 0
    );
    Ok(has_initializer)
}

/// Materializes artifacts into isolated wasmtime instances.
pub struct WasmResolver {
    engine: Engine,
    linker: Linker<WasiP1Ctx>,
    fuel: u64,
    output_capacity: usize,
}

impl WasmResolver {
    pub fn new(config: &WasmConfig) -> wasmtime::Result<Self> {
        let engine = create_engine()?;
        let mut linker = Linker::new(&engine);
        wasmtime_wasi::p1::add_to_linker_sync(&mut linker, |ctx: &mut WasiP1Ctx| ctx)?;
        Ok(Self {
            engine,
            linker,
            fuel: config.fuel.effective(),
            output_capacity: config.output_capacity,
        })
    }

    pub fn fuel(&self) -> u64 {
        self.fuel
    }
}

impl ArtifactResolver for WasmResolver {
    /// Nothing is known by name before it has been materialized.
    fn resolve_by_name(&self, _name: &str) -> Option<Arc<dyn Runnable>> {
        None
    }

    fn materialize_from_bytes(
        &self,
        name: &str,
        bytes: &[u8],
        path: &Path,
    ) -> LoadResult<Arc<dyn Runnable>> {
        match detect_binary_kind(bytes).map_err(|e| LoadError::not_found(name, e))? {
            BinaryKind::CoreModule => {}
            BinaryKind::Component => {
                return Err(LoadError::not_found(
                    name,
                    "component binaries are not supported, expected a core module",
                ))
            }
        }

        let module =
            Module::new(&self.engine, bytes).map_err(|e| LoadError::not_found(name, e))?;
        let has_initializer = check_entry_point(&module).map_err(|reason| LoadError::NotRunnable {
            path: path.display().to_string(),
            reason,
        })?;
        let pre = self
            .linker
            .instantiate_pre(&module)
            .map_err(|e| LoadError::not_found(name, format!("{:#}", e)))?;

        Ok(Arc::new(WasmArtifact {
            origin: path.display().to_string(),
            engine: self.engine.clone(),
            pre,
            has_initializer,
            fuel: self.fuel,
            output_capacity: self.output_capacity,
        }))
    }
}

/// Guest stdout delivered straight to the run's console, one write at a time.
#[derive(Clone)]
struct GuestStdout(Arc<dyn OutputSink>);

impl IsTerminal for GuestStdout {
    fn is_terminal(&self) -> bool {
        false
    }
}

impl StdoutStream for GuestStdout {
    fn p2_stream(&self) -> Box<dyn OutputStream> {
        Box::new(self.clone())
    }

    fn async_stream(&self) -> Box<dyn AsyncWrite + Send + Sync> {
        Box::new(self.clone())
    }
}

impl OutputStream for GuestStdout {
    fn write(&mut self, bytes: Bytes) -> StreamResult<()> {
        self.0
            .write_bytes(&bytes)
            .map_err(|e| StreamError::LastOperationFailed(anyhow::Error::new(e)))
    }

    fn flush(&mut self) -> StreamResult<()> {
        self.0
            .flush()
            .map_err(|e| StreamError::LastOperationFailed(anyhow::Error::new(e)))
    }

    fn check_write(&mut self) -> StreamResult<usize> {
        Ok(STDOUT_WRITE_BUDGET)
    }
}

#[async_trait::async_trait]
impl Pollable for GuestStdout {
    async fn ready(&mut self) {}
}

impl AsyncWrite for GuestStdout {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(self.0.write_bytes(buf).map(|()| buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(self.0.flush())
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// A linked, ready-to-instantiate artifact.
pub struct WasmArtifact {
    origin: String,
    engine: Engine,
    pre: InstancePre<WasiP1Ctx>,
    has_initializer: bool,
    fuel: u64,
    output_capacity: usize,
}

impl WasmArtifact {
    fn call_entry(&self, store: &mut Store<WasiP1Ctx>) -> wasmtime::Result<()> {
        let instance = self.pre.instantiate(&mut *store)?;
        if self.has_initializer {
            instance
                .get_typed_func::<(), ()>(&mut *store, INITIALIZER)?
                .call(&mut *store, ())?;
        }
        instance
            .get_typed_func::<(), ()>(&mut *store, ENTRY_POINT)?
            .call(&mut *store, ())
    }

    fn classify(&self, error: wasmtime::Error, stderr: String) -> Result<(), RunError> {
        if let Some(exit) = error.downcast_ref::<I32Exit>() {
            return match exit.0 {
                0 => Ok(()),
                code => Err(RunError::Exit { code, stderr }),
            };
        }
        if let Some(Trap::OutOfFuel) = error.downcast_ref::<Trap>() {
            return Err(RunError::FuelExhausted(self.fuel));
        }
        Err(RunError::Trap {
            message: error.root_cause().to_string(),
            stderr,
        })
    }
}

impl Runnable for WasmArtifact {
    fn run(&self, console: Arc<dyn OutputSink>) -> Result<(), RunError> {
        // Only stderr is buffered: it becomes part of a failure report.
        let stderr = MemoryOutputPipe::new(self.output_capacity);
        let wasi = WasiCtxBuilder::new()
            .stdout(GuestStdout(Arc::clone(&console)))
            .stderr(stderr.clone())
            .build_p1();

        let mut store = Store::new(&self.engine, wasi);
        store
            .set_fuel(self.fuel)
            .map_err(|e| RunError::Setup(e.to_string()))?;

        let outcome = self.call_entry(&mut store);
        console.flush()?;

        match outcome {
            Ok(()) => Ok(()),
            Err(error) => {
                let stderr = String::from_utf8_lossy(&stderr.contents()).into_owned();
                self.classify(error, stderr)
            }
        }
    }

    fn origin(&self) -> &str {
        &self.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::console::tests::RecordingSink;
    use crate::config::FuelConfig;
    use crate::loader::fixtures;
    use std::sync::{mpsc, Mutex};
    use std::time::Duration;

    /// Reports each write on a channel as it arrives.
    struct ChannelSink(Mutex<mpsc::Sender<String>>);

    impl OutputSink for ChannelSink {
        fn write_bytes(&self, bytes: &[u8]) -> io::Result<()> {
            let text = String::from_utf8_lossy(bytes).into_owned();
            let _ = self.0.lock().unwrap().send(text);
            Ok(())
        }
    }

    fn resolver() -> WasmResolver {
        WasmResolver::new(&WasmConfig::default()).unwrap()
    }

    fn materialize(wat: &str) -> LoadResult<Arc<dyn Runnable>> {
        let bytes = wat::parse_str(wat).unwrap();
        resolver().materialize_from_bytes("fixture", &bytes, Path::new("/ws/fixture.wasm"))
    }

    fn run(wat: &str) -> (Result<(), RunError>, String) {
        let artifact = materialize(wat).unwrap();
        let console = Arc::new(RecordingSink::default());
        let result = artifact.run(console.clone());
        (result, console.text())
    }

    #[test]
    fn test_detects_core_modules_and_components() {
        let module = wat::parse_str("(module)").unwrap();
        assert_eq!(detect_binary_kind(&module), Ok(BinaryKind::CoreModule));
        let component = wat::parse_str("(component)").unwrap();
        assert_eq!(detect_binary_kind(&component), Ok(BinaryKind::Component));
        assert!(detect_binary_kind(&[]).is_err());
        assert!(detect_binary_kind(b"\x00\x00\x00\x00\x00\x00\x00\x00").is_err());
    }

    #[test]
    fn test_hello_prints_to_console() {
        let (result, printed) = run(fixtures::HELLO);
        assert!(result.is_ok());
        assert_eq!(printed, "hello, world\n");
    }

    #[test]
    fn test_each_run_starts_fresh() {
        let artifact = materialize(fixtures::HELLO).unwrap();
        let console = Arc::new(RecordingSink::default());
        artifact.run(console.clone()).unwrap();
        artifact.run(console.clone()).unwrap();
        assert_eq!(console.text(), "hello, world\nhello, world\n");
    }

    #[test]
    fn test_initializer_runs_first() {
        let (result, printed) = run(fixtures::REACTOR);
        assert!(result.is_ok());
        assert_eq!(printed, "init\nrun\n");
    }

    #[test]
    fn test_trap_carries_stderr_and_keeps_stdout() {
        let (result, printed) = run(fixtures::PANICS);
        assert_eq!(printed, "before\n");
        match result {
            Err(RunError::Trap { message, stderr }) => {
                assert!(message.contains("unreachable"), "{}", message);
                assert_eq!(stderr, "boom\n");
            }
            other => panic!("expected a trap, got {:?}", other),
        }
    }

    #[test]
    fn test_exit_codes() {
        let (ok, _) = run(&fixtures::exits_with(0));
        assert!(ok.is_ok());
        let (failed, _) = run(&fixtures::exits_with(3));
        assert!(matches!(failed, Err(RunError::Exit { code: 3, .. })));
    }

    #[test]
    fn test_runaway_loop_runs_out_of_fuel() {
        let config = WasmConfig {
            fuel: FuelConfig {
                default: Some(1_000_000),
                minimum: None,
                maximum: None,
            },
            ..WasmConfig::default()
        };
        let bytes = wat::parse_str(fixtures::SPINS).unwrap();
        let artifact = WasmResolver::new(&config)
            .unwrap()
            .materialize_from_bytes("spin", &bytes, Path::new("spin.wasm"))
            .unwrap();
        let result = artifact.run(Arc::new(RecordingSink::default()));
        assert!(matches!(result, Err(RunError::FuelExhausted(1_000_000))));
    }

    #[test]
    fn test_output_reaches_console_while_guest_still_runs() {
        let artifact = materialize(fixtures::TICKS_THEN_SPINS).unwrap();
        let (sender, receiver) = mpsc::channel();
        let console: Arc<dyn OutputSink> = Arc::new(ChannelSink(Mutex::new(sender)));
        let worker = std::thread::spawn(move || artifact.run(console));

        let first = receiver.recv_timeout(Duration::from_millis(500)).unwrap();
        assert_eq!(first, "tick\n");
        assert!(!worker.is_finished(), "guest should still be spinning");

        let result = worker.join().unwrap();
        assert!(matches!(result, Err(RunError::FuelExhausted(_))));
    }

    #[test]
    fn test_stdout_is_not_bounded_by_output_capacity() {
        let config = WasmConfig {
            output_capacity: 8,
            ..WasmConfig::default()
        };
        let bytes = wat::parse_str(fixtures::HELLO).unwrap();
        let artifact = WasmResolver::new(&config)
            .unwrap()
            .materialize_from_bytes("hello", &bytes, Path::new("hello.wasm"))
            .unwrap();
        let console = Arc::new(RecordingSink::default());
        artifact.run(console.clone()).unwrap();
        assert_eq!(console.text(), "hello, world\n");
    }

    #[test]
    fn test_wrong_signature_is_not_runnable() {
        match materialize(fixtures::WRONG_SIGNATURE) {
            Err(LoadError::NotRunnable { path, reason }) => {
                assert_eq!(path, "/ws/fixture.wasm");
                assert!(reason.contains("1 parameter(s)"));
            }
            Err(other) => panic!("unexpected error {}", other),
            Ok(_) => panic!("artifact should not be runnable"),
        }
    }

    #[test]
    fn test_missing_run_is_not_runnable() {
        assert!(matches!(
            materialize(fixtures::NO_RUN),
            Err(LoadError::NotRunnable { .. })
        ));
    }

    #[test]
    fn test_unknown_import_fails_to_link() {
        assert!(matches!(
            materialize(fixtures::UNKNOWN_IMPORT),
            Err(LoadError::NotFound { .. })
        ));
    }

    #[test]
    fn test_components_are_rejected() {
        let bytes = wat::parse_str("(component)").unwrap();
        let result = resolver().materialize_from_bytes("c", &bytes, Path::new("c.wasm"));
        assert!(matches!(result, Err(LoadError::NotFound { .. })));
    }

    #[test]
    fn test_origin_is_the_path() {
        let artifact = materialize(fixtures::HELLO).unwrap();
        assert_eq!(artifact.origin(), "/ws/fixture.wasm");
    }
}
