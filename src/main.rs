// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context};
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use the_scriptgate::capture::{Console, OutputListener, StderrSink};
use the_scriptgate::config::{load_config, GatewayConfig};
use the_scriptgate::gateway::boundary::{dispatch_json, encode, PrintEvent};
use the_scriptgate::gateway::Gateway;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const DEFAULT_ORIGIN: &str = "file://localhost/";

struct Args {
    config: Option<PathBuf>,
    origin: String,
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {} [--config gateway.yaml] [--origin URI]\n\
         Reads one JSON request per line on stdin and answers one JSON record per line on stdout.\n\
         Example: echo '{{\"op\":\"compile\",\"code\":\"println!(\\\"hi\\\");\"}}' | {}",
        program, program
    )
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Option<Args>> {
    let program = args.next().unwrap_or_else(|| "the-scriptgate".to_string());
    let mut parsed = Args {
        config: None,
        origin: DEFAULT_ORIGIN.to_string(),
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config needs a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--origin" => {
                parsed.origin = args.next().context("--origin needs a URI")?;
            }
            "-h" | "--help" => {
                println!("{}", usage(&program));
                return Ok(None);
            }
            other => bail!("unknown argument '{}'\n{}", other, usage(&program)),
        }
    }
    Ok(Some(parsed))
}

/// One line per record; the lock keeps records from interleaving.
fn emit(line: &str) {
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", line);
    let _ = stdout.flush();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("the_scriptgate=info".parse()?),
        )
        .with_writer(io::stderr)
        .init();

    let Some(args) = parse_args(env::args())? else {
        return Ok(());
    };

    let config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => GatewayConfig::default(),
    };

    // stdout carries protocol records only.
    Console::global().install_base(Arc::new(StderrSink));

    let listener: Arc<dyn OutputListener> = Arc::new(|text: &str| {
        emit(&encode(&PrintEvent {
            print: text.to_string(),
        }));
    });

    let gateway = Gateway::builder(args.origin)
        .config(config)
        .listener(listener)
        .build()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let worker = gateway.clone();
        let response = tokio::task::spawn_blocking(move || dispatch_json(&worker, &line)).await?;
        emit(&response);
    }

    gateway.stop();
    Ok(())
}
