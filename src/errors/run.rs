// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Everything that can go wrong inside an artifact's `run()`.
///
/// These never propagate as panics: the gateway stringifies them into the
/// execution result or the mailbox.
#[derive(Error, Debug)]
pub enum RunError {
    /// The guest trapped (panic, unreachable, out-of-bounds access, ...).
    #[error("{message}{}", stderr_suffix(.stderr))]
    Trap { message: String, stderr: String },

    /// The guest called `proc_exit` with a non-zero status.
    #[error("program exited with status {code}{}", stderr_suffix(.stderr))]
    Exit { code: i32, stderr: String },

    /// The instruction budget ran out.
    #[error("program stopped: instruction budget of {0} exhausted")]
    FuelExhausted(u64),

    /// Could not set up the execution context for the artifact.
    #[error("could not prepare execution: {0}")]
    Setup(String),

    /// Writing the program's output to the console failed.
    #[error("could not deliver program output: {0}")]
    Output(#[from] std::io::Error),

    /// A host-provided entry point failed or panicked.
    #[error("{0}")]
    Host(String),
}

fn stderr_suffix(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\n{}", stderr)
    }
}
