// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default fuel level for artifact execution (1 billion instructions)
pub const DEFAULT_FUEL_LEVEL: u64 = 1_000_000_000;
/// Minimum allowed fuel level (1 million instructions)
pub const MIN_FUEL_LEVEL: u64 = 1_000_000;
/// Maximum allowed fuel level (20 billion instructions) - security limit
pub const MAX_FUEL_LEVEL: u64 = 20_000_000_000;

/// Largest artifact the loader will read (16 MB)
pub const MAX_ARTIFACT_SIZE: usize = 16 * 1024 * 1024;
/// Per-stream buffer for guest stdout/stderr (1 MB)
pub const DEFAULT_OUTPUT_CAPACITY: usize = 1024 * 1024;

pub const DEFAULT_COMPILER: &str = "rustc";
pub const DEFAULT_TARGET: &str = "wasm32-wasip1";
pub const DEFAULT_EDITION: &str = "2021";

/// Prefix for per-request compile directories
pub const DEFAULT_WORKSPACE_PREFIX: &str = "scriptgate-compile-";
/// Prefix for derived artifact names (`snippet_1`, `snippet_2`, ...)
pub const DEFAULT_ARTIFACT_PREFIX: &str = "snippet_";

/// Origins with these URI schemes are trusted by default
pub const DEFAULT_TRUSTED_SCHEMES: &[&str] = &["file"];

pub const SOURCE_EXTENSION: &str = "rs";
pub const ARTIFACT_EXTENSION: &str = "wasm";

/// Name given to background execution threads
pub const EXEC_THREAD_NAME: &str = "scriptgate-exec";
