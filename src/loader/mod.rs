// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Artifact loading.
//!
//! [`IsolatedLoader`] composes two [`ArtifactResolver`](crate::traits::ArtifactResolver)s
//! by priority: the trusted [`HostResolver`] first, then the isolating
//! [`WasmResolver`], with a per-loader cache in front of both.

mod host;
mod isolated;
pub mod wasm;

#[cfg(test)]
pub(crate) mod fixtures;

pub use host::HostResolver;
pub use isolated::IsolatedLoader;
pub use wasm::{create_engine, detect_binary_kind, BinaryKind, WasmArtifact, WasmResolver};
