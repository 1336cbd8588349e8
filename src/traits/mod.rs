// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod resolver;
pub mod runnable;

pub use resolver::ArtifactResolver;
pub use runnable::{HostArtifacts, HostFn, Runnable};
