// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error taxonomy for the compile → load → run pipeline.
//!
//! Each subsystem owns one enum. `GatewayError` is the only type that crosses
//! the trust boundary, and it does so as data (a mailbox entry or a JSON
//! record), never as a panic.

mod gateway;
mod load;
mod run;
mod toolchain;
mod translate;

pub use gateway::{GatewayError, GatewayResult};
pub use load::{LoadError, LoadResult};
pub use run::RunError;
pub use toolchain::{ToolchainError, ToolchainResult};
pub use translate::TranslateError;
