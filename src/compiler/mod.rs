// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Compiler invocation.
//!
//! [`CompilerInvoker`] runs an external [`Toolchain`] over a
//! [`CompilationRequest`] and reduces its raw diagnostics to a short,
//! learner-facing transcript with [`DiagnosticRewriter`]. A compile succeeds
//! exactly when that transcript ends up empty.

pub mod diagnostics;
mod invoker;
mod toolchain;

pub use diagnostics::{DiagnosticRewriter, RewriteRule, REWRITE_RULES};
pub use invoker::{CompilationRequest, CompilationResult, CompilerInvoker};
pub use toolchain::{RustcToolchain, Toolchain, ToolchainInvocation, ToolchainOutput};
