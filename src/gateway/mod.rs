// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The execution gateway: the entry points an untrusted caller invokes.

pub mod boundary;
mod builder;
mod mailbox;
mod service;
mod trust;


pub use builder::GatewayBuilder;
pub use mailbox::ErrorMailbox;
pub use service::{CompileOutcome, ExecOutcome, Gateway, RequestPhase};
pub use trust::{LogNotifier, OperatorNotifier, TrustState, UNTRUSTED_ORIGIN_WARNING};
