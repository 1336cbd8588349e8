// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod capture;   // console redirection and capture sessions
pub mod compiler;  // external toolchain + diagnostic rewriting
pub mod config;    // YAML configuration
pub mod errors;    // error handling
pub mod files;     // file collaborator
pub mod gateway;   // trust-gated entry points, mailbox, boundary records
pub mod loader;    // isolated artifact loading
pub mod observability;
pub mod traits;    // unified abstractions
pub mod translate; // learner source -> compilable unit
