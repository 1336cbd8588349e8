// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging, one module per subsystem.

pub mod capture;
pub mod compiler;
pub mod gateway;
pub mod loader;
