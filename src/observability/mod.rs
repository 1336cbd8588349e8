// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging.
//!
//! Log lines are built from message structs with a `Display` implementation
//! rather than format strings scattered through the code. This keeps wording
//! in one place per subsystem:
//!
//! * `messages::compiler` - toolchain invocation and transcript handling
//! * `messages::loader` - artifact resolution, materialization and caching
//! * `messages::capture` - console layers being pushed and removed
//! * `messages::gateway` - request lifecycle, trust checks and the mailbox
//!
//! # Usage
//!
//! ```rust
//! use the_scriptgate::observability::messages::loader::ArtifactCacheHit;
//!
//! let msg = ArtifactCacheHit { name: "snippet_1" };
//! tracing::debug!("{}", msg);
//! ```

pub mod messages;
