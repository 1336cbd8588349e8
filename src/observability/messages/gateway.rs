// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the execution gateway: request lifecycle, trust and mailbox.

use std::fmt::{Display, Formatter};

/// A request moved to a new lifecycle phase.
///
/// # Log Level
/// `debug!` for intermediate phases, `info!` for terminal ones
///
/// # Example
/// ```
/// use the_scriptgate::observability::messages::gateway::PhaseEntered;
///
/// let msg = PhaseEntered {
///     request_id: 7,
///     phase: "Compiling",
/// };
///
/// assert_eq!(msg.to_string(), "Request 7 entered phase Compiling");
/// ```
pub struct PhaseEntered<'a> {
    pub request_id: u64,
    pub phase: &'a str,
}

impl Display for PhaseEntered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Request {} entered phase {}", self.request_id, self.phase)
    }
}

/// A privileged entry point was called while the gateway is locked.
///
/// # Log Level
/// `warn!` - Security relevant
pub struct SecurityViolation<'a> {
    pub origin: &'a str,
    pub operation: &'a str,
}

impl Display for SecurityViolation<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Refused '{}' from untrusted origin '{}'",
            self.operation, self.origin
        )
    }
}

/// A failure replaced one that was never popped (last write wins).
///
/// # Log Level
/// `debug!`
pub struct MailboxOverwritten<'a> {
    pub dropped: &'a dyn std::error::Error,
}

impl Display for MailboxOverwritten<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Unpolled mailbox entry overwritten: {}", self.dropped)
    }
}

/// A background worker was spawned for an execution.
pub struct BackgroundExecutionStarted<'a> {
    pub request_id: u64,
    pub artifact_path: &'a str,
}

impl Display for BackgroundExecutionStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Request {} executing '{}' on a background worker",
            self.request_id, self.artifact_path
        )
    }
}

/// A compile workspace was removed before shutdown: its compile failed, or
/// its artifact is now cached.
///
/// # Log Level
/// `debug!` - Housekeeping
pub struct WorkspaceReleased<'a> {
    pub path: &'a str,
}

impl Display for WorkspaceReleased<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Released workspace '{}'", self.path)
    }
}

/// A compile workspace could not be removed.
pub struct WorkspaceCleanupFailed<'a> {
    pub path: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for WorkspaceCleanupFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Failed to remove workspace '{}': {}", self.path, self.error)
    }
}

/// Gateway assembled and ready to take requests.
///
/// # Log Level
/// `info!` - Important operational event
pub struct GatewayReady<'a> {
    pub origin: &'a str,
    pub locked: bool,
}

impl Display for GatewayReady<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.locked {
            write!(f, "Gateway ready for '{}' (locked: privileged calls refused)", self.origin)
        } else {
            write!(f, "Gateway ready for '{}'", self.origin)
        }
    }
}
