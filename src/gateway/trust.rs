// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicBool, Ordering};

/// Tells the human operator about a refused privileged call.
pub trait OperatorNotifier: Send + Sync {
    fn warn(&self, origin: &str, message: &str);
}

/// Default notifier: a `tracing` warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl OperatorNotifier for LogNotifier {
    fn warn(&self, origin: &str, message: &str) {
        tracing::warn!(origin, "{}", message);
    }
}

pub const UNTRUSTED_ORIGIN_WARNING: &str = "This program was loaded from a location that is not \
trusted. Compiling and running code is disabled for it; open it from a local file to use these \
features.";

/// Whether privileged calls are refused, decided once from the caller's origin.
#[derive(Debug)]
pub struct TrustState {
    origin: String,
    locked: bool,
    warning_shown: AtomicBool,
}

impl TrustState {
    /// Locked unless the origin's URI scheme is one of `trusted_schemes`.
    /// An origin without a scheme, or with a malformed one, is locked.
    pub fn from_origin<S: AsRef<str>>(origin: &str, trusted_schemes: &[S]) -> Self {
        let locked = match scheme_of(origin) {
            Some(scheme) => !trusted_schemes
                .iter()
                .any(|trusted| trusted.as_ref().eq_ignore_ascii_case(scheme)),
            None => true,
        };
        Self {
            origin: origin.to_string(),
            locked,
            warning_shown: AtomicBool::new(false),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// True exactly once, for the first caller to ask.
    pub fn claim_warning(&self) -> bool {
        !self.warning_shown.swap(true, Ordering::SeqCst)
    }
}

fn scheme_of(origin: &str) -> Option<&str> {
    let (scheme, _) = origin.split_once(':')?;
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}
