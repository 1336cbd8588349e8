// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::GatewayError;
use crate::observability::messages::gateway::MailboxOverwritten;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Single-slot holder for the most recent unhandled failure.
///
/// Callers that cannot receive errors directly poll it with [`pop`](Self::pop).
/// The slot is last-write-wins: a failure nobody popped yet is replaced by
/// the next one (and the replacement is logged). Reading clears the slot.
#[derive(Debug, Default)]
pub struct ErrorMailbox {
    slot: Mutex<Option<GatewayError>>,
    notify: Notify,
}

impl ErrorMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<GatewayError>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, error: GatewayError) {
        let dropped = self.lock().replace(error);
        if let Some(dropped) = dropped {
            tracing::debug!("{}", MailboxOverwritten { dropped: &dropped });
        }
        self.notify.notify_waiters();
    }

    /// Take the pending failure, leaving the slot empty.
    pub fn pop(&self) -> Option<GatewayError> {
        self.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    /// Wait for a failure and take it.
    pub async fn next(&self) -> GatewayError {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if let Some(error) = self.pop() {
                return error;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn security() -> GatewayError {
        GatewayError::Security("locked".to_string())
    }

    #[test]
    fn test_pop_is_destructive() {
        let mailbox = ErrorMailbox::new();
        assert!(mailbox.pop().is_none());
        assert!(mailbox.pop().is_none());

        mailbox.push(security());
        assert!(matches!(mailbox.pop(), Some(GatewayError::Security(_))));
        assert!(mailbox.pop().is_none());
        assert!(mailbox.is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let mailbox = ErrorMailbox::new();
        mailbox.push(security());
        mailbox.push(GatewayError::Worker("second".to_string()));
        match mailbox.pop() {
            Some(GatewayError::Worker(message)) => assert_eq!(message, "second"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(mailbox.pop().is_none());
    }

    #[tokio::test]
    async fn test_next_returns_pending_error_immediately() {
        let mailbox = ErrorMailbox::new();
        mailbox.push(security());
        assert_eq!(mailbox.next().await.kind(), "security");
        assert!(mailbox.is_empty());
    }

    #[tokio::test]
    async fn test_next_waits_for_a_push() {
        let mailbox = Arc::new(ErrorMailbox::new());
        let pusher = Arc::clone(&mailbox);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            pusher.push(GatewayError::Worker("late".to_string()));
        });

        let error = tokio::time::timeout(Duration::from_secs(5), mailbox.next())
            .await
            .unwrap();
        assert_eq!(error.kind(), "worker");
        handle.await.unwrap();
    }
}
