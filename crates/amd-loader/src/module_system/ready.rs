// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Document-ready gate
//!
//! Fetches do not start until the host document has finished parsing. The
//! gate is a one-time shared future: once open it stays open.

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;

/// Host document ready-state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// Markup is still being parsed
    Loading,
    /// Parsing finished, subresources may still be loading
    Interactive,
    /// Fully loaded
    Complete,
}

impl ReadyState {
    /// Interactive or complete
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Interactive | Self::Complete)
    }
}

/// One-time gate that opens when the document becomes ready
#[derive(Clone)]
pub struct ReadyGate {
    inner: Shared<BoxFuture<'static, ()>>,
}

impl ReadyGate {
    /// A gate that is already open
    pub fn open() -> Self {
        Self {
            inner: futures::future::ready(()).boxed().shared(),
        }
    }

    /// Gate on a ready-state channel
    pub fn new(mut state: watch::Receiver<ReadyState>) -> Self {
        if state.borrow().is_ready() {
            return Self::open();
        }

        let inner = async move {
            if state.wait_for(|s| s.is_ready()).await.is_err() {
                tracing::debug!("document ready-state channel closed, opening gate");
            }
        }
        .boxed()
        .shared();

        Self { inner }
    }

    /// Wait for the gate to open
    pub async fn wait(&self) {
        self.inner.clone().await
    }
}

impl Default for ReadyGate {
    fn default() -> Self {
        Self::open()
    }
}

impl std::fmt::Debug for ReadyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadyGate")
            .field("open", &self.inner.peek().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_open_when_already_interactive() {
        let (_tx, rx) = watch::channel(ReadyState::Interactive);
        let gate = ReadyGate::new(rx);
        tokio::time::timeout(Duration::from_millis(100), gate.wait())
            .await
            .expect("gate should be open");
    }

    #[tokio::test]
    async fn test_opens_on_ready_state_change() {
        let (tx, rx) = watch::channel(ReadyState::Loading);
        let gate = ReadyGate::new(rx);

        let waiter = tokio::spawn({
            let gate = gate.clone();
            async move { gate.wait().await }
        });

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        tx.send(ReadyState::Complete).unwrap();
        waiter.await.unwrap();

        // stays open even if the state goes back
        tx.send_replace(ReadyState::Loading);
        gate.wait().await;
    }

    #[tokio::test]
    async fn test_closed_channel_opens_gate() {
        let (tx, rx) = watch::channel(ReadyState::Loading);
        let gate = ReadyGate::new(rx);
        drop(tx);
        gate.wait().await;
    }
}
