// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module registry
//!
//! Maps module names to memoized shared futures of their values. A resolver is
//! kept per name only while the module is pending, along with the handle of its
//! timeout task. Every pending entry gets a fresh generation number so a fetch
//! started for an entry that was later removed cannot settle its replacement.

use crate::error::{LoaderError, Result};
use crate::value::ModuleValue;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

/// A module's memoized outcome, shared by every dependent
pub type ModulePromise = Shared<BoxFuture<'static, Result<ModuleValue>>>;

/// Lifecycle state of a registered module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleStatus {
    /// Waiting for its resource or its `define` to finish
    Pending,
    /// Published
    Fulfilled,
    /// Failed (load error, timeout, factory or dependency failure)
    Rejected,
}

/// Outcome of claiming a name for `define`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Claim {
    /// The definition owns the entry
    Accepted,
    /// `define` was already called for the entry
    Defined,
    /// The definition belongs to a fetch of a removed entry
    Stale,
}

/// Registry entry
struct ModuleRecord {
    promise: ModulePromise,
    status: ModuleStatus,
    generation: u64,
    /// `define` has been called for this name
    defined: bool,
}

/// Module, resolver and timer tables
#[derive(Default)]
pub(crate) struct Registry {
    modules: HashMap<String, ModuleRecord>,
    resolves: HashMap<String, oneshot::Sender<Result<ModuleValue>>>,
    timers: HashMap<String, AbortHandle>,
    last_generation: u64,
}

impl Registry {
    /// Get the memoized promise for a name
    pub fn lookup(&self, name: &str) -> Option<ModulePromise> {
        self.modules.get(name).map(|record| record.promise.clone())
    }

    /// Register a new pending module and keep its resolver.
    ///
    /// Returns the promise and the entry's generation.
    pub fn insert_pending(&mut self, name: &str) -> (ModulePromise, u64) {
        let (tx, rx) = oneshot::channel();
        let module = name.to_string();
        let promise = async move {
            rx.await
                .unwrap_or_else(|_| Err(LoaderError::Abandoned(module)))
        }
        .boxed()
        .shared();

        self.last_generation += 1;
        let generation = self.last_generation;
        self.modules.insert(
            name.to_string(),
            ModuleRecord {
                promise: promise.clone(),
                status: ModuleStatus::Pending,
                generation,
                defined: false,
            },
        );
        self.resolves.insert(name.to_string(), tx);
        (promise, generation)
    }

    /// Generation of the entry registered under a name
    pub fn generation(&self, name: &str) -> Option<u64> {
        self.modules.get(name).map(|record| record.generation)
    }

    fn is_current(&self, name: &str, generation: u64) -> bool {
        self.generation(name) == Some(generation)
    }

    /// Keep the timeout task for a pending module
    pub fn set_timer(&mut self, name: &str, handle: AbortHandle) {
        if let Some(previous) = self.timers.insert(name.to_string(), handle) {
            previous.abort();
        }
    }

    /// Mark a name as defined, registering it if it was never referenced.
    ///
    /// A definition coming from a fetch carries that fetch's generation and is
    /// only accepted by the entry the fetch was started for.
    pub fn claim(&mut self, name: &str, generation: Option<u64>) -> Claim {
        match (self.generation(name), generation) {
            (Some(current), Some(generation)) if current != generation => return Claim::Stale,
            (None, Some(_)) => return Claim::Stale,
            (None, None) => {
                let _ = self.insert_pending(name);
            }
            _ => {}
        }
        match self.modules.get_mut(name) {
            Some(record) if !record.defined => {
                record.defined = true;
                Claim::Accepted
            }
            _ => Claim::Defined,
        }
    }

    /// Whether `define` has been called for the name
    pub fn is_defined(&self, name: &str) -> bool {
        self.modules.get(name).is_some_and(|record| record.defined)
    }

    /// Settle a pending module, dropping its resolver and cancelling its timer
    pub fn settle(&mut self, name: &str, outcome: Result<ModuleValue>) -> Result<()> {
        let resolver = self
            .resolves
            .remove(name)
            .ok_or_else(|| LoaderError::NotPending(name.to_string()))?;

        if let Some(timer) = self.timers.remove(name) {
            timer.abort();
        }
        if let Some(record) = self.modules.get_mut(name) {
            record.status = if outcome.is_ok() {
                ModuleStatus::Fulfilled
            } else {
                ModuleStatus::Rejected
            };
        }

        // Nobody awaiting the promise is not an error.
        let _ = resolver.send(outcome);
        Ok(())
    }

    /// Settle a module only if its entry is still the given generation
    pub fn settle_generation(
        &mut self,
        name: &str,
        generation: u64,
        outcome: Result<ModuleValue>,
    ) -> Result<()> {
        if !self.is_current(name, generation) {
            return Err(LoaderError::NotPending(name.to_string()));
        }
        self.settle(name, outcome)
    }

    /// Cancel the timeout of a generation whose fetch has completed
    pub fn clear_timer(&mut self, name: &str, generation: u64) {
        if !self.is_current(name, generation) {
            return;
        }
        if let Some(timer) = self.timers.remove(name) {
            timer.abort();
        }
    }

    /// Status of a module
    pub fn status(&self, name: &str) -> Option<ModuleStatus> {
        self.modules.get(name).map(|record| record.status)
    }

    /// Remove a settled module so the next reference starts over
    pub fn remove_settled(&mut self, name: &str) -> bool {
        match self.modules.get(name) {
            Some(record) if record.status != ModuleStatus::Pending => {
                self.modules.remove(name);
                true
            }
            _ => false,
        }
    }

    /// All registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.modules.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }
}
