// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Script-element fetching

use super::{FetchRequest, ResourceFetcher};
use crate::error::{BoxError, LoaderError, Result};
use crate::module_system::resolver::strip_query;
use crate::module_system::Loader;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A script element appended to the host document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptElement {
    /// Unique element id
    pub id: u64,
    /// Resource URL
    pub src: String,
    /// Module the element was created for
    pub module: String,
    /// Load without blocking the parser
    pub is_async: bool,
    /// Registry entry the element was appended for; a `define` run by a
    /// superseded element is ignored
    pub generation: Option<u64>,
}

/// Where script elements are appended and executed
#[async_trait]
pub trait ScriptHost: Send + Sync {
    /// Append a script element and wait for its load event.
    ///
    /// The error string is the reason reported by the error event. Hosts run
    /// the script through [`Loader::execute_script`] so an anonymous `define`
    /// can find its name.
    async fn append(&self, element: &ScriptElement, loader: &Loader) -> std::result::Result<(), String>;

    /// Remove a previously appended element
    fn remove(&self, element: &ScriptElement);
}

/// Default fetcher: one script element per module
pub struct ScriptFetcher {
    host: Arc<dyn ScriptHost>,
    next_id: AtomicU64,
}

impl ScriptFetcher {
    /// Create a fetcher appending to `host`
    pub fn new(host: Arc<dyn ScriptHost>) -> Self {
        Self {
            host,
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl ResourceFetcher for ScriptFetcher {
    async fn fetch(&self, request: &FetchRequest, loader: &Loader) -> Result<()> {
        let element = ScriptElement {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            src: request.url.clone(),
            module: request.module.clone(),
            is_async: true,
            generation: request.generation,
        };

        tracing::debug!(module = %element.module, src = %element.src, "appending script element");
        let outcome = self.host.append(&element, loader).await;

        if loader.options().remove_script_tags {
            self.host.remove(&element);
        }

        outcome.map_err(|reason| LoaderError::load(&request.module, &request.url, reason))
    }
}

/// Body of an in-process script
type ScriptBody = Arc<dyn Fn(&Loader) -> std::result::Result<(), BoxError> + Send + Sync>;

#[derive(Clone)]
enum Script {
    /// Runs as soon as it is appended
    Ready(ScriptBody),
    /// Runs after a network delay
    Delayed(Duration, ScriptBody),
    /// Never fires load or error
    Stalled,
}

/// In-process script host.
///
/// Scripts are Rust closures registered by URL (query string ignored) that
/// usually call [`Loader::define`]. Appending a URL with no registered script
/// fails like a 404. The host keeps the elements currently attached and every
/// element ever appended.
#[derive(Default)]
pub struct ScriptTable {
    scripts: DashMap<String, Script>,
    attached: Mutex<Vec<ScriptElement>>,
    history: Mutex<Vec<ScriptElement>>,
}

impl ScriptTable {
    /// Create an empty host
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a script that runs as soon as it is appended
    pub fn insert<F>(&self, url: impl Into<String>, body: F)
    where
        F: Fn(&Loader) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        self.scripts.insert(url.into(), Script::Ready(Arc::new(body)));
    }

    /// Register a script that loads after `delay`
    pub fn insert_delayed<F>(&self, url: impl Into<String>, delay: Duration, body: F)
    where
        F: Fn(&Loader) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        self.scripts
            .insert(url.into(), Script::Delayed(delay, Arc::new(body)));
    }

    /// Register a script whose load never completes
    pub fn insert_stalled(&self, url: impl Into<String>) {
        self.scripts.insert(url.into(), Script::Stalled);
    }

    /// Elements currently attached to the document
    pub fn elements(&self) -> Vec<ScriptElement> {
        self.attached.lock().clone()
    }

    /// Every element appended so far
    pub fn history(&self) -> Vec<ScriptElement> {
        self.history.lock().clone()
    }

    /// Number of elements appended for a module
    pub fn injections(&self, module: &str) -> usize {
        self.history
            .lock()
            .iter()
            .filter(|element| element.module == module)
            .count()
    }
}

#[async_trait]
impl ScriptHost for ScriptTable {
    async fn append(&self, element: &ScriptElement, loader: &Loader) -> std::result::Result<(), String> {
        self.attached.lock().push(element.clone());
        self.history.lock().push(element.clone());

        let script = self
            .scripts
            .get(strip_query(&element.src))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| format!("404 Not Found: {}", element.src))?;

        let body = match script {
            Script::Ready(body) => body,
            Script::Delayed(delay, body) => {
                tokio::time::sleep(delay).await;
                body
            }
            Script::Stalled => return futures::future::pending().await,
        };

        loader
            .execute_script(element, || body(loader))
            .map_err(|e| e.to_string())
    }

    fn remove(&self, element: &ScriptElement) {
        self.attached.lock().retain(|attached| attached.id != element.id);
    }
}
