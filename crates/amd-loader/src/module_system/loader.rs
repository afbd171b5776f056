// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module loader - registry lookups, fetch scheduling and timeouts

use crate::config::{ConfigPatch, Options};
use crate::error::{LoaderError, Result};
use crate::fetch::{FetchRequest, JsonFetcher, ResourceFetcher, ScriptFetcher, ScriptHost, ScriptTable};
use crate::module_system::ready::{ReadyGate, ReadyState};
use crate::module_system::registry::{Claim, ModulePromise, ModuleStatus, Registry};
use crate::module_system::resolver;
use crate::value::{ModuleInfo, ModuleValue};
use dashmap::DashMap;
use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Dependency name resolving to a [`ModuleInfo`] for the requester
pub const MODULE_DEPENDENCY: &str = "module";

/// Dependency name resolving to the [`Loader`] itself
pub const REQUIRE_DEPENDENCY: &str = "require";

const SCRIPT_EXTENSION: &str = "js";
const JSON_EXTENSION: &str = "json";

/// Module loader context.
///
/// Owns its module table, configuration and fetchers; clones share the same
/// context and separate loaders are fully isolated. Fetches and `define`
/// bodies run on tokio tasks, so the loader must be used inside a runtime.
#[derive(Clone)]
pub struct Loader {
    inner: Arc<LoaderInner>,
}

struct LoaderInner {
    registry: Mutex<Registry>,
    options: RwLock<Options>,
    fetchers: DashMap<String, Arc<dyn ResourceFetcher>>,
    default_fetcher: Arc<dyn ResourceFetcher>,
    ready: ReadyGate,
}

/// Builder for [`Loader`]
pub struct LoaderBuilder {
    options: Options,
    host: Option<Arc<dyn ScriptHost>>,
    fetchers: Vec<(String, Arc<dyn ResourceFetcher>)>,
    ready: ReadyGate,
}

impl LoaderBuilder {
    /// Start from these options
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Apply a config patch to the initial options
    pub fn config(mut self, patch: ConfigPatch) -> Self {
        self.options.apply(patch);
        self
    }

    /// Document that script elements are appended to
    pub fn script_host(mut self, host: Arc<dyn ScriptHost>) -> Self {
        self.host = Some(host);
        self
    }

    /// Register a fetcher for a file extension
    pub fn fetcher(mut self, extension: impl Into<String>, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        self.fetchers.push((extension.into(), fetcher));
        self
    }

    /// Hold fetches until the host document is ready
    pub fn ready_state(mut self, state: watch::Receiver<ReadyState>) -> Self {
        self.ready = ReadyGate::new(state);
        self
    }

    /// Build the loader
    pub fn build(self) -> Loader {
        let host = self
            .host
            .unwrap_or_else(|| Arc::new(ScriptTable::new()) as Arc<dyn ScriptHost>);
        let default_fetcher: Arc<dyn ResourceFetcher> = Arc::new(ScriptFetcher::new(host));

        let fetchers: DashMap<String, Arc<dyn ResourceFetcher>> = DashMap::new();
        fetchers.insert(SCRIPT_EXTENSION.to_string(), Arc::clone(&default_fetcher));
        fetchers.insert(JSON_EXTENSION.to_string(), Arc::new(JsonFetcher));
        for (extension, fetcher) in self.fetchers {
            fetchers.insert(extension, fetcher);
        }

        Loader {
            inner: Arc::new(LoaderInner {
                registry: Mutex::new(Registry::default()),
                options: RwLock::new(self.options),
                fetchers,
                default_fetcher,
                ready: self.ready,
            }),
        }
    }
}

impl Loader {
    /// Create a loader appending scripts to `host`
    pub fn new(host: Arc<dyn ScriptHost>) -> Self {
        Self::builder().script_host(host).build()
    }

    /// Start building a loader
    pub fn builder() -> LoaderBuilder {
        LoaderBuilder {
            options: Options::default(),
            host: None,
            fetchers: Vec::new(),
            ready: ReadyGate::open(),
        }
    }

    /// Update options. Keys present in the patch replace the current values;
    /// fetches started afterwards see the new configuration.
    pub fn config(&self, patch: ConfigPatch) -> &Self {
        self.inner.options.write().apply(patch);
        self
    }

    /// Snapshot of the current options
    pub fn options(&self) -> Options {
        self.inner.options.read().clone()
    }

    /// Register a fetcher for a file extension, replacing any previous one
    pub fn register_fetcher(&self, extension: impl Into<String>, fetcher: Arc<dyn ResourceFetcher>) -> &Self {
        self.inner.fetchers.insert(extension.into(), fetcher);
        self
    }

    /// URL a module name resolves to under the current configuration
    pub fn url_for(&self, name: &str) -> String {
        self.plan(name, None).0.url
    }

    /// Pick the fetcher by extension and compute the URL
    fn plan(&self, name: &str, generation: Option<u64>) -> (FetchRequest, Arc<dyn ResourceFetcher>) {
        let registered = resolver::extension(name).and_then(|extension| {
            self.inner
                .fetchers
                .get(extension)
                .map(|fetcher| (extension.to_string(), Arc::clone(fetcher.value())))
        });

        let (extension, fetcher) = match registered {
            Some((extension, fetcher)) => (Some(extension), fetcher),
            None => (None, Arc::clone(&self.inner.default_fetcher)),
        };
        let append_js = extension.is_none();
        let url = resolver::url_for(name, &self.inner.options.read(), append_js);

        (
            FetchRequest {
                module: name.to_string(),
                url,
                extension,
                generation,
            },
            fetcher,
        )
    }

    /// Descriptor handed out for the `module` dependency
    pub fn module_info(&self, name: &str) -> ModuleInfo {
        let url = if name.is_empty() {
            String::new()
        } else {
            self.url_for(name)
        };

        ModuleInfo {
            name: name.to_string(),
            url,
            config: self.inner.options.read().module_config(name),
        }
    }

    /// Resolve one dependency name on behalf of `requester`
    pub(crate) fn dependency(&self, name: &str, requester: &str) -> BoxFuture<'static, Result<ModuleValue>> {
        match name {
            MODULE_DEPENDENCY => future::ready(Ok(ModuleValue::new(self.module_info(requester)))).boxed(),
            REQUIRE_DEPENDENCY => future::ready(Ok(ModuleValue::new(self.clone()))).boxed(),
            _ => self.get_dependency_promise(name).boxed(),
        }
    }

    /// Get the memoized promise for a module, starting its fetch on first
    /// reference. At most one fetch is ever in flight per name.
    pub fn get_dependency_promise(&self, name: &str) -> ModulePromise {
        let mut registry = self.inner.registry.lock();
        if let Some(promise) = registry.lookup(name) {
            return promise;
        }

        tracing::debug!(module = name, "registering module");
        let (promise, generation) = registry.insert_pending(name);

        if let Some(after_ms) = self.inner.options.read().timeout_ms() {
            let timer = tokio::spawn(self.clone().expire(name.to_string(), generation, after_ms));
            registry.set_timer(name, timer.abort_handle());
        }
        tokio::spawn(self.clone().fetch_module(name.to_string(), generation));

        promise
    }

    /// Reject a module whose fetch has not completed after `after_ms`
    async fn expire(self, name: String, generation: u64, after_ms: u64) {
        tokio::time::sleep(Duration::from_millis(after_ms)).await;

        let error = LoaderError::Timeout {
            module: name.clone(),
            after_ms,
        };
        if self.reject_generation(&name, generation, error).is_err() {
            tracing::debug!(module = %name, "timer fired for a settled module");
        }
    }

    async fn fetch_module(self, name: String, generation: u64) {
        match self.fetch(&name, Some(generation)).await {
            // the module now waits on its dependencies, which have timers of their own
            Ok(()) => self.inner.registry.lock().clear_timer(&name, generation),
            Err(error) => {
                if self.reject_generation(&name, generation, error).is_err() {
                    // timed out or removed already; the fetch outcome has nobody to tell
                    tracing::debug!(module = %name, "fetch finished after module settled");
                }
            }
        }
    }

    /// Fetch the resource backing a module.
    ///
    /// Waits for the document-ready gate, then runs the fetcher registered for
    /// the name's extension. Fails when the fetch fails or when the resource
    /// loaded without calling `define` for the module.
    pub async fn load(&self, name: &str) -> Result<()> {
        let generation = self.inner.registry.lock().generation(name);
        self.fetch(name, generation).await
    }

    async fn fetch(&self, name: &str, generation: Option<u64>) -> Result<()> {
        self.inner.ready.wait().await;

        let (request, fetcher) = self.plan(name, generation);
        tracing::debug!(module = name, url = %request.url, "fetching module");
        fetcher.fetch(&request, self).await?;

        let defined = self.inner.registry.lock().is_defined(name);
        if !defined {
            return Err(LoaderError::NotDefined {
                module: request.module,
                url: request.url,
            });
        }
        Ok(())
    }

    /// Fulfil a pending module.
    ///
    /// Fails with `NotPending` if the module has no pending load; an already
    /// settled module keeps its value and its waiters are not notified again.
    pub fn resolve(&self, name: &str, value: ModuleValue) -> Result<()> {
        self.inner.registry.lock().settle(name, Ok(value))?;
        tracing::debug!(module = name, "module resolved");
        Ok(())
    }

    /// Reject a pending module
    pub fn reject(&self, name: &str, error: LoaderError) -> Result<()> {
        let message = error.to_string();
        self.inner.registry.lock().settle(name, Err(error))?;
        tracing::warn!(module = name, error = %message, "module rejected");
        Ok(())
    }

    /// Reject a module only while its entry is the one `generation` was fetched for
    fn reject_generation(&self, name: &str, generation: u64, error: LoaderError) -> Result<()> {
        let message = error.to_string();
        self.inner
            .registry
            .lock()
            .settle_generation(name, generation, Err(error))?;
        tracing::warn!(module = name, error = %message, "module rejected");
        Ok(())
    }

    /// Claim a name for `define`
    pub(crate) fn claim(&self, name: &str, generation: Option<u64>) -> Claim {
        self.inner.registry.lock().claim(name, generation)
    }

    /// Lifecycle state of a module, `None` if never referenced
    pub fn status(&self, name: &str) -> Option<ModuleStatus> {
        self.inner.registry.lock().status(name)
    }

    /// Remove a settled module so a later reference fetches it again.
    ///
    /// Pending modules are left alone; returns whether the entry was removed.
    pub fn undef(&self, name: &str) -> bool {
        let removed = self.inner.registry.lock().remove_settled(name);
        if removed {
            tracing::debug!(module = name, "module undefined");
        }
        removed
    }

    /// Names of all registered modules, sorted
    pub fn module_names(&self) -> Vec<String> {
        self.inner.registry.lock().names()
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("modules", &self.inner.registry.lock().len())
            .field("options", &*self.inner.options.read())
            .finish()
    }
}
