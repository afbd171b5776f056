// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Resource fetchers
//!
//! A fetcher retrieves the resource backing a module and makes sure `define`
//! is called for it before returning. Fetchers are registered per file
//! extension on the [`Loader`]; names without a registered extension go
//! through the default [`ScriptFetcher`].
//!
//! - [`ScriptFetcher`] appends a script element to a [`ScriptHost`]
//! - [`JsonFetcher`] reads a `.json` file and publishes the parsed value

mod json;
mod script;

pub use json::JsonFetcher;
pub use script::{ScriptElement, ScriptFetcher, ScriptHost, ScriptTable};

use crate::error::Result;
use crate::module_system::Loader;
use async_trait::async_trait;
use std::future::Future;

/// What to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Module name
    pub module: String,
    /// URL computed from the name and the current configuration
    pub url: String,
    /// Extension the fetcher was selected by, if any
    pub extension: Option<String>,
    /// Registry entry the fetch was started for; `None` for a direct
    /// [`Loader::load`] of an unregistered name
    pub generation: Option<u64>,
}

/// Fetches the resource behind a module name.
///
/// Resolve once the resource has loaded. The resource is expected to have
/// called [`Loader::define`] for `request.module` by then; the loader rejects
/// the module otherwise.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetch the resource for a request
    async fn fetch(&self, request: &FetchRequest, loader: &Loader) -> Result<()>;
}

/// Adapts an async closure into a [`ResourceFetcher`]
pub struct FnFetcher<F>(F);

/// Build a fetcher from an async closure
pub fn fetcher_fn<F, Fut>(f: F) -> FnFetcher<F>
where
    F: Fn(FetchRequest, Loader) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    FnFetcher(f)
}

#[async_trait]
impl<F, Fut> ResourceFetcher for FnFetcher<F>
where
    F: Fn(FetchRequest, Loader) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn fetch(&self, request: &FetchRequest, loader: &Loader) -> Result<()> {
        (self.0)(request.clone(), loader.clone()).await
    }
}
