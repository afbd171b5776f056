// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # amd-loader
//!
//! An AMD-style module registry with asynchronous, memoized dependency
//! loading:
//!
//! - `define()` publishes a named module once its dependencies resolve
//! - `require()` resolves a list of names into their values, in order
//! - Unknown names are fetched once through a per-extension fetcher
//!   (script elements by default, `.json` files built in)
//! - `baseUrl` / `paths` / `prefix` URL resolution, read at fetch time
//! - Per-module settings through the special `module` dependency
//! - Load timeouts and a document-ready gate
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use amd_loader::{ConfigPatch, Definition, Loader, ModuleValue, ScriptTable};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> amd_loader::Result<()> {
//!     let scripts = Arc::new(ScriptTable::new());
//!     scripts.insert("libs/greeting.js", |loader| {
//!         loader.define(Definition::value(ModuleValue::new("hello")).deps(Vec::<String>::new()))?;
//!         Ok(())
//!     });
//!
//!     let loader = Loader::new(scripts);
//!     loader.config(ConfigPatch::new().base_url("libs"));
//!
//!     let greeting = loader
//!         .require_with(["greeting"], |args| args.get::<&str>(0))
//!         .await??;
//!     println!("{}", greeting);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod fetch;
pub mod module_system;
pub mod value;

// Re-exports
pub use bootstrap::Bootstrap;
pub use config::{ConfigPatch, Options, DEFAULT_TIMEOUT_MS};
pub use error::{BoxError, LoaderError, Result};
pub use fetch::{
    fetcher_fn, FetchRequest, JsonFetcher, ResourceFetcher, ScriptElement, ScriptFetcher,
    ScriptHost, ScriptTable,
};
pub use module_system::{
    Definition, Dependencies, Loader, LoaderBuilder, ModuleStatus, ReadyState,
};
pub use value::{Args, ModuleInfo, ModuleValue};

/// Version of the loader
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
