// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! AMD module system
//!
//! - [`Loader`] owns the registry, configuration and fetchers
//! - `require()` resolves a list of names into their values
//! - `define()` publishes a module once its dependencies resolve
//! - URLs are computed from the name, `baseUrl`, `paths` and `prefix`
//!
//! Special dependency names:
//! - `module`: a [`ModuleInfo`](crate::ModuleInfo) for the requesting module
//! - `require`: the [`Loader`] itself

mod define;
mod loader;
mod ready;
mod registry;
mod require;
pub mod resolver;

pub use define::{Definition, Factory};
pub use loader::{Loader, LoaderBuilder, MODULE_DEPENDENCY, REQUIRE_DEPENDENCY};
pub use ready::{ReadyGate, ReadyState};
pub use registry::{ModulePromise, ModuleStatus};
pub use require::Dependencies;
