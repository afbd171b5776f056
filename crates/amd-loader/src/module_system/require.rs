// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! require() implementation

use crate::error::Result;
use crate::module_system::loader::Loader;
use crate::value::Args;
use futures::future::try_join_all;

/// Ordered list of dependency names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies(Vec<String>);

impl Dependencies {
    /// No dependencies
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// Number of names
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the names in order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<&str> for Dependencies {
    fn from(name: &str) -> Self {
        Self(vec![name.to_string()])
    }
}

impl From<String> for Dependencies {
    fn from(name: String) -> Self {
        Self(vec![name])
    }
}

impl From<Vec<String>> for Dependencies {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<Vec<&str>> for Dependencies {
    fn from(names: Vec<&str>) -> Self {
        names.as_slice().into()
    }
}

impl From<&[&str]> for Dependencies {
    fn from(names: &[&str]) -> Self {
        Self(names.iter().map(|name| name.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Dependencies {
    fn from(names: [&str; N]) -> Self {
        names.as_slice().into()
    }
}

impl Loader {
    /// Resolve dependencies into their values, in request order.
    ///
    /// Fetches for all names start together; the first rejection fails the
    /// whole call.
    pub async fn require(&self, dependencies: impl Into<Dependencies>) -> Result<Args> {
        let dependencies = dependencies.into();
        self.resolve_dependencies(&dependencies, "").await
    }

    /// Resolve dependencies, then call `callback` with their values.
    ///
    /// The callback is never invoked if any dependency fails.
    pub async fn require_with<F, R>(&self, dependencies: impl Into<Dependencies>, callback: F) -> Result<R>
    where
        F: FnOnce(Args) -> R,
    {
        let args = self.require(dependencies).await?;
        Ok(callback(args))
    }

    pub(crate) async fn resolve_dependencies(&self, dependencies: &Dependencies, requester: &str) -> Result<Args> {
        let pending: Vec<_> = dependencies
            .iter()
            .map(|name| self.dependency(name, requester))
            .collect();
        let values = try_join_all(pending).await?;

        Ok(Args::new(dependencies.0.clone(), values))
    }
}
