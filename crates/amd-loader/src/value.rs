// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module values and factory arguments

use crate::error::{LoaderError, Result};
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// The value a module publishes under its name.
///
/// Values are type-erased and shared between every dependent; use
/// [`ModuleValue::downcast`] or [`Args::get`] to get a typed handle back.
#[derive(Clone)]
pub struct ModuleValue {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl ModuleValue {
    /// Wrap a value
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// The value of a module whose factory returns nothing
    pub fn undefined() -> Self {
        Self::new(())
    }

    /// Check if this is the unit value
    pub fn is_undefined(&self) -> bool {
        self.inner.is::<()>()
    }

    /// Check the concrete type
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Borrow the value as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Get a shared handle to the value as `T`
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner).downcast::<T>().ok()
    }

    /// The value as JSON, for modules loaded from `.json` resources
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        self.downcast_ref::<serde_json::Value>()
    }

    /// Name of the wrapped type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether both handles point at the same published value
    pub fn ptr_eq(&self, other: &ModuleValue) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ModuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_json() {
            Some(json) => write!(f, "ModuleValue({})", json),
            None => write!(f, "ModuleValue(<{}>)", self.type_name),
        }
    }
}

impl From<serde_json::Value> for ModuleValue {
    fn from(value: serde_json::Value) -> Self {
        Self::new(value)
    }
}

/// Descriptor delivered for the special `module` dependency
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleInfo {
    /// Name of the module that asked for it (empty for top-level `require`)
    pub name: String,
    /// URL the name resolves to under the current configuration
    pub url: String,
    /// Settings configured for this name, `null` when none
    pub config: serde_json::Value,
}

/// Resolved dependency values, in the order they were requested
#[derive(Debug, Clone, Default)]
pub struct Args {
    names: Vec<String>,
    values: Vec<ModuleValue>,
}

impl Args {
    pub(crate) fn new(names: Vec<String>, values: Vec<ModuleValue>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    /// Number of resolved dependencies
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no dependencies
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value at `index`
    pub fn value(&self, index: usize) -> Option<&ModuleValue> {
        self.values.get(index)
    }

    /// Dependency name at `index`
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Typed value at `index`
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
        let value = self
            .values
            .get(index)
            .ok_or(LoaderError::MissingArgument(index))?;

        value.downcast::<T>().ok_or_else(|| LoaderError::TypeMismatch {
            dependency: self.names[index].clone(),
            expected: type_name::<T>(),
            found: value.type_name(),
        })
    }

    /// The `module` descriptor, if it was requested
    pub fn module_info(&self) -> Option<&ModuleInfo> {
        self.values.iter().find_map(|v| v.downcast_ref::<ModuleInfo>())
    }

    /// Iterate over `(name, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModuleValue)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }

    /// Consume into the positional values
    pub fn into_values(self) -> Vec<ModuleValue> {
        self.values
    }
}
