// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loader configuration
//!
//! Options use the same camelCase keys as a `require.config({...})` call, so a
//! JSON config module can be applied directly.

use crate::error::{LoaderError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default time a module may stay pending after its fetch starts
pub const DEFAULT_TIMEOUT_MS: u64 = 7_000;

/// Loader options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Resource root for module URLs
    pub base_url: String,

    /// Per-module path overrides (module name -> path or full URL)
    pub paths: BTreeMap<String, String>,

    /// Query suffix appended to computed URLs (cache busting)
    pub prefix: String,

    /// Remove injected script elements once they have loaded
    pub remove_script_tags: bool,

    /// Per-module settings, delivered through the `module` dependency
    pub config: BTreeMap<String, serde_json::Value>,

    /// Milliseconds a fetched module may stay pending; 0 disables the timer
    pub timeout: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            paths: BTreeMap::new(),
            prefix: String::new(),
            remove_script_tags: false,
            config: BTreeMap::new(),
            timeout: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl Options {
    /// The fetch timeout in milliseconds, `None` when disabled
    pub fn timeout_ms(&self) -> Option<u64> {
        (self.timeout > 0).then_some(self.timeout)
    }

    /// Settings configured for `name`, `null` when none
    pub fn module_config(&self, name: &str) -> serde_json::Value {
        self.config
            .get(name)
            .cloned()
            .unwrap_or(serde_json::Value::Null)
    }

    /// Apply a patch. Each key present in the patch replaces the current value.
    pub fn apply(&mut self, patch: ConfigPatch) {
        if let Some(base_url) = patch.base_url {
            self.base_url = base_url;
        }
        if let Some(paths) = patch.paths {
            self.paths = paths;
        }
        if let Some(prefix) = patch.prefix {
            self.prefix = prefix;
        }
        if let Some(remove) = patch.remove_script_tags {
            self.remove_script_tags = remove;
        }
        if let Some(config) = patch.config {
            self.config = config;
        }
        if let Some(timeout) = patch.timeout {
            self.timeout = timeout;
        }
        for key in patch.extra.keys() {
            tracing::warn!(option = %key, "ignoring unknown loader option");
        }
    }
}

/// A partial set of options, as passed to `config()`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigPatch {
    /// Resource root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Path overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<BTreeMap<String, String>>,
    /// URL query suffix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Remove script elements after load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_script_tags: Option<bool>,
    /// Per-module settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<BTreeMap<String, serde_json::Value>>,
    /// Timeout in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Keys the loader does not recognize
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ConfigPatch {
    /// Create an empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a patch from a JSON value
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(LoaderError::Config(format!(
                "expected an object of options, got {}",
                value
            )));
        }
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Read a patch from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LoaderError::Config(format!("{}: {}", path.display(), e)))?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        Self::from_json(&value)
    }

    /// Set the resource root
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Add a path override
    pub fn path(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.paths
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), path.into());
        self
    }

    /// Set the URL query suffix
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Remove script elements after load
    pub fn remove_script_tags(mut self, remove: bool) -> Self {
        self.remove_script_tags = Some(remove);
        self
    }

    /// Add settings for a module
    pub fn module_config(mut self, name: impl Into<String>, settings: serde_json::Value) -> Self {
        self.config
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), settings);
        self
    }

    /// Set the timeout in milliseconds (0 disables it)
    pub fn timeout(mut self, millis: u64) -> Self {
        self.timeout = Some(millis);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.base_url, "");
        assert_eq!(options.timeout_ms(), Some(DEFAULT_TIMEOUT_MS));
        assert_eq!(options.module_config("ajax"), serde_json::Value::Null);
    }

    #[test]
    fn test_patch_from_camel_case_json() {
        let patch = ConfigPatch::from_json(&json!({
            "baseUrl": "../../libs",
            "removeScriptTags": true,
            "config": { "ajax": { "type": "GET", "url": "//my.api.com/" } }
        }))
        .unwrap();

        let mut options = Options::default();
        options.apply(patch);

        assert_eq!(options.base_url, "../../libs");
        assert!(options.remove_script_tags);
        assert_eq!(options.module_config("ajax")["type"], "GET");
    }

    #[test]
    fn test_patch_replaces_top_level_keys() {
        let mut options = Options::default();
        options.apply(ConfigPatch::new().path("a", "vendor/a").path("b", "vendor/b"));
        options.apply(ConfigPatch::new().path("c", "lib/c").prefix("v=2"));

        assert_eq!(options.paths.len(), 1);
        assert_eq!(options.paths["c"], "lib/c");
        assert_eq!(options.prefix, "v=2");
    }

    #[test]
    fn test_zero_timeout_disables() {
        let mut options = Options::default();
        options.apply(ConfigPatch::new().timeout(0));
        assert_eq!(options.timeout_ms(), None);
    }

    #[test]
    fn test_unknown_keys_are_kept_aside() {
        let patch = ConfigPatch::from_json(&json!({ "shim": {}, "prefix": "x" })).unwrap();
        assert!(patch.extra.contains_key("shim"));
        assert_eq!(patch.prefix.as_deref(), Some("x"));
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(matches!(
            ConfigPatch::from_json(&json!([1, 2])),
            Err(LoaderError::Config(_))
        ));
    }
}
