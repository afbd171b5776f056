// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Bootstrap from `data-config` / `data-main` attributes

use crate::config::ConfigPatch;
use crate::error::{LoaderError, Result};
use crate::module_system::Loader;
use crate::value::ModuleValue;

/// Attribute naming the config module
pub const CONFIG_ATTRIBUTE: &str = "data-config";

/// Attribute naming the main module
pub const MAIN_ATTRIBUTE: &str = "data-main";

/// Modules to load when the loader starts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bootstrap {
    /// Module loaded first; a JSON value is applied as configuration
    pub config: Option<String>,
    /// Module loaded once configuration is in place
    pub main: Option<String>,
}

impl Bootstrap {
    /// Read the attributes of the script element that loaded the loader
    pub fn from_attributes<I, K, V>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut bootstrap = Self::default();
        for (key, value) in attributes {
            let value = value.into();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                CONFIG_ATTRIBUTE => bootstrap.config = Some(value),
                MAIN_ATTRIBUTE => bootstrap.main = Some(value),
                _ => {}
            }
        }
        bootstrap
    }

    /// Nothing to load
    pub fn is_empty(&self) -> bool {
        self.config.is_none() && self.main.is_none()
    }
}

impl Loader {
    /// Load the config module, then the main module.
    ///
    /// A config module whose value is JSON is applied as a [`ConfigPatch`];
    /// script config modules are expected to call [`Loader::config`]
    /// themselves. Returns the main module's value.
    pub async fn bootstrap(&self, bootstrap: &Bootstrap) -> Result<Option<ModuleValue>> {
        if let Some(config) = &bootstrap.config {
            tracing::debug!(module = %config, "loading config module");
            let args = self.require(config.as_str()).await?;
            if let Some(json) = args.value(0).and_then(ModuleValue::as_json) {
                self.config(ConfigPatch::from_json(json)?);
            }
        }

        let Some(main) = &bootstrap.main else {
            return Ok(None);
        };
        tracing::debug!(module = %main, "loading main module");
        let args = self.require(main.as_str()).await?;
        args.into_values()
            .into_iter()
            .next()
            .map(Some)
            .ok_or(LoaderError::MissingArgument(0))
    }
}
