// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! JSON data modules

use super::{FetchRequest, ResourceFetcher};
use crate::error::{LoaderError, Result};
use crate::module_system::resolver::strip_query;
use crate::module_system::{Definition, Dependencies, Loader};
use async_trait::async_trait;
use std::path::PathBuf;
use url::Url;

/// Reads `.json` resources from the filesystem and publishes the parsed value.
///
/// The URL is a local path, or a `file://` URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFetcher;

impl JsonFetcher {
    /// Map a module URL to a filesystem path
    fn local_path(url: &str) -> Result<PathBuf> {
        let url = strip_query(url);
        if url.starts_with("file:") {
            return Url::parse(url)
                .ok()
                .and_then(|parsed| parsed.to_file_path().ok())
                .ok_or_else(|| LoaderError::Config(format!("invalid file URL: {}", url)));
        }
        Ok(PathBuf::from(url))
    }
}

#[async_trait]
impl ResourceFetcher for JsonFetcher {
    async fn fetch(&self, request: &FetchRequest, loader: &Loader) -> Result<()> {
        let path = Self::local_path(&request.url)?;
        tracing::debug!(module = %request.module, path = %path.display(), "reading JSON module");

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| LoaderError::load(&request.module, &request.url, e))?;
        let value: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| LoaderError::load(&request.module, &request.url, e))?;

        loader.define(
            Definition::value(value)
                .for_request(request)
                .deps(Dependencies::none()),
        )
    }
}
