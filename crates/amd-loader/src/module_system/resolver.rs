// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module URL resolution

use crate::config::Options;
use url::Url;

/// Compute the URL for a module name.
///
/// The root is the module's path override or `base_url`. A full `http(s)` or
/// protocol-relative URL to a `.js` file is used verbatim, a path ending in
/// `.js` already names the file, and anything else is treated as a directory
/// the module file lives in. `append_js` adds the `.js` extension to the name.
pub fn url_for(name: &str, options: &Options, append_js: bool) -> String {
    let path = options
        .paths
        .get(name)
        .map(String::as_str)
        .unwrap_or(&options.base_url);

    if is_absolute_script_url(path) {
        return path.to_string();
    }

    let suffix = if options.prefix.is_empty() {
        String::new()
    } else {
        format!("?{}", options.prefix)
    };

    if path.ends_with(".js") {
        return format!("{}{}", path, suffix);
    }

    let separator = if path.is_empty() || path.ends_with('/') {
        ""
    } else {
        "/"
    };
    let extension = if append_js { ".js" } else { "" };

    format!("{}{}{}{}{}", path, separator, name, extension, suffix)
}

/// Check for an `http(s)://` or `//` URL to a `.js` file
fn is_absolute_script_url(path: &str) -> bool {
    if !path.ends_with(".js") {
        return false;
    }
    if path.starts_with("//") {
        return true;
    }
    Url::parse(path)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// File extension of the last segment of a module name
pub fn extension(name: &str) -> Option<&str> {
    let segment = name.rsplit('/').next().unwrap_or(name);
    match segment.rfind('.') {
        Some(0) | None => None,
        Some(pos) if pos + 1 < segment.len() => Some(&segment[pos + 1..]),
        Some(_) => None,
    }
}

/// Drop the query string and fragment from a URL
pub fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigPatch;

    fn options(patch: ConfigPatch) -> Options {
        let mut options = Options::default();
        options.apply(patch);
        options
    }

    #[test]
    fn test_base_url() {
        let opts = options(ConfigPatch::new().base_url("../../libs"));
        assert_eq!(url_for("ajax", &opts, true), "../../libs/ajax.js");

        let opts = options(ConfigPatch::new().base_url("libs/"));
        assert_eq!(url_for("ajax", &opts, true), "libs/ajax.js");
    }

    #[test]
    fn test_empty_base_url() {
        assert_eq!(url_for("utils", &Options::default(), true), "utils.js");
    }

    #[test]
    fn test_path_override() {
        let opts = options(ConfigPatch::new().base_url("B").path("x", "P"));
        assert_eq!(url_for("x", &opts, true), "P/x.js");
        assert_eq!(url_for("y", &opts, true), "B/y.js");
    }

    #[test]
    fn test_path_override_naming_file() {
        let opts = options(ConfigPatch::new().path("jquery", "vendor/jquery-2.1.js").prefix("v=3"));
        assert_eq!(url_for("jquery", &opts, true), "vendor/jquery-2.1.js?v=3");
    }

    #[test]
    fn test_absolute_url_is_verbatim() {
        let opts = options(
            ConfigPatch::new()
                .path("cdn", "https://cdn.example.com/lib/cdn.js")
                .path("proto", "//cdn.example.com/proto.js")
                .prefix("bust"),
        );
        assert_eq!(url_for("cdn", &opts, true), "https://cdn.example.com/lib/cdn.js");
        assert_eq!(url_for("proto", &opts, true), "//cdn.example.com/proto.js");
    }

    #[test]
    fn test_prefix_query() {
        let opts = options(ConfigPatch::new().base_url("libs").prefix("t=123"));
        assert_eq!(url_for("dom", &opts, true), "libs/dom.js?t=123");
    }

    #[test]
    fn test_no_js_extension() {
        let opts = options(ConfigPatch::new().base_url("data"));
        assert_eq!(url_for("audio.json", &opts, false), "data/audio.json");
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("audio.json"), Some("json"));
        assert_eq!(extension("lib/jquery.min"), Some("min"));
        assert_eq!(extension("ajax"), None);
        assert_eq!(extension("dir.v2/ajax"), None);
        assert_eq!(extension(".hidden"), None);
        assert_eq!(extension("trailing."), None);
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("libs/a.js?v=1"), "libs/a.js");
        assert_eq!(strip_query("libs/a.js#top"), "libs/a.js");
        assert_eq!(strip_query("libs/a.js"), "libs/a.js");
    }
}
