// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the module loader
//!
//! Every waiter on a module shares the same settled outcome, so the error type
//! is `Clone` and carries only owned strings.

use thiserror::Error;

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Error type returned by module factories
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while loading or defining modules
#[derive(Debug, Clone, Error)]
pub enum LoaderError {
    /// The backing resource could not be fetched (network error, 404, bad JSON)
    #[error("Failed to load module '{module}' from {url}: {reason}")]
    Load {
        /// Module name
        module: String,
        /// URL the fetch was issued for
        url: String,
        /// Reason for failure
        reason: String,
    },

    /// The module did not settle within the configured timeout
    #[error("Load timeout for module '{module}' after {after_ms}ms")]
    Timeout {
        /// Module name
        module: String,
        /// Configured timeout
        after_ms: u64,
    },

    /// The module factory returned an error
    #[error("Factory for module '{module}' failed: {reason}")]
    Factory {
        /// Module name
        module: String,
        /// Error reported by the factory
        reason: String,
    },

    /// A dependency of the module was rejected
    #[error("Module '{module}' could not be defined: {source}")]
    Dependency {
        /// Module name
        module: String,
        /// The dependency's own failure
        #[source]
        source: Box<LoaderError>,
    },

    /// The resource loaded but never called `define` for the module
    #[error("Script {url} loaded but did not define module '{module}'")]
    NotDefined {
        /// Module name
        module: String,
        /// URL of the loaded resource
        url: String,
    },

    /// Resolve or reject was called for a module with no pending load
    #[error("Module '{0}' has no pending load to settle")]
    NotPending(String),

    /// `define` without a name was called outside of an executing script
    #[error("Anonymous define() called outside of a loading script")]
    AnonymousDefine,

    /// The resolver for a module was dropped before it settled
    #[error("Module '{0}' was abandoned before it settled")]
    Abandoned(String),

    /// A dependency value did not have the requested type
    #[error("Dependency '{dependency}' is a {found}, expected {expected}")]
    TypeMismatch {
        /// Dependency name
        dependency: String,
        /// Requested type
        expected: &'static str,
        /// Actual type of the module value
        found: &'static str,
    },

    /// No dependency value at the requested position
    #[error("No dependency at position {0}")]
    MissingArgument(usize),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LoaderError {
    /// Create a load error
    pub fn load(module: impl Into<String>, url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Load {
            module: module.into(),
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Follow `Dependency` wrappers down to the failure that started the chain
    pub fn root_cause(&self) -> &LoaderError {
        match self {
            Self::Dependency { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Whether the root cause is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self.root_cause(), Self::Timeout { .. })
    }

    /// Whether the root cause is a failed fetch
    pub fn is_load_error(&self) -> bool {
        matches!(self.root_cause(), Self::Load { .. } | Self::NotDefined { .. })
    }
}

impl From<serde_json::Error> for LoaderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_dependency_chain() {
        let timeout = LoaderError::Timeout {
            module: "a".to_string(),
            after_ms: 50,
        };
        let chained = LoaderError::Dependency {
            module: "c".to_string(),
            source: Box::new(LoaderError::Dependency {
                module: "b".to_string(),
                source: Box::new(timeout),
            }),
        };

        assert!(chained.is_timeout());
        assert!(!chained.is_load_error());
        assert!(matches!(chained.root_cause(), LoaderError::Timeout { module, .. } if module == "a"));
    }

    #[test]
    fn test_display() {
        let err = LoaderError::load("ajax", "libs/ajax.js", "404 Not Found");
        assert_eq!(
            err.to_string(),
            "Failed to load module 'ajax' from libs/ajax.js: 404 Not Found"
        );
    }
}
