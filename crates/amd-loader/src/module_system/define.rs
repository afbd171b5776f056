// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! define() implementation

use crate::error::{BoxError, LoaderError, Result};
use crate::fetch::{FetchRequest, ScriptElement};
use crate::module_system::loader::{Loader, MODULE_DEPENDENCY};
use crate::module_system::registry::Claim;
use crate::module_system::require::Dependencies;
use crate::value::{Args, ModuleValue};
use std::fmt;

tokio::task_local! {
    static CURRENT_SCRIPT: ScriptElement;
}

/// Module factory: receives resolved dependencies, returns the module value
pub type Factory = Box<dyn FnOnce(Args) -> std::result::Result<ModuleValue, BoxError> + Send>;

enum Body {
    Factory(Factory),
    Value(ModuleValue),
}

impl Body {
    fn evaluate(self, module: &str, args: Args) -> Result<ModuleValue> {
        match self {
            Self::Factory(factory) => factory(args).map_err(|e| LoaderError::Factory {
                module: module.to_string(),
                reason: e.to_string(),
            }),
            Self::Value(value) => Ok(value),
        }
    }
}

/// Arguments of a `define` call.
///
/// The name defaults to the module of the currently executing script and the
/// dependencies default to `["module"]`.
///
/// ```rust,ignore
/// loader.define(
///     Definition::factory(|args| {
///         let utils = args.get::<Utils>(0)?;
///         Ok(ModuleValue::new(Model::new(utils)))
///     })
///     .named("model")
///     .deps(["utils"]),
/// )?;
/// ```
pub struct Definition {
    name: Option<String>,
    dependencies: Option<Dependencies>,
    generation: Option<u64>,
    body: Body,
}

impl Definition {
    /// Publish the value returned by `factory`
    pub fn factory<F>(factory: F) -> Self
    where
        F: FnOnce(Args) -> std::result::Result<ModuleValue, BoxError> + Send + 'static,
    {
        Self {
            name: None,
            dependencies: None,
            generation: None,
            body: Body::Factory(Box::new(factory)),
        }
    }

    /// Publish a plain value
    pub fn value(value: impl Into<ModuleValue>) -> Self {
        Self {
            name: None,
            dependencies: None,
            generation: None,
            body: Body::Value(value.into()),
        }
    }

    /// Set the module name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name the module after a fetch request and only settle the registry
    /// entry that fetch was started for. Fetchers that publish values
    /// themselves use this instead of [`Definition::named`].
    pub fn for_request(mut self, request: &FetchRequest) -> Self {
        self.name = Some(request.module.clone());
        self.generation = request.generation;
        self
    }

    /// Set the dependencies
    pub fn deps(mut self, dependencies: impl Into<Dependencies>) -> Self {
        self.dependencies = Some(dependencies.into());
        self
    }

    /// Explicit module name, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = match self.body {
            Body::Factory(_) => "factory",
            Body::Value(_) => "value",
        };
        f.debug_struct("Definition")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("generation", &self.generation)
            .field("body", &body)
            .finish()
    }
}

impl Loader {
    /// Run a script body with `element` as the current script
    pub fn execute_script<R>(&self, element: &ScriptElement, run: impl FnOnce() -> R) -> R {
        CURRENT_SCRIPT.sync_scope(element.clone(), run)
    }

    /// The script element currently executing, if any
    pub fn current_script() -> Option<ScriptElement> {
        CURRENT_SCRIPT.try_with(|element| element.clone()).ok()
    }

    /// Define a module.
    ///
    /// The name is claimed immediately so concurrent `require` calls wait for
    /// this definition instead of fetching. Dependencies resolve on a spawned
    /// task, after which the module is fulfilled with the factory result or
    /// rejected with the factory or dependency error. Defining a name twice
    /// keeps the first definition.
    ///
    /// A definition run by a script element for its own module only settles
    /// the registry entry that element was appended for. After
    /// [`Loader::undef`], a script still loading from the earlier attempt
    /// cannot fulfil the retry.
    pub fn define(&self, definition: Definition) -> Result<()> {
        let Definition {
            name,
            dependencies,
            generation,
            body,
        } = definition;

        let script = Self::current_script();
        let name = match name {
            Some(name) => name,
            None => script
                .as_ref()
                .map(|element| element.module.clone())
                .ok_or(LoaderError::AnonymousDefine)?,
        };
        let generation = generation.or_else(|| {
            script
                .filter(|element| element.module == name)
                .and_then(|element| element.generation)
        });
        let dependencies = dependencies.unwrap_or_else(|| Dependencies::from(MODULE_DEPENDENCY));

        match self.claim(&name, generation) {
            Claim::Accepted => {}
            Claim::Defined => {
                tracing::warn!(module = %name, "module already defined, ignoring redefinition");
                return Ok(());
            }
            Claim::Stale => {
                tracing::warn!(module = %name, "define from a superseded load, ignoring");
                return Ok(());
            }
        }
        tracing::debug!(module = %name, dependencies = ?dependencies, "defining module");

        let loader = self.clone();
        tokio::spawn(async move {
            let outcome = match loader.resolve_dependencies(&dependencies, &name).await {
                Ok(args) => body.evaluate(&name, args),
                Err(source) => Err(LoaderError::Dependency {
                    module: name.clone(),
                    source: Box::new(source),
                }),
            };

            let settled = match outcome {
                Ok(value) => loader.resolve(&name, value),
                Err(error) => loader.reject(&name, error),
            };
            if settled.is_err() {
                tracing::warn!(module = %name, "module settled before its definition finished, result discarded");
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_builder() {
        let definition = Definition::value(serde_json::json!(1))
            .named("one")
            .deps(["utils"]);
        assert_eq!(definition.name(), Some("one"));
        assert_eq!(definition.dependencies, Some(Dependencies::from("utils")));
    }

    #[test]
    fn test_factory_error_names_module() {
        let body = Body::Factory(Box::new(
            |_: Args| -> std::result::Result<ModuleValue, BoxError> { Err("bad state".into()) },
        ));
        match body.evaluate("model", Args::default()) {
            Err(LoaderError::Factory { module, reason }) => {
                assert_eq!(module, "model");
                assert_eq!(reason, "bad state");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_current_script_scope() {
        let loader = Loader::builder().build();
        let element = ScriptElement {
            id: 1,
            src: "libs/dom.js".to_string(),
            module: "dom".to_string(),
            is_async: true,
            generation: None,
        };

        assert!(Loader::current_script().is_none());
        let seen = loader.execute_script(&element, || Loader::current_script().map(|s| s.module));
        assert_eq!(seen.as_deref(), Some("dom"));
        assert!(Loader::current_script().is_none());
    }

    #[test]
    fn test_anonymous_define_outside_script() {
        let loader = Loader::builder().build();
        let result = loader.define(Definition::value(ModuleValue::undefined()));
        assert!(matches!(result, Err(LoaderError::AnonymousDefine)));
    }
}
