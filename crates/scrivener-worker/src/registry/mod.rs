//! Method registry mapping names to handlers.
//!
//! The [`MethodRegistry`] is built once at worker startup and then handed to
//! the run loop by reference. Registering a name twice replaces the earlier
//! binding.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use scrivener_protocol::Params;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::HandlerError;

/// Tracing target for registry operations.
const REGISTRY_TARGET: &str = "scrivener_worker::registry";

/// A function bound to a method name.
///
/// # Example
///
/// ```
/// use scrivener_protocol::Params;
/// use scrivener_worker::{Handler, HandlerError};
/// use serde_json::Value;
///
/// struct Ping;
///
/// impl Handler for Ping {
///     fn call(&self, _params: &Params) -> Result<Value, HandlerError> {
///         Ok(Value::from("pong"))
///     }
/// }
/// ```
pub trait Handler: Send + Sync {
    /// Runs the handler against the request parameters.
    ///
    /// # Errors
    ///
    /// Returns a [`HandlerError`] when the parameters are unusable or the
    /// operation fails.
    fn call(&self, params: &Params) -> Result<Value, HandlerError>;
}

/// Name and description of a registered method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodInfo<'a> {
    name: &'a str,
    description: &'a str,
}

impl<'a> MethodInfo<'a> {
    /// Returns the method name.
    #[must_use]
    pub const fn name(&self) -> &'a str {
        self.name
    }

    /// Returns the human-readable description.
    #[must_use]
    pub const fn description(&self) -> &'a str {
        self.description
    }
}

struct Entry {
    description: String,
    handler: Box<dyn Handler>,
}

/// Registry of named method handlers.
///
/// # Example
///
/// ```
/// use scrivener_worker::{HandlerError, MethodRegistry};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct EchoParams {
///     text: String,
/// }
///
/// let mut registry = MethodRegistry::new();
/// registry.register_fn("echo", "Returns the text unchanged", |params: EchoParams| {
///     Ok::<_, HandlerError>(params.text)
/// });
/// assert!(registry.get("echo").is_some());
/// assert_eq!(registry.len(), 1);
/// ```
#[derive(Default)]
pub struct MethodRegistry {
    entries: BTreeMap<String, Entry>,
}

impl MethodRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` to `name`, replacing any existing binding.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: impl Handler + 'static,
    ) {
        let method = name.into();
        let entry = Entry {
            description: description.into(),
            handler: Box::new(handler),
        };
        if self.entries.insert(method.clone(), entry).is_some() {
            debug!(
                target: REGISTRY_TARGET,
                method = %method,
                "replaced existing method binding"
            );
        }
    }

    /// Binds a closure whose parameters are deserialised from the request.
    ///
    /// A parameter map that does not deserialise into `P` yields
    /// [`HandlerError::InvalidParams`] without calling the closure.
    pub fn register_fn<P, R, F>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        function: F,
    ) where
        P: DeserializeOwned + 'static,
        R: Serialize + 'static,
        F: Fn(P) -> Result<R, HandlerError> + Send + Sync + 'static,
    {
        self.register(
            name,
            description,
            TypedHandler {
                function,
                marker: PhantomData,
            },
        );
    }

    /// Binds an asynchronous closure.
    ///
    /// The returned future is driven to completion on the dispatching thread
    /// before the response is written.
    pub fn register_async<P, R, F, Fut>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        function: F,
    ) where
        P: DeserializeOwned + 'static,
        R: Serialize + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + 'static,
    {
        self.register_fn(name, description, move |params: P| {
            futures::executor::block_on(function(params))
        });
    }

    /// Looks up the handler bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Handler> {
        self.entries.get(name).map(|entry| entry.handler.as_ref())
    }

    /// Lists registered methods ordered by name.
    pub fn methods(&self) -> impl Iterator<Item = MethodInfo<'_>> {
        self.entries.iter().map(|(name, entry)| MethodInfo {
            name: name.as_str(),
            description: entry.description.as_str(),
        })
    }

    /// Returns the number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no methods are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Adapts a typed closure to the [`Handler`] trait.
struct TypedHandler<F, P, R> {
    function: F,
    marker: PhantomData<fn(P) -> R>,
}

impl<F, P, R> Handler for TypedHandler<F, P, R>
where
    P: DeserializeOwned,
    R: Serialize,
    F: Fn(P) -> Result<R, HandlerError> + Send + Sync,
{
    fn call(&self, params: &Params) -> Result<Value, HandlerError> {
        let typed: P = serde_json::from_value(Value::Object(params.clone()))
            .map_err(|error| HandlerError::invalid_params(error.to_string()))?;
        let output = (self.function)(typed)?;
        serde_json::to_value(output)
            .map_err(|error| HandlerError::failed(format!("failed to serialise result: {error}")))
    }
}

#[cfg(test)]
mod tests;
