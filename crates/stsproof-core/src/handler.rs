//! Named, ordered request-processing steps.

use crate::request::IdentityRequest;
use std::fmt;
use std::sync::Arc;
use stsproof_types::CONTENT_LENGTH;
use thiserror::Error;

/// Boxed error returned by a pipeline step or a collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

type HandlerFn = dyn Fn(&mut IdentityRequest) -> Result<(), BoxError> + Send + Sync;

/// Name of the built-in content-length step.
pub const CONTENT_LENGTH_HANDLER: &str = "core.content-length";

/// A pipeline step failed.
#[derive(Debug, Error)]
#[error("pipeline step `{handler}` failed: {source}")]
pub struct HandlerError {
    /// Name of the failing step.
    pub handler: String,
    /// What the step reported.
    #[source]
    pub source: BoxError,
}

/// A single named step that mutates a request in place.
#[derive(Clone)]
pub struct NamedHandler {
    name: String,
    func: Arc<HandlerFn>,
}

impl NamedHandler {
    /// Wraps `func` as a step called `name`.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut IdentityRequest) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Returns the step name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, request: &mut IdentityRequest) -> Result<(), HandlerError> {
        (self.func)(request).map_err(|source| HandlerError {
            handler: self.name.clone(),
            source,
        })
    }
}

impl fmt::Debug for NamedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedHandler")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// An ordered list of [`NamedHandler`]s.
///
/// Steps run front to back. The first failing step stops the run.
#[derive(Debug, Clone, Default)]
pub struct HandlerList {
    handlers: Vec<NamedHandler>,
}

impl HandlerList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step.
    pub fn push_back_named(&mut self, handler: NamedHandler) {
        self.handlers.push(handler);
    }

    /// Prepends a step.
    pub fn push_front_named(&mut self, handler: NamedHandler) {
        self.handlers.insert(0, handler);
    }

    /// Removes every step called `name`. Returns whether anything was removed.
    pub fn remove_by_name(&mut self, name: &str) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|handler| handler.name != name);
        self.handlers.len() != before
    }

    /// Removes every step.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Step names in run order.
    pub fn names(&self) -> Vec<String> {
        self.handlers.iter().map(|h| h.name.clone()).collect()
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the list has no steps.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs every step over `request` in order.
    ///
    /// # Errors
    ///
    /// Returns the [`HandlerError`] of the first step that fails; later steps
    /// do not run.
    pub fn run(&self, request: &mut IdentityRequest) -> Result<(), HandlerError> {
        for handler in &self.handlers {
            tracing::trace!(handler = %handler.name, "running pipeline step");
            handler.call(request)?;
        }
        Ok(())
    }
}

/// Step that sets `Content-Length` from the request body.
///
/// It touches no credentials and is the only step the verifier keeps.
pub fn content_length_handler() -> NamedHandler {
    NamedHandler::new(CONTENT_LENGTH_HANDLER, |request: &mut IdentityRequest| {
        let length = request.body().len().to_string();
        request.headers_mut().set(CONTENT_LENGTH, length);
        Ok(())
    })
}
