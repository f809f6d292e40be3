//! The unsent identity-check request and its header map.

use crate::handler::{HandlerError, HandlerList};
use std::collections::BTreeMap;
use stsproof_types::{
    CONTENT_TYPE, FORM_CONTENT_TYPE, HOST, IDENTITY_CHECK_BODY, IDENTITY_CHECK_METHOD,
};

/// Case-insensitive header map.
///
/// Lookups ignore ASCII case; iteration yields names as they were last set,
/// ordered by their lowercased form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: BTreeMap<String, (String, String)>,
}

impl Headers {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|(_, value)| value.as_str())
    }

    /// Sets `name` to `value`, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.entries
            .insert(name.to_ascii_lowercase(), (name, value.into()));
    }

    /// Removes `name`, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries
            .remove(&name.to_ascii_lowercase())
            .map(|(_, value)| value)
    }

    /// Whether `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// An identity-check request that has not been sent.
///
/// Processing happens in two phases, each an ordered [`HandlerList`]:
/// `build` runs once and prepares protocol-level details, `sign` runs on
/// every [`IdentityRequest::sign`] call and is where signing steps live.
#[derive(Debug)]
pub struct IdentityRequest {
    method: String,
    url: String,
    headers: Headers,
    body: String,
    build_handlers: HandlerList,
    sign_handlers: HandlerList,
    built: bool,
}

impl IdentityRequest {
    /// Creates the fixed identity-check request against `url`.
    ///
    /// `host` must be the authority the transport will connect to (including
    /// a non-default port), since it is covered by the signature.
    pub fn new(url: impl Into<String>, host: impl Into<String>) -> Self {
        let mut headers = Headers::new();
        headers.set(CONTENT_TYPE, FORM_CONTENT_TYPE);
        headers.set(HOST, host);

        Self {
            method: IDENTITY_CHECK_METHOD.to_string(),
            url: url.into(),
            headers,
            body: IDENTITY_CHECK_BODY.to_string(),
            build_handlers: HandlerList::new(),
            sign_handlers: HandlerList::new(),
            built: false,
        }
    }

    /// HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Mutable request headers.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Steps of the build phase.
    pub fn build_handlers(&self) -> &HandlerList {
        &self.build_handlers
    }

    /// Mutable steps of the build phase.
    pub fn build_handlers_mut(&mut self) -> &mut HandlerList {
        &mut self.build_handlers
    }

    /// Steps of the sign phase.
    pub fn sign_handlers(&self) -> &HandlerList {
        &self.sign_handlers
    }

    /// Mutable steps of the sign phase.
    pub fn sign_handlers_mut(&mut self) -> &mut HandlerList {
        &mut self.sign_handlers
    }

    /// Names of every installed step, build phase first.
    pub fn pipeline(&self) -> Vec<String> {
        let mut names = self.build_handlers.names();
        names.extend(self.sign_handlers.names());
        names
    }

    /// Runs the build phase if it has not run yet.
    ///
    /// # Errors
    ///
    /// Returns the first failing build step.
    pub fn build(&mut self) -> Result<(), HandlerError> {
        if self.built {
            return Ok(());
        }
        let handlers = self.build_handlers.clone();
        handlers.run(self)?;
        self.built = true;
        Ok(())
    }

    /// Runs the build phase (once) and then the sign phase.
    ///
    /// # Errors
    ///
    /// Returns the first failing step of either phase.
    pub fn sign(&mut self) -> Result<(), HandlerError> {
        self.build()?;
        let handlers = self.sign_handlers.clone();
        handlers.run(self)
    }
}
