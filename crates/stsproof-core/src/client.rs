//! Capabilities the core consumes.

use crate::handler::{BoxError, HandlerError};
use crate::request::IdentityRequest;
use stsproof_types::CallerIdentity;
use thiserror::Error;

/// Builds identity-check requests that sign themselves with local credentials.
///
/// The returned request is unsent. Its pipeline is expected to stamp the
/// `X-Amz-Date` and `Authorization` headers when [`IdentityRequest::sign`]
/// runs.
pub trait IdentityClient {
    /// Builds a fresh, unsent identity-check request.
    fn identity_request(&self) -> IdentityRequest;
}

/// Sends identity-check requests to the identity provider.
///
/// Implementations drive the request's own pipeline (via
/// [`IdentityRequest::sign`]) before dispatch and never sign outside it.
pub trait IdentityTransport: IdentityClient {
    /// Sends `request` and decodes the provider's identity response.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the pipeline fails, the provider is
    /// unreachable, the provider rejects the request, or its response cannot
    /// be decoded.
    fn send(&self, request: IdentityRequest) -> Result<CallerIdentity, TransportError>;
}

/// Errors reported by an [`IdentityTransport`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// A pipeline step failed before dispatch.
    #[error("request pipeline failed: {0}")]
    Pipeline(#[from] HandlerError),

    /// The request could not be delivered.
    #[error("network error: {0}")]
    Network(#[source] BoxError),

    /// The provider answered with an error (bad signature, expired date, ...).
    #[error("identity provider rejected request ({status} {code}): {message}")]
    Provider {
        /// HTTP status code.
        status: u16,
        /// Provider error code, e.g. `SignatureDoesNotMatch`.
        code: String,
        /// Provider error message.
        message: String,
    },

    /// The provider answered successfully but the body was not understood.
    #[error("unreadable identity provider response: {0}")]
    Decode(String),
}
