//! Ordinary failures of extraction and verification.

use crate::client::TransportError;
use crate::handler::HandlerError;
use thiserror::Error;

/// Local signing did not yield a usable tuple.
#[derive(Debug, Error)]
#[error("failed to prepare signature for request: {cause}")]
pub struct SignatureCreationError {
    #[from]
    cause: SigningFailure,
}

impl SignatureCreationError {
    /// The underlying failure.
    pub fn cause(&self) -> &SigningFailure {
        &self.cause
    }
}

/// Why local signing failed.
#[derive(Debug, Error)]
pub enum SigningFailure {
    /// A pipeline step failed, e.g. no usable local credentials.
    #[error(transparent)]
    Pipeline(#[from] HandlerError),

    /// The pipeline completed without producing a transferred header.
    #[error("signed request carries no `{0}` header")]
    MissingHeader(&'static str),
}

/// The identity provider did not confirm the transferred tuple.
///
/// This is the expected outcome for tampered, expired or malformed tuples.
#[derive(Debug, Error)]
#[error("failed to request caller identity: {cause}")]
pub struct IdentityVerificationError {
    #[from]
    cause: TransportError,
}

impl IdentityVerificationError {
    /// The underlying transport or provider failure.
    pub fn cause(&self) -> &TransportError {
        &self.cause
    }
}
