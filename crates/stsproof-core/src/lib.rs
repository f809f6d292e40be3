//! Caller-identity assertion core.
//!
//! A client proves its cloud identity to a remote verifier without handing
//! over credentials. The asserting side signs an identity-check request
//! locally and keeps only two header values from it ([`extract`]). The
//! verifying side rebuilds the same request, makes sure nothing in its own
//! pipeline can sign it, injects the two transferred values and lets the
//! identity provider decide ([`verify`]).
//!
//! # Collaborators
//!
//! The core never signs and never opens a connection itself. It drives two
//! capabilities:
//!
//! | Trait | Used by | Provides |
//! |-------|---------|----------|
//! | [`IdentityClient`] | [`extract`] | An unsent identity-check request whose pipeline signs it with local credentials |
//! | [`IdentityTransport`] | [`verify`] | The same request shape, plus delivery to the provider |
//!
//! # Failure modes
//!
//! Ordinary failures are [`SignatureCreationError`] and
//! [`IdentityVerificationError`]. A verifier pipeline that re-introduces a
//! local signature is not an ordinary failure: it goes through
//! [`integrity::halt`] and never comes back as a `Result`.

mod client;
mod error;
mod extract;
mod handler;
pub mod integrity;
mod request;
mod verify;

pub use client::{IdentityClient, IdentityTransport, TransportError};
pub use error::{IdentityVerificationError, SignatureCreationError, SigningFailure};
pub use extract::extract;
pub use handler::{content_length_handler, BoxError, HandlerError, HandlerList, NamedHandler};
pub use integrity::IntegrityViolation;
pub use request::{Headers, IdentityRequest};
pub use verify::verify;

pub use stsproof_types::{CallerIdentity, IdentityTuple};
