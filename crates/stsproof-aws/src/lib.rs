//! AWS collaborators for the stsproof protocol.
//!
//! The core crate only knows two capabilities: something that builds a
//! self-signing identity-check request, and something that sends one. This
//! crate provides both for AWS STS:
//!
//! - [`Credentials`] loads a static access key pair from the environment.
//! - [`sigv4`] signs the identity-check request with Signature Version 4.
//! - [`StsClient`] builds requests against a configured endpoint and sends
//!   them over blocking HTTP, decoding the `GetCallerIdentity` JSON response.
//!
//! ```rust,ignore
//! use stsproof_aws::{Credentials, StsClient, StsConfig};
//!
//! let config = StsConfig::default();
//!
//! // Asserting side.
//! let caller = StsClient::new(&config, Some(Credentials::from_env()?))?;
//! let tuple = stsproof_core::extract(&caller)?;
//!
//! // Verifying side, possibly in another process.
//! let verifier = StsClient::new(&config, None)?;
//! let identity = stsproof_core::verify(&verifier, &tuple)?;
//! ```

mod client;
mod config;
mod credentials;
pub mod sigv4;

pub use client::{ClientError, StsClient, ACCEPT_JSON_HANDLER};
pub use config::{StsConfig, DEFAULT_ENDPOINT, DEFAULT_REGION};
pub use credentials::{Credentials, CredentialsError};
pub use sigv4::{AuthorizationHeader, SigV4Signer};
