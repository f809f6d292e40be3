//! Static AWS credentials read from the environment.

use std::fmt;
use thiserror::Error;

/// Environment variable holding the access key id.
pub const ACCESS_KEY_ID_ENV: &str = "AWS_ACCESS_KEY_ID";
/// Environment variable holding the secret access key.
pub const SECRET_ACCESS_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";
/// Environment variable holding a session token.
pub const SESSION_TOKEN_ENV: &str = "AWS_SESSION_TOKEN";

/// Errors that can occur when loading credentials.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialsError {
    /// A required variable is unset or empty.
    #[error("no valid credential sources found: `{0}` is not set")]
    Missing(&'static str),

    /// Temporary credentials need a signed `X-Amz-Security-Token` header,
    /// which the identity tuple does not carry.
    #[error("`AWS_SESSION_TOKEN` is set; temporary credentials cannot be asserted with an identity tuple")]
    SessionTokenUnsupported,
}

/// A long-lived access key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
}

impl Credentials {
    /// Creates credentials from an access key pair.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    /// The access key id.
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// The secret access key.
    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    /// Loads credentials from `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError::Missing`] if either variable is unset or
    /// empty, and [`CredentialsError::SessionTokenUnsupported`] if
    /// `AWS_SESSION_TOKEN` is set.
    pub fn from_env() -> Result<Self, CredentialsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads credentials through `lookup`, which maps a variable name to its value.
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Same as [`Credentials::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CredentialsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if get(SESSION_TOKEN_ENV).is_some() {
            return Err(CredentialsError::SessionTokenUnsupported);
        }

        let access_key_id = get(ACCESS_KEY_ID_ENV).ok_or(CredentialsError::Missing(ACCESS_KEY_ID_ENV))?;
        let secret_access_key =
            get(SECRET_ACCESS_KEY_ENV).ok_or(CredentialsError::Missing(SECRET_ACCESS_KEY_ENV))?;

        Ok(Self::new(access_key_id, secret_access_key))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}
