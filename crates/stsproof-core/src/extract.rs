//! Asserting side: sign locally, keep two headers, send nothing.

use crate::client::IdentityClient;
use crate::error::{SignatureCreationError, SigningFailure};
use stsproof_types::{transferred_headers, IdentityTuple, TupleField};

/// Signs an identity-check request locally and extracts its proof tuple.
///
/// The request is built by `client`, signed in place by its own pipeline,
/// and dropped once the `Authorization` and `X-Amz-Date` values have been
/// copied out. It is never transmitted. No other header of the signed
/// request leaves this function.
///
/// # Errors
///
/// Returns [`SignatureCreationError`] if a pipeline step fails (for example
/// when no local credentials are available) or if signing completes without
/// producing one of the two transferred headers.
pub fn extract<C>(client: &C) -> Result<IdentityTuple, SignatureCreationError>
where
    C: IdentityClient + ?Sized,
{
    let mut request = client.identity_request();
    tracing::debug!(pipeline = ?request.pipeline(), "signing identity-check request locally");

    request.sign().map_err(SigningFailure::from)?;

    let mut tuple = IdentityTuple::new(String::new(), String::new());
    for (name, field) in transferred_headers() {
        let value = request
            .headers()
            .get(name)
            .filter(|value| !value.is_empty())
            .ok_or(SigningFailure::MissingHeader(name))?;

        match field {
            TupleField::Authorization => tuple.authorization = value.to_owned(),
            TupleField::Date => tuple.date = value.to_owned(),
        }
    }

    tracing::debug!(date = %tuple.date, "extracted identity tuple");
    Ok(tuple)
}
