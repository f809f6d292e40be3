//! Verifying side: rebuild, prove nothing signs locally, inject, send.

use crate::client::{IdentityTransport, TransportError};
use crate::error::IdentityVerificationError;
use crate::handler::content_length_handler;
use crate::integrity::{self, IntegrityViolation};
use stsproof_types::{injected_headers, CallerIdentity, HeaderSource, IdentityTuple, AUTHORIZATION};

/// Asks the identity provider who signed `tuple`.
///
/// The request is rebuilt by `transport`, its sign phase is replaced by the
/// content-length step alone, and the pipeline is driven once to prove it
/// leaves `Authorization` empty. Only then are the transferred values and the
/// fixed content type injected and the request sent.
///
/// # Errors
///
/// Returns [`IdentityVerificationError`] when the provider rejects the
/// request (bad or tampered signature, expired date, malformed tuple) or the
/// request cannot be delivered.
///
/// # Panics
///
/// Halts through [`integrity::halt`] if the pipeline produces an
/// `Authorization` header on its own. The request is not sent in that case.
pub fn verify<T>(
    transport: &T,
    tuple: &IdentityTuple,
) -> Result<CallerIdentity, IdentityVerificationError>
where
    T: IdentityTransport + ?Sized,
{
    let mut request = transport.identity_request();

    let sign = request.sign_handlers_mut();
    sign.clear();
    sign.push_front_named(content_length_handler());

    request.sign().map_err(TransportError::from)?;

    if request
        .headers()
        .get(AUTHORIZATION)
        .is_some_and(|value| !value.is_empty())
    {
        integrity::halt(IntegrityViolation::new(request.pipeline()));
    }

    for rule in injected_headers() {
        let value = match rule.source {
            HeaderSource::Tuple(field) => tuple.field(field),
            HeaderSource::Fixed(value) => value,
            HeaderSource::Computed => continue,
        };
        request.headers_mut().set(rule.name, value);
    }

    match transport.send(request) {
        Ok(identity) => {
            tracing::info!(
                account = %identity.account,
                arn = %identity.arn,
                "verified caller identity"
            );
            Ok(identity)
        }
        Err(e) => {
            tracing::warn!(error = %e, "identity provider did not confirm tuple");
            Err(e.into())
        }
    }
}
