//! In-process signer and identity provider used by the core tests.
//!
//! The toy scheme mirrors the properties that matter for the protocol: the
//! signature covers method, body, timestamp and a declared list of headers,
//! and the provider checks it against a per-key secret and a time window.

#![allow(dead_code)]

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use stsproof_core::{
    content_length_handler, BoxError, CallerIdentity, IdentityClient, IdentityRequest,
    IdentityTransport, NamedHandler, TransportError,
};

pub const WINDOW_SECS: u64 = 900;
pub const TOY_SIGN: &str = "toy.sign";

/// Shared fake clock, in seconds.
#[derive(Clone, Default)]
pub struct Clock(Arc<AtomicU64>);

impl Clock {
    pub fn at(secs: u64) -> Self {
        Self(Arc::new(AtomicU64::new(secs)))
    }

    pub fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct Key {
    pub id: String,
    pub secret: String,
}

impl Key {
    pub fn new(id: &str, secret: &str) -> Self {
        Self {
            id: id.to_string(),
            secret: secret.to_string(),
        }
    }
}

fn signature(secret: &str, request: &IdentityRequest, date: &str, signed: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b"\n");
    hasher.update(request.method().as_bytes());
    hasher.update(b"\n");
    hasher.update(request.body().as_bytes());
    hasher.update(b"\n");
    hasher.update(date.as_bytes());
    for name in signed {
        let value = request.headers().get(name).unwrap_or_default();
        hasher.update(format!("\n{name}:{value}").as_bytes());
    }
    hex::encode(hasher.finalize())
}

const SIGNED: [&str; 4] = ["content-length", "content-type", "host", "x-amz-date"];

/// Pipeline step that signs with `key`, stamping the clock's time.
pub fn toy_sign_handler(name: &str, key: Key, clock: Clock) -> NamedHandler {
    NamedHandler::new(name, move |request: &mut IdentityRequest| {
        let date = clock.now().to_string();
        request.headers_mut().set("X-Amz-Date", date.clone());
        let sig = signature(&key.secret, request, &date, &SIGNED);
        request.headers_mut().set(
            "Authorization",
            format!(
                "TOY-SHA256 Credential={}, SignedHeaders={}, Signature={sig}",
                key.id,
                SIGNED.join(";")
            ),
        );
        Ok(())
    })
}

/// Identity provider that knows a fixed set of principals.
pub struct ToyProvider {
    principals: HashMap<String, (String, CallerIdentity)>,
    clock: Clock,
}

impl ToyProvider {
    pub fn new(clock: Clock) -> Self {
        Self {
            principals: HashMap::new(),
            clock,
        }
    }

    pub fn with_principal(mut self, key: &Key, arn: &str) -> Self {
        let identity = CallerIdentity {
            account: "123456789012".to_string(),
            arn: arn.to_string(),
            user_id: format!("AIDA{}", key.id),
        };
        self.principals
            .insert(key.id.clone(), (key.secret.clone(), identity));
        self
    }

    fn reject(code: &str, message: &str) -> TransportError {
        TransportError::Provider {
            status: 403,
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    pub fn check(&self, request: &IdentityRequest) -> Result<CallerIdentity, TransportError> {
        let auth = request
            .headers()
            .get("authorization")
            .ok_or_else(|| Self::reject("MissingAuthenticationToken", "no authorization"))?;
        let rest = auth
            .strip_prefix("TOY-SHA256 Credential=")
            .ok_or_else(|| Self::reject("IncompleteSignature", "bad algorithm"))?;
        let mut parts = rest.split(", ");
        let key_id = parts.next().unwrap_or_default();
        let signed = parts
            .next()
            .and_then(|p| p.strip_prefix("SignedHeaders="))
            .ok_or_else(|| Self::reject("IncompleteSignature", "no signed headers"))?;
        let provided = parts
            .next()
            .and_then(|p| p.strip_prefix("Signature="))
            .ok_or_else(|| Self::reject("IncompleteSignature", "no signature"))?;

        let (secret, identity) = self
            .principals
            .get(key_id)
            .ok_or_else(|| Self::reject("InvalidClientTokenId", "unknown key"))?;

        let date = request.headers().get("x-amz-date").unwrap_or_default();
        let signed: Vec<&str> = signed.split(';').collect();
        if signature(secret, request, date, &signed) != provided {
            return Err(Self::reject("SignatureDoesNotMatch", "signature mismatch"));
        }

        let stamped: u64 = date
            .parse()
            .map_err(|_| Self::reject("IncompleteSignature", "bad date"))?;
        if self.clock.now().abs_diff(stamped) > WINDOW_SECS {
            return Err(Self::reject("SignatureDoesNotMatch", "Signature expired"));
        }

        Ok(identity.clone())
    }
}

/// Client/transport double.
pub struct ToyClient {
    key: Option<Key>,
    clock: Clock,
    provider: Arc<ToyProvider>,
    build_signer: bool,
    extra_header: bool,
    pub sent: AtomicUsize,
}

impl ToyClient {
    pub fn new(key: Option<Key>, clock: Clock, provider: Arc<ToyProvider>) -> Self {
        Self {
            key,
            clock,
            provider,
            build_signer: false,
            extra_header: false,
            sent: AtomicUsize::new(0),
        }
    }

    /// Installs a signing step in the build phase, out of the verifier's reach.
    pub fn with_build_phase_signer(mut self) -> Self {
        self.build_signer = true;
        self
    }

    /// Adds an unrelated header to every signed request.
    pub fn with_extra_header(mut self) -> Self {
        self.extra_header = true;
        self
    }

    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

impl IdentityClient for ToyClient {
    fn identity_request(&self) -> IdentityRequest {
        let mut request = IdentityRequest::new("https://sts.toy.test/", "sts.toy.test");

        if self.extra_header {
            request
                .build_handlers_mut()
                .push_back_named(NamedHandler::new("toy.extra", |r: &mut IdentityRequest| {
                    r.headers_mut().set("X-Toy-Trace", "trace-1234");
                    Ok(())
                }));
        }

        request
            .sign_handlers_mut()
            .push_back_named(content_length_handler());

        match &self.key {
            Some(key) => {
                if self.build_signer {
                    request.build_handlers_mut().push_back_named(toy_sign_handler(
                        "toy.build-sign",
                        key.clone(),
                        self.clock.clone(),
                    ));
                }
                request.sign_handlers_mut().push_back_named(toy_sign_handler(
                    TOY_SIGN,
                    key.clone(),
                    self.clock.clone(),
                ));
            }
            None => request.sign_handlers_mut().push_back_named(NamedHandler::new(
                TOY_SIGN,
                |_: &mut IdentityRequest| -> Result<(), BoxError> {
                    Err("no valid credential sources found".into())
                },
            )),
        }

        request
    }
}

impl IdentityTransport for ToyClient {
    fn send(&self, mut request: IdentityRequest) -> Result<CallerIdentity, TransportError> {
        request.sign()?;
        self.sent.fetch_add(1, Ordering::SeqCst);
        self.provider.check(&request)
    }
}
