//! Mock STS endpoint for the integration tests.
//!
//! Runs an axum server on its own thread and validates SigV4 signatures
//! the way STS does for `GetCallerIdentity`: known access key, matching
//! credential scope, correct signature over the declared headers, and a
//! timestamp within 15 minutes of now.

#![allow(dead_code)]

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use stsproof_aws::sigv4::{parse_amz_date, signature, CanonicalRequest, SERVICE};
use stsproof_aws::{AuthorizationHeader, StsConfig};
use stsproof_types::{CallerIdentity, IDENTITY_CHECK_BODY};

pub const ACCOUNT: &str = "123456789012";
pub const REGION: &str = "us-east-1";
pub const MAX_SKEW_SECS: i64 = 15 * 60;

pub struct Principal {
    secret: String,
    identity: CallerIdentity,
}

#[derive(Default)]
pub struct MockSts {
    principals: HashMap<String, Principal>,
    pub requests: AtomicUsize,
}

type Rejection = (StatusCode, &'static str, String);

impl MockSts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_principal(mut self, access_key_id: &str, secret: &str, arn: &str) -> Self {
        self.principals.insert(
            access_key_id.to_string(),
            Principal {
                secret: secret.to_string(),
                identity: CallerIdentity {
                    account: ACCOUNT.to_string(),
                    arn: arn.to_string(),
                    user_id: format!("AIDA{access_key_id}"),
                },
            },
        );
        self
    }

    fn check(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: &str,
    ) -> Result<CallerIdentity, Rejection> {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

        if body != IDENTITY_CHECK_BODY {
            return Err((
                StatusCode::BAD_REQUEST,
                "InvalidAction",
                "Could not find operation".to_string(),
            ));
        }

        let raw = header("authorization").ok_or((
            StatusCode::FORBIDDEN,
            "MissingAuthenticationToken",
            "Request is missing Authentication Token".to_string(),
        ))?;
        let auth = AuthorizationHeader::parse(raw)
            .map_err(|e| (StatusCode::BAD_REQUEST, "IncompleteSignature", e.to_string()))?;

        let amz_date = header("x-amz-date").ok_or((
            StatusCode::BAD_REQUEST,
            "IncompleteSignature",
            "Authorization header requires existence of either a 'X-Amz-Date' or a 'Date' header"
                .to_string(),
        ))?;
        let stamped = parse_amz_date(amz_date)
            .map_err(|e| (StatusCode::BAD_REQUEST, "IncompleteSignature", e.to_string()))?;

        if auth.day != amz_date[..8] || auth.region != REGION || auth.service != SERVICE {
            return Err((
                StatusCode::FORBIDDEN,
                "SignatureDoesNotMatch",
                "Credential should be scoped to a valid region".to_string(),
            ));
        }

        let principal = self.principals.get(&auth.access_key_id).ok_or((
            StatusCode::FORBIDDEN,
            "InvalidClientTokenId",
            "The security token included in the request is invalid.".to_string(),
        ))?;

        if !auth.signed_headers.iter().any(|h| h == "host")
            || !auth.signed_headers.iter().any(|h| h == "x-amz-date")
        {
            return Err((
                StatusCode::BAD_REQUEST,
                "IncompleteSignature",
                "Signed headers must include host and x-amz-date".to_string(),
            ));
        }

        let mut covered = Vec::new();
        for name in &auth.signed_headers {
            let value = header(name.as_str()).ok_or((
                StatusCode::FORBIDDEN,
                "SignatureDoesNotMatch",
                format!("Signed header {name} is missing"),
            ))?;
            covered.push((name.clone(), value.to_string()));
        }

        let canonical = CanonicalRequest::new(
            method.as_str(),
            uri.path(),
            uri.query().unwrap_or_default(),
            covered,
            body.as_bytes(),
        );
        let expected = signature(&principal.secret, amz_date, REGION, SERVICE, &canonical);
        if expected != auth.signature {
            return Err((
                StatusCode::FORBIDDEN,
                "SignatureDoesNotMatch",
                "The request signature we calculated does not match the signature you provided."
                    .to_string(),
            ));
        }

        let skew = (Utc::now() - stamped).num_seconds().abs();
        if skew > MAX_SKEW_SECS {
            return Err((
                StatusCode::FORBIDDEN,
                "SignatureDoesNotMatch",
                format!("Signature expired: {amz_date} is now earlier than the allowed window"),
            ));
        }

        Ok(principal.identity.clone())
    }
}

async fn get_caller_identity(
    State(sts): State<Arc<MockSts>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<Value>) {
    sts.requests.fetch_add(1, Ordering::SeqCst);
    match sts.check(&method, &uri, &headers, &body) {
        Ok(identity) => (
            StatusCode::OK,
            Json(json!({
                "GetCallerIdentityResponse": {
                    "GetCallerIdentityResult": identity,
                    "ResponseMetadata": { "RequestId": "00000000-0000-0000-0000-000000000000" }
                }
            })),
        ),
        Err((status, code, message)) => (
            status,
            Json(json!({
                "Error": { "Code": code, "Message": message, "Type": "Sender" },
                "RequestId": "00000000-0000-0000-0000-000000000000"
            })),
        ),
    }
}

/// Starts `sts` on a background thread and returns its shared handle and address.
pub fn spawn(sts: MockSts) -> (Arc<MockSts>, SocketAddr) {
    let sts = Arc::new(sts);
    let state = sts.clone();
    let (tx, rx) = std::sync::mpsc::channel();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            let app = Router::new()
                .route("/", post(get_caller_identity))
                .with_state(state);
            axum::serve(listener, app).await.unwrap();
        });
    });

    (sts, rx.recv().unwrap())
}

pub fn config_for(addr: SocketAddr) -> StsConfig {
    StsConfig {
        endpoint: format!("http://{addr}/"),
        region: REGION.to_string(),
        timeout_secs: 5,
    }
}
