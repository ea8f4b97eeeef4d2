//! Token minting.
//!
//! Two token families are issued at sign-in:
//!
//! * an HS256 **access token** for the REST plane, signed with the
//!   configured secret;
//! * a NATS **realtime JWT** (header `alg: ed25519-nkey`) signed with the
//!   backend's account key-pair, scoping the user to the message and
//!   notification subjects they may subscribe to.

use std::time::SystemTime;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use nkeys::KeyPair;
use serde::{Deserialize, Serialize};

use kollabx_models::UserId;
use kollabx_sdk::RealtimeSubjects;

use crate::error::ApiError;

// ---------------------------------------------------------------------------
// Access tokens (REST plane)
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct AccessClaims {
    sub: String,
    iat: u64,
    exp: u64,
}

/// Sign an HS256 access token for the given user.
pub fn mint_access_token(
    secret: &str,
    user: UserId,
    ttl_secs: u64,
) -> Result<String, ApiError> {
    let now = unix_now();
    let claims = AccessClaims {
        sub: user.to_string(),
        iat: now,
        exp: now + ttl_secs,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Unauthorized(e.to_string()))
}

/// Verify an access token and return the user it belongs to.
pub fn verify_access_token(secret: &str, token: &str) -> Result<UserId, ApiError> {
    let data = decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    data.claims
        .sub
        .parse()
        .map_err(|_| ApiError::Unauthorized("malformed subject claim".into()))
}

// ---------------------------------------------------------------------------
// NATS realtime JWT claim types
// ---------------------------------------------------------------------------

/// Top-level NATS JWT claims.
#[derive(Serialize)]
struct NatsUserClaims {
    jti: String,
    iat: u64,
    exp: u64,
    iss: String,
    name: String,
    sub: String,
    nats: NatsClaims,
}

/// The `nats` object embedded in the JWT body.
#[derive(Serialize)]
struct NatsClaims {
    permissions: NatsPermissions,
    #[serde(rename = "type")]
    claim_type: String,
    version: i32,
}

#[derive(Serialize)]
struct NatsPermissions {
    publish: NatsPermissionList,
    subscribe: NatsPermissionList,
}

#[derive(Serialize)]
struct NatsPermissionList {
    allow: Vec<String>,
}

/// Sign a NATS user JWT for the realtime plane.
///
/// Clients only consume change events, so the JWT grants:
/// - **subscribe** on the user's notification subject and on every
///   channel-message subject (channel membership is enforced at the
///   query plane);
/// - **publish** on nothing.
pub fn sign_realtime_jwt(
    account_kp: &KeyPair,
    user_nkey_public: &str,
    user: UserId,
    ttl_secs: u64,
) -> Result<String, ApiError> {
    let now = unix_now();

    let claims = NatsUserClaims {
        jti: uuid::Uuid::new_v4().to_string(),
        iat: now,
        exp: now + ttl_secs,
        iss: account_kp.public_key(),
        name: user.to_string(),
        sub: user_nkey_public.to_string(),
        nats: NatsClaims {
            claim_type: "user".to_string(),
            version: 2,
            permissions: NatsPermissions {
                publish: NatsPermissionList { allow: vec![] },
                subscribe: NatsPermissionList {
                    allow: vec![
                        RealtimeSubjects::user_notifications(user),
                        RealtimeSubjects::messages_wildcard(),
                    ],
                },
            },
        },
    };

    encode_and_sign(account_kp, &claims)
}

/// Encode claims as a NATS JWT: `base64url(header).base64url(body).base64url(sig)`.
fn encode_and_sign(kp: &KeyPair, claims: &NatsUserClaims) -> Result<String, ApiError> {
    let header = serde_json::json!({
        "typ": "JWT",
        "alg": "ed25519-nkey"
    });

    let encoded_header = URL_SAFE_NO_PAD.encode(serde_json::to_string(&header)?);
    let encoded_body = URL_SAFE_NO_PAD.encode(serde_json::to_string(claims)?);
    let signing_input = format!("{encoded_header}.{encoded_body}");

    let sig = kp
        .sign(signing_input.as_bytes())
        .map_err(|e| ApiError::NKey(e.to_string()))?;
    let encoded_sig = URL_SAFE_NO_PAD.encode(sig);

    Ok(format!("{signing_input}.{encoded_sig}"))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
