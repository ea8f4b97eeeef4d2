//! Authentication credentials returned by the KollabX auth endpoints.

use kollabx_models::UserId;

/// Credentials obtained after a successful sign-in or sign-up.
///
/// The REST plane authenticates with `access_token`; the realtime plane
/// authenticates the NATS connection via NKey challenge using `seed` and
/// `realtime_jwt`.
///
/// * `seed`          – NKey seed (private key) used to sign the server challenge.
/// * `realtime_jwt`  – JWT that authorises the NATS connection.
/// * `access_token`  – bearer token for the REST plane.
/// * `user_id`       – the authenticated account.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Session {
    /// NKey seed for NATS authentication.
    pub seed: String,
    /// JWT that encodes NATS permissions.
    pub realtime_jwt: String,
    /// Bearer token for REST calls.
    pub access_token: String,
    /// The authenticated user.
    pub user_id: UserId,
}
