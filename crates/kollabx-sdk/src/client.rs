//! High-level client for the KollabX hosted backend.
//!
//! [`KollabClient`] handles authentication, connection, and typed access to
//! the backend's two planes on behalf of a single signed-in user:
//!
//! * the **query/mutation plane**: REST with PostgREST-style predicates
//!   (`?col=eq.v&order=col.asc&limit=n`);
//! * the **realtime plane**: NATS subjects carrying change events,
//!   consumed through [`ChangeFeed`].
//!
//! # Typical usage
//!
//! ```rust,no_run
//! use kollabx_sdk::KollabClient;
//!
//! # async fn run() -> Result<(), kollabx_sdk::SdkError> {
//! let client = KollabClient::sign_in(
//!     "http://localhost:3001",
//!     "nats://localhost:4222",
//!     "ada@example.com",
//!     "hunter2",
//! ).await?;
//!
//! println!("signed in as {}", client.user_id());
//! # Ok(())
//! # }
//! ```

use async_nats::ConnectOptions;
use nkeys::KeyPair;
use serde::de::DeserializeOwned;
use serde::Serialize;

use kollabx_models::{ChangeEvent, ChannelId, Message, Notification, Profile, UserId};

use crate::error::SdkError;
use crate::realtime::ChangeFeed;
use crate::session::Session;
use crate::subjects::RealtimeSubjects;

/// A connected, authenticated KollabX client.
///
/// Wraps the underlying HTTP and NATS connections and exposes typed
/// methods for every table family; data-access methods live in the
/// per-family modules (`projects`, `applications`, `teams`, `chat`,
/// `notifications`).
#[derive(Clone)]
pub struct KollabClient {
    http: reqwest::Client,
    nats_client: async_nats::Client,
    api_url: String,
    session: Session,
}

impl KollabClient {
    // ------------------------------------------------------------------
    // Connection
    // ------------------------------------------------------------------

    /// Create an account, then connect.
    ///
    /// 1. Generates an ephemeral NKey pair.
    /// 2. Exchanges the credentials + public key for a session at
    ///    `POST {api}/auth/v1/signup`.
    /// 3. Connects to NATS using JWT + NKey challenge.
    pub async fn sign_up(
        api_url: &str,
        nats_url: &str,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<Self, SdkError> {
        let session = Self::exchange(
            api_url,
            "/auth/v1/signup",
            serde_json::json!({
                "email": email,
                "password": password,
                "full_name": full_name,
            }),
        )
        .await?;
        Self::connect(api_url, nats_url, session).await
    }

    /// Authenticate with email + password, then connect.
    ///
    /// This is the recommended entry-point for most integrations.
    pub async fn sign_in(
        api_url: &str,
        nats_url: &str,
        email: &str,
        password: &str,
    ) -> Result<Self, SdkError> {
        let session = Self::exchange(
            api_url,
            "/auth/v1/token",
            serde_json::json!({
                "email": email,
                "password": password,
            }),
        )
        .await?;
        Self::connect(api_url, nats_url, session).await
    }

    /// Generate an ephemeral user key-pair and exchange credentials for a
    /// [`Session`] at the given auth endpoint.
    async fn exchange(
        api_url: &str,
        path: &str,
        mut body: serde_json::Value,
    ) -> Result<Session, SdkError> {
        let user_kp = KeyPair::new(nkeys::KeyPairType::User);
        let seed = user_kp
            .seed()
            .map_err(|e| SdkError::Config(e.to_string()))?;
        body["user_nkey_public"] = serde_json::Value::String(user_kp.public_key());

        let http = reqwest::Client::new();
        let res = http
            .post(format!("{api_url}{path}"))
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let text = res.text().await?;
            return Err(SdkError::Auth(text));
        }

        let body: serde_json::Value = res.json().await?;
        let access_token = body["access_token"]
            .as_str()
            .ok_or_else(|| SdkError::Auth("missing `access_token` in auth response".into()))?
            .to_string();
        let realtime_jwt = body["realtime_jwt"]
            .as_str()
            .ok_or_else(|| SdkError::Auth("missing `realtime_jwt` in auth response".into()))?
            .to_string();
        let user_id: UserId = body["user_id"]
            .as_str()
            .ok_or_else(|| SdkError::Auth("missing `user_id` in auth response".into()))?
            .parse()
            .map_err(|_| SdkError::Auth("malformed `user_id` in auth response".into()))?;

        Ok(Session {
            seed,
            realtime_jwt,
            access_token,
            user_id,
        })
    }

    /// Connect using a pre-existing session (e.g. restored from disk).
    ///
    /// Supports both TCP (`nats://`) and WebSocket (`ws://`, `wss://`)
    /// realtime URLs.
    pub async fn connect(
        api_url: &str,
        nats_url: &str,
        session: Session,
    ) -> Result<Self, SdkError> {
        // Sanity-check the seed
        let _ = KeyPair::from_seed(&session.seed)
            .map_err(|e| SdkError::Config(format!("invalid NKey seed: {e}")))?;

        let jwt = session.realtime_jwt.clone();
        let seed_for_sign = session.seed.clone();

        let options = ConnectOptions::with_jwt(jwt, move |nonce| {
            let seed = seed_for_sign.clone();
            async move {
                let kp = KeyPair::from_seed(&seed).map_err(async_nats::AuthError::new)?;
                kp.sign(&nonce).map_err(async_nats::AuthError::new)
            }
        });

        let nats_client = async_nats::connect_with_options(nats_url, options).await?;

        Ok(Self {
            http: reqwest::Client::new(),
            nats_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Invalidate the session and close the realtime connection.
    pub async fn sign_out(self) -> Result<(), SdkError> {
        let res = self
            .http
            .post(format!("{}/auth/v1/logout", self.api_url))
            .bearer_auth(&self.session.access_token)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let message = res.text().await?;
            return Err(SdkError::Backend { status, message });
        }

        self.nats_client
            .drain()
            .await
            .map_err(|e| SdkError::Nats(e.to_string()))?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Query/mutation plane (PostgREST-style)
    // ------------------------------------------------------------------

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.api_url)
    }

    async fn read_rows<T: DeserializeOwned>(
        &self,
        res: reqwest::Response,
    ) -> Result<T, SdkError> {
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let message = res.text().await?;
            return Err(SdkError::Backend { status, message });
        }
        Ok(res.json().await?)
    }

    /// Fetch all rows matching the given predicates.
    pub(crate) async fn get_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, SdkError> {
        let res = self
            .http
            .get(self.table_url(table))
            .bearer_auth(&self.session.access_token)
            .query(query)
            .send()
            .await?;
        self.read_rows(res).await
    }

    /// Fetch at most one row matching the given predicates.
    pub(crate) async fn get_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, SdkError> {
        let mut query: Vec<(&str, String)> = query.to_vec();
        query.push(("limit", "1".to_string()));
        let mut rows: Vec<T> = self.get_rows(table, &query).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// Insert one row and return it as stored by the backend.
    pub(crate) async fn insert_returning<T: DeserializeOwned, B: Serialize>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T, SdkError> {
        let res = self
            .http
            .post(self.table_url(table))
            .bearer_auth(&self.session.access_token)
            .json(body)
            .send()
            .await?;
        self.read_rows(res).await
    }

    /// Update all rows matching the predicates; returns the updated rows.
    pub(crate) async fn update_returning<T: DeserializeOwned, B: Serialize>(
        &self,
        table: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<Vec<T>, SdkError> {
        let res = self
            .http
            .patch(self.table_url(table))
            .bearer_auth(&self.session.access_token)
            .query(query)
            .json(body)
            .send()
            .await?;
        self.read_rows(res).await
    }

    /// Delete all rows matching the predicates; returns the deleted count.
    pub(crate) async fn delete_where(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<u64, SdkError> {
        let res = self
            .http
            .delete(self.table_url(table))
            .bearer_auth(&self.session.access_token)
            .query(query)
            .send()
            .await?;
        let body: serde_json::Value = self.read_rows(res).await?;
        Ok(body["deleted"].as_u64().unwrap_or(0))
    }

    /// Invoke a remote procedure.
    pub(crate) async fn rpc<T: DeserializeOwned, B: Serialize>(
        &self,
        function: &str,
        body: &B,
    ) -> Result<T, SdkError> {
        let res = self
            .http
            .post(format!("{}/rest/v1/rpc/{function}", self.api_url))
            .bearer_auth(&self.session.access_token)
            .json(body)
            .send()
            .await?;
        self.read_rows(res).await
    }

    // ------------------------------------------------------------------
    // Realtime plane
    // ------------------------------------------------------------------

    /// Subscribe to change events for one channel's messages.
    ///
    /// At most one such feed should be live per chat view; tear the
    /// previous one down before opening the next.
    pub async fn subscribe_channel_messages(
        &self,
        channel: ChannelId,
    ) -> Result<ChangeFeed<Message>, SdkError> {
        let subject = RealtimeSubjects::channel_messages(channel);
        let sub = self.nats_client.subscribe(subject.clone()).await?;
        Ok(ChangeFeed::new(sub, subject))
    }

    /// Subscribe to change events for the signed-in user's notifications.
    pub async fn subscribe_notifications(
        &self,
    ) -> Result<ChangeFeed<Notification>, SdkError> {
        let subject = RealtimeSubjects::user_notifications(self.session.user_id);
        let sub = self.nats_client.subscribe(subject.clone()).await?;
        Ok(ChangeFeed::new(sub, subject))
    }

    /// Publish a change event (backend tooling; clients normally only
    /// subscribe).
    pub async fn publish_change<T: Serialize>(
        &self,
        subject: &str,
        event: &ChangeEvent<T>,
    ) -> Result<(), SdkError> {
        let bytes = serde_json::to_vec(event)?;
        self.nats_client
            .publish(subject.to_string(), bytes.into())
            .await?;
        self.nats_client
            .flush()
            .await
            .map_err(|e| SdkError::Nats(e.to_string()))?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The signed-in user's id.
    pub fn user_id(&self) -> UserId {
        self.session.user_id
    }

    /// The underlying session credentials (e.g. for persisting to disk).
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fetch the signed-in user's profile row.
    pub async fn current_profile(&self) -> Result<Option<Profile>, SdkError> {
        self.get_one(
            "profiles",
            &[("id", format!("eq.{}", self.session.user_id))],
        )
        .await
    }

    /// Access the raw NATS client for advanced operations.
    pub fn nats_client(&self) -> &async_nats::Client {
        &self.nats_client
    }
}
