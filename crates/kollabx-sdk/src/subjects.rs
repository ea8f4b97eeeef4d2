//! Canonical realtime subject definitions for the KollabX backend.
//!
//! All NATS subject strings used by the realtime plane **must** be built
//! through [`RealtimeSubjects`]. This ensures that clients, the backend,
//! and tooling agree on a single naming convention and makes future
//! versioning explicit.
//!
//! # Subject layout
//!
//! ```text
//! kollabx.v1.messages.channel.{channel_id}    ← change events for one channel's messages
//! kollabx.v1.notifications.user.{user_id}     ← change events for one user's notifications
//! kollabx.v1.messages.channel.>               ← tooling wildcard (all channels)
//! kollabx.v1.notifications.user.>             ← tooling wildcard (all users)
//! ```

use kollabx_models::{ChannelId, UserId};

/// Current subject version prefix.
const VERSION: &str = "v1";

/// Central authority for all realtime subject names.
///
/// Every subject produced by KollabX flows through this struct so that
/// the naming convention is defined in exactly one place.
///
/// # Examples
///
/// ```
/// use kollabx_models::ChannelId;
/// use kollabx_sdk::RealtimeSubjects;
/// use uuid::Uuid;
///
/// let channel = ChannelId::new(Uuid::nil());
/// assert_eq!(
///     RealtimeSubjects::channel_messages(channel),
///     "kollabx.v1.messages.channel.00000000-0000-0000-0000-000000000000",
/// );
/// ```
pub struct RealtimeSubjects;

impl RealtimeSubjects {
    // ------------------------------------------------------------------
    // Per-row-set subjects
    // ------------------------------------------------------------------

    /// Subject carrying change events for one channel's messages.
    ///
    /// A chat client subscribes here after selecting a channel; the
    /// backend publishes one event per insert/update/delete.
    pub fn channel_messages(channel: ChannelId) -> String {
        format!("kollabx.{VERSION}.messages.channel.{channel}")
    }

    /// Subject carrying change events for one user's notifications.
    pub fn user_notifications(user: UserId) -> String {
        format!("kollabx.{VERSION}.notifications.user.{user}")
    }

    // ------------------------------------------------------------------
    // Wildcards
    // ------------------------------------------------------------------

    /// Wildcard matching **all** message change events.
    ///
    /// Intended for backend tooling and monitoring, not for clients.
    pub fn messages_wildcard() -> String {
        format!("kollabx.{VERSION}.messages.channel.>")
    }

    /// Wildcard matching **all** notification change events.
    pub fn notifications_wildcard() -> String {
        format!("kollabx.{VERSION}.notifications.user.>")
    }

    // ------------------------------------------------------------------
    // Parsing helpers
    // ------------------------------------------------------------------

    /// Extract the channel id from a message subject.
    ///
    /// Given `"kollabx.v1.messages.channel.<uuid>"` returns the channel id.
    /// Returns `None` if the subject does not match the expected pattern.
    pub fn parse_channel(subject: &str) -> Option<ChannelId> {
        let parts: Vec<&str> = subject.splitn(5, '.').collect();
        if parts.len() == 5
            && parts[0] == "kollabx"
            && parts[2] == "messages"
            && parts[3] == "channel"
        {
            parts[4].parse().ok()
        } else {
            None
        }
    }

    /// Extract the user id from a notification subject.
    pub fn parse_user(subject: &str) -> Option<UserId> {
        let parts: Vec<&str> = subject.splitn(5, '.').collect();
        if parts.len() == 5
            && parts[0] == "kollabx"
            && parts[2] == "notifications"
            && parts[3] == "user"
        {
            parts[4].parse().ok()
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
