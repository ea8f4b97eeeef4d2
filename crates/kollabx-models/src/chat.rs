//! Chat channels and messages.
//!
//! A channel is a named sub-conversation scoped to one project. A project
//! has at most [`MAX_CHANNELS_PER_PROJECT`] channels: the default `general`
//! channel plus two the leader may create.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::ids::{ChannelId, MessageId, ProjectId, UserId};

/// Upper bound on channels per project (1 general + 2 custom).
pub const MAX_CHANNELS_PER_PROJECT: usize = 3;

/// Name of the channel every project is bootstrapped with.
pub const DEFAULT_CHANNEL_NAME: &str = "general";

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// A named sub-conversation belonging to exactly one project.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Channel {
    /// Channel id.
    pub id: ChannelId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Normalized channel name (see [`normalize_channel_name`]).
    pub name: String,
    /// Optional one-line description shown in the chat header.
    pub description: Option<String>,
}

/// Normalize a user-entered channel name.
///
/// Lower-cases the input and collapses every whitespace run into a single
/// hyphen, so `"Dev  Updates"` becomes `"dev-updates"`. Rejects names that
/// normalize to the empty string.
pub fn normalize_channel_name(raw: &str) -> Result<String, ModelError> {
    let normalized = raw
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");

    if normalized.is_empty() {
        return Err(ModelError::InvalidChannelName {
            value: raw.to_string(),
            reason: "normalizes to the empty string".to_string(),
        });
    }

    Ok(normalized)
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// The author fields joined onto a message for display.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MessageAuthor {
    /// Display name.
    pub full_name: Option<String>,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
}

impl MessageAuthor {
    /// Name to show next to the message, falling back to a generic label.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or("Unknown")
    }
}

/// A single chat message.
///
/// Mutable (content editable by its author) and deletable after creation.
/// Display ordering key: `created_at` ascending.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    /// Message id.
    pub id: MessageId,
    /// The channel the message belongs to.
    pub channel_id: ChannelId,
    /// The author's account id.
    pub user_id: UserId,
    /// Message body.
    pub content: String,
    /// Creation timestamp (UTC).
    pub created_at: DateTime<Utc>,
    /// Joined author profile, when the query asked for it.
    #[serde(default)]
    pub author: Option<MessageAuthor>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
