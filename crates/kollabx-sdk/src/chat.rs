//! Chat channels and messages.

use kollabx_models::{
    normalize_channel_name, Channel, ChannelId, Message, MessageId, ProjectId,
    MAX_CHANNELS_PER_PROJECT,
};

use crate::client::KollabClient;
use crate::error::SdkError;

/// How many messages a history fetch returns at most.
pub const HISTORY_LIMIT: usize = 100;

/// Reject a new channel before any remote mutation when the project is
/// already at the channel cap or the name is taken. `name` must already
/// be normalized.
fn ensure_channel_addable(existing: &[Channel], name: &str) -> Result<(), SdkError> {
    if existing.len() >= MAX_CHANNELS_PER_PROJECT {
        return Err(SdkError::Validation(format!(
            "a project can have at most {MAX_CHANNELS_PER_PROJECT} channels"
        )));
    }
    if existing.iter().any(|c| c.name == name) {
        return Err(SdkError::Validation(format!(
            "channel \"{name}\" already exists"
        )));
    }
    Ok(())
}

impl KollabClient {
    /// Channels of a project, ordered by creation so "general" comes
    /// first.
    pub async fn project_channels(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Channel>, SdkError> {
        self.get_rows(
            "channels",
            &[
                ("project_id", format!("eq.{project_id}")),
                ("order", "created_at.asc".to_string()),
            ],
        )
        .await
    }

    /// Ask the backend to create the project's "general" channel if it
    /// does not exist yet, returning the project's channels either way.
    ///
    /// Call this when a channel listing comes back empty before showing
    /// an empty state.
    pub async fn ensure_general_channel(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Channel>, SdkError> {
        let _: serde_json::Value = self
            .rpc(
                "ensure_general_channel",
                &serde_json::json!({ "project_id": project_id }),
            )
            .await?;
        self.project_channels(project_id).await
    }

    /// Create a custom channel on a project.
    ///
    /// The name is normalized (trimmed, lowercased, whitespace runs
    /// become hyphens). Only the project leader may create channels, and
    /// a project holds at most [`MAX_CHANNELS_PER_PROJECT`] of them.
    pub async fn create_channel(
        &self,
        project_id: ProjectId,
        name: &str,
        description: Option<&str>,
    ) -> Result<Channel, SdkError> {
        let project = self.get_project(project_id).await?;
        if !project.is_leader(self.user_id()) {
            return Err(SdkError::PermissionDenied(
                "only the project leader may create channels".into(),
            ));
        }

        let name = normalize_channel_name(name)?;

        let existing = self.project_channels(project_id).await?;
        ensure_channel_addable(&existing, &name)?;

        self.insert_returning(
            "channels",
            &serde_json::json!({
                "project_id": project_id,
                "name": name,
                "description": description,
            }),
        )
        .await
    }

    /// Fetch a channel's most recent messages in ascending creation
    /// order, each with its author's profile joined in.
    pub async fn message_history(
        &self,
        channel_id: ChannelId,
    ) -> Result<Vec<Message>, SdkError> {
        self.get_rows(
            "messages",
            &[
                ("channel_id", format!("eq.{channel_id}")),
                (
                    "select",
                    "*,author:profiles(full_name,avatar_url)".to_string(),
                ),
                ("order", "created_at.asc".to_string()),
                ("limit", HISTORY_LIMIT.to_string()),
            ],
        )
        .await
    }

    /// Send a message to a channel. Whitespace-only content is rejected;
    /// stored content is the trimmed text.
    pub async fn send_message(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<Message, SdkError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(kollabx_models::ModelError::EmptyMessageContent.into());
        }
        self.insert_returning(
            "messages",
            &serde_json::json!({
                "channel_id": channel_id,
                "content": content,
            }),
        )
        .await
    }

    /// Edit one of the signed-in user's own messages.
    pub async fn edit_message(
        &self,
        message_id: MessageId,
        content: &str,
    ) -> Result<Message, SdkError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(kollabx_models::ModelError::EmptyMessageContent.into());
        }
        let rows: Vec<Message> = self
            .update_returning(
                "messages",
                &[
                    ("id", format!("eq.{message_id}")),
                    ("user_id", format!("eq.{}", self.user_id())),
                ],
                &serde_json::json!({ "content": content }),
            )
            .await?;
        rows.into_iter().next().ok_or_else(|| {
            SdkError::PermissionDenied(format!("cannot edit message {message_id}"))
        })
    }

    /// Delete one of the signed-in user's own messages.
    pub async fn delete_message(&self, message_id: MessageId) -> Result<(), SdkError> {
        let deleted = self
            .delete_where(
                "messages",
                &[
                    ("id", format!("eq.{message_id}")),
                    ("user_id", format!("eq.{}", self.user_id())),
                ],
            )
            .await?;
        if deleted == 0 {
            return Err(SdkError::PermissionDenied(format!(
                "cannot delete message {message_id}"
            )));
        }
        Ok(())
    }
}
