//! Backend seams for the chat and notification state machines.
//!
//! [`kollabx_sdk::KollabClient`] implements both traits; tests supply
//! in-memory fakes instead.

use async_trait::async_trait;
use futures::stream::BoxStream;

use kollabx_models::{
    Channel, ChangeEvent, ChannelId, Message, MessageId, Notification, NotificationId,
    ProjectId,
};
use kollabx_sdk::{KollabClient, SdkError};

/// Live change events for one channel's messages. Dropping the stream
/// tears the subscription down.
pub type MessageEvents = BoxStream<'static, ChangeEvent<Message>>;

/// Live change events for one user's notifications.
pub type NotificationEvents = BoxStream<'static, ChangeEvent<Notification>>;

/// Everything a [`ChatSession`](crate::ChatSession) needs from the
/// outside world.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn project_channels(&self, project: ProjectId) -> Result<Vec<Channel>, SdkError>;

    async fn ensure_general_channel(
        &self,
        project: ProjectId,
    ) -> Result<Vec<Channel>, SdkError>;

    async fn create_channel(
        &self,
        project: ProjectId,
        name: &str,
        description: Option<&str>,
    ) -> Result<Channel, SdkError>;

    async fn message_history(&self, channel: ChannelId) -> Result<Vec<Message>, SdkError>;

    async fn send_message(
        &self,
        channel: ChannelId,
        content: &str,
    ) -> Result<Message, SdkError>;

    async fn edit_message(
        &self,
        message: MessageId,
        content: &str,
    ) -> Result<Message, SdkError>;

    async fn delete_message(&self, message: MessageId) -> Result<(), SdkError>;

    async fn subscribe_messages(
        &self,
        channel: ChannelId,
    ) -> Result<MessageEvents, SdkError>;
}

/// Everything a [`NotificationCenter`](crate::NotificationCenter) needs
/// from the outside world.
#[async_trait]
pub trait NotificationBackend: Send + Sync {
    async fn unread_count(&self) -> Result<usize, SdkError>;

    async fn recent_notifications(&self) -> Result<Vec<Notification>, SdkError>;

    async fn mark_read(&self, id: NotificationId) -> Result<(), SdkError>;

    async fn mark_all_read(&self) -> Result<(), SdkError>;

    async fn subscribe_notifications(&self) -> Result<NotificationEvents, SdkError>;
}

#[async_trait]
impl ChatBackend for KollabClient {
    async fn project_channels(&self, project: ProjectId) -> Result<Vec<Channel>, SdkError> {
        KollabClient::project_channels(self, project).await
    }

    async fn ensure_general_channel(
        &self,
        project: ProjectId,
    ) -> Result<Vec<Channel>, SdkError> {
        KollabClient::ensure_general_channel(self, project).await
    }

    async fn create_channel(
        &self,
        project: ProjectId,
        name: &str,
        description: Option<&str>,
    ) -> Result<Channel, SdkError> {
        KollabClient::create_channel(self, project, name, description).await
    }

    async fn message_history(&self, channel: ChannelId) -> Result<Vec<Message>, SdkError> {
        KollabClient::message_history(self, channel).await
    }

    async fn send_message(
        &self,
        channel: ChannelId,
        content: &str,
    ) -> Result<Message, SdkError> {
        KollabClient::send_message(self, channel, content).await
    }

    async fn edit_message(
        &self,
        message: MessageId,
        content: &str,
    ) -> Result<Message, SdkError> {
        KollabClient::edit_message(self, message, content).await
    }

    async fn delete_message(&self, message: MessageId) -> Result<(), SdkError> {
        KollabClient::delete_message(self, message).await
    }

    async fn subscribe_messages(
        &self,
        channel: ChannelId,
    ) -> Result<MessageEvents, SdkError> {
        let feed = self.subscribe_channel_messages(channel).await?;
        Ok(feed.into_stream())
    }
}

#[async_trait]
impl NotificationBackend for KollabClient {
    async fn unread_count(&self) -> Result<usize, SdkError> {
        KollabClient::unread_count(self).await
    }

    async fn recent_notifications(&self) -> Result<Vec<Notification>, SdkError> {
        KollabClient::recent_notifications(self).await
    }

    async fn mark_read(&self, id: NotificationId) -> Result<(), SdkError> {
        self.mark_notification_read(id).await
    }

    async fn mark_all_read(&self) -> Result<(), SdkError> {
        self.mark_all_notifications_read().await
    }

    async fn subscribe_notifications(&self) -> Result<NotificationEvents, SdkError> {
        let feed = KollabClient::subscribe_notifications(self).await?;
        Ok(feed.into_stream())
    }
}
