//! In-memory doubles shared by the session and notification tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::channel::mpsc;
use futures::StreamExt;

use kollabx_models::{
    Channel, ChangeEvent, ChannelId, Message, MessageId, Notification, NotificationId,
    NotificationKind, ProjectId, UserId,
};
use kollabx_sdk::SdkError;

use crate::backend::{
    ChatBackend, MessageEvents, NotificationBackend, NotificationEvents,
};
use crate::grouping::MessageGroup;
use crate::view::MessageListView;

pub fn message_in(
    channel: ChannelId,
    user: UserId,
    at: DateTime<Utc>,
    content: &str,
) -> Message {
    Message {
        id: MessageId::generate(),
        channel_id: channel,
        user_id: user,
        content: content.to_string(),
        created_at: at,
        author: None,
    }
}

pub fn notification_for(user: UserId, at: DateTime<Utc>, title: &str) -> Notification {
    Notification {
        id: NotificationId::generate(),
        user_id: user,
        kind: NotificationKind::ApplicationReceived,
        title: title.to_string(),
        body: String::new(),
        link: None,
        read: false,
        created_at: at,
    }
}

// ----------------------------------------------------------------------
// Recording view
// ----------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum ViewCall {
    ShowLoading,
    ShowError(String),
    ShowEmpty,
    Render(Vec<MessageGroup>),
    AppendGroup(MessageGroup),
    AppendToLastGroup(Message),
    UpdateMessage(Message),
    RemoveMessage(MessageId),
    ScrollToLatest,
}

/// Records every call the session makes, in order.
#[derive(Default)]
pub struct RecordingView {
    calls: Vec<ViewCall>,
}

impl RecordingView {
    pub fn calls(&self) -> &[ViewCall] {
        &self.calls
    }

    /// The groups passed to the most recent full render, if any.
    pub fn last_render(&self) -> Option<&[MessageGroup]> {
        self.calls.iter().rev().find_map(|c| match c {
            ViewCall::Render(groups) => Some(groups.as_slice()),
            _ => None,
        })
    }
}

impl MessageListView for RecordingView {
    fn show_loading(&mut self) {
        self.calls.push(ViewCall::ShowLoading);
    }

    fn show_error(&mut self, message: &str) {
        self.calls.push(ViewCall::ShowError(message.to_string()));
    }

    fn show_empty(&mut self) {
        self.calls.push(ViewCall::ShowEmpty);
    }

    fn render(&mut self, groups: &[MessageGroup]) {
        self.calls.push(ViewCall::Render(groups.to_vec()));
    }

    fn append_group(&mut self, group: &MessageGroup) {
        self.calls.push(ViewCall::AppendGroup(group.clone()));
    }

    fn append_to_last_group(&mut self, message: &Message) {
        self.calls.push(ViewCall::AppendToLastGroup(message.clone()));
    }

    fn update_message(&mut self, message: &Message) {
        self.calls.push(ViewCall::UpdateMessage(message.clone()));
    }

    fn remove_message(&mut self, id: MessageId) {
        self.calls.push(ViewCall::RemoveMessage(id));
    }

    fn scroll_to_latest(&mut self) {
        self.calls.push(ViewCall::ScrollToLatest);
    }
}

// ----------------------------------------------------------------------
// Fake chat backend
// ----------------------------------------------------------------------

#[derive(Default)]
struct FakeState {
    user: Option<UserId>,
    channels: Vec<Channel>,
    messages: Vec<Message>,
    sent: Vec<Message>,
    feeds: HashMap<ChannelId, mpsc::UnboundedSender<ChangeEvent<Message>>>,
    fail_history: bool,
}

/// In-memory [`ChatBackend`] with an injectable change feed.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().user = Some(UserId::generate());
        backend
    }

    pub fn add_channel(&self, project: ProjectId, name: &str) -> ChannelId {
        let channel = Channel {
            id: ChannelId::generate(),
            project_id: project,
            name: name.to_string(),
            description: None,
        };
        let id = channel.id;
        self.state.lock().unwrap().channels.push(channel);
        id
    }

    pub fn seed_message(&self, message: Message) {
        self.state.lock().unwrap().messages.push(message);
    }

    pub fn sent_messages(&self) -> Vec<Message> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn fail_history_once(&self) {
        self.state.lock().unwrap().fail_history = true;
    }

    pub fn feed_open(&self, channel: ChannelId) -> bool {
        self.state
            .lock()
            .unwrap()
            .feeds
            .get(&channel)
            .is_some_and(|s| !s.is_closed())
    }

    pub fn emit_insert(&self, message: Message) {
        self.emit(message.channel_id, ChangeEvent::insert(message));
    }

    pub fn emit_update(&self, message: Message) {
        self.emit(
            message.channel_id,
            ChangeEvent::update(message.clone(), message),
        );
    }

    pub fn emit_delete(&self, message: Message) {
        self.emit(message.channel_id, ChangeEvent::delete(message));
    }

    fn emit(&self, channel: ChannelId, event: ChangeEvent<Message>) {
        let state = self.state.lock().unwrap();
        if let Some(sender) = state.feeds.get(&channel) {
            let _ = sender.unbounded_send(event);
        }
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn project_channels(&self, project: ProjectId) -> Result<Vec<Channel>, SdkError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .channels
            .iter()
            .filter(|c| c.project_id == project)
            .cloned()
            .collect())
    }

    async fn ensure_general_channel(
        &self,
        project: ProjectId,
    ) -> Result<Vec<Channel>, SdkError> {
        let missing = self
            .project_channels(project)
            .await?
            .is_empty();
        if missing {
            self.add_channel(project, "general");
        }
        self.project_channels(project).await
    }

    async fn create_channel(
        &self,
        project: ProjectId,
        name: &str,
        description: Option<&str>,
    ) -> Result<Channel, SdkError> {
        let channel = Channel {
            id: ChannelId::generate(),
            project_id: project,
            name: name.to_string(),
            description: description.map(str::to_string),
        };
        self.state.lock().unwrap().channels.push(channel.clone());
        Ok(channel)
    }

    async fn message_history(&self, channel: ChannelId) -> Result<Vec<Message>, SdkError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_history {
            state.fail_history = false;
            return Err(SdkError::Backend {
                status: 500,
                message: "history unavailable".to_string(),
            });
        }
        let mut rows: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.channel_id == channel)
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.created_at);
        Ok(rows)
    }

    async fn send_message(
        &self,
        channel: ChannelId,
        content: &str,
    ) -> Result<Message, SdkError> {
        let message = {
            let mut state = self.state.lock().unwrap();
            let user = state.user.unwrap_or_else(UserId::generate);
            let message = message_in(channel, user, Utc::now(), content);
            state.messages.push(message.clone());
            state.sent.push(message.clone());
            message
        };
        // Every stored message echoes back over the feed, like the real
        // backend does.
        self.emit_insert(message.clone());
        Ok(message)
    }

    async fn edit_message(
        &self,
        message: MessageId,
        content: &str,
    ) -> Result<Message, SdkError> {
        let mut state = self.state.lock().unwrap();
        let slot = state
            .messages
            .iter_mut()
            .find(|m| m.id == message)
            .ok_or_else(|| SdkError::NotFound(format!("message {message}")))?;
        slot.content = content.to_string();
        Ok(slot.clone())
    }

    async fn delete_message(&self, message: MessageId) -> Result<(), SdkError> {
        self.state
            .lock()
            .unwrap()
            .messages
            .retain(|m| m.id != message);
        Ok(())
    }

    async fn subscribe_messages(
        &self,
        channel: ChannelId,
    ) -> Result<MessageEvents, SdkError> {
        let (sender, receiver) = mpsc::unbounded();
        self.state.lock().unwrap().feeds.insert(channel, sender);
        Ok(receiver.boxed())
    }
}

// ----------------------------------------------------------------------
// Fake notification backend
// ----------------------------------------------------------------------

#[derive(Default)]
struct NotifierState {
    rows: Vec<Notification>,
    feed: Option<mpsc::UnboundedSender<ChangeEvent<Notification>>>,
}

/// In-memory [`NotificationBackend`].
#[derive(Clone, Default)]
pub struct FakeNotifier {
    state: Arc<Mutex<NotifierState>>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, notification: Notification) {
        self.state.lock().unwrap().rows.push(notification);
    }

    pub fn emit(&self, notification: Notification) {
        self.state.lock().unwrap().rows.push(notification.clone());
        let state = self.state.lock().unwrap();
        if let Some(sender) = &state.feed {
            let _ = sender.unbounded_send(ChangeEvent::insert(notification));
        }
    }

    pub fn stored(&self) -> Vec<Notification> {
        self.state.lock().unwrap().rows.clone()
    }
}

#[async_trait]
impl NotificationBackend for FakeNotifier {
    async fn unread_count(&self) -> Result<usize, SdkError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .rows
            .iter()
            .filter(|n| !n.read)
            .count())
    }

    async fn recent_notifications(&self) -> Result<Vec<Notification>, SdkError> {
        let mut rows = self.state.lock().unwrap().rows.clone();
        rows.sort_by_key(|n| std::cmp::Reverse(n.created_at));
        rows.truncate(crate::notifications::FEED_LIMIT);
        Ok(rows)
    }

    async fn mark_read(&self, id: NotificationId) -> Result<(), SdkError> {
        let mut state = self.state.lock().unwrap();
        if let Some(row) = state.rows.iter_mut().find(|n| n.id == id) {
            row.read = true;
        }
        Ok(())
    }

    async fn mark_all_read(&self) -> Result<(), SdkError> {
        for row in &mut self.state.lock().unwrap().rows {
            row.read = true;
        }
        Ok(())
    }

    async fn subscribe_notifications(&self) -> Result<NotificationEvents, SdkError> {
        let (sender, receiver) = mpsc::unbounded();
        self.state.lock().unwrap().feed = Some(sender);
        Ok(receiver.boxed())
    }
}
