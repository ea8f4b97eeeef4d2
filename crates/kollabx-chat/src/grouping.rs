//! Message grouping rules.
//!
//! A timeline renders consecutive messages from the same author as one
//! group with a single header, as long as each message lands within
//! [`GROUP_WINDOW`] of the previous one. A different author or a gap of
//! the full window or more starts a new group.

use chrono::Duration;

use kollabx_models::{Message, MessageAuthor, UserId};

/// Gap at which consecutive messages stop sharing a group.
pub const GROUP_WINDOW: Duration = Duration::minutes(5);

/// A run of consecutive messages by one author.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageGroup {
    /// Author shared by every message in the group.
    pub author_id: UserId,
    /// Author profile snapshot, when the backend joined one in.
    pub author: Option<MessageAuthor>,
    /// Messages in ascending creation order. Never empty.
    pub messages: Vec<Message>,
}

impl MessageGroup {
    fn start(message: Message) -> Self {
        Self {
            author_id: message.user_id,
            author: message.author.clone(),
            messages: vec![message],
        }
    }

    /// Display name for the group header.
    #[must_use]
    pub fn author_name(&self) -> &str {
        self.author
            .as_ref()
            .map_or("Unknown", MessageAuthor::display_name)
    }
}

/// Whether `next` belongs to the group ending in `last`.
#[must_use]
pub fn continues_group(last: &Message, next: &Message) -> bool {
    next.user_id == last.user_id && next.created_at - last.created_at < GROUP_WINDOW
}

/// Partition an ascending message list into groups.
#[must_use]
pub fn group_messages(messages: &[Message]) -> Vec<MessageGroup> {
    let mut groups: Vec<MessageGroup> = Vec::new();
    for message in messages {
        match groups.last_mut() {
            Some(group)
                if group
                    .messages
                    .last()
                    .is_some_and(|last| continues_group(last, message)) =>
            {
                if group.author.is_none() {
                    group.author = message.author.clone();
                }
                group.messages.push(message.clone());
            }
            _ => groups.push(MessageGroup::start(message.clone())),
        }
    }
    groups
}
