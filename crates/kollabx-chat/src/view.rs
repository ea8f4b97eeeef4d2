//! Rendering sink for a chat timeline.

use kollabx_models::{Message, MessageId};

use crate::grouping::MessageGroup;

/// What a [`ChatSession`](crate::ChatSession) pushes into a UI.
///
/// Implementations only draw; every ordering, grouping, and dedup rule
/// lives in the session. A test double that records calls is enough to
/// verify the session end to end.
pub trait MessageListView {
    /// Channel history is being fetched.
    fn show_loading(&mut self);

    /// A terminal failure; no retry follows.
    fn show_error(&mut self, message: &str);

    /// The channel has no messages.
    fn show_empty(&mut self);

    /// Replace the whole timeline.
    fn render(&mut self, groups: &[MessageGroup]);

    /// A new group was appended to the timeline.
    fn append_group(&mut self, group: &MessageGroup);

    /// A message was appended to the timeline's last group.
    fn append_to_last_group(&mut self, message: &Message);

    /// An existing message's content changed in place.
    fn update_message(&mut self, message: &Message);

    /// A message was removed. The session follows up with [`render`]
    /// when the removal collapses a group.
    ///
    /// [`render`]: MessageListView::render
    fn remove_message(&mut self, id: MessageId);

    /// Scroll so the newest message is visible.
    fn scroll_to_latest(&mut self);
}
