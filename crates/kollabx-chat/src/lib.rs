//! # KollabX chat state machines
//!
//! Headless, transport-agnostic state for the two realtime surfaces of a
//! KollabX client:
//!
//! * [`ChatSession`]: one project's chat: channel list, active channel,
//!   grouped message timeline, and the live change feed driving it.
//! * [`NotificationCenter`]: the signed-in user's notification feed and
//!   unread badge.
//!
//! Neither type draws anything. A UI plugs in by implementing
//! [`MessageListView`] (a rendering sink the session pushes updates into)
//! and by providing a [`ChatBackend`] / [`NotificationBackend`]
//! (implemented for [`kollabx_sdk::KollabClient`] out of the box). This
//! split keeps every ordering and dedup rule testable without a network
//! or a terminal.

pub mod backend;
pub mod error;
pub mod grouping;
pub mod notifications;
pub mod session;
pub mod view;

#[cfg(test)]
mod testutil;

pub use backend::{ChatBackend, MessageEvents, NotificationBackend, NotificationEvents};
pub use error::ChatError;
pub use grouping::{group_messages, MessageGroup, GROUP_WINDOW};
pub use notifications::NotificationCenter;
pub use session::{ChatSession, SendOutcome};
pub use view::MessageListView;
