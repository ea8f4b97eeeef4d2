#![deny(missing_docs)]

//! # KollabX Models
//!
//! Core data types for the KollabX project-collaboration platform.
//!
//! These mirror the hosted backend's schema one-to-one: every struct here
//! round-trips through the same JSON the backend stores and pushes over the
//! realtime bus.
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`ids`] | Typed UUID identifiers (`UserId`, `ChannelId`, …) |
//! | [`profile`] | User display profiles |
//! | [`project`] | Projects, applications, team membership |
//! | [`chat`] | Channels, messages, channel-name rules |
//! | [`notification`] | Notifications and their kinds |
//! | [`event`] | Realtime change-event payloads |

pub mod chat;
pub mod error;
pub mod event;
pub mod ids;
pub mod notification;
pub mod profile;
pub mod project;

// Re-export all public types at crate root for convenience.
// Downstream crates can use `kollabx_models::ChannelId` directly.
pub use chat::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use notification::*;
pub use profile::*;
pub use project::*;
