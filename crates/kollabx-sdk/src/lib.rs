//! # KollabX SDK
//!
//! Typed client for the KollabX hosted backend.
//!
//! The SDK provides:
//!
//! * [`KollabClient`]: authenticated connection exposing the backend's
//!   query/mutation plane (REST) and realtime plane (NATS change feeds).
//! * [`RealtimeSubjects`]: canonical realtime subject definitions shared
//!   by clients and backend tooling alike.
//! * [`ChangeFeed`]: a typed, explicitly torn-down subscription to one
//!   row set's change events.
//! * [`SdkError`]: unified error type for all SDK operations.
//! * [`Session`]: portable credential struct (seed, JWT, access token,
//!   user id).
//!
//! Data-access methods are grouped per table family, mirroring the
//! backend's schema: [`projects`](KollabClient::create_project),
//! applications, teams, chat, notifications.
//!
//! # Quick start
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
//! let teams = client.user_teams().await?;
//! println!("member of {} team(s)", teams.len());
//! # Ok(())
//! # }
//! ```

pub mod applications;
pub mod chat;
pub mod client;
pub mod error;
pub mod notifications;
pub mod projects;
pub mod realtime;
pub mod session;
pub mod subjects;
pub mod teams;

pub use client::KollabClient;
pub use error::SdkError;
pub use projects::{NewProject, ProjectFilter, ProjectSort};
pub use realtime::ChangeFeed;
pub use session::Session;
pub use subjects::RealtimeSubjects;
