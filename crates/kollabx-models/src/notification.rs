//! User notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::ids::{NotificationId, UserId};

/// What triggered a notification.
///
/// Stored as snake_case text in the backend.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    /// Someone applied to a project the user leads.
    ApplicationReceived,
    /// The user's application was accepted.
    ApplicationAccepted,
    /// The user's application was rejected.
    ApplicationRejected,
    /// A member left a project the user leads.
    TeamMemberLeft,
    /// The user was removed from a team.
    TeamMemberRemoved,
}

/// A notification row for one user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Notification {
    /// Notification id.
    pub id: NotificationId,
    /// The user the notification belongs to.
    pub user_id: UserId,
    /// What triggered it.
    pub kind: NotificationKind,
    /// Short headline.
    pub title: String,
    /// Longer body text.
    pub body: String,
    /// In-app destination to open when clicked.
    pub link: Option<String>,
    /// Whether the user has seen it.
    pub read: bool,
    /// Creation timestamp (UTC).
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&NotificationKind::TeamMemberLeft).unwrap(),
            "\"team_member_left\""
        );
        assert_eq!(
            "application_accepted".parse::<NotificationKind>().unwrap(),
            NotificationKind::ApplicationAccepted
        );
    }

    #[test]
    fn notification_serde_roundtrip() {
        let n = Notification {
            id: NotificationId::new(Uuid::new_v4()),
            user_id: UserId::new(Uuid::new_v4()),
            kind: NotificationKind::ApplicationReceived,
            title: "New Application".into(),
            body: "Someone applied to your project.".into(),
            link: Some("/dashboard?tab=applications".into()),
            read: false,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&n).unwrap();
        let back: Notification = serde_json::from_str(&json).unwrap();
        assert_eq!(n, back);
    }
}
