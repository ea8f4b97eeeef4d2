//! Notification feed queries.

use kollabx_models::{Notification, NotificationId};

use crate::client::KollabClient;
use crate::error::SdkError;

/// How many notifications the dropdown feed shows at most.
pub const FEED_LIMIT: usize = 50;

impl KollabClient {
    /// Count of the signed-in user's unread notifications.
    pub async fn unread_count(&self) -> Result<usize, SdkError> {
        let rows: Vec<serde_json::Value> = self
            .get_rows(
                "notifications",
                &[
                    ("user_id", format!("eq.{}", self.user_id())),
                    ("read", "eq.false".to_string()),
                    ("select", "id".to_string()),
                ],
            )
            .await?;
        Ok(rows.len())
    }

    /// The signed-in user's most recent notifications, newest first.
    pub async fn recent_notifications(&self) -> Result<Vec<Notification>, SdkError> {
        self.get_rows(
            "notifications",
            &[
                ("user_id", format!("eq.{}", self.user_id())),
                ("order", "created_at.desc".to_string()),
                ("limit", FEED_LIMIT.to_string()),
            ],
        )
        .await
    }

    /// Mark a single notification read.
    pub async fn mark_notification_read(
        &self,
        id: NotificationId,
    ) -> Result<(), SdkError> {
        let _: Vec<Notification> = self
            .update_returning(
                "notifications",
                &[
                    ("id", format!("eq.{id}")),
                    ("user_id", format!("eq.{}", self.user_id())),
                ],
                &serde_json::json!({ "read": true }),
            )
            .await?;
        Ok(())
    }

    /// Mark every unread notification of the signed-in user read.
    pub async fn mark_all_notifications_read(&self) -> Result<(), SdkError> {
        let _: Vec<Notification> = self
            .update_returning(
                "notifications",
                &[
                    ("user_id", format!("eq.{}", self.user_id())),
                    ("read", "eq.false".to_string()),
                ],
                &serde_json::json!({ "read": true }),
            )
            .await?;
        Ok(())
    }
}
