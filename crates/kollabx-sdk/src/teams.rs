//! Team membership queries and removal.

use kollabx_models::{Notification, ProjectId, TeamMember, TeamMembership, UserId};

use crate::client::KollabClient;
use crate::error::SdkError;

impl KollabClient {
    /// Members of a project with their profiles joined in, ordered by
    /// join time.
    pub async fn team_members(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<TeamMember>, SdkError> {
        self.get_rows(
            "team_members",
            &[
                ("project_id", format!("eq.{project_id}")),
                ("select", "*,profile:profiles(*)".to_string()),
                ("order", "joined_at.asc".to_string()),
            ],
        )
        .await
    }

    /// Projects the signed-in user belongs to (as member or leader),
    /// with each project row joined in.
    pub async fn user_teams(&self) -> Result<Vec<TeamMembership>, SdkError> {
        self.get_rows(
            "team_members",
            &[
                ("user_id", format!("eq.{}", self.user_id())),
                ("select", "*,project:projects(*)".to_string()),
                ("order", "joined_at.desc".to_string()),
            ],
        )
        .await
    }

    /// Whether `user` is on the team of `project_id`.
    pub async fn is_team_member(
        &self,
        project_id: ProjectId,
        user: UserId,
    ) -> Result<bool, SdkError> {
        let row: Option<serde_json::Value> = self
            .get_one(
                "team_members",
                &[
                    ("project_id", format!("eq.{project_id}")),
                    ("user_id", format!("eq.{user}")),
                    ("select", "user_id".to_string()),
                ],
            )
            .await?;
        Ok(row.is_some())
    }

    /// Remove a member from a project's team. Only the leader may do
    /// this, and the leader cannot remove themselves.
    pub async fn remove_team_member(
        &self,
        project_id: ProjectId,
        user: UserId,
    ) -> Result<(), SdkError> {
        let project = self.get_project(project_id).await?;
        if !project.is_leader(self.user_id()) {
            return Err(SdkError::PermissionDenied(
                "only the project leader may remove members".into(),
            ));
        }
        if user == self.user_id() {
            return Err(SdkError::Validation(
                "the project leader cannot be removed".into(),
            ));
        }

        self.delete_membership(project_id, user).await?;

        let notify: Result<Notification, SdkError> = self
            .insert_returning(
                "notifications",
                &serde_json::json!({
                    "user_id": user,
                    "kind": "team_member_removed",
                    "title": "Removed from team",
                    "body": format!("You were removed from \"{}\"", project.title),
                    "link": serde_json::Value::Null,
                }),
            )
            .await;
        if let Err(e) = notify {
            tracing::warn!("failed to notify removed member: {e}");
        }
        Ok(())
    }

    /// Leave a project's team. The leader cannot leave their own project.
    pub async fn leave_team(&self, project_id: ProjectId) -> Result<(), SdkError> {
        let project = self.get_project(project_id).await?;
        if project.is_leader(self.user_id()) {
            return Err(SdkError::Validation(
                "the project leader cannot leave their own project".into(),
            ));
        }

        self.delete_membership(project_id, self.user_id()).await?;

        let notify: Result<Notification, SdkError> = self
            .insert_returning(
                "notifications",
                &serde_json::json!({
                    "user_id": project.creator_id,
                    "kind": "team_member_left",
                    "title": "Team member left",
                    "body": format!("A member left \"{}\"", project.title),
                    "link": format!("/projects/{project_id}/team"),
                }),
            )
            .await;
        if let Err(e) = notify {
            tracing::warn!("failed to notify project leader: {e}");
        }
        Ok(())
    }

    async fn delete_membership(
        &self,
        project_id: ProjectId,
        user: UserId,
    ) -> Result<(), SdkError> {
        let deleted = self
            .delete_where(
                "team_members",
                &[
                    ("project_id", format!("eq.{project_id}")),
                    ("user_id", format!("eq.{user}")),
                ],
            )
            .await?;
        if deleted == 0 {
            return Err(SdkError::NotFound(format!(
                "no membership for {user} in {project_id}"
            )));
        }

        // Keep the cached member count in step. Best-effort; the backend
        // recomputes it on read when this races.
        let project = self.get_project(project_id).await?;
        let _: Vec<serde_json::Value> = self
            .update_returning(
                "projects",
                &[("id", format!("eq.{project_id}"))],
                &serde_json::json!({
                    "current_members": project.current_members.saturating_sub(1)
                }),
            )
            .await?;
        Ok(())
    }
}
