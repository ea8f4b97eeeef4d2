//! Team applications: apply to a project, review, accept, reject.

use kollabx_models::{
    Application, ApplicationId, ApplicationStatus, Notification, ProjectId, ProjectStatus,
};

use crate::client::KollabClient;
use crate::error::SdkError;

impl KollabClient {
    /// Apply to join a project.
    ///
    /// Rejected locally when the project is closed or full, when the
    /// applicant is the project leader, or when a pending application
    /// already exists.
    pub async fn apply_to_project(
        &self,
        project_id: ProjectId,
        message: &str,
        role: Option<&str>,
    ) -> Result<Application, SdkError> {
        let project = self.get_project(project_id).await?;
        if project.is_leader(self.user_id()) {
            return Err(SdkError::Validation(
                "cannot apply to your own project".into(),
            ));
        }
        if project.status == ProjectStatus::Closed {
            return Err(SdkError::Validation("project is closed".into()));
        }
        if project.is_full() {
            return Err(SdkError::Validation("project team is full".into()));
        }
        if self.is_team_member(project_id, self.user_id()).await? {
            return Err(SdkError::Validation("already a team member".into()));
        }
        let existing: Option<Application> = self
            .get_one(
                "applications",
                &[
                    ("project_id", format!("eq.{project_id}")),
                    ("applicant_id", format!("eq.{}", self.user_id())),
                    ("status", "eq.pending".to_string()),
                ],
            )
            .await?;
        if existing.is_some() {
            return Err(SdkError::Validation(
                "a pending application already exists".into(),
            ));
        }

        let application: Application = self
            .insert_returning(
                "applications",
                &serde_json::json!({
                    "project_id": project_id,
                    "message": message,
                    "role": role,
                }),
            )
            .await?;

        // Notify the leader; delivery failure does not undo the apply.
        let notify: Result<Notification, SdkError> = self
            .insert_returning(
                "notifications",
                &serde_json::json!({
                    "user_id": project.creator_id,
                    "kind": "application_received",
                    "title": "New application",
                    "body": format!("Someone applied to join \"{}\"", project.title),
                    "link": format!("/projects/{project_id}/applications"),
                }),
            )
            .await;
        if let Err(e) = notify {
            tracing::warn!("failed to notify project leader: {e}");
        }

        Ok(application)
    }

    /// Applications submitted to a project, newest first. Leader-only on
    /// the backend.
    pub async fn project_applications(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Application>, SdkError> {
        self.get_rows(
            "applications",
            &[
                ("project_id", format!("eq.{project_id}")),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    /// Applications the signed-in user has submitted, newest first.
    pub async fn my_applications(&self) -> Result<Vec<Application>, SdkError> {
        self.get_rows(
            "applications",
            &[
                ("applicant_id", format!("eq.{}", self.user_id())),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    /// Accept a pending application.
    ///
    /// Adds the applicant to the team, bumps the project's member count,
    /// and notifies the applicant. Only the project leader may call this.
    pub async fn accept_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<Application, SdkError> {
        let application = self.resolve_application(application_id).await?;
        let project = self.get_project(application.project_id).await?;
        if !project.is_leader(self.user_id()) {
            return Err(SdkError::PermissionDenied(
                "only the project leader may review applications".into(),
            ));
        }
        if application.status != ApplicationStatus::Pending {
            return Err(SdkError::Validation(
                "application has already been reviewed".into(),
            ));
        }
        if project.is_full() {
            return Err(SdkError::Validation("project team is full".into()));
        }

        let _: serde_json::Value = self
            .insert_returning(
                "team_members",
                &serde_json::json!({
                    "project_id": application.project_id,
                    "user_id": application.applicant_id,
                    "role": application.role,
                }),
            )
            .await?;

        let updated = self
            .set_application_status(application_id, ApplicationStatus::Accepted)
            .await?;

        let _: Vec<serde_json::Value> = self
            .update_returning(
                "projects",
                &[("id", format!("eq.{}", project.id))],
                &serde_json::json!({ "current_members": project.current_members + 1 }),
            )
            .await?;

        self.notify_applicant(
            &updated,
            "application_accepted",
            "Application accepted",
            &format!("You have been accepted to \"{}\"", project.title),
            Some(&format!("/projects/{}", project.id)),
        )
        .await;

        Ok(updated)
    }

    /// Reject a pending application and notify the applicant.
    pub async fn reject_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<Application, SdkError> {
        let application = self.resolve_application(application_id).await?;
        let project = self.get_project(application.project_id).await?;
        if !project.is_leader(self.user_id()) {
            return Err(SdkError::PermissionDenied(
                "only the project leader may review applications".into(),
            ));
        }
        if application.status != ApplicationStatus::Pending {
            return Err(SdkError::Validation(
                "application has already been reviewed".into(),
            ));
        }

        let updated = self
            .set_application_status(application_id, ApplicationStatus::Rejected)
            .await?;

        self.notify_applicant(
            &updated,
            "application_rejected",
            "Application update",
            &format!("Your application to \"{}\" was not accepted", project.title),
            None,
        )
        .await;

        Ok(updated)
    }

    async fn resolve_application(
        &self,
        id: ApplicationId,
    ) -> Result<Application, SdkError> {
        self.get_one("applications", &[("id", format!("eq.{id}"))])
            .await?
            .ok_or_else(|| SdkError::NotFound(format!("application {id}")))
    }

    async fn set_application_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Application, SdkError> {
        let rows: Vec<Application> = self
            .update_returning(
                "applications",
                &[("id", format!("eq.{id}"))],
                &serde_json::json!({ "status": status }),
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| SdkError::NotFound(format!("application {id}")))
    }

    async fn notify_applicant(
        &self,
        application: &Application,
        kind: &str,
        title: &str,
        body: &str,
        link: Option<&str>,
    ) {
        let result: Result<Notification, SdkError> = self
            .insert_returning(
                "notifications",
                &serde_json::json!({
                    "user_id": application.applicant_id,
                    "kind": kind,
                    "title": title,
                    "body": body,
                    "link": link,
                }),
            )
            .await;
        if let Err(e) = result {
            tracing::warn!("failed to notify applicant: {e}");
        }
    }
}
