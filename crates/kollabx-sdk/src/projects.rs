//! Project listing and lifecycle.

use serde::Serialize;

use kollabx_models::{Project, ProjectId, ProjectStatus, Visibility};

use crate::client::KollabClient;
use crate::error::SdkError;

/// Fields required to create a project. The creator, status and member
/// count are filled in server-side.
#[derive(Debug, Clone, Serialize)]
pub struct NewProject {
    pub title: String,
    pub category: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub team_size: u32,
    pub roles_needed: Vec<String>,
    pub timeline: Option<String>,
    pub visibility: Visibility,
}

/// Optional predicates for [`KollabClient::list_projects`].
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    /// Exact category match.
    pub category: Option<String>,
    /// Case-insensitive substring match against the title.
    pub search: Option<String>,
    /// Restrict to a single status.
    pub status: Option<ProjectStatus>,
}

/// Sort order for project listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectSort {
    /// Most recently created first.
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
}

impl ProjectSort {
    fn order_param(self) -> &'static str {
        match self {
            Self::Newest => "created_at.desc",
            Self::Oldest => "created_at.asc",
        }
    }
}

impl KollabClient {
    /// List publicly visible projects matching the filter.
    pub async fn list_projects(
        &self,
        filter: &ProjectFilter,
        sort: ProjectSort,
    ) -> Result<Vec<Project>, SdkError> {
        let mut query: Vec<(&str, String)> = vec![
            ("visibility", "eq.public".to_string()),
            ("order", sort.order_param().to_string()),
        ];
        if let Some(category) = &filter.category {
            query.push(("category", format!("eq.{category}")));
        }
        if let Some(status) = filter.status {
            query.push(("status", format!("eq.{status}")));
        }
        if let Some(search) = &filter.search {
            let term = search.trim();
            if !term.is_empty() {
                query.push(("title", format!("ilike.*{term}*")));
            }
        }
        self.get_rows("projects", &query).await
    }

    /// Fetch a single project by id.
    pub async fn get_project(&self, id: ProjectId) -> Result<Project, SdkError> {
        self.get_one("projects", &[("id", format!("eq.{id}"))])
            .await?
            .ok_or_else(|| SdkError::NotFound(format!("project {id}")))
    }

    /// List projects created by the signed-in user.
    pub async fn my_projects(&self) -> Result<Vec<Project>, SdkError> {
        self.get_rows(
            "projects",
            &[
                ("creator_id", format!("eq.{}", self.user_id())),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    /// Create a project owned by the signed-in user.
    pub async fn create_project(&self, new: &NewProject) -> Result<Project, SdkError> {
        if new.title.trim().is_empty() {
            return Err(SdkError::Validation("project title must not be empty".into()));
        }
        if new.team_size == 0 {
            return Err(SdkError::Validation("team size must be at least 1".into()));
        }
        self.insert_returning("projects", new).await
    }

    /// Update project fields. Only the creator may do this; the backend
    /// rejects anyone else.
    pub async fn update_project<B: Serialize>(
        &self,
        id: ProjectId,
        patch: &B,
    ) -> Result<Project, SdkError> {
        let rows: Vec<Project> = self
            .update_returning("projects", &[("id", format!("eq.{id}"))], patch)
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| SdkError::PermissionDenied(format!("cannot update project {id}")))
    }

    /// Close a project to further applications.
    pub async fn close_project(&self, id: ProjectId) -> Result<Project, SdkError> {
        self.update_project(id, &serde_json::json!({ "status": "closed" }))
            .await
    }

    /// Delete a project. Only the creator may do this.
    pub async fn delete_project(&self, id: ProjectId) -> Result<(), SdkError> {
        let deleted = self
            .delete_where("projects", &[("id", format!("eq.{id}"))])
            .await?;
        if deleted == 0 {
            return Err(SdkError::PermissionDenied(format!(
                "cannot delete project {id}"
            )));
        }
        Ok(())
    }
}
