//! Projects, applications to join them, and team membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::ids::{ApplicationId, ProjectId, UserId};
use crate::profile::Profile;

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// Whether a project is still recruiting.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProjectStatus {
    /// Open for new applications.
    Open,
    /// No longer accepting applications.
    Closed,
}

/// Who can discover a project.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Visibility {
    /// Listed on the explore page.
    Public,
    /// Invitation only.
    Private,
}

/// A collaboration project with a leader and a team.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Project {
    /// Project id.
    pub id: ProjectId,
    /// The project leader (only account allowed to manage the team).
    pub creator_id: UserId,
    /// Project title.
    pub title: String,
    /// Category label shown on project cards.
    pub category: String,
    /// Long-form description.
    pub description: String,
    /// Skills the leader is recruiting for.
    #[serde(default)]
    pub required_skills: Vec<String>,
    /// Target team size (including the leader).
    pub team_size: u32,
    /// Current member count, maintained by the backend.
    pub current_members: u32,
    /// Role labels the leader still needs to fill.
    #[serde(default)]
    pub roles_needed: Vec<String>,
    /// Free-form timeline estimate.
    pub timeline: Option<String>,
    /// Discoverability.
    pub visibility: Visibility,
    /// Recruiting status.
    pub status: ProjectStatus,
    /// Creation timestamp (UTC).
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// True if `user` is the project leader.
    pub fn is_leader(&self, user: UserId) -> bool {
        self.creator_id == user
    }

    /// True if the team already reached its target size.
    pub fn is_full(&self) -> bool {
        self.current_members >= self.team_size
    }
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Lifecycle of an application to join a project.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApplicationStatus {
    /// Waiting for the leader's decision.
    Pending,
    /// Accepted; the applicant became a team member.
    Accepted,
    /// Rejected by the leader.
    Rejected,
}

/// A user's request to join a project team.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Application {
    /// Application id.
    pub id: ApplicationId,
    /// The project applied to.
    pub project_id: ProjectId,
    /// The applying user.
    pub applicant_id: UserId,
    /// Cover message to the leader.
    pub message: String,
    /// Role the applicant is asking for.
    pub role: Option<String>,
    /// Current decision state.
    pub status: ApplicationStatus,
    /// Submission timestamp (UTC).
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Team membership
// ---------------------------------------------------------------------------

/// One row of a project's team roster.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TeamMember {
    /// The project the membership belongs to.
    pub project_id: ProjectId,
    /// The member's account id.
    pub user_id: UserId,
    /// Role label within the team ("Creator" for the leader).
    pub role: Option<String>,
    /// When the member joined (UTC).
    pub joined_at: DateTime<Utc>,
    /// Joined display profile, when the query asked for it.
    #[serde(default)]
    pub profile: Option<Profile>,
}

/// A membership row joined with its project, as returned by the
/// "my teams" query.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TeamMembership {
    /// The underlying roster row.
    #[serde(flatten)]
    pub member: TeamMember,
    /// The joined project. `None` when the project was deleted while the
    /// roster row lingered.
    #[serde(default)]
    pub project: Option<Project>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_project(leader: UserId) -> Project {
        Project {
            id: ProjectId::new(Uuid::new_v4()),
            creator_id: leader,
            title: "Flight Tracker".into(),
            category: "Web".into(),
            description: "Track flights in realtime".into(),
            required_skills: vec!["rust".into()],
            team_size: 3,
            current_members: 1,
            roles_needed: vec!["frontend".into()],
            timeline: None,
            visibility: Visibility::Public,
            status: ProjectStatus::Open,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&ProjectStatus::Open).unwrap(), "\"open\"");
        assert_eq!(
            serde_json::to_string(&ApplicationStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(ApplicationStatus::Accepted.to_string(), "accepted");
    }

    #[test]
    fn leader_and_capacity_checks() {
        let leader = UserId::new(Uuid::new_v4());
        let mut project = sample_project(leader);
        assert!(project.is_leader(leader));
        assert!(!project.is_leader(UserId::new(Uuid::new_v4())));
        assert!(!project.is_full());
        project.current_members = 3;
        assert!(project.is_full());
    }

    #[test]
    fn project_serde_roundtrip() {
        let project = sample_project(UserId::new(Uuid::new_v4()));
        let json = serde_json::to_string(&project).unwrap();
        let back: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(project, back);
    }

    #[test]
    fn membership_tolerates_deleted_project() {
        let member = TeamMember {
            project_id: ProjectId::new(Uuid::new_v4()),
            user_id: UserId::new(Uuid::new_v4()),
            role: Some("Creator".into()),
            joined_at: Utc::now(),
            profile: None,
        };
        let json = serde_json::to_string(&member).unwrap();
        let membership: TeamMembership = serde_json::from_str(&json).unwrap();
        assert!(membership.project.is_none());
        assert_eq!(membership.member.role.as_deref(), Some("Creator"));
    }
}
