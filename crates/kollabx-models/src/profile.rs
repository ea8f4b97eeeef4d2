//! User display profiles.

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// A user's public profile row.
///
/// Shares its id with the auth account it belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Profile {
    /// Account id (same UUID as the auth user).
    pub id: UserId,
    /// Display name.
    pub full_name: Option<String>,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
    /// Free-form biography.
    pub bio: Option<String>,
    /// Self-declared skills, used for project matching on the backend.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Optional GitHub profile link.
    pub github_url: Option<String>,
    /// Optional LinkedIn profile link.
    pub linkedin_url: Option<String>,
}

impl Profile {
    /// Name to show in the UI, falling back to a generic label.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or("User")
    }
}
