use serde::{Deserialize, Serialize};

use crate::models::{Author, EngagementView, Project};

// -- JWT Claims --

/// Claims carried by the bearer token the OAuth front-end issues after a
/// successful sign-in. `sub` is the provider's subject; the stable local
/// identity is keyed on `email`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub exp: usize,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
}

// -- Projects --

/// Absent text fields decode as empty so the handler reports them with the
/// same "Missing required fields" error as blank ones.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub category: String,
    pub private: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateVisibilityRequest {
    pub private: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

/// A project as shown in list and detail views.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectResponse {
    #[serde(flatten)]
    pub project: Project,
    pub owner: Author,
    pub engagement: EngagementView,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentRequest {
    pub content: String,
}

// -- Profile --

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub image: Option<String>,
}
