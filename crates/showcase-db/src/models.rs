//! Database-side shapes that have no counterpart in showcase-types:
//! insert payloads, filters, and joined read rows.

use showcase_types::models::{Author, Project};
use uuid::Uuid;

pub struct NewProject {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub category: String,
    pub private: bool,
}

/// `None` fields keep their stored value.
#[derive(Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub image: Option<String>,
}

#[derive(Default)]
pub struct ProjectFilter {
    /// Restrict to one owner's projects (public and private).
    pub owner_id: Option<Uuid>,
    /// Restrict to public projects.
    pub public_only: bool,
    /// Case-insensitive substring match on title or description.
    pub search: Option<String>,
    pub category: Option<String>,
    pub limit: Option<u32>,
}

pub struct ProjectWithOwner {
    pub project: Project,
    pub owner: Author,
}

/// Outcome of an atomic vote write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteWrite {
    /// No previous vote existed.
    Inserted,
    /// The opposite polarity was replaced in place.
    Switched,
    /// The same polarity was already stored; nothing was written.
    Unchanged,
}
