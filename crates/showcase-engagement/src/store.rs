use std::collections::HashMap;

use anyhow::Result;
use showcase_db::{Database, VoteWrite};
use showcase_types::models::{Comment, Polarity, Project, VoteCounts};
use uuid::Uuid;

use crate::error::EngagementError;

/// Persistence the engagement core needs.
///
/// `cast_vote` must be atomic: reading the current vote and writing the new
/// one happen as one unit, and the store itself enforces uniqueness of the
/// (user, project) pair.
pub trait EngagementStore {
    fn user_exists(&self, user_id: Uuid) -> Result<bool>;
    fn project(&self, project_id: Uuid) -> Result<Option<Project>>;

    fn cast_vote(&self, user_id: Uuid, project_id: Uuid, polarity: Polarity) -> Result<VoteWrite>;
    fn retract_vote(&self, user_id: Uuid, project_id: Uuid, polarity: Polarity) -> Result<bool>;
    fn vote_counts(&self, project_id: Uuid) -> Result<VoteCounts>;
    fn user_polarity(&self, user_id: Uuid, project_id: Uuid) -> Result<Option<Polarity>>;
    fn vote_counts_for(&self, project_ids: &[Uuid]) -> Result<HashMap<Uuid, VoteCounts>>;
    fn user_polarities_for(&self, user_id: Uuid, project_ids: &[Uuid]) -> Result<HashMap<Uuid, Polarity>>;

    fn insert_comment(&self, project_id: Uuid, user_id: Uuid, content: &str) -> Result<Comment>;
    fn comment(&self, comment_id: Uuid) -> Result<Option<Comment>>;
    fn comments(&self, project_id: Uuid) -> Result<Vec<Comment>>;
    fn update_comment(&self, comment_id: Uuid, content: &str) -> Result<Option<Comment>>;
    fn delete_comment(&self, comment_id: Uuid) -> Result<bool>;
    fn comment_count(&self, project_id: Uuid) -> Result<u64>;
    fn comment_counts_for(&self, project_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>>;
}

impl EngagementStore for Database {
    fn user_exists(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.get_user(user_id)?.is_some())
    }

    fn project(&self, project_id: Uuid) -> Result<Option<Project>> {
        Ok(self.get_project(project_id)?.map(|row| row.project))
    }

    fn cast_vote(&self, user_id: Uuid, project_id: Uuid, polarity: Polarity) -> Result<VoteWrite> {
        Database::cast_vote(self, user_id, project_id, polarity)
    }

    fn retract_vote(&self, user_id: Uuid, project_id: Uuid, polarity: Polarity) -> Result<bool> {
        Database::retract_vote(self, user_id, project_id, polarity)
    }

    fn vote_counts(&self, project_id: Uuid) -> Result<VoteCounts> {
        Database::vote_counts(self, project_id)
    }

    fn user_polarity(&self, user_id: Uuid, project_id: Uuid) -> Result<Option<Polarity>> {
        Database::user_polarity(self, user_id, project_id)
    }

    fn vote_counts_for(&self, project_ids: &[Uuid]) -> Result<HashMap<Uuid, VoteCounts>> {
        Database::vote_counts_for(self, project_ids)
    }

    fn user_polarities_for(&self, user_id: Uuid, project_ids: &[Uuid]) -> Result<HashMap<Uuid, Polarity>> {
        Database::user_polarities_for(self, user_id, project_ids)
    }

    fn insert_comment(&self, project_id: Uuid, user_id: Uuid, content: &str) -> Result<Comment> {
        Database::insert_comment(self, project_id, user_id, content)
    }

    fn comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        self.get_comment(comment_id)
    }

    fn comments(&self, project_id: Uuid) -> Result<Vec<Comment>> {
        self.list_comments(project_id)
    }

    fn update_comment(&self, comment_id: Uuid, content: &str) -> Result<Option<Comment>> {
        Database::update_comment(self, comment_id, content)
    }

    fn delete_comment(&self, comment_id: Uuid) -> Result<bool> {
        Database::delete_comment(self, comment_id)
    }

    fn comment_count(&self, project_id: Uuid) -> Result<u64> {
        Database::comment_count(self, project_id)
    }

    fn comment_counts_for(&self, project_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>> {
        Database::comment_counts_for(self, project_ids)
    }
}

/// Resolves a project the viewer may see. Private projects of other users
/// report `NotFound` so their existence does not leak.
pub(crate) fn accessible_project<S>(
    store: &S,
    viewer: Option<Uuid>,
    project_id: Uuid,
) -> crate::Result<Project>
where
    S: EngagementStore + ?Sized,
{
    store
        .project(project_id)?
        .filter(|project| project.is_visible_to(viewer))
        .ok_or(EngagementError::NotFound("Project"))
}

pub(crate) fn require_user<S>(store: &S, user_id: Uuid) -> crate::Result<()>
where
    S: EngagementStore + ?Sized,
{
    if store.user_exists(user_id)? {
        Ok(())
    } else {
        Err(EngagementError::NotFound("User"))
    }
}
