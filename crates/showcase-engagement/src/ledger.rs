use showcase_db::VoteWrite;
use showcase_types::models::{Polarity, VoteState};
use tracing::debug;
use uuid::Uuid;

use crate::error::{EngagementError, Result};
use crate::store::{EngagementStore, accessible_project, require_user};

/// Per-user like/dislike state of projects.
///
/// A user holds at most one vote per project. Casting the opposite polarity
/// replaces the existing vote in one store write; casting the same polarity
/// again is `AlreadyVoted`, it never toggles. Counts are always derived from
/// the stored votes.
pub struct VoteLedger<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: EngagementStore + ?Sized> VoteLedger<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn set_vote(&self, user_id: Uuid, project_id: Uuid, polarity: Polarity) -> Result<VoteState> {
        require_user(self.store, user_id)?;
        accessible_project(self.store, Some(user_id), project_id)?;

        match self.store.cast_vote(user_id, project_id, polarity)? {
            VoteWrite::Unchanged => return Err(EngagementError::AlreadyVoted(polarity)),
            VoteWrite::Switched => {
                debug!(%user_id, %project_id, from = %polarity.opposite(), to = %polarity, "Vote switched")
            }
            VoteWrite::Inserted => debug!(%user_id, %project_id, %polarity, "Vote cast"),
        }

        self.read_state(Some(user_id), project_id)
    }

    /// Removes the caller's vote if it has `polarity`; absent votes are not an error.
    pub fn clear_vote(&self, user_id: Uuid, project_id: Uuid, polarity: Polarity) -> Result<VoteState> {
        require_user(self.store, user_id)?;
        accessible_project(self.store, Some(user_id), project_id)?;

        if self.store.retract_vote(user_id, project_id, polarity)? {
            debug!(%user_id, %project_id, %polarity, "Vote retracted");
        }

        self.read_state(Some(user_id), project_id)
    }

    /// Counts for anyone; the caller's polarity only when `viewer` is known.
    pub fn vote_state(&self, viewer: Option<Uuid>, project_id: Uuid) -> Result<VoteState> {
        accessible_project(self.store, viewer, project_id)?;
        self.read_state(viewer, project_id)
    }

    fn read_state(&self, viewer: Option<Uuid>, project_id: Uuid) -> Result<VoteState> {
        let counts = self.store.vote_counts(project_id)?;
        let polarity = match viewer {
            Some(user_id) => self.store.user_polarity(user_id, project_id)?,
            None => None,
        };
        Ok(VoteState::new(counts, polarity))
    }
}
