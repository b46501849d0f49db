use std::collections::HashMap;

use showcase_types::models::EngagementView;
use uuid::Uuid;

use crate::error::Result;
use crate::ledger::VoteLedger;
use crate::store::EngagementStore;

/// Read-model for list and detail views. Holds no state of its own.
pub struct EngagementAggregator<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: EngagementStore + ?Sized> EngagementAggregator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn view(&self, viewer: Option<Uuid>, project_id: Uuid) -> Result<EngagementView> {
        let votes = VoteLedger::new(self.store).vote_state(viewer, project_id)?;
        let comments_count = self.store.comment_count(project_id)?;

        Ok(EngagementView {
            likes_count: votes.likes_count,
            dislikes_count: votes.dislikes_count,
            comments_count,
            user_polarity: votes.user_polarity,
        })
    }

    /// Views for a page of projects the caller has already resolved as
    /// visible. One grouped query per table regardless of page size.
    pub fn views(&self, viewer: Option<Uuid>, project_ids: &[Uuid]) -> Result<HashMap<Uuid, EngagementView>> {
        let votes = self.store.vote_counts_for(project_ids)?;
        let comments = self.store.comment_counts_for(project_ids)?;
        let polarities = match viewer {
            Some(user_id) => self.store.user_polarities_for(user_id, project_ids)?,
            None => HashMap::new(),
        };

        Ok(project_ids
            .iter()
            .map(|id| {
                let counts = votes.get(id).copied().unwrap_or_default();
                let view = EngagementView {
                    likes_count: counts.likes,
                    dislikes_count: counts.dislikes,
                    comments_count: comments.get(id).copied().unwrap_or(0),
                    user_polarity: polarities.get(id).copied(),
                };
                (*id, view)
            })
            .collect())
    }
}
