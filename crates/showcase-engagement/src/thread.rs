use showcase_types::models::Comment;
use tracing::debug;
use uuid::Uuid;

use crate::error::{EngagementError, Result};
use crate::store::{EngagementStore, accessible_project, require_user};

/// Comments on a project, newest first.
///
/// Only the author may edit a comment. The author or the project's owner may
/// delete it.
pub struct CommentThread<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: EngagementStore + ?Sized> CommentThread<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn post(&self, user_id: Uuid, project_id: Uuid, content: &str) -> Result<Comment> {
        require_user(self.store, user_id)?;
        accessible_project(self.store, Some(user_id), project_id)?;
        let content = validate_content(content)?;

        let comment = self.store.insert_comment(project_id, user_id, content)?;
        debug!(comment_id = %comment.id, %project_id, %user_id, "Comment posted");
        Ok(comment)
    }

    /// A fresh read of the current comments on every call.
    pub fn list(&self, viewer: Option<Uuid>, project_id: Uuid) -> Result<Vec<Comment>> {
        accessible_project(self.store, viewer, project_id)?;
        Ok(self.store.comments(project_id)?)
    }

    pub fn update(
        &self,
        requester: Uuid,
        project_id: Uuid,
        comment_id: Uuid,
        content: &str,
    ) -> Result<Comment> {
        let comment = self.find(requester, project_id, comment_id)?;
        if comment.author.id != requester {
            return Err(EngagementError::Unauthorized);
        }
        let content = validate_content(content)?;

        let updated = self
            .store
            .update_comment(comment_id, content)?
            .ok_or(EngagementError::NotFound("Comment"))?;
        debug!(%comment_id, %requester, "Comment edited");
        Ok(updated)
    }

    pub fn delete(&self, requester: Uuid, project_id: Uuid, comment_id: Uuid) -> Result<()> {
        let comment = self.find(requester, project_id, comment_id)?;

        if comment.author.id != requester {
            let owner = self.store.project(comment.project_id)?.map(|p| p.owner_id);
            if owner != Some(requester) {
                return Err(EngagementError::Unauthorized);
            }
            debug!(%comment_id, %requester, "Comment removed by project owner");
        }

        if !self.store.delete_comment(comment_id)? {
            return Err(EngagementError::NotFound("Comment"));
        }
        debug!(%comment_id, %requester, "Comment deleted");
        Ok(())
    }

    /// The comment, provided it belongs to `project_id` and the requester can see that project.
    fn find(&self, requester: Uuid, project_id: Uuid, comment_id: Uuid) -> Result<Comment> {
        accessible_project(self.store, Some(requester), project_id)?;
        self.store
            .comment(comment_id)?
            .filter(|comment| comment.project_id == project_id)
            .ok_or(EngagementError::NotFound("Comment"))
    }
}

fn validate_content(content: &str) -> Result<&str> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(EngagementError::Validation("Comment content is required".into()));
    }
    Ok(trimmed)
}
