//! Reactions and discussion on projects.
//!
//! [`VoteLedger`] owns the like/dislike rule: at most one vote per
//! (user, project), switched atomically. [`CommentThread`] owns comment
//! moderation rights. [`EngagementAggregator`] composes both into the
//! read-model list and detail views show. All three work over any
//! [`EngagementStore`]; `showcase_db::Database` is the production one.

pub mod aggregator;
pub mod error;
pub mod ledger;
pub mod store;
pub mod thread;

pub use aggregator::EngagementAggregator;
pub use error::{EngagementError, Result};
pub use ledger::VoteLedger;
pub use store::EngagementStore;
pub use thread::CommentThread;
