use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub category: String,
    pub private: bool,
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Public projects are visible to everyone, private ones only to their owner.
    pub fn is_visible_to(&self, viewer: Option<Uuid>) -> bool {
        !self.private || viewer == Some(self.owner_id)
    }
}

/// Display snapshot of a user, joined at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: Uuid,
    pub name: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub project_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: Author,
}

/// Direction of a user's reaction to a project. The absence of a vote is
/// represented by `Option::None`, never by a third variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Like,
    Dislike,
}

impl Polarity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Like => Self::Dislike,
            Self::Dislike => Self::Like,
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPolarity(pub String);

impl fmt::Display for UnknownPolarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown polarity '{}'", self.0)
    }
}

impl std::error::Error for UnknownPolarity {}

impl FromStr for Polarity {
    type Err = UnknownPolarity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            other => Err(UnknownPolarity(other.to_string())),
        }
    }
}

/// Like/dislike totals for one project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteCounts {
    pub likes: u64,
    pub dislikes: u64,
}

/// Vote counts plus the caller's own polarity (`None` when anonymous or not voted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteState {
    pub likes_count: u64,
    pub dislikes_count: u64,
    pub user_polarity: Option<Polarity>,
}

impl VoteState {
    pub fn new(counts: VoteCounts, user_polarity: Option<Polarity>) -> Self {
        Self {
            likes_count: counts.likes,
            dislikes_count: counts.dislikes,
            user_polarity,
        }
    }
}

/// Aggregated read-model used by list and detail views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementView {
    pub likes_count: u64,
    pub dislikes_count: u64,
    pub comments_count: u64,
    pub user_polarity: Option<Polarity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(private: bool) -> Project {
        Project {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "Maze".into(),
            description: "A maze game".into(),
            image_url: "https://img.example/maze.png".into(),
            category: "Game".into(),
            private,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn polarity_parses_its_own_string_form() {
        assert_eq!("like".parse::<Polarity>(), Ok(Polarity::Like));
        assert_eq!("dislike".parse::<Polarity>(), Ok(Polarity::Dislike));
        assert!("meh".parse::<Polarity>().is_err());
    }

    #[test]
    fn opposite_flips_polarity() {
        assert_eq!(Polarity::Like.opposite(), Polarity::Dislike);
        assert_eq!(Polarity::Dislike.opposite(), Polarity::Like);
    }

    #[test]
    fn private_project_visible_only_to_owner() {
        let p = project(true);
        assert!(p.is_visible_to(Some(p.owner_id)));
        assert!(!p.is_visible_to(Some(Uuid::new_v4())));
        assert!(!p.is_visible_to(None));
        assert!(project(false).is_visible_to(None));
    }

    #[test]
    fn vote_state_serializes_camel_case_with_null_polarity() {
        let state = VoteState::new(VoteCounts { likes: 2, dislikes: 1 }, None);
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "likesCount": 2, "dislikesCount": 1, "userPolarity": null })
        );
    }
}
