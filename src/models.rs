use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Id = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Idea {
    pub id: Id,
    pub title: String,
    pub upvotes: i64,
    pub downvotes: i64,
    pub twitter_link: Option<String>,
    pub reports: i64,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub tags: Vec<Tag>, // hydrated from the join table, never stored inline
}

impl Idea {
    /// Only http(s) links are rendered as anchors.
    pub fn has_twitter_link(&self) -> bool {
        !self.twitter_href().is_empty()
    }

    pub fn twitter_href(&self) -> &str {
        match self.twitter_link.as_deref().map(str::trim) {
            Some(l) if l.starts_with("https://") || l.starts_with("http://") => l,
            _ => "",
        }
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name == name)
    }
}

/// Insert payload; tags are already resolved to ids by the tag registry.
#[derive(Debug, Clone)]
pub struct NewIdea {
    pub title: String,
    pub twitter_link: Option<String>,
    pub tag_ids: Vec<Id>,
}

/// Signed counter deltas applied in one storage operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteDelta {
    pub upvotes: i64,
    pub downvotes: i64,
}
