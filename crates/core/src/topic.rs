use crate::category::CategoryId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Label used for a citation the API returned without a title.
pub const DEFAULT_SOURCE_TITLE: &str = "Source Web";

/// A citation surfaced by a search-grounded generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub title: Option<String>,
    pub uri: String,
}

impl GroundingSource {
    /// Text to display for this source: its title, or the URI when untitled.
    pub fn label(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => &self.uri,
        }
    }
}

/// The result of one generation call.
///
/// A topic is never edited in place; regenerating produces a new value with
/// a fresh identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: Uuid,
    pub category: CategoryId,
    pub content: String,
    pub sources: Vec<GroundingSource>,
    pub created_at: DateTime<Utc>,
}

impl Topic {
    /// Creates a new topic stamped with a fresh identifier and the current time.
    pub fn new(category: CategoryId, content: String, sources: Vec<GroundingSource>) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            content,
            sources,
            created_at: Utc::now(),
        }
    }
}
