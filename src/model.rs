use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub rating: i64,
}

/// Fields of a bookmark that passed creation checks, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub rating: i64,
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkPatch {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub rating: Option<i64>,
}

impl BookmarkPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.url.is_none() && self.description.is_none() && self.rating.is_none()
    }
}
