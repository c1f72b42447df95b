use chrono::{DateTime, Utc};
use std::fmt;

use crate::error::{FeedError, Result};

/// Pagination position in the feed. `Start` means nothing has been loaded yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Start,
    After(String),
}

impl Cursor {
    /// Token for the `after` query parameter, if any.
    pub fn token(&self) -> Option<&str> {
        match self {
            Cursor::Start => None,
            Cursor::After(id) => Some(id),
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::Start => write!(f, "start"),
            Cursor::After(id) => write!(f, "{}", id),
        }
    }
}

/// A single feed post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub source_group: String,
    pub thumbnail_url: Option<String>,
    pub upvote_count: u64,
    pub comment_count: u64,
    pub url: Option<String>,
    pub permalink: Option<String>,
}

impl Item {
    /// Best link to hand to a browser or clipboard.
    pub fn link(&self) -> Option<&str> {
        self.url.as_deref().or(self.permalink.as_deref())
    }
}

/// One fetched batch of items. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    items: Vec<Item>,
}

impl Page {
    pub fn new(items: Vec<Item>) -> Result<Self> {
        if items.is_empty() {
            return Err(FeedError::EmptyPage);
        }
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Cursor for the request after this one: the id of the last item.
    pub fn next_cursor(&self) -> Cursor {
        // `new` rejects empty pages, so there is always a last item.
        match self.items.last() {
            Some(item) => Cursor::After(item.id.clone()),
            None => Cursor::Start,
        }
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }
}

#[cfg(test)]
pub(crate) fn sample_item(id: &str, group: &str) -> Item {
    Item {
        id: id.to_string(),
        created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default(),
        title: format!("Post {}", id),
        source_group: group.to_string(),
        thumbnail_url: None,
        upvote_count: 1,
        comment_count: 0,
        url: Some(format!("https://example.com/{}", id)),
        permalink: None,
    }
}
