use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Cursor, Page};

/// Source of feed pages. Implementations do not retry; a failed fetch is
/// retried only when the controller receives another trigger.
#[async_trait]
pub trait PageFetcher: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    async fn fetch(&self, cursor: &Cursor) -> Result<Page>;
}

/// Per-group metadata used to decorate rendered items.
#[async_trait]
pub trait GroupDirectory: Send + Sync + std::fmt::Debug {
    /// Icon URL for a group, `None` when the group has no icon.
    async fn group_icon(&self, group: &str) -> Result<Option<String>>;
}
