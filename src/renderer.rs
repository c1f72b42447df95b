use std::sync::Arc;

use tokio::sync::mpsc;

use crate::action::Action;
use crate::fetcher::GroupDirectory;
use crate::icons::{Icon, IconCache};
use crate::types::Item;

/// Receives fetched items one at a time, in feed order.
pub trait ItemRenderer {
    fn render(&mut self, item: Item);
}

/// The rendered feed: items in display order plus their group decorations.
pub struct FeedView {
    items: Vec<Item>,
    icons: IconCache,
    directory: Arc<dyn GroupDirectory>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl FeedView {
    pub fn new(
        directory: Arc<dyn GroupDirectory>,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            items: Vec::new(),
            icons: IconCache::new(),
            directory,
            action_tx,
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn icon(&self, group: &str) -> &Icon {
        self.icons.get(group)
    }

    pub fn set_icon(&mut self, group: &str, icon: Option<String>) {
        self.icons.resolve(group, icon);
    }

    fn spawn_icon_lookup(&self, group: String) {
        let tx = self.action_tx.clone();
        let directory = Arc::clone(&self.directory);
        tokio::spawn(async move {
            let icon = match directory.group_icon(&group).await {
                Ok(icon) => icon,
                Err(e) => {
                    tracing::debug!(group = %group, error = %e, "group icon lookup failed");
                    None
                }
            };
            tx.send(Action::GroupIconLoaded { group, icon }).ok();
        });
    }
}

impl ItemRenderer for FeedView {
    fn render(&mut self, item: Item) {
        if self.icons.request(&item.source_group) {
            self.spawn_icon_lookup(item.source_group.clone());
        }
        self.items.push(item);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::{FeedError, Result};
    use crate::types::sample_item;

    #[derive(Debug, Default)]
    struct CountingDirectory {
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl GroupDirectory for CountingDirectory {
        async fn group_icon(&self, group: &str) -> Result<Option<String>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if group == "broken" {
                return Err(FeedError::Transport("connection reset".into()));
            }
            Ok(Some(format!("https://i.example/{}.png", group)))
        }
    }

    async fn icon_results(
        rx: &mut mpsc::UnboundedReceiver<Action>,
        n: usize,
    ) -> Vec<(String, Option<String>)> {
        let mut out = Vec::new();
        while out.len() < n {
            if let Some(Action::GroupIconLoaded { group, icon }) = rx.recv().await {
                out.push((group, icon));
            }
        }
        out.sort();
        out
    }

    #[tokio::test]
    async fn render_appends_in_call_order() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut view = FeedView::new(Arc::new(CountingDirectory::default()), tx);

        view.render(sample_item("t3_a", "rust"));
        view.render(sample_item("t3_b", "rust"));
        view.render(sample_item("t3_c", "pics"));

        let ids: Vec<_> = view.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["t3_a", "t3_b", "t3_c"]);
    }

    #[tokio::test]
    async fn icon_lookup_runs_once_per_group() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let directory = Arc::new(CountingDirectory::default());
        let mut view = FeedView::new(directory.clone(), tx);

        view.render(sample_item("t3_a", "rust"));
        view.render(sample_item("t3_b", "rust"));
        view.render(sample_item("t3_c", "pics"));
        assert_eq!(view.icon("rust"), &Icon::Pending);

        let results = icon_results(&mut rx, 2).await;
        assert_eq!(directory.lookups.load(Ordering::SeqCst), 2);
        for (group, icon) in results {
            view.set_icon(&group, icon);
        }
        assert_eq!(
            view.icon("rust"),
            &Icon::Found("https://i.example/rust.png".into())
        );

        view.render(sample_item("t3_d", "rust"));
        assert_eq!(directory.lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_icon_lookup_degrades_to_missing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut view = FeedView::new(Arc::new(CountingDirectory::default()), tx);

        view.render(sample_item("t3_a", "broken"));
        view.render(sample_item("t3_b", "rust"));

        let results = icon_results(&mut rx, 2).await;
        assert_eq!(results[0], ("broken".to_string(), None));
        for (group, icon) in results {
            view.set_icon(&group, icon);
        }

        assert_eq!(view.icon("broken"), &Icon::Missing);
        assert_eq!(view.len(), 2);
    }
}
