use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use crate::action::Action;
use crate::controller::{ControllerOptions, FeedController, TriggerOutcome};
use crate::event::Event;
use crate::fetcher::{GroupDirectory, PageFetcher};
use crate::renderer::FeedView;
use crate::trigger::{
    detector_for, Observation, TriggerDetector, TriggerStrategy, Viewport, SENTINEL_HEIGHT,
};
use crate::types::Item;

/// Rows per rendered item: header, title, counts, separator.
pub const ITEM_HEIGHT: usize = 4;

/// Rows not available to the feed: header, status bar, feed borders.
const CHROME_HEIGHT: u16 = 4;

pub struct App {
    pub feed: FeedView,
    pub controller: FeedController,
    pub source: String,
    pub selected: usize,
    pub scroll_offset: usize,
    pub viewport_height: usize,
    pub error: Option<String>,
    pub flash: Option<String>,
    pub should_quit: bool,
    detector: Box<dyn TriggerDetector>,
}

impl App {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        directory: Arc<dyn GroupDirectory>,
        strategy: TriggerStrategy,
        options: ControllerOptions,
        source: String,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            feed: FeedView::new(directory, action_tx.clone()),
            controller: FeedController::new(fetcher, options, action_tx),
            source,
            selected: 0,
            scroll_offset: 0,
            viewport_height: 0,
            error: None,
            flash: None,
            should_quit: false,
            detector: detector_for(strategy),
        }
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            // The first layout observation may already have started a fetch.
            Event::Init if self.controller.is_loading() => Action::None,
            Event::Init => Action::LoadMore,
            Event::Key(key) => self.handle_key(key),
            Event::Resize(width, height) => Action::Resize(width, height),
            _ => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('d') => Action::PageDown,
                KeyCode::Char('u') => Action::PageUp,
                _ => Action::None,
            };
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
            KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
            KeyCode::PageDown => Action::PageDown,
            KeyCode::PageUp => Action::PageUp,
            KeyCode::Char('g') | KeyCode::Home => Action::GoToTop,
            KeyCode::Char('G') | KeyCode::End => Action::GoToBottom,
            KeyCode::Char('o') | KeyCode::Enter => Action::OpenInBrowser,
            KeyCode::Char('y') => Action::YankUrl,
            KeyCode::Char('l') => Action::LoadMore,
            _ => Action::None,
        }
    }

    pub fn update(&mut self, action: Action) {
        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::ScrollDown => self.scroll_to(self.selected.saturating_add(1)),
            Action::ScrollUp => self.scroll_to(self.selected.saturating_sub(1)),
            Action::PageDown => self.scroll_to(self.selected.saturating_add(self.half_page())),
            Action::PageUp => self.scroll_to(self.selected.saturating_sub(self.half_page())),
            Action::GoToTop => self.scroll_to(0),
            Action::GoToBottom => self.scroll_to(usize::MAX),
            Action::Resize(_, height) => {
                self.viewport_height = height.saturating_sub(CHROME_HEIGHT) as usize;
                self.ensure_visible();
                self.observe(Observation::Layout);
            }

            Action::LoadMore => self.trigger(),
            Action::PageFetched(result) => {
                match self.controller.on_page_fetched(result, &mut self.feed) {
                    Ok(0) => {}
                    Ok(_) => {
                        self.error = None;
                        self.ensure_visible();
                        self.observe(Observation::Layout);
                        if self.should_fill_viewport() {
                            self.trigger();
                        }
                    }
                    Err(e) => {
                        self.error = Some(e.to_string());
                    }
                }
            }
            Action::GroupIconLoaded { group, icon } => {
                self.feed.set_icon(&group, icon);
            }

            Action::OpenInBrowser => {
                if let Some(link) = self.selected_link() {
                    if let Err(e) = open::that(&link) {
                        self.error = Some(format!("Could not open browser: {}", e));
                    }
                }
            }
            Action::YankUrl => {
                if let Some(link) = self.selected_link() {
                    match arboard::Clipboard::new().and_then(|mut c| c.set_text(link.clone())) {
                        Ok(()) => self.flash = Some(format!("Copied {}", link)),
                        Err(e) => self.error = Some(format!("Clipboard error: {}", e)),
                    }
                }
            }

            Action::None => {}
        }
    }

    pub fn selected_item(&self) -> Option<&Item> {
        self.feed.get(self.selected)
    }

    fn selected_link(&self) -> Option<String> {
        self.selected_item()
            .and_then(|item| item.link())
            .map(str::to_string)
    }

    /// Content rows including the sentinel line.
    pub fn total_height(&self) -> usize {
        self.feed.len() * ITEM_HEIGHT + SENTINEL_HEIGHT as usize
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            total_height: self.total_height() as f64,
            viewport_height: self.viewport_height as f64,
            scroll_offset: self.scroll_offset as f64,
        }
    }

    fn trigger(&mut self) {
        if self.controller.on_trigger() == TriggerOutcome::Started {
            self.error = None;
        }
    }

    fn observe(&mut self, cause: Observation) {
        let viewport = self.viewport();
        if self.detector.observe(&viewport, cause) {
            self.trigger();
        }
    }

    fn half_page(&self) -> usize {
        (self.viewport_height / 2 / ITEM_HEIGHT).max(1)
    }

    fn scroll_to(&mut self, index: usize) {
        self.flash = None;
        self.selected = index.min(self.feed.len().saturating_sub(1));
        self.ensure_visible();
        self.observe(Observation::Scroll);
    }

    /// Keep the selected item on screen. Selecting the last item scrolls all
    /// the way down so the sentinel comes into view.
    fn ensure_visible(&mut self) {
        let max_scroll = self.total_height().saturating_sub(self.viewport_height);
        if self.feed.is_empty() {
            self.scroll_offset = 0;
            return;
        }
        if self.selected + 1 >= self.feed.len() {
            self.scroll_offset = max_scroll;
            return;
        }

        let top = self.selected * ITEM_HEIGHT;
        let bottom = top + ITEM_HEIGHT;
        if top < self.scroll_offset {
            self.scroll_offset = top;
        } else if bottom > self.scroll_offset + self.viewport_height {
            self.scroll_offset = bottom.saturating_sub(self.viewport_height);
        }
        self.scroll_offset = self.scroll_offset.min(max_scroll);
    }

    /// A page that does not fill the screen leaves nothing to scroll, so
    /// keep loading until it does.
    fn should_fill_viewport(&self) -> bool {
        !self.controller.is_loading() && self.total_height() <= self.viewport_height
    }
}
