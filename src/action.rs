use crate::error::Result;
use crate::types::Page;

#[derive(Debug)]
pub enum Action {
    Quit,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    GoToTop,
    GoToBottom,
    Resize(u16, u16),

    // Feed loading
    LoadMore,
    PageFetched(Result<Page>),
    GroupIconLoaded {
        group: String,
        icon: Option<String>,
    },

    // Selected item
    OpenInBrowser,
    YankUrl,

    None,
}
