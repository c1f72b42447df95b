use std::collections::HashMap;

/// Lookup state of a group's icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Icon {
    Pending,
    Found(String),
    Missing,
}

/// Per-session cache of group icons so each group is looked up once.
#[derive(Debug, Default)]
pub struct IconCache {
    entries: HashMap<String, Icon>,
}

impl IconCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a group as wanted. Returns true if the caller should start a
    /// lookup, false if one is already running or finished.
    pub fn request(&mut self, group: &str) -> bool {
        if self.entries.contains_key(group) {
            return false;
        }
        self.entries.insert(group.to_string(), Icon::Pending);
        true
    }

    pub fn resolve(&mut self, group: &str, icon: Option<String>) {
        let icon = match icon {
            Some(url) => Icon::Found(url),
            None => Icon::Missing,
        };
        self.entries.insert(group.to_string(), icon);
    }

    pub fn get(&self, group: &str) -> &Icon {
        self.entries.get(group).unwrap_or(&Icon::Missing)
    }
}
