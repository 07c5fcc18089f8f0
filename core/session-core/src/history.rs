//! Browser history synchronization.
//!
//! Internal navigation changes are pushed as history entries carrying a
//! [`HistoryEntry`] payload. Popstate replays that payload (never the URL)
//! through [`NavigationStateStore::apply_external`], which emits nothing, so
//! walking back and forward never grows the stack.

use std::cell::RefCell;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::navigation::{
    canonical_query, NavigationChange, NavigationState, NavigationStateStore, TabId,
};

/// State payload attached to each history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub tab: TabId,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub entity_label: String,
}

impl From<&NavigationState> for HistoryEntry {
    fn from(state: &NavigationState) -> Self {
        HistoryEntry {
            tab: state.active_tab,
            entity_id: state.selected_entity_id.clone(),
            entity_label: state.selected_entity_label.clone(),
        }
    }
}

impl From<HistoryEntry> for NavigationState {
    fn from(entry: HistoryEntry) -> Self {
        NavigationState {
            active_tab: entry.tab,
            selected_entity_id: entry.entity_id,
            selected_entity_label: entry.entity_label,
        }
    }
}

impl HistoryEntry {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// The browser location and history API as seen by the core.
///
/// Popstate is delivered by the host calling
/// [`crate::SessionContext::pop_state`] with the entry's state payload.
pub trait LocationHost {
    /// `location.search`, with its leading `?` when non-empty.
    fn current_query(&self) -> String;
    /// `location.pathname`.
    fn current_path(&self) -> String;
    /// `history.pushState`. `path` includes the query string.
    fn push_entry(&self, path: &str, state: &HistoryEntry);
    /// `history.replaceState`.
    fn replace_entry(&self, path: &str, state: &HistoryEntry);
}

#[derive(Debug, Default)]
pub struct HistoryBridge {
    last_entry: Option<HistoryEntry>,
}

impl HistoryBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the initial navigation state to the entry the page was
    /// loaded with, so navigating back to it restores the same view. The
    /// URL is left as loaded; evaluator links carry tokens we must keep.
    pub fn seed(&mut self, initial: &NavigationState, host: &dyn LocationHost) {
        let entry = HistoryEntry::from(initial);
        let url = format!("{}{}", host.current_path(), host.current_query());
        host.replace_entry(&url, &entry);
        self.last_entry = Some(entry);
    }

    /// Pushes the change unless it repeats the current entry. Returns true
    /// when an entry was pushed.
    pub fn on_internal_change(
        &mut self,
        change: &NavigationChange,
        host: &dyn LocationHost,
    ) -> bool {
        let entry = HistoryEntry::from(&change.state);
        if self.last_entry.as_ref() == Some(&entry) {
            debug!(tab = %entry.tab, "Suppressing duplicate history push");
            return false;
        }
        let path = entry_path(&entry, host);
        host.push_entry(&path, &entry);
        self.last_entry = Some(entry);
        true
    }

    /// Rewrites the current entry in place (redirects that must not add to
    /// the back stack).
    pub fn replace_current(&mut self, state: &NavigationState, host: &dyn LocationHost) {
        let entry = HistoryEntry::from(state);
        let path = entry_path(&entry, host);
        host.replace_entry(&path, &entry);
        self.last_entry = Some(entry);
    }

    /// Replays a popstate payload. Missing or corrupt payloads navigate home.
    pub fn handle_pop_state(
        &mut self,
        payload: Option<&Value>,
        store: &mut NavigationStateStore,
    ) -> NavigationState {
        let entry = match payload.map(|value| HistoryEntry::deserialize(value)) {
            Some(Ok(entry)) => Some(entry),
            Some(Err(err)) => {
                warn!(error = %err, "Corrupt history payload; navigating home");
                None
            }
            None => {
                debug!("Popstate without payload; navigating home");
                None
            }
        };

        let state = entry
            .clone()
            .map(NavigationState::from)
            .unwrap_or_else(NavigationState::home);
        self.last_entry = Some(entry.unwrap_or_else(|| HistoryEntry::from(&state)));
        store.apply_external(state.clone());
        state
    }

    pub fn last_entry(&self) -> Option<&HistoryEntry> {
        self.last_entry.as_ref()
    }
}

/// Path for an entry: the current path plus the canonical query. Leaving
/// the evaluator workflow from an `/evaluator` path falls back to `/`,
/// since that prefix would force the evaluator view on reload.
fn entry_path(entry: &HistoryEntry, host: &dyn LocationHost) -> String {
    let current = host.current_path();
    let path = if current.is_empty()
        || (current.contains("/evaluator") && entry.tab != TabId::EVALUATOR_WORKFLOW)
    {
        "/".to_string()
    } else {
        current
    };
    format!("{}?{}", path, canonical_query(entry))
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    url: String,
    state: Option<Value>,
}

#[derive(Debug)]
struct MemoryHistory {
    entries: Vec<MemoryEntry>,
    cursor: usize,
    pushes: usize,
}

/// In-memory browser history for headless hosts and tests.
#[derive(Debug)]
pub struct MemoryLocation {
    history: RefCell<MemoryHistory>,
}

impl MemoryLocation {
    /// Starts with a single entry for `url` (path plus optional `?query`)
    /// and no state payload, as a fresh page load would.
    pub fn new(url: &str) -> Self {
        MemoryLocation {
            history: RefCell::new(MemoryHistory {
                entries: vec![MemoryEntry {
                    url: url.to_string(),
                    state: None,
                }],
                cursor: 0,
                pushes: 0,
            }),
        }
    }

    /// Moves one entry back and returns the payload a popstate would carry,
    /// or `None` at the start of history.
    pub fn back(&self) -> Option<Option<Value>> {
        let mut history = self.history.borrow_mut();
        if history.cursor == 0 {
            return None;
        }
        history.cursor -= 1;
        Some(history.entries[history.cursor].state.clone())
    }

    pub fn forward(&self) -> Option<Option<Value>> {
        let mut history = self.history.borrow_mut();
        if history.cursor + 1 >= history.entries.len() {
            return None;
        }
        history.cursor += 1;
        Some(history.entries[history.cursor].state.clone())
    }

    pub fn current_url(&self) -> String {
        let history = self.history.borrow();
        history.entries[history.cursor].url.clone()
    }

    pub fn len(&self) -> usize {
        self.history.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push_count(&self) -> usize {
        self.history.borrow().pushes
    }

    fn split_url(&self) -> (String, String) {
        let url = self.current_url();
        match url.split_once('?') {
            Some((path, query)) => (path.to_string(), format!("?{query}")),
            None => (url, String::new()),
        }
    }
}

impl LocationHost for MemoryLocation {
    fn current_query(&self) -> String {
        self.split_url().1
    }

    fn current_path(&self) -> String {
        self.split_url().0
    }

    fn push_entry(&self, path: &str, state: &HistoryEntry) {
        let mut history = self.history.borrow_mut();
        let keep = history.cursor + 1;
        history.entries.truncate(keep);
        history.entries.push(MemoryEntry {
            url: path.to_string(),
            state: Some(state.to_value()),
        });
        history.cursor = history.entries.len() - 1;
        history.pushes += 1;
    }

    fn replace_entry(&self, path: &str, state: &HistoryEntry) {
        let mut history = self.history.borrow_mut();
        let cursor = history.cursor;
        history.entries[cursor] = MemoryEntry {
            url: path.to_string(),
            state: Some(state.to_value()),
        };
    }
}
