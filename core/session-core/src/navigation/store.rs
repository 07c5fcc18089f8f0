//! In-memory navigation state.
//!
//! `set_tab` is the only mutator for application code and is the only
//! operation that produces a [`NavigationChange`]. `apply_external` is
//! reserved for history replay and produces nothing, which is what keeps
//! back/forward from pushing new entries.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::catalog::TabId;
use super::location::initialize_from_location;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub active_tab: TabId,
    pub selected_entity_id: Option<String>,
    pub selected_entity_label: String,
}

impl NavigationState {
    pub fn home() -> Self {
        NavigationState {
            active_tab: TabId::HOME,
            selected_entity_id: None,
            selected_entity_label: String::new(),
        }
    }
}

impl Default for NavigationState {
    fn default() -> Self {
        NavigationState::home()
    }
}

/// Emitted by [`NavigationStateStore::set_tab`]; consumed by the history bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationChange {
    pub state: NavigationState,
}

#[derive(Debug, Clone, Default)]
pub struct NavigationStateStore {
    state: NavigationState,
}

impl NavigationStateStore {
    pub fn new(state: NavigationState) -> Self {
        NavigationStateStore { state }
    }

    pub fn from_location(query: &str, pathname: &str, is_authenticated: bool) -> Self {
        Self::new(initialize_from_location(query, pathname, is_authenticated))
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn active_tab(&self) -> TabId {
        self.state.active_tab
    }

    pub fn selected_entity_id(&self) -> Option<&str> {
        self.state.selected_entity_id.as_deref()
    }

    pub fn selected_entity_label(&self) -> &str {
        &self.state.selected_entity_label
    }

    /// Moves to `tab` (a canonical catalog id). Unknown ids are rejected and
    /// leave the state untouched.
    pub fn set_tab(
        &mut self,
        tab: &str,
        entity_id: Option<&str>,
        entity_label: Option<&str>,
    ) -> Option<NavigationChange> {
        let Some(tab) = TabId::parse(tab) else {
            warn!(tab, "Rejecting navigation to unknown tab");
            return None;
        };
        Some(self.set_known_tab(tab, entity_id, entity_label))
    }

    pub fn set_known_tab(
        &mut self,
        tab: TabId,
        entity_id: Option<&str>,
        entity_label: Option<&str>,
    ) -> NavigationChange {
        self.state = NavigationState {
            active_tab: tab,
            selected_entity_id: entity_id.map(str::to_string),
            selected_entity_label: entity_label.unwrap_or_default().to_string(),
        };
        debug!(tab = %tab, entity = ?entity_id, "Navigation changed");
        NavigationChange {
            state: self.state.clone(),
        }
    }

    /// Replays a state from browser history without emitting a change.
    pub fn apply_external(&mut self, state: NavigationState) {
        debug!(tab = %state.active_tab, "Applying external navigation");
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_tab_emits_change_with_defaults() {
        let mut store = NavigationStateStore::default();
        let change = store
            .set_tab("results-analysis", Some("p-1"), None)
            .expect("known tab");
        assert_eq!(change.state.active_tab.as_str(), "results-analysis");
        assert_eq!(store.selected_entity_id(), Some("p-1"));
        assert_eq!(store.selected_entity_label(), "");
    }

    #[test]
    fn set_tab_rejects_unknown_ids_and_aliases() {
        let mut store = NavigationStateStore::from_location("?tab=export", "/", true);
        assert!(store.set_tab("does-not-exist", None, None).is_none());
        assert!(store.set_tab("dss", None, None).is_none());
        assert_eq!(store.active_tab().as_str(), "export-reports");
    }

    #[test]
    fn apply_external_replaces_state() {
        let mut store = NavigationStateStore::default();
        let replay = NavigationState {
            active_tab: TabId::EVALUATOR_WORKFLOW,
            selected_entity_id: Some("9".to_string()),
            selected_entity_label: "Survey".to_string(),
        };
        store.apply_external(replay.clone());
        assert_eq!(store.state(), &replay);
    }

    #[test]
    fn state_serializes_camel_case() {
        let json = serde_json::to_value(NavigationState::home()).expect("serialize");
        assert_eq!(json["activeTab"], "home");
        assert_eq!(json["selectedEntityId"], serde_json::Value::Null);
        assert_eq!(json["selectedEntityLabel"], "");
    }
}
