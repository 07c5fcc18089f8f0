//! External URL contract: links handed to evaluators by project owners must
//! keep resolving the same way.

use ahp_session_core::navigation::resolve_alias;
use ahp_session_core::{
    canonical_query, initialize_from_location, AccessGate, HistoryEntry, NavigationStateStore,
    SessionStatus, TabId, TAB_CATALOG,
};

#[test]
fn tab_alias_scenario() {
    let state = initialize_from_location("?tab=evaluators", "/", false);
    assert_eq!(state.active_tab.as_str(), "evaluator-management");
    assert_eq!(state.selected_entity_id, None);
}

#[test]
fn project_only_scenario() {
    let state = initialize_from_location("?project=42", "/", false);
    assert_eq!(state.active_tab, TabId::EVALUATOR_WORKFLOW);
    assert_eq!(state.selected_entity_id.as_deref(), Some("42"));
}

#[test]
fn evaluator_path_scenario() {
    for query in ["?token=abc123", "?token=abc123&tab=settings", "?tab=home&key=abc123"] {
        let state = initialize_from_location(query, "/evaluator", true);
        assert_eq!(state.active_tab, TabId::EVALUATOR_WORKFLOW, "{query}");
    }
}

#[test]
fn every_alias_resolves_from_the_query_string() {
    let aliases = [
        ("evaluators", "evaluator-management"),
        ("monitoring", "progress-monitoring"),
        ("analysis", "results-analysis"),
        ("ai-paper", "ai-paper-assistant"),
        ("export", "export-reports"),
        ("workshop", "workshop-management"),
        ("dss", "decision-support-system"),
        ("settings", "personal-settings"),
    ];
    for (alias, canonical) in aliases {
        let query = format!("?tab={alias}");
        assert_eq!(
            initialize_from_location(&query, "/", true).active_tab.as_str(),
            canonical
        );
        assert_eq!(resolve_alias(alias).map(|t| t.as_str()), Some(canonical));
    }
}

#[test]
fn set_tab_round_trips_through_url() {
    let mut store = NavigationStateStore::default();
    for entry in TAB_CATALOG {
        for entity in [None, Some("p-17")] {
            let change = store
                .set_tab(entry.id, entity, Some("Label"))
                .expect("catalogued tab");
            let query = canonical_query(&HistoryEntry::from(&change.state));
            let reparsed = initialize_from_location(&query, "/", true);
            assert_eq!(reparsed.active_tab, change.state.active_tab, "{query}");
            assert_eq!(
                reparsed.selected_entity_id, change.state.selected_entity_id,
                "{query}"
            );
        }
    }
}

#[test]
fn gate_matches_catalog_for_anonymous_and_authenticated() {
    let gate = AccessGate::default();
    for entry in TAB_CATALOG.iter().filter(|e| e.requires_auth) {
        let tab = TabId::parse(entry.id).expect("catalogued");
        assert!(!gate.decide(tab, SessionStatus::Anonymous).allow, "{tab}");
        assert!(gate.decide(tab, SessionStatus::Authenticated).allow, "{tab}");
    }
}
