use ahp_session_core::{
    canonical_query, initialize_from_location, is_direct_evaluator_link, AccessDecision,
    AccessGate, HistoryEntry, NavigationState, SessionStatus,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Resolution {
    navigation: NavigationState,
    canonical_query: String,
    evaluator_link: bool,
    status: SessionStatus,
    decision: AccessDecision,
}

pub fn run(path: &str, query: &str, authenticated: bool) -> Result<(), String> {
    let resolution = resolve(path, query, authenticated);
    let output = serde_json::to_string_pretty(&resolution)
        .map_err(|e| format!("Failed to serialize resolution: {}", e))?;
    println!("{}", output);
    Ok(())
}

fn resolve(path: &str, query: &str, authenticated: bool) -> Resolution {
    let status = if authenticated {
        SessionStatus::Authenticated
    } else {
        SessionStatus::Anonymous
    };
    let navigation = initialize_from_location(query, path, authenticated);
    let gate = AccessGate::from_location(query, path);
    Resolution {
        canonical_query: canonical_query(&HistoryEntry::from(&navigation)),
        evaluator_link: is_direct_evaluator_link(query, path),
        decision: gate.decide(navigation.active_tab, status),
        navigation,
        status,
    }
}
