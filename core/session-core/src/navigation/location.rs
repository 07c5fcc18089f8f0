//! Pure mapping between a browser location and a [`NavigationState`].
//!
//! Both the initial load and history replay parse through
//! [`initialize_from_location`], so the two entry points cannot drift.
//!
//! # Parsing rules (priority order)
//!
//! 1. Path containing `/evaluator`, an `eval` parameter, or a `project`
//!    parameter without a recognised `tab` selects `evaluator-workflow`
//!    with `eval ?? project` as the entity.
//! 2. `tab` is resolved through the alias table, then the catalog.
//! 3. Anything unrecognised falls back to `home`.
//!
//! A `project` parameter next to a recognised `tab` is the selected entity
//! of that tab, which is what makes [`canonical_query`] round-trip.

use url::form_urlencoded;

use super::catalog::{self, TabId};
use super::store::NavigationState;
use crate::history::HistoryEntry;

/// Query parameters the client understands. First occurrence wins; empty
/// values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationQuery {
    pub tab: Option<String>,
    pub project: Option<String>,
    pub eval: Option<String>,
    /// `token`, or its older spelling `key`.
    pub token: Option<String>,
}

impl LocationQuery {
    pub fn parse(query: &str) -> Self {
        let raw = query.strip_prefix('?').unwrap_or(query);
        let mut parsed = LocationQuery::default();

        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                "tab" => &mut parsed.tab,
                "project" => &mut parsed.project,
                "eval" => &mut parsed.eval,
                "token" | "key" => &mut parsed.token,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        parsed
    }
}

pub fn initialize_from_location(
    query: &str,
    pathname: &str,
    is_authenticated: bool,
) -> NavigationState {
    let params = LocationQuery::parse(query);
    let explicit_tab = params.tab.as_deref().and_then(catalog::lookup);

    let evaluator_link = pathname.contains("/evaluator")
        || params.eval.is_some()
        || (params.project.is_some() && explicit_tab.is_none());

    let state = if evaluator_link {
        NavigationState {
            active_tab: TabId::EVALUATOR_WORKFLOW,
            selected_entity_id: params.eval.or(params.project),
            selected_entity_label: String::new(),
        }
    } else {
        NavigationState {
            active_tab: explicit_tab.unwrap_or(TabId::HOME),
            selected_entity_id: params.project,
            selected_entity_label: String::new(),
        }
    };

    tracing::trace!(
        query,
        pathname,
        is_authenticated,
        tab = %state.active_tab,
        "Resolved location"
    );
    state
}

/// True when the location is a one-off evaluator link that must work
/// without an account.
pub fn is_direct_evaluator_link(query: &str, pathname: &str) -> bool {
    let params = LocationQuery::parse(query);
    pathname.contains("/evaluator")
        || params.eval.is_some()
        || params.project.is_some()
        || params.token.is_some()
}

/// `tab=<id>` followed by `&project=<id>` when an entity is selected.
pub fn canonical_query(entry: &HistoryEntry) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.append_pair("tab", entry.tab.as_str());
    if let Some(entity_id) = entry.entity_id.as_deref() {
        serializer.append_pair("project", entity_id);
    }
    serializer.finish()
}
