//! Per-tab access decisions.

use serde::Serialize;

use crate::navigation::{is_direct_evaluator_link, TabId, TAB_CATALOG};
use crate::types::SessionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub allow: bool,
    pub redirect_to: TabId,
}

/// Decides whether a tab may be entered with the current session.
///
/// `home` is always public. `evaluator-workflow` is public when the page
/// was opened through an evaluator link (`/evaluator`, `eval`, `project`,
/// `token`/`key`), so anonymous evaluators can finish their comparisons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessGate {
    evaluator_link: bool,
}

impl AccessGate {
    pub fn new(evaluator_link: bool) -> Self {
        AccessGate { evaluator_link }
    }

    pub fn from_location(query: &str, pathname: &str) -> Self {
        Self::new(is_direct_evaluator_link(query, pathname))
    }

    pub fn evaluator_link(&self) -> bool {
        self.evaluator_link
    }

    pub fn decide(&self, tab: TabId, status: SessionStatus) -> AccessDecision {
        let public = tab == TabId::HOME
            || (tab == TabId::EVALUATOR_WORKFLOW && self.evaluator_link)
            || !tab.requires_auth();

        if public || status.is_signed_in() {
            AccessDecision {
                allow: true,
                redirect_to: tab,
            }
        } else {
            AccessDecision {
                allow: false,
                redirect_to: TabId::LOGIN,
            }
        }
    }

    /// Tabs reachable with `status`, in catalog order.
    pub fn reachable(&self, status: SessionStatus) -> Vec<TabId> {
        TAB_CATALOG
            .iter()
            .filter_map(|entry| TabId::parse(entry.id))
            .filter(|tab| self.decide(*tab, status).allow)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protected_tabs() -> Vec<TabId> {
        TAB_CATALOG
            .iter()
            .filter(|entry| entry.requires_auth)
            .filter_map(|entry| TabId::parse(entry.id))
            .collect()
    }

    #[test]
    fn anonymous_is_denied_every_protected_tab() {
        let gate = AccessGate::default();
        for tab in protected_tabs() {
            let decision = gate.decide(tab, SessionStatus::Anonymous);
            assert!(!decision.allow, "{tab} should be denied");
            assert_eq!(decision.redirect_to, TabId::LOGIN);
        }
    }

    #[test]
    fn authenticated_is_allowed_every_protected_tab() {
        let gate = AccessGate::default();
        for tab in protected_tabs() {
            assert_eq!(
                gate.decide(tab, SessionStatus::Authenticated),
                AccessDecision {
                    allow: true,
                    redirect_to: tab
                }
            );
        }
    }

    #[test]
    fn expired_session_is_treated_as_anonymous() {
        let gate = AccessGate::default();
        let tab = TabId::parse("my-projects").expect("catalogued");
        assert!(!gate.decide(tab, SessionStatus::Expired).allow);
        assert!(gate.decide(tab, SessionStatus::Expiring).allow);
    }

    #[test]
    fn home_is_always_public() {
        let gate = AccessGate::default();
        assert!(gate.decide(TabId::HOME, SessionStatus::Anonymous).allow);
        assert!(gate.decide(TabId::HOME, SessionStatus::Expired).allow);
    }

    #[test]
    fn evaluator_workflow_public_only_through_link() {
        let linked = AccessGate::from_location("?eval=12", "/");
        assert!(linked.evaluator_link());
        assert!(linked
            .decide(TabId::EVALUATOR_WORKFLOW, SessionStatus::Anonymous)
            .allow);

        let token_link = AccessGate::from_location("?token=abc123", "/evaluator");
        assert!(token_link
            .decide(TabId::EVALUATOR_WORKFLOW, SessionStatus::Anonymous)
            .allow);

        let plain = AccessGate::from_location("?tab=evaluator-workflow", "/");
        assert!(!plain
            .decide(TabId::EVALUATOR_WORKFLOW, SessionStatus::Anonymous)
            .allow);
    }

    #[test]
    fn evaluator_link_does_not_open_other_tabs() {
        let gate = AccessGate::new(true);
        let tab = TabId::parse("super-admin").expect("catalogued");
        assert!(!gate.decide(tab, SessionStatus::Anonymous).allow);
    }

    #[test]
    fn reachable_lists_public_tabs_for_anonymous() {
        let reachable = AccessGate::default().reachable(SessionStatus::Anonymous);
        let ids: Vec<_> = reachable.iter().map(|t| t.as_str()).collect();
        assert_eq!(ids, vec!["home", "login", "register", "user-guide"]);
    }
}
