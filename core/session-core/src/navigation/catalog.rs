//! Static tab catalog.
//!
//! A [`TabId`] can only be obtained from this table, so every tab that ever
//! appears in a navigation state has an entry here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabEntry {
    pub id: &'static str,
    pub requires_auth: bool,
    /// External short name accepted in `?tab=`.
    pub url_alias: Option<&'static str>,
}

const fn tab(id: &'static str, requires_auth: bool, url_alias: Option<&'static str>) -> TabEntry {
    TabEntry {
        id,
        requires_auth,
        url_alias,
    }
}

pub const TAB_CATALOG: &[TabEntry] = &[
    tab("home", false, None),
    tab("login", false, None),
    tab("register", false, None),
    tab("user-guide", false, None),
    tab("evaluator-workflow", true, None),
    tab("personal-service", true, None),
    tab("my-projects", true, None),
    tab("project-creation", true, None),
    tab("model-builder", true, None),
    tab("evaluator-management", true, Some("evaluators")),
    tab("progress-monitoring", true, Some("monitoring")),
    tab("results-analysis", true, Some("analysis")),
    tab("ai-paper-assistant", true, Some("ai-paper")),
    tab("export-reports", true, Some("export")),
    tab("workshop-management", true, Some("workshop")),
    tab("decision-support-system", true, Some("dss")),
    tab("personal-settings", true, Some("settings")),
    tab("evaluator-dashboard", true, None),
    tab("super-admin", true, None),
];

/// Identifier of a catalogued tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(&'static str);

impl TabId {
    pub const HOME: TabId = TabId("home");
    pub const LOGIN: TabId = TabId("login");
    pub const EVALUATOR_WORKFLOW: TabId = TabId("evaluator-workflow");

    /// Looks up a canonical id. Aliases are not accepted here.
    pub fn parse(raw: &str) -> Option<TabId> {
        TAB_CATALOG
            .iter()
            .find(|entry| entry.id == raw)
            .map(|entry| TabId(entry.id))
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    pub fn entry(&self) -> &'static TabEntry {
        TAB_CATALOG
            .iter()
            .find(|entry| entry.id == self.0)
            .unwrap_or(&TAB_CATALOG[0])
    }

    pub fn requires_auth(&self) -> bool {
        self.entry().requires_auth
    }
}

/// Maps an external short name (`evaluators`, `dss`, ...) to its tab.
pub fn resolve_alias(alias: &str) -> Option<TabId> {
    TAB_CATALOG
        .iter()
        .find(|entry| entry.url_alias == Some(alias))
        .map(|entry| TabId(entry.id))
}

/// Resolves a raw `?tab=` value: alias first, then canonical id.
pub fn lookup(raw: &str) -> Option<TabId> {
    resolve_alias(raw).or_else(|| TabId::parse(raw))
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl FromStr for TabId {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(s).ok_or_else(|| SessionError::UnknownTab(s.to_string()))
    }
}

impl Serialize for TabId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

impl<'de> Deserialize<'de> for TabId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TabId::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown tab id: {raw}")))
    }
}
