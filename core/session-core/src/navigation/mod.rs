//! URL-synchronized navigation: the tab catalog, location parsing and the
//! navigation state store.

pub mod catalog;
pub mod location;
pub mod store;

pub use catalog::{lookup, resolve_alias, TabEntry, TabId, TAB_CATALOG};
pub use location::{
    canonical_query, initialize_from_location, is_direct_evaluator_link, LocationQuery,
};
pub use store::{NavigationChange, NavigationState, NavigationStateStore};
