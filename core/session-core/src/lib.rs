//! # ahp-session-core
//!
//! Session lifecycle and URL-synchronized navigation for the AHP
//! decision-support client.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Timers and network calls
//!   are supplied by the host through [`TimerHost`] and [`AuthGateway`].
//! - **Single-threaded**: Shared collaborators live behind `Rc`; hosts that
//!   need threads provide their own synchronization.
//! - **Declarative output**: The core exposes state ([`Notification`],
//!   [`NavigationState`]) and never touches the UI.
//! - **Graceful degradation**: Unknown tabs, stale timers and corrupt
//!   history payloads fall back to safe defaults instead of failing.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use ahp_session_core::{ClientConfig, SessionContext, SystemClock};
//!
//! let mut context = SessionContext::mount(
//!     &ClientConfig::default(),
//!     gateway,
//!     user_store,
//!     location,
//!     Rc::new(SystemClock),
//!     timers,
//! );
//! context.navigate("my-projects", None, None);
//! ```

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod gate;
pub mod gateway;
pub mod history;
pub mod navigation;
pub mod presenter;
pub mod time;
pub mod timers;
pub mod types;

pub use clock::{ClockEvent, TokenClock, DEFAULT_WARNING_LEAD_MS};
pub use config::{default_config_path, load_config, save_config, ClientConfig};
pub use context::SessionContext;
pub use error::{Result, SessionError};
pub use gate::{AccessDecision, AccessGate};
pub use gateway::{AuthGateway, JsonFileUserStore, MemoryUserStore, PersistedUserStore};
pub use history::{HistoryBridge, HistoryEntry, LocationHost, MemoryLocation};
pub use navigation::{
    canonical_query, initialize_from_location, is_direct_evaluator_link, NavigationChange,
    NavigationState, NavigationStateStore, TabEntry, TabId, TAB_CATALOG,
};
pub use presenter::{Notification, NotificationKind, SessionPresenter, DEFAULT_EXPIRY_GRACE_MS};
pub use time::{Clock, ManualClock, SystemClock};
pub use timers::{ManualTimers, ScheduledTimer, TimerHandle, TimerHost, TimerKind};
pub use types::{Generation, SessionState, SessionStatus, User, UserRole};
