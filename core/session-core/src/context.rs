//! Application-root session context.
//!
//! Constructed once when the application mounts and passed down to
//! whatever needs session or navigation state. It owns the token clock,
//! the notification presenter, the navigation store and the history
//! bridge, and is the only place where clock events, popstate and access
//! decisions meet.
//!
//! ## Event flow
//!
//! - Host timer fires → [`SessionContext::handle_timer`] → clock or
//!   presenter → notification state.
//! - Application navigates → [`SessionContext::navigate`] → access gate →
//!   store → history push.
//! - Browser back/forward → [`SessionContext::pop_state`] → history replay
//!   (no push) → access gate (redirects replace, never push).
//!
//! Network effects (`logout`) are fire-and-forget: failures are logged and
//! never block a timer-driven transition.

use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::clock::{ClockEvent, TokenClock};
use crate::config::ClientConfig;
use crate::error::{Result, SessionError};
use crate::gate::{AccessDecision, AccessGate};
use crate::gateway::{AuthGateway, PersistedUserStore};
use crate::history::{HistoryBridge, LocationHost};
use crate::navigation::{NavigationState, NavigationStateStore, TabId};
use crate::presenter::{Notification, SessionPresenter};
use crate::time::Clock;
use crate::timers::{ScheduledTimer, TimerHost, TimerKind};
use crate::types::{Generation, SessionState, SessionStatus, User};

type ExpiredHook = Box<dyn FnMut()>;

pub struct SessionContext<G, S, L>
where
    G: AuthGateway,
    S: PersistedUserStore,
    L: LocationHost,
{
    gateway: G,
    users: S,
    location: L,
    clock: TokenClock,
    presenter: SessionPresenter,
    navigation: NavigationStateStore,
    history: HistoryBridge,
    gate: AccessGate,
    user: Option<User>,
    /// View the user asked for before being sent to login.
    resume: Option<NavigationState>,
    expired_hooks: Vec<ExpiredHook>,
}

impl<G, S, L> SessionContext<G, S, L>
where
    G: AuthGateway,
    S: PersistedUserStore,
    L: LocationHost,
{
    pub fn mount(
        config: &ClientConfig,
        gateway: G,
        users: S,
        location: L,
        clock: Rc<dyn Clock>,
        timers: Rc<dyn TimerHost>,
    ) -> Self {
        let query = location.current_query();
        let path = location.current_path();
        let token_expiry = if gateway.is_authenticated() {
            gateway.token_expiry_ms()
        } else {
            None
        };

        let navigation = NavigationStateStore::from_location(&query, &path, token_expiry.is_some());
        let gate = AccessGate::from_location(&query, &path);
        let mut history = HistoryBridge::new();
        history.seed(navigation.state(), &location);

        let user = if token_expiry.is_some() {
            users.load()
        } else {
            if let Err(err) = users.clear() {
                warn!(error = %err, "Failed to clear cached user without a session");
            }
            None
        };

        let mut context = SessionContext {
            clock: TokenClock::new(clock, timers.clone(), config.warning_lead_ms),
            presenter: SessionPresenter::new(timers, config.expiry_grace_ms),
            gateway,
            users,
            location,
            navigation,
            history,
            gate,
            user,
            resume: None,
            expired_hooks: Vec::new(),
        };

        if let Some(expiry) = token_expiry {
            let events = context.clock.start(expiry);
            context.route(events);
        }
        context.enforce_access();

        info!(
            tab = %context.navigation.active_tab(),
            status = %context.clock.status(),
            evaluator_link = context.gate.evaluator_link(),
            "Session context mounted"
        );
        context
    }

    /// Cancels every outstanding timer. The context is gone afterwards.
    pub fn unmount(mut self) {
        self.clock.cancel();
        self.presenter.dismiss();
        info!("Session context unmounted");
    }

    // ─────────────────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────────────────

    /// Navigates to a canonical tab id. Unknown ids are ignored and return
    /// `None`; denied tabs are remembered and the view moves to login.
    pub fn navigate(
        &mut self,
        tab: &str,
        entity_id: Option<&str>,
        entity_label: Option<&str>,
    ) -> Option<AccessDecision> {
        let Some(tab) = TabId::parse(tab) else {
            warn!(tab, "Ignoring navigation to unknown tab");
            return None;
        };

        let decision = self.gate.decide(tab, self.clock.status());
        if decision.allow {
            self.push(tab, entity_id, entity_label);
        } else {
            info!(requested = %tab, "Tab requires a session; redirecting to login");
            self.resume = Some(NavigationState {
                active_tab: tab,
                selected_entity_id: entity_id.map(str::to_string),
                selected_entity_label: entity_label.unwrap_or_default().to_string(),
            });
            self.push(decision.redirect_to, None, None);
        }
        Some(decision)
    }

    /// Browser popstate with the entry's state payload.
    pub fn pop_state(&mut self, payload: Option<&Value>) -> &NavigationState {
        let replayed = self.history.handle_pop_state(payload, &mut self.navigation);
        let decision = self.gate.decide(replayed.active_tab, self.clock.status());
        if !decision.allow {
            info!(requested = %replayed.active_tab, "Replayed tab requires a session");
            self.resume = Some(replayed);
            let login = NavigationState {
                active_tab: decision.redirect_to,
                ..NavigationState::home()
            };
            self.history.replace_current(&login, &self.location);
            self.navigation.apply_external(login);
        }
        self.navigation.state()
    }

    pub fn decide(&self, tab: TabId) -> AccessDecision {
        self.gate.decide(tab, self.clock.status())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────

    pub fn login(&mut self, user: User, token_expiry_ms: i64) {
        if let Err(err) = self.users.save(&user) {
            warn!(error = %err, "Failed to persist user");
        }
        info!(user_id = %user.id, "User signed in");
        self.user = Some(user);

        self.presenter.dismiss();
        let events = self.clock.start(token_expiry_ms);
        self.route(events);

        if let Some(target) = self.resume.take() {
            if self.gate.decide(target.active_tab, self.clock.status()).allow {
                debug!(tab = %target.active_tab, "Resuming requested tab after login");
                self.push(
                    target.active_tab,
                    target.selected_entity_id.as_deref(),
                    Some(target.selected_entity_label.as_str()),
                );
            }
        }
    }

    /// Explicit logout. Idempotent.
    pub fn logout(&mut self) {
        if self.clock.status() == SessionStatus::Anonymous && self.user.is_none() {
            debug!("Logout ignored; no session");
            return;
        }
        if let Err(err) = self.gateway.logout() {
            warn!(error = %err, "Logout request failed; ending local session anyway");
        }
        self.end_session();
        self.resume = None;

        if !self.decide(self.navigation.active_tab()).allow {
            self.push(TabId::HOME, None, None);
        }
        info!("User signed out");
    }

    /// Refreshes the token through the gateway. On failure the warning
    /// stays and the current expiry keeps running.
    pub fn extend(&mut self) -> Result<()> {
        if self.clock.status() == SessionStatus::Anonymous {
            return Err(SessionError::RefreshFailed {
                reason: "no active session".to_string(),
            });
        }
        let events = self.presenter.extend(&self.gateway, &mut self.clock)?;
        self.route(events);
        Ok(())
    }

    /// Completes an extension whose refresh the host performed itself.
    pub fn apply_refreshed_expiry(&mut self, token_expiry_ms: i64) {
        if self.clock.status() == SessionStatus::Anonymous {
            warn!("Refreshed token arrived after the session ended; ignoring");
            return;
        }
        let events = self.presenter.complete_extend(token_expiry_ms, &mut self.clock);
        self.route(events);
    }

    /// Delivers a timer scheduled through the injected [`TimerHost`].
    pub fn handle_timer(&mut self, timer: ScheduledTimer) {
        match timer.kind {
            TimerKind::Grace => {
                if self.presenter.grace_elapsed(timer.generation, &self.clock) {
                    self.finish_expiry();
                }
            }
            TimerKind::Warning | TimerKind::Expiry => {
                if let Some(event) = self.clock.fire(timer) {
                    self.route(vec![event]);
                }
            }
        }
    }

    /// Refreshes the warning countdown.
    pub fn tick(&mut self) {
        self.presenter.refresh(&self.clock);
    }

    /// Registers an application callback run once per expired session,
    /// after the grace delay.
    pub fn on_session_expired(&mut self, hook: impl FnMut() + 'static) {
        self.expired_hooks.push(Box::new(hook));
    }

    pub fn on_clock_warning(&mut self, listener: impl FnMut(Generation) + 'static) {
        self.clock.on_warning(listener);
    }

    pub fn on_clock_expired(&mut self, listener: impl FnMut(Generation) + 'static) {
        self.clock.on_expired(listener);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Read model
    // ─────────────────────────────────────────────────────────────────────

    pub fn navigation(&self) -> &NavigationState {
        self.navigation.state()
    }

    pub fn notification(&self) -> Notification {
        self.presenter.notification()
    }

    pub fn session(&self) -> &SessionState {
        self.clock.state()
    }

    pub fn status(&self) -> SessionStatus {
        self.clock.status()
    }

    pub fn remaining_ms(&self) -> i64 {
        self.clock.remaining_ms()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn resume_target(&self) -> Option<&NavigationState> {
        self.resume.as_ref()
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    pub fn users(&self) -> &S {
        &self.users
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn route(&mut self, events: Vec<ClockEvent>) {
        for event in events {
            self.presenter.handle(event, &self.clock);
        }
    }

    fn push(&mut self, tab: TabId, entity_id: Option<&str>, entity_label: Option<&str>) {
        let change = self.navigation.set_known_tab(tab, entity_id, entity_label);
        self.history.on_internal_change(&change, &self.location);
    }

    /// Redirects the initial view if the session does not permit it. The
    /// loaded entry is replaced so the denied URL does not stay on the
    /// back stack.
    fn enforce_access(&mut self) {
        let current = self.navigation.state().clone();
        let decision = self.gate.decide(current.active_tab, self.clock.status());
        if decision.allow {
            return;
        }
        info!(requested = %current.active_tab, "Initial tab requires a session");
        self.resume = Some(current);
        let login = NavigationState {
            active_tab: decision.redirect_to,
            ..NavigationState::home()
        };
        self.history.replace_current(&login, &self.location);
        self.navigation.apply_external(login);
    }

    fn end_session(&mut self) {
        self.clock.reset();
        self.presenter.dismiss();
        if let Err(err) = self.users.clear() {
            warn!(error = %err, "Failed to clear cached user");
        }
        self.user = None;
    }

    fn finish_expiry(&mut self) {
        if let Err(err) = self.gateway.logout() {
            warn!(error = %err, "Logout after expiry failed");
        }
        self.end_session();
        for hook in &mut self.expired_hooks {
            hook();
        }

        let current = self.navigation.state().clone();
        if !self.decide(current.active_tab).allow {
            self.resume = Some(current);
            self.push(TabId::LOGIN, None, None);
        }
        info!("Session expiry completed");
    }
}
