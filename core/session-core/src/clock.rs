//! Token lifecycle clock.
//!
//! Owns [`SessionState`] and schedules at most one warning timer and one
//! expiry timer for the current token. Every `start`/`extend` bumps the
//! generation before scheduling, so a timer that fired before its
//! cancellation landed is recognized as stale in [`TokenClock::fire`].
//!
//! | `delta = expiry - now` | effect                                           |
//! |------------------------|--------------------------------------------------|
//! | `delta <= 0`           | `expired` fires synchronously                    |
//! | `0 < delta <= W`       | `warning` fires synchronously, expiry at `delta` |
//! | `delta > W`            | warning at `delta - W`, expiry at `delta`        |

use std::rc::Rc;

use tracing::{debug, info};

use crate::time::Clock;
use crate::timers::{ScheduledTimer, TimerHandle, TimerHost, TimerKind};
use crate::types::{Generation, SessionState, SessionStatus};

/// Default warning lead time (5 minutes).
pub const DEFAULT_WARNING_LEAD_MS: u64 = 5 * 60 * 1000;

type Listener = Box<dyn FnMut(Generation)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    Warning { generation: Generation },
    Expired { generation: Generation },
}

impl ClockEvent {
    pub fn generation(&self) -> Generation {
        match self {
            ClockEvent::Warning { generation } | ClockEvent::Expired { generation } => *generation,
        }
    }
}

pub struct TokenClock {
    clock: Rc<dyn Clock>,
    timers: Rc<dyn TimerHost>,
    warning_lead_ms: i64,
    state: SessionState,
    pending_warning: Option<TimerHandle>,
    pending_expiry: Option<TimerHandle>,
    warning_listeners: Vec<Listener>,
    expired_listeners: Vec<Listener>,
}

impl TokenClock {
    pub fn new(clock: Rc<dyn Clock>, timers: Rc<dyn TimerHost>, warning_lead_ms: u64) -> Self {
        TokenClock {
            clock,
            timers,
            warning_lead_ms: i64::try_from(warning_lead_ms).unwrap_or(i64::MAX),
            state: SessionState::default(),
            pending_warning: None,
            pending_expiry: None,
            warning_listeners: Vec::new(),
            expired_listeners: Vec::new(),
        }
    }

    /// Schedules warning and expiry for a token expiring at `expiry_epoch_ms`.
    ///
    /// Returns the events that fired synchronously, in firing order.
    pub fn start(&mut self, expiry_epoch_ms: i64) -> Vec<ClockEvent> {
        self.clear_pending();
        self.state.generation += 1;
        self.state.token_expiry_epoch_ms = Some(expiry_epoch_ms);
        self.state.status = SessionStatus::Authenticated;

        let generation = self.state.generation;
        let delta = expiry_epoch_ms.saturating_sub(self.clock.now_ms());
        info!(generation, delta_ms = delta, "Token clock started");

        if delta <= 0 {
            return self.emit_expired(generation).into_iter().collect();
        }

        let mut fired = Vec::new();
        if delta > self.warning_lead_ms {
            self.pending_warning = Some(self.schedule(
                delta - self.warning_lead_ms,
                TimerKind::Warning,
                generation,
            ));
        } else {
            fired.extend(self.emit_warning(generation));
        }
        self.pending_expiry = Some(self.schedule(delta, TimerKind::Expiry, generation));
        fired
    }

    /// `cancel()` followed by `start(new_expiry_epoch_ms)`.
    pub fn extend(&mut self, new_expiry_epoch_ms: i64) -> Vec<ClockEvent> {
        self.cancel();
        self.start(new_expiry_epoch_ms)
    }

    /// Clears pending timers without firing them. Status is unchanged.
    pub fn cancel(&mut self) {
        self.clear_pending();
    }

    /// Ends the session: cancels timers and returns to `Anonymous`.
    pub fn reset(&mut self) {
        self.clear_pending();
        self.state.status = SessionStatus::Anonymous;
        self.state.token_expiry_epoch_ms = None;
        info!(generation = self.state.generation, "Token clock reset");
    }

    /// Handles a timer delivered by the host. Stale or out-of-state timers
    /// return `None`.
    pub fn fire(&mut self, timer: ScheduledTimer) -> Option<ClockEvent> {
        if timer.generation != self.state.generation {
            debug!(
                timer_generation = timer.generation,
                current_generation = self.state.generation,
                kind = ?timer.kind,
                "Ignoring stale timer"
            );
            return None;
        }

        match timer.kind {
            TimerKind::Warning => {
                self.pending_warning = None;
                self.emit_warning(timer.generation)
            }
            TimerKind::Expiry => {
                self.pending_expiry = None;
                self.emit_expired(timer.generation)
            }
            TimerKind::Grace => None,
        }
    }

    /// `max(0, expiry - now)`, or 0 without a session.
    pub fn remaining_ms(&self) -> i64 {
        if self.state.status == SessionStatus::Anonymous {
            return 0;
        }
        self.state
            .token_expiry_epoch_ms
            .map(|expiry| expiry.saturating_sub(self.clock.now_ms()).max(0))
            .unwrap_or(0)
    }

    pub fn on_warning(&mut self, listener: impl FnMut(Generation) + 'static) {
        self.warning_listeners.push(Box::new(listener));
    }

    pub fn on_expired(&mut self, listener: impl FnMut(Generation) + 'static) {
        self.expired_listeners.push(Box::new(listener));
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status
    }

    pub fn generation(&self) -> Generation {
        self.state.generation
    }

    pub fn has_pending_timers(&self) -> bool {
        self.pending_warning.is_some() || self.pending_expiry.is_some()
    }

    fn schedule(&self, delay_ms: i64, kind: TimerKind, generation: Generation) -> TimerHandle {
        let delay = u64::try_from(delay_ms).unwrap_or(0);
        debug!(?kind, generation, delay_ms = delay, "Scheduling timer");
        self.timers
            .set_timeout(delay, ScheduledTimer { kind, generation })
    }

    fn clear_pending(&mut self) {
        if let Some(handle) = self.pending_warning.take() {
            self.timers.clear_timeout(handle);
        }
        if let Some(handle) = self.pending_expiry.take() {
            self.timers.clear_timeout(handle);
        }
    }

    fn emit_warning(&mut self, generation: Generation) -> Option<ClockEvent> {
        if self.state.status != SessionStatus::Authenticated {
            debug!(status = %self.state.status, "Warning ignored outside Authenticated");
            return None;
        }
        self.state.status = SessionStatus::Expiring;
        info!(generation, "Session entering warning window");
        for listener in &mut self.warning_listeners {
            listener(generation);
        }
        Some(ClockEvent::Warning { generation })
    }

    fn emit_expired(&mut self, generation: Generation) -> Option<ClockEvent> {
        if !self.state.status.is_signed_in() {
            debug!(status = %self.state.status, "Expiry ignored, session already ended");
            return None;
        }
        if let Some(handle) = self.pending_warning.take() {
            self.timers.clear_timeout(handle);
        }
        self.state.status = SessionStatus::Expired;
        info!(generation, "Session expired");
        for listener in &mut self.expired_listeners {
            listener(generation);
        }
        Some(ClockEvent::Expired { generation })
    }
}
