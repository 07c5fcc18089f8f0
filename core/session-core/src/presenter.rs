//! Declarative session notification state.
//!
//! Translates clock events into `{ kind, remaining_ms }` for a status
//! indicator. Nothing here touches the UI; a presentation layer renders
//! [`Notification`] however it likes.

use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::{ClockEvent, TokenClock};
use crate::error::Result;
use crate::gateway::AuthGateway;
use crate::timers::{ScheduledTimer, TimerHandle, TimerHost, TimerKind};
use crate::types::Generation;

/// Default time the terminal "session expired" message stays up.
pub const DEFAULT_EXPIRY_GRACE_MS: u64 = 3_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    None,
    Warning,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub kind: NotificationKind,
    pub remaining_ms: i64,
}

pub struct SessionPresenter {
    timers: Rc<dyn TimerHost>,
    grace_ms: u64,
    notification: Notification,
    grace_timer: Option<TimerHandle>,
}

impl SessionPresenter {
    pub fn new(timers: Rc<dyn TimerHost>, grace_ms: u64) -> Self {
        SessionPresenter {
            timers,
            grace_ms,
            notification: Notification::default(),
            grace_timer: None,
        }
    }

    pub fn notification(&self) -> Notification {
        self.notification
    }

    pub fn handle(&mut self, event: ClockEvent, clock: &TokenClock) {
        match event {
            ClockEvent::Warning { generation } => self.on_warning(generation, clock),
            ClockEvent::Expired { generation } => self.on_expired(generation, clock),
        }
    }

    pub fn on_warning(&mut self, generation: Generation, clock: &TokenClock) {
        if generation != clock.generation() {
            debug!(generation, "Stale warning ignored");
            return;
        }
        if self.notification.kind == NotificationKind::Expired {
            return;
        }
        self.notification = Notification {
            kind: NotificationKind::Warning,
            remaining_ms: clock.remaining_ms(),
        };
    }

    pub fn on_expired(&mut self, generation: Generation, clock: &TokenClock) {
        if generation != clock.generation() {
            debug!(generation, "Stale expiry ignored");
            return;
        }
        if self.notification.kind == NotificationKind::Expired {
            debug!(generation, "Session already showing expired");
            return;
        }
        self.notification = Notification {
            kind: NotificationKind::Expired,
            remaining_ms: 0,
        };
        self.grace_timer = Some(self.timers.set_timeout(
            self.grace_ms,
            ScheduledTimer {
                kind: TimerKind::Grace,
                generation,
            },
        ));
    }

    /// Called when the grace timer elapses. Returns true exactly once per
    /// expiry; the caller then runs the application's expiry side effects.
    pub fn grace_elapsed(&mut self, generation: Generation, clock: &TokenClock) -> bool {
        if self.notification.kind != NotificationKind::Expired
            || self.grace_timer.is_none()
            || generation != clock.generation()
        {
            debug!(generation, "Grace timer ignored");
            return false;
        }
        self.grace_timer = None;
        self.notification = Notification::default();
        true
    }

    /// Re-reads the countdown while a warning is showing.
    pub fn refresh(&mut self, clock: &TokenClock) {
        if self.notification.kind == NotificationKind::Warning {
            self.notification.remaining_ms = clock.remaining_ms();
        }
    }

    /// Requests a fresh token and reschedules the clock.
    ///
    /// On refresh failure the warning stays up and the clock keeps its
    /// current schedule, so the user is never granted time the server did
    /// not.
    pub fn extend(
        &mut self,
        gateway: &dyn AuthGateway,
        clock: &mut TokenClock,
    ) -> Result<Vec<ClockEvent>> {
        let new_expiry = gateway.refresh_token().inspect_err(|err| {
            warn!(error = %err, "Token refresh failed; keeping current expiry");
        })?;
        Ok(self.complete_extend(new_expiry, clock))
    }

    /// Second half of [`Self::extend`] for hosts that refresh asynchronously.
    pub fn complete_extend(
        &mut self,
        new_expiry_ms: i64,
        clock: &mut TokenClock,
    ) -> Vec<ClockEvent> {
        self.dismiss();
        info!(new_expiry_ms, "Session extended");
        clock.extend(new_expiry_ms)
    }

    pub fn dismiss(&mut self) {
        if let Some(handle) = self.grace_timer.take() {
            self.timers.clear_timeout(handle);
        }
        self.notification = Notification::default();
    }
}
