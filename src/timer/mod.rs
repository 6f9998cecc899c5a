// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Delayed-trigger items.
//!
//! A [`TimerItem`] drives a target item through a delayed on / automatic
//! off sequence. Writing an "on" value (`"on"`, `"ON"` or `"1"`) to the
//! timer activates it; every further "on" write refreshes the activation.
//! Any other value switches both the timer and its target off.
//!
//! # Lifecycle
//!
//! ```text
//!   Idle ──on──▶ Pending ──on_after──▶ Driving ──no refresh for off_after──▶ Idle
//!    ▲              │                     │
//!    └──stale / off─┘◀─────── off ────────┘
//! ```
//!
//! - **Idle**: timer value is `OFF`, no session task.
//! - **Pending**: timer value is `ON`, the session waits for `on_after`.
//!   If no refresh arrives within `timeout`, the activation is abandoned.
//! - **Driving**: the target holds `on_state`. Once refreshes stop for
//!   `timeout`, the timer value counts down the whole seconds left until
//!   `off_after` past the last refresh, then the timer goes back to Idle.
//!
//! One tokio task supervises each activation. It ticks every
//! [`TICK_PERIOD`]; missed ticks are not replayed, so scheduler delays only
//! postpone the countdown.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use hasc::item::{Item, SwitchItem, OFF, ON};
//! use hasc::timer::{TimerItem, TimerOptions};
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() -> hasc::Result<()> {
//! let light = Arc::new(SwitchItem::new("light", "Light"));
//! let timer = TimerItem::new(
//!     "light_timer",
//!     "Light timer",
//!     light.clone(),
//!     TimerOptions::new().with_off_after(Duration::from_secs(60)),
//! )?;
//!
//! // Motion detected.
//! timer.set_value(ON);
//! tokio::time::sleep(Duration::from_millis(10)).await;
//! assert_eq!(light.value(), ON);
//!
//! // No more motion: the light goes off a minute later.
//! timer.wait_idle().await;
//! assert_eq!(light.value(), OFF);
//! # Ok(())
//! # }
//! ```

mod options;

use std::cell::RefCell;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};
use tokio::time::{self, Instant, MissedTickBehavior};

pub use options::{DEFAULT_TIMEOUT, TimerOptions};

use crate::error::{Error, Result};
use crate::item::{BaseItem, Item, OFF, ON, ValueUpdate, is_on_command};

/// Period of the session tick driving staleness checks and the countdown.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// A running activation.
#[derive(Debug)]
struct Session {
    id: u64,
    cancel: oneshot::Sender<()>,
}

#[derive(Debug)]
struct Sessions {
    /// Time of the last "on" write.
    last_update: Instant,
    current: Option<Session>,
    next_id: u64,
}

impl Sessions {
    fn is_current(&self, id: u64) -> bool {
        self.current.as_ref().is_some_and(|session| session.id == id)
    }
}

/// Held while the timer inspects its sessions and writes its own value.
///
/// Reentrant so listeners of the timer may write back to it. A `RefCell`
/// borrow is never held across a `set_value` call.
type SessionsGuard<'a> = ReentrantMutexGuard<'a, RefCell<Sessions>>;

/// An item that switches a target item on after a delay and back off once
/// it stops being refreshed.
#[derive(Debug)]
pub struct TimerItem {
    base: BaseItem,
    target: Arc<dyn Item>,
    options: TimerOptions,
    sessions: ReentrantMutex<RefCell<Sessions>>,
    /// `true` while a session exists.
    active: watch::Sender<bool>,
    runtime: Handle,
    this: Weak<TimerItem>,
}

impl TimerItem {
    /// Creates an idle timer driving `target`, running its sessions on the
    /// current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRuntime`] when called outside of a tokio runtime.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        target: Arc<dyn Item>,
        options: TimerOptions,
    ) -> Result<Arc<Self>> {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        Ok(Self::with_runtime(id, label, target, options, runtime))
    }

    /// Creates an idle timer running its sessions on `runtime`.
    #[must_use]
    pub fn with_runtime(
        id: impl Into<String>,
        label: impl Into<String>,
        target: Arc<dyn Item>,
        options: TimerOptions,
        runtime: Handle,
    ) -> Arc<Self> {
        let base = BaseItem::new(id)
            .with_label(label)
            .with_kind("timer")
            .with_img("timer");
        base.set_value(OFF);

        let (active, _) = watch::channel(false);

        Arc::new_cyclic(|this| Self {
            base,
            target,
            options: options.normalized(),
            sessions: ReentrantMutex::new(RefCell::new(Sessions {
                last_update: Instant::now(),
                current: None,
                next_id: 1,
            })),
            active,
            runtime,
            this: this.clone(),
        })
    }

    /// Returns the item this timer drives.
    #[must_use]
    pub fn target(&self) -> &Arc<dyn Item> {
        &self.target
    }

    /// Returns the effective options, defaults applied.
    #[must_use]
    pub fn options(&self) -> &TimerOptions {
        &self.options
    }

    /// Returns `true` while an activation is being supervised.
    #[must_use]
    pub fn is_active(&self) -> bool {
        *self.active.borrow()
    }

    /// Waits until no activation is being supervised.
    ///
    /// Returns immediately if the timer is idle. When it returns after a
    /// session ended, the off transition has already been applied.
    pub async fn wait_idle(&self) {
        let mut active = self.active.subscribe();
        let _ = active.wait_for(|active| !*active).await;
    }

    fn on(&self) -> ValueUpdate {
        tracing::info!(timer = %self.base.id(), "Timer set to ON");

        let guard = self.sessions.lock();
        let update = self.base.set_value(ON);
        let now = Instant::now();

        // A listener of the timer may have switched it off again.
        let still_on = self.base.value() == ON;

        let started = {
            let mut sessions = guard.borrow_mut();
            sessions.last_update = now;

            match self.this.upgrade() {
                Some(this) if still_on && update.old != ON && sessions.current.is_none() => {
                    let (cancel, cancelled) = oneshot::channel();
                    let id = sessions.next_id;
                    sessions.next_id += 1;
                    sessions.current = Some(Session { id, cancel });
                    Some((this, id, cancelled))
                }
                _ => None,
            }
        };
        if started.is_some() {
            self.active.send_replace(true);
        }
        drop(guard);

        // The target may be shared with another timer.
        if self.target.value() == ON {
            self.target.set_value(ON);
        }

        if let Some((this, id, cancelled)) = started {
            tracing::debug!(timer = %self.base.id(), session = id, "Starting timer session");
            self.runtime.spawn(this.run(id, now, cancelled));
        }

        update
    }

    fn off(&self) -> ValueUpdate {
        let guard = self.sessions.lock();
        let session = guard.borrow_mut().current.take();
        if let Some(session) = session {
            tracing::debug!(timer = %self.base.id(), session = session.id, "Cancelling timer session");
            let _ = session.cancel.send(());
        }

        self.switch_off(guard)
    }

    /// Writes the off states, then publishes whether a session still exists.
    ///
    /// The timer value is written before `guard` is released, so no session
    /// can slip in between the caller's session change and the write.
    fn switch_off(&self, guard: SessionsGuard<'_>) -> ValueUpdate {
        tracing::info!(timer = %self.base.id(), "Timer set to OFF");

        let update = self.base.set_value(OFF);
        drop(guard);

        self.target.set_value(&self.options.off_state);

        let guard = self.sessions.lock();
        self.active.send_replace(guard.borrow().current.is_some());

        update
    }

    fn is_current(&self, id: u64) -> bool {
        self.sessions.lock().borrow().is_current(id)
    }

    /// Returns the last refresh time while session `id` is the current one.
    fn last_update_of(&self, id: u64) -> Option<Instant> {
        let guard = self.sessions.lock();
        let sessions = guard.borrow();
        sessions.is_current(id).then_some(sessions.last_update)
    }

    /// Supervises one activation until it goes stale, elapses or is
    /// cancelled.
    async fn run(self: Arc<Self>, id: u64, start: Instant, mut cancelled: oneshot::Receiver<()>) {
        let on_after = time::sleep_until(start + self.options.on_after);
        tokio::pin!(on_after);

        let mut tick = time::interval_at(start + TICK_PERIOD, TICK_PERIOD);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut fired = false;

        loop {
            tokio::select! {
                biased;

                _ = &mut cancelled => {
                    tracing::debug!(timer = %self.base.id(), session = id, "Timer session cancelled");
                    return;
                }
                () = &mut on_after, if !fired => {
                    if !self.is_current(id) {
                        return;
                    }
                    tracing::debug!(timer = %self.base.id(), session = id, "Timer fired");
                    self.target.set_value(&self.options.on_state);
                    fired = true;
                }
                _ = tick.tick() => {
                    if !self.on_tick(id, fired) {
                        break;
                    }
                }
            }
        }

        self.finish(id);
    }

    /// Returns `false` once the session must end.
    fn on_tick(&self, id: u64, fired: bool) -> bool {
        let Some(last_update) = self.last_update_of(id) else {
            return false;
        };

        let now = Instant::now();
        if now < last_update + self.options.timeout {
            return true;
        }

        if !fired {
            tracing::debug!(timer = %self.base.id(), session = id, "Timer activation abandoned");
            return false;
        }

        if self.target.value() != self.options.on_state {
            self.target.set_value(&self.options.on_state);
        }

        let deadline = last_update + self.options.off_after;
        if now > deadline {
            return false;
        }
        let remaining = (deadline - now).as_secs().to_string();

        // Listeners of the target may have switched the timer off or
        // refreshed it during the write above.
        let guard = self.sessions.lock();
        {
            let sessions = guard.borrow();
            if !sessions.is_current(id) {
                return false;
            }
            if sessions.last_update != last_update {
                return true;
            }
        }
        self.base.set_value(&remaining);

        true
    }

    /// Ends session `id`, unless another call already replaced or cancelled it.
    fn finish(&self, id: u64) {
        let guard = self.sessions.lock();
        let session = guard
            .borrow_mut()
            .current
            .take_if(|session| session.id == id);

        if session.is_some() {
            tracing::debug!(timer = %self.base.id(), session = id, "Timer session ended");
            self.switch_off(guard);
        }
    }
}

impl Item for TimerItem {
    fn base(&self) -> &BaseItem {
        &self.base
    }

    fn set_value(&self, value: &str) -> ValueUpdate {
        if is_on_command(value) {
            self.on()
        } else {
            self.off()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{CallbackListener, SwitchItem};
    use tokio::time::sleep;

    fn options(on_after_ms: u64, off_after_ms: u64, timeout_ms: u64) -> TimerOptions {
        TimerOptions::new()
            .with_on_after(Duration::from_millis(on_after_ms))
            .with_off_after(Duration::from_millis(off_after_ms))
            .with_timeout(Duration::from_millis(timeout_ms))
    }

    fn target() -> Arc<BaseItem> {
        let target = Arc::new(BaseItem::new("target"));
        target.set_value(OFF);
        target
    }

    #[test]
    fn new_requires_runtime() {
        let result = TimerItem::new("t", "Timer", target(), TimerOptions::default());
        assert!(matches!(result, Err(Error::NoRuntime)));
    }

    #[tokio::test]
    async fn new_timer_is_idle() {
        let target = target();
        let timer = TimerItem::new("t", "Timer", target.clone(), TimerOptions::default()).unwrap();

        assert_eq!(timer.value(), OFF);
        assert_eq!(timer.kind(), "timer");
        assert_eq!(timer.img(), "timer");
        assert!(!timer.is_active());
        assert_eq!(timer.target().id(), "target");
        assert_eq!(target.value(), OFF);
    }

    #[tokio::test]
    async fn options_are_normalized() {
        let timer = TimerItem::new(
            "t",
            "Timer",
            target(),
            TimerOptions::new().with_timeout(Duration::ZERO).with_on_state(""),
        )
        .unwrap();

        assert_eq!(timer.options().timeout, DEFAULT_TIMEOUT);
        assert_eq!(timer.options().on_state, ON);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_on_with_keep_alive_then_auto_off() {
        let target = target();
        let timer = TimerItem::new("t", "Timer", target.clone(), options(1000, 2000, 500)).unwrap();

        timer.set_value(ON);
        assert_eq!(target.value(), OFF);
        assert!(timer.is_active());

        sleep(Duration::from_millis(600)).await;
        timer.set_value(ON);
        assert_eq!(target.value(), OFF);
        assert_eq!(timer.value(), ON);

        sleep(Duration::from_millis(300)).await;
        timer.set_value(ON);
        assert_eq!(target.value(), OFF);

        sleep(Duration::from_millis(300)).await;
        timer.set_value(ON);
        assert_eq!(target.value(), ON);
        assert_eq!(timer.value(), ON);

        // Last refresh at 1.2s: stale from 1.7s, off once 3.2s is past.
        sleep(Duration::from_millis(1300)).await;
        assert_eq!(timer.value(), "1");
        assert_eq!(target.value(), ON);

        sleep(Duration::from_secs(1)).await;
        assert_eq!(timer.value(), "0");

        sleep(Duration::from_secs(1)).await;
        assert_eq!(target.value(), OFF);
        assert_eq!(timer.value(), OFF);
        assert!(!timer.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn activation_without_refresh_is_abandoned() {
        let target = target();
        let timer = TimerItem::new("t", "Timer", target.clone(), options(3000, 5000, 500)).unwrap();

        timer.set_value("1");
        sleep(Duration::from_millis(1500)).await;

        assert_eq!(timer.value(), OFF);
        assert_eq!(target.value(), OFF);
        assert!(!timer.is_active());

        // The abandoned session never fires.
        sleep(Duration::from_secs(5)).await;
        assert_eq!(target.value(), OFF);
    }

    #[tokio::test(start_paused = true)]
    async fn off_cancels_session_immediately() {
        let target = target();
        let timer = TimerItem::new("t", "Timer", target.clone(), options(0, 10_000, 500)).unwrap();

        timer.set_value(ON);
        sleep(Duration::from_millis(100)).await;
        assert_eq!(target.value(), ON);

        let update = timer.set_value(OFF);
        assert_eq!(update.old, ON);
        assert!(update.changed);
        assert_eq!(timer.value(), OFF);
        assert_eq!(target.value(), OFF);
        assert!(!timer.is_active());

        sleep(Duration::from_secs(20)).await;
        assert_eq!(timer.value(), OFF);
        assert_eq!(target.value(), OFF);
    }

    #[tokio::test(start_paused = true)]
    async fn off_is_applied_even_when_idle() {
        let target = target();
        let timer = TimerItem::new("t", "Timer", target.clone(), TimerOptions::default()).unwrap();

        target.set_value(ON);
        timer.set_value("anything");

        assert_eq!(timer.value(), OFF);
        assert_eq!(target.value(), OFF);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_target_states() {
        let target = target();
        let timer = TimerItem::new(
            "t",
            "Timer",
            target.clone(),
            options(0, 1000, 500).with_on_state("HEAT").with_off_state("ECO"),
        )
        .unwrap();

        timer.set_value("on");
        sleep(Duration::from_millis(10)).await;
        assert_eq!(target.value(), "HEAT");

        timer.wait_idle().await;
        assert_eq!(target.value(), "ECO");
        assert_eq!(timer.value(), OFF);
    }

    #[tokio::test(start_paused = true)]
    async fn drifted_target_is_reasserted() {
        let target = target();
        let timer = TimerItem::new("t", "Timer", target.clone(), options(0, 5000, 500)).unwrap();

        timer.set_value(ON);
        sleep(Duration::from_millis(100)).await;
        assert_eq!(target.value(), ON);

        // Someone else switched the target off while the timer drives it.
        target.set_value(OFF);
        sleep(Duration::from_secs(1)).await;
        assert_eq!(target.value(), ON);
    }

    #[tokio::test(start_paused = true)]
    async fn off_from_target_listener_during_reassert_leaves_timer_idle() {
        let target = target();
        let timer = TimerItem::new("t", "Timer", target.clone(), options(0, 5000, 500)).unwrap();

        timer.set_value(ON);
        sleep(Duration::from_millis(100)).await;
        assert_eq!(target.value(), ON);

        let weak = Arc::downgrade(&timer);
        target.add_listener(CallbackListener::new(move |_, _, new| {
            if new == ON
                && let Some(timer) = weak.upgrade()
            {
                timer.set_value(OFF);
            }
        }));

        // The next tick re-asserts the target, whose listener turns the timer off.
        target.set_value(OFF);
        sleep(Duration::from_secs(1)).await;
        assert_eq!(timer.value(), OFF);
        assert!(!timer.is_active());
        assert_eq!(target.value(), OFF);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(timer.value(), OFF);
        assert_eq!(target.value(), OFF);
    }

    #[tokio::test(start_paused = true)]
    async fn off_from_timer_listener_during_countdown() {
        let target = target();
        let timer = TimerItem::new("t", "Timer", target.clone(), options(0, 3000, 500)).unwrap();

        let weak = Arc::downgrade(&timer);
        timer.add_listener(CallbackListener::new(move |_, _, new| {
            if new.parse::<u64>().is_ok()
                && let Some(timer) = weak.upgrade()
            {
                timer.set_value(OFF);
            }
        }));

        timer.set_value(ON);
        sleep(Duration::from_millis(1500)).await;

        assert_eq!(timer.value(), OFF);
        assert!(!timer.is_active());
        assert_eq!(target.value(), OFF);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_during_countdown_restarts_it() {
        let target = target();
        let timer = TimerItem::new("t", "Timer", target.clone(), options(0, 3000, 500)).unwrap();

        timer.set_value(ON);
        // Stale from 0.5s, the 1s tick reports 2s left.
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(timer.value(), "2");

        // Refresh while counting down: no second session, deadline moves.
        timer.set_value(ON);
        assert_eq!(timer.value(), ON);
        assert!(timer.is_active());

        sleep(Duration::from_millis(2000)).await;
        assert_eq!(timer.value(), "1");
        assert_eq!(target.value(), ON);

        timer.wait_idle().await;
        assert_eq!(target.value(), OFF);
    }

    #[tokio::test(start_paused = true)]
    async fn single_session_per_activation() {
        let target = target();
        let fired = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let fired_clone = Arc::clone(&fired);
        target.add_listener(CallbackListener::new(move |_, _, new| {
            if new == ON {
                fired_clone.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
        }));

        let timer = TimerItem::new("t", "Timer", target.clone(), options(1000, 1000, 5000)).unwrap();
        for _ in 0..5 {
            timer.set_value(ON);
            sleep(Duration::from_millis(100)).await;
        }

        sleep(Duration::from_millis(1000)).await;
        assert_eq!(fired.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_activations_start_one_session() {
        const THREADS: usize = 8;
        const ROUNDS: usize = 200;

        let target = target();
        let fired = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let fired_clone = Arc::clone(&fired);
        target.add_listener(CallbackListener::new(move |_, _, new| {
            if new == ON {
                fired_clone.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
        }));

        let timer = TimerItem::new("t", "Timer", target.clone(), options(500, 60_000, 5000)).unwrap();
        let handle = Handle::current();

        for round in 1..=ROUNDS {
            let barrier = std::sync::Barrier::new(THREADS);
            std::thread::scope(|scope| {
                for _ in 0..THREADS {
                    scope.spawn(|| {
                        // Share the paused clock of the test runtime.
                        let _runtime = handle.enter();
                        barrier.wait();
                        timer.set_value(ON);
                    });
                }
            });
            assert!(timer.is_active());

            sleep(Duration::from_millis(600)).await;
            assert_eq!(fired.load(std::sync::atomic::Ordering::SeqCst), round);

            timer.set_value(OFF);
            assert!(!timer.is_active());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reactivation_after_cancel_is_not_switched_off_by_old_session() {
        let target = target();
        let timer = TimerItem::new("t", "Timer", target.clone(), options(0, 10_000, 500)).unwrap();

        timer.set_value(ON);
        sleep(Duration::from_millis(100)).await;
        timer.set_value(OFF);
        timer.set_value(ON);

        sleep(Duration::from_millis(100)).await;
        assert_eq!(target.value(), ON);
        assert_eq!(timer.value(), ON);
        assert!(timer.is_active());

        sleep(Duration::from_secs(3)).await;
        assert_eq!(target.value(), ON);
        assert!(timer.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_idle_returns_immediately_when_idle() {
        let timer = TimerItem::new("t", "Timer", target(), TimerOptions::default()).unwrap();
        timer.wait_idle().await;
        assert!(!timer.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn target_on_is_renudged_on_refresh() {
        let target = Arc::new(SwitchItem::new("light", "Light"));
        let writes = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let writes_clone = Arc::clone(&writes);
        target.add_listener(CallbackListener::new(move |_, _, _| {
            writes_clone.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }));

        let timer = TimerItem::new("t", "Timer", target.clone(), options(0, 5000, 500)).unwrap();
        timer.set_value(ON);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(writes.load(std::sync::atomic::Ordering::SeqCst), 1);

        timer.set_value(ON);
        assert_eq!(writes.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert_eq!(target.value(), ON);
    }
}
