//! Per-element playback controller.
//!
//! The controller keeps a logical clock (`time`, `rate`) and a small state machine, and
//! projects both onto the element's CSS animation properties. CSS animations cannot seek, so
//! the current position is expressed as a negative `animation-delay` and the animation is
//! restarted (name cleared, layout forced, name set again) on every reconciliation.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::{
    foundation::core::{BOUNDARY_EPSILON_MS, css_ms},
    host::{
        element::{AnimationProperty, StyleTarget},
        timer::{Scheduler, TaskId},
    },
    style::registry::KeyframesName,
    timing::effect::ResolvedTiming,
};

/// Playback state as reported by `playState`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayState {
    /// Never started or canceled; no current time.
    #[default]
    Idle,
    /// Time advances with the clock.
    Running,
    /// Time is held.
    Paused,
    /// Parked on a boundary.
    Finished,
}

impl PlayState {
    /// WAAPI `playState` string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for PlayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

type Callback = Box<dyn FnMut()>;

/// Callback owed to the caller once every borrow is released.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
enum Event {
    None,
    Finished,
    Canceled,
}

struct ControllerState {
    this: Weak<RefCell<ControllerState>>,
    name: KeyframesName,
    timing: ResolvedTiming,
    element: Rc<dyn StyleTarget>,
    scheduler: Rc<dyn Scheduler>,
    time: Option<f64>,
    start_time: Option<f64>,
    rate: f64,
    state: PlayState,
    pending: bool,
    finish_task: Option<TaskId>,
    onfinish: Option<Callback>,
    oncancel: Option<Callback>,
}

impl ControllerState {
    fn is_forward(&self) -> bool {
        self.rate >= 0.0
    }

    fn past_boundary(&self, time: f64) -> bool {
        if self.is_forward() {
            time >= self.timing.total_time
        } else {
            time <= 0.0
        }
    }

    /// Reconcile, then either complete or reflect and reschedule.
    fn sync(&mut self) -> Event {
        if self.pending {
            return Event::None;
        }
        if self.advance() {
            return self.complete();
        }
        self.reflect();
        self.reschedule();
        Event::None
    }

    /// Fold elapsed clock time into `time`. Returns `true` when the boundary was reached.
    fn advance(&mut self) -> bool {
        if self.state != PlayState::Running {
            return false;
        }
        let (Some(time), Some(start)) = (self.time, self.start_time) else {
            return false;
        };
        let now = self.scheduler.now_ms();
        let time = time + (now - start) * self.rate;
        self.time = Some(time);
        self.start_time = Some(now);
        tracing::trace!(name = %self.name, time, rate = self.rate, "reconciled");
        self.past_boundary(time)
    }

    /// Move to `finished`, parking the time on the boundary the fill mode keeps visible.
    fn complete(&mut self) -> Event {
        let total = self.timing.total_time;
        let forward = self.is_forward();
        if forward && !total.is_finite() {
            tracing::warn!(name = %self.name, "cannot finish an infinite animation");
            return Event::None;
        }
        self.pending = true;
        let fills = if forward {
            self.timing.fill.fills_forward()
        } else {
            self.timing.fill.fills_backward()
        };
        let parked = match (forward, fills) {
            (true, true) => total - BOUNDARY_EPSILON_MS,
            (true, false) => 0.0,
            (false, true) => BOUNDARY_EPSILON_MS.min(total),
            (false, false) if total.is_finite() => total,
            (false, false) => 0.0,
        };
        self.time = Some(parked.max(0.0));
        self.start_time = None;
        self.state = PlayState::Finished;
        self.clear_finish_task();
        self.reflect();
        self.pending = false;
        tracing::debug!(name = %self.name, time = parked, "finished");
        Event::Finished
    }

    fn reflect(&self) {
        let el = &self.element;
        if self.state == PlayState::Idle {
            el.set_animation_property(AnimationProperty::Name, "");
            el.set_animation_property(AnimationProperty::PlayState, "");
            el.set_animation_property(AnimationProperty::Delay, "");
            return;
        }
        let local = self.timing.local_time(self.time.unwrap_or(0.0));
        let play_state = match self.state {
            PlayState::Paused | PlayState::Finished => "paused",
            _ => "running",
        };
        el.set_animation_property(AnimationProperty::Name, "");
        el.force_layout();
        el.set_animation_property(AnimationProperty::Delay, &css_ms(-local));
        el.set_animation_property(AnimationProperty::PlayState, play_state);
        el.set_animation_property(AnimationProperty::Name, self.name.as_str());
        tracing::trace!(name = %self.name, local, play_state, "reflected");
    }

    fn clear_finish_task(&mut self) {
        if let Some(task) = self.finish_task.take() {
            self.scheduler.cancel(task);
        }
    }

    fn remaining(&self) -> Option<f64> {
        let time = self.time?;
        let remaining = if self.rate > 0.0 {
            (self.timing.total_time - time) / self.rate
        } else if self.rate < 0.0 {
            time / -self.rate
        } else {
            return None;
        };
        remaining.is_finite().then_some(remaining.max(0.0))
    }

    fn reschedule(&mut self) {
        self.clear_finish_task();
        if self.state != PlayState::Running {
            return;
        }
        let Some(remaining) = self.remaining() else {
            return;
        };
        let weak = self.this.clone();
        let task = self.scheduler.schedule_after(
            remaining,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    Animation { inner }.finish_deadline();
                }
            }),
        );
        self.finish_task = Some(task);
    }

    fn transition(&mut self, to: PlayState) {
        if self.state != to {
            tracing::debug!(name = %self.name, from = %self.state, to = %to, "play state");
            self.state = to;
        }
    }
}

/// Handle to one running CSS-backed animation, shaped like a WAAPI `Animation`.
///
/// Clones share the same controller. Every read reconciles against the clock first, so
/// values are always current.
#[derive(Clone)]
pub struct Animation {
    inner: Rc<RefCell<ControllerState>>,
}

impl Animation {
    /// Build a controller, write the static animation properties and start playing.
    pub(crate) fn start(
        name: KeyframesName,
        timing: ResolvedTiming,
        element: Rc<dyn StyleTarget>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        element.set_animation_property(AnimationProperty::TimingFunction, &timing.easing);
        element.set_animation_property(AnimationProperty::Duration, &css_ms(timing.duration));
        element.set_animation_property(
            AnimationProperty::IterationCount,
            &timing.iterations.css_value(),
        );
        element.set_animation_property(AnimationProperty::Direction, timing.direction.css_name());
        element.set_animation_property(AnimationProperty::FillMode, timing.fill.css_name());

        let inner = Rc::new_cyclic(|this| {
            RefCell::new(ControllerState {
                this: this.clone(),
                name,
                timing,
                element,
                scheduler,
                time: None,
                start_time: None,
                rate: 1.0,
                state: PlayState::Idle,
                pending: false,
                finish_task: None,
                onfinish: None,
                oncancel: None,
            })
        });
        let animation = Self { inner };
        animation.play();
        animation
    }

    /// Registered keyframes name, also the element's `animation-name`.
    pub fn id(&self) -> KeyframesName {
        self.inner.borrow().name.clone()
    }

    /// Timing this controller was built with.
    pub fn timing(&self) -> ResolvedTiming {
        self.inner.borrow().timing.clone()
    }

    /// Current logical time in ms; `None` while idle.
    pub fn current_time(&self) -> Option<f64> {
        let event = self.inner.borrow_mut().sync();
        self.emit(event);
        self.inner.borrow().time
    }

    /// Seek to `ms`.
    ///
    /// An idle animation becomes paused at `ms`; a finished one resumes running.
    pub fn set_current_time(&self, ms: f64) {
        let event = {
            let mut s = self.inner.borrow_mut();
            if !ms.is_finite() {
                tracing::warn!(name = %s.name, ms, "ignoring non-finite current time");
                return;
            }
            let now = s.scheduler.now_ms();
            let state = s.state;
            match state {
                PlayState::Idle => s.transition(PlayState::Paused),
                PlayState::Finished => {
                    s.start_time = Some(now);
                    s.transition(PlayState::Running);
                }
                PlayState::Running => s.start_time = Some(now),
                PlayState::Paused => {}
            }
            s.time = Some(ms);
            s.sync()
        };
        self.emit(event);
    }

    /// Signed playback rate.
    pub fn playback_rate(&self) -> f64 {
        let event = self.inner.borrow_mut().sync();
        self.emit(event);
        self.inner.borrow().rate
    }

    /// Change the playback rate. Time elapsed so far is accounted at the old rate.
    pub fn set_playback_rate(&self, rate: f64) {
        let event = {
            let mut s = self.inner.borrow_mut();
            if !rate.is_finite() {
                tracing::warn!(name = %s.name, rate, "ignoring non-finite playback rate");
                return;
            }
            match s.sync() {
                Event::None => {
                    s.rate = rate;
                    s.sync()
                }
                event => {
                    s.rate = rate;
                    event
                }
            }
        };
        self.emit(event);
    }

    /// Current play state.
    pub fn play_state(&self) -> PlayState {
        let event = self.inner.borrow_mut().sync();
        self.emit(event);
        self.inner.borrow().state
    }

    /// Always `false` when observed from outside an operation.
    pub fn pending(&self) -> bool {
        self.inner.borrow().pending
    }

    /// Start or resume playback.
    ///
    /// Restarts from the beginning (or the end, when playing backward) if the animation is
    /// idle, finished, or parked past its boundary.
    pub fn play(&self) {
        let (entry, started) = {
            let mut s = self.inner.borrow_mut();
            let entry = s.sync();
            let restart = s.state == PlayState::Finished
                || s.time.is_none_or(|time| s.past_boundary(time));
            if restart {
                if s.is_forward() {
                    s.time = Some(0.0);
                } else if s.timing.total_time.is_finite() {
                    s.time = Some(s.timing.total_time);
                } else {
                    tracing::warn!(name = %s.name, "cannot play an infinite animation backward");
                    drop(s);
                    self.emit(entry);
                    return;
                }
            }
            s.start_time = Some(s.scheduler.now_ms());
            s.transition(PlayState::Running);
            (entry, s.sync())
        };
        // a completion noticed on the way in still owes its callback
        self.emit(entry);
        self.emit(started);
    }

    /// Hold the current time. Finished animations stay finished.
    pub fn pause(&self) {
        let event = {
            let mut s = self.inner.borrow_mut();
            let state = s.state;
            match state {
                PlayState::Finished => Event::None,
                PlayState::Idle => {
                    s.time = Some(if s.is_forward() {
                        0.0
                    } else {
                        s.timing.total_time
                    });
                    s.start_time = None;
                    s.transition(PlayState::Paused);
                    s.sync()
                }
                PlayState::Running | PlayState::Paused => match s.sync() {
                    Event::None if s.state != PlayState::Finished => {
                        s.start_time = None;
                        s.transition(PlayState::Paused);
                        s.sync()
                    }
                    event => event,
                },
            }
        };
        self.emit(event);
    }

    /// Stop, drop the current time and detach the animation from the element.
    ///
    /// `oncancel` fires on every call.
    pub fn cancel(&self) {
        {
            let mut s = self.inner.borrow_mut();
            s.time = None;
            s.start_time = None;
            s.transition(PlayState::Idle);
            s.clear_finish_task();
            s.reflect();
        }
        self.emit(Event::Canceled);
    }

    /// Jump to the end (or the start, when playing backward) and fire `onfinish`.
    pub fn finish(&self) {
        let event = self.inner.borrow_mut().complete();
        self.emit(event);
    }

    /// Flip the playback direction, keeping the current state.
    pub fn reverse(&self) {
        let event = {
            let mut s = self.inner.borrow_mut();
            let event = s.sync();
            s.rate = -s.rate;
            match event {
                Event::None => s.sync(),
                event => event,
            }
        };
        self.emit(event);
    }

    /// Install the `onfinish` hook, replacing any previous one.
    pub fn set_onfinish(&self, f: impl FnMut() + 'static) {
        self.inner.borrow_mut().onfinish = Some(Box::new(f));
    }

    /// Install the `oncancel` hook, replacing any previous one.
    pub fn set_oncancel(&self, f: impl FnMut() + 'static) {
        self.inner.borrow_mut().oncancel = Some(Box::new(f));
    }

    /// Remove both hooks.
    pub fn clear_callbacks(&self) {
        let mut s = self.inner.borrow_mut();
        s.onfinish = None;
        s.oncancel = None;
    }

    fn finish_deadline(&self) {
        let event = {
            let mut s = self.inner.borrow_mut();
            s.finish_task = None;
            if s.state != PlayState::Running {
                return;
            }
            match s.sync() {
                Event::None if s.state == PlayState::Running => s.complete(),
                event => event,
            }
        };
        self.emit(event);
    }

    fn emit(&self, event: Event) {
        if event == Event::None {
            return;
        }
        let Some(mut callback) = callback_slot(&mut self.inner.borrow_mut(), event).take() else {
            return;
        };
        callback();
        let mut s = self.inner.borrow_mut();
        let slot = callback_slot(&mut s, event);
        if slot.is_none() {
            *slot = Some(callback);
        }
    }
}

fn callback_slot(s: &mut ControllerState, event: Event) -> &mut Option<Callback> {
    match event {
        Event::Canceled => &mut s.oncancel,
        Event::Finished | Event::None => &mut s.onfinish,
    }
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.inner.borrow();
        f.debug_struct("Animation")
            .field("id", &s.name)
            .field("state", &s.state)
            .field("time", &s.time)
            .field("rate", &s.rate)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/controller.rs"]
mod tests;
