use std::cell::Cell;

use super::*;
use crate::animation::engine::Engine;
use crate::host::clock::VirtualClock;
use crate::host::element::{MemoryElement, StyleWrite};
use crate::host::timer::TimerQueue;
use crate::keyframes::model::Keyframe;
use crate::style::sheet::MemoryStyleSheet;
use crate::timing::effect::{EffectTiming, FillMode, Iterations, PlaybackDirection, TimingInput};

struct Rig {
    timers: Rc<TimerQueue<VirtualClock>>,
    element: Rc<MemoryElement>,
    engine: Engine,
}

impl Rig {
    fn new() -> Self {
        let timers = Rc::new(TimerQueue::new(VirtualClock::new()));
        let engine = Engine::new(Rc::new(MemoryStyleSheet::new()), timers.clone());
        Self {
            timers,
            element: Rc::new(MemoryElement::new()),
            engine,
        }
    }

    fn animate(&self, timing: impl Into<TimingInput>) -> Animation {
        let frames = [
            Keyframe::new().set("opacity", 0),
            Keyframe::new().set("opacity", 1),
        ];
        let animation = self
            .engine
            .animate(self.element.clone(), &frames, timing)
            .unwrap();
        self.engine.flush_styles();
        animation
    }

    fn style(&self, property: AnimationProperty) -> Option<String> {
        self.element.get(property)
    }
}

fn counter() -> (Rc<Cell<u32>>, impl FnMut() + 'static) {
    let count = Rc::new(Cell::new(0));
    let c = count.clone();
    (count, move || c.set(c.get() + 1))
}

#[test]
fn construction_starts_running_at_zero() {
    let rig = Rig::new();
    let a = rig.animate(100.0);
    assert_eq!(a.play_state(), PlayState::Running);
    assert_eq!(a.current_time(), Some(0.0));
    assert_eq!(a.playback_rate(), 1.0);
    assert!(!a.pending());
    assert_eq!(rig.style(AnimationProperty::Name).as_deref(), Some(a.id().as_str()));
    assert_eq!(rig.style(AnimationProperty::PlayState).as_deref(), Some("running"));
    assert_eq!(rig.style(AnimationProperty::Delay).as_deref(), Some("0ms"));
}

#[test]
fn construction_writes_static_properties() {
    let rig = Rig::new();
    rig.animate(
        EffectTiming::with_duration(250.0)
            .iterations(Iterations::Infinite)
            .direction(PlaybackDirection::AlternateReverse)
            .fill(FillMode::Both)
            .easing("ease-in-out"),
    );
    assert_eq!(rig.style(AnimationProperty::Duration).as_deref(), Some("250ms"));
    assert_eq!(
        rig.style(AnimationProperty::IterationCount).as_deref(),
        Some("infinite")
    );
    assert_eq!(
        rig.style(AnimationProperty::Direction).as_deref(),
        Some("alternate-reverse")
    );
    assert_eq!(rig.style(AnimationProperty::FillMode).as_deref(), Some("both"));
    assert_eq!(
        rig.style(AnimationProperty::TimingFunction).as_deref(),
        Some("ease-in-out")
    );
}

#[test]
fn cancel_twice_leaves_idle() {
    let rig = Rig::new();
    let a = rig.animate(100.0);
    a.cancel();
    a.cancel();
    assert_eq!(a.play_state(), PlayState::Idle);
    assert_eq!(a.current_time(), None);
    assert_eq!(a.playback_rate(), 1.0);
    assert_eq!(rig.style(AnimationProperty::Name), None);
    assert_eq!(rig.style(AnimationProperty::Delay), None);
    assert_eq!(rig.style(AnimationProperty::PlayState), None);
    assert_eq!(rig.timers.pending_tasks(), 0);
}

#[test]
fn cancel_after_seek_clears_time() {
    let rig = Rig::new();
    let a = rig.animate(100.0);
    a.set_current_time(50.0);
    a.cancel();
    assert_eq!(a.current_time(), None);
}

#[test]
fn cancel_fires_oncancel_every_time() {
    let rig = Rig::new();
    let a = rig.animate(100.0);
    let (cancels, on_cancel) = counter();
    let (finishes, on_finish) = counter();
    a.set_oncancel(on_cancel);
    a.set_onfinish(on_finish);
    a.cancel();
    a.cancel();
    rig.timers.advance_by(500.0);
    assert_eq!(cancels.get(), 2);
    assert_eq!(finishes.get(), 0);
}

#[test]
fn finish_with_fill_forwards_holds_the_end() {
    let rig = Rig::new();
    let a = rig.animate(EffectTiming::with_duration(100.0).fill(FillMode::Forwards));
    a.finish();
    a.finish();
    assert_eq!(a.play_state(), PlayState::Finished);
    assert_eq!(a.current_time().map(f64::round), Some(100.0));
    assert_eq!(rig.style(AnimationProperty::PlayState).as_deref(), Some("paused"));
}

#[test]
fn finish_without_fill_returns_to_start() {
    let rig = Rig::new();
    let a = rig.animate(100.0);
    a.finish();
    assert_eq!(a.play_state(), PlayState::Finished);
    assert_eq!(a.current_time().map(f64::round), Some(0.0));
}

#[test]
fn finish_fires_onfinish_per_call() {
    let rig = Rig::new();
    let a = rig.animate(100.0);
    let (finishes, on_finish) = counter();
    a.set_onfinish(on_finish);
    a.finish();
    a.finish();
    assert_eq!(finishes.get(), 2);
}

#[test]
fn play_from_idle_restarts() {
    let rig = Rig::new();
    let a = rig.animate(100.0);
    a.cancel();
    a.play();
    assert_eq!(a.current_time(), Some(0.0));
    assert_eq!(a.play_state(), PlayState::Running);
}

#[test]
fn play_from_finished_restarts() {
    let rig = Rig::new();
    let a = rig.animate(EffectTiming::with_duration(100.0).fill(FillMode::Forwards));
    a.finish();
    a.play();
    assert_eq!(a.current_time(), Some(0.0));
    assert_eq!(a.play_state(), PlayState::Running);
}

#[test]
fn play_reports_a_missed_completion_before_restarting() {
    let rig = Rig::new();
    let a = rig.animate(100.0);
    let (finishes, on_finish) = counter();
    a.set_onfinish(on_finish);
    // clock jumps past the deadline without running the completion task
    rig.timers.clock().advance(150.0);
    a.play();
    assert_eq!(finishes.get(), 1);
    assert_eq!(a.play_state(), PlayState::Running);
    assert_eq!(a.current_time(), Some(0.0));
}

#[test]
fn zero_length_play_fires_onfinish_each_time() {
    let rig = Rig::new();
    let a = rig.animate(0.0);
    assert_eq!(a.play_state(), PlayState::Finished);
    let (finishes, on_finish) = counter();
    a.set_onfinish(on_finish);
    a.play();
    assert_eq!(finishes.get(), 1);
    assert_eq!(a.play_state(), PlayState::Finished);
    a.play();
    assert_eq!(finishes.get(), 2);
}

#[test]
fn seek_while_paused_survives_play() {
    let rig = Rig::new();
    let a = rig.animate(100.0);
    a.pause();
    a.set_current_time(50.0);
    a.play();
    assert_eq!(a.current_time(), Some(50.0));
    assert_eq!(a.play_state(), PlayState::Running);
}

#[test]
fn pause_holds_time() {
    let rig = Rig::new();
    let a = rig.animate(100.0);
    rig.timers.advance_by(50.0);
    a.pause();
    rig.timers.advance_by(30.0);
    assert_eq!(a.play_state(), PlayState::Paused);
    assert_eq!(a.current_time(), Some(50.0));
    assert_eq!(rig.timers.pending_tasks(), 0);
}

#[test]
fn pause_from_idle_parks_at_start() {
    let rig = Rig::new();
    let a = rig.animate(100.0);
    a.cancel();
    a.pause();
    assert_eq!(a.play_state(), PlayState::Paused);
    assert_eq!(a.current_time(), Some(0.0));
}

#[test]
fn pause_from_finished_is_ignored() {
    let rig = Rig::new();
    let a = rig.animate(100.0);
    a.finish();
    a.pause();
    assert_eq!(a.play_state(), PlayState::Finished);
}

#[test]
fn seek_from_finished_resumes_running() {
    let rig = Rig::new();
    let a = rig.animate(100.0);
    a.finish();
    a.set_current_time(20.0);
    assert_eq!(a.play_state(), PlayState::Running);
    assert_eq!(a.current_time(), Some(20.0));
}

#[test]
fn seek_past_the_end_finishes_immediately() {
    let rig = Rig::new();
    let a = rig.animate(EffectTiming::with_duration(100.0).fill(FillMode::Forwards));
    let (finishes, on_finish) = counter();
    a.set_onfinish(on_finish);
    a.set_current_time(150.0);
    assert_eq!(a.play_state(), PlayState::Finished);
    assert_eq!(finishes.get(), 1);
}

#[test]
fn at_most_one_completion_task() {
    let rig = Rig::new();
    let a = rig.animate(100.0);
    assert_eq!(rig.timers.pending_tasks(), 1);
    a.set_current_time(10.0);
    a.set_playback_rate(2.0);
    a.play();
    assert_eq!(rig.timers.pending_tasks(), 1);
    a.pause();
    assert_eq!(rig.timers.pending_tasks(), 0);
    a.play();
    a.reverse();
    assert_eq!(rig.timers.pending_tasks(), 1);
}

#[test]
fn natural_completion_fires_onfinish_once() {
    let rig = Rig::new();
    let a = rig.animate(EffectTiming::with_duration(100.0).delay(20.0));
    let (finishes, on_finish) = counter();
    a.set_onfinish(on_finish);
    rig.timers.advance_by(119.0);
    assert_eq!(a.play_state(), PlayState::Running);
    rig.timers.advance_by(1.0);
    assert_eq!(finishes.get(), 1);
    assert_eq!(a.play_state(), PlayState::Finished);
    rig.timers.advance_by(500.0);
    assert_eq!(finishes.get(), 1);
    assert_eq!(rig.timers.pending_tasks(), 0);
}

#[test]
fn playback_rate_scales_elapsed_time() {
    let rig = Rig::new();
    let a = rig.animate(100.0);
    rig.timers.advance_by(10.0);
    a.set_playback_rate(2.0);
    rig.timers.advance_by(20.0);
    assert_eq!(a.current_time(), Some(50.0));
    assert_eq!(rig.timers.next_deadline(), Some(55.0));
}

#[test]
fn zero_rate_schedules_nothing() {
    let rig = Rig::new();
    let a = rig.animate(100.0);
    rig.timers.advance_by(40.0);
    a.set_playback_rate(0.0);
    assert_eq!(rig.timers.pending_tasks(), 0);
    rig.timers.advance_by(1000.0);
    assert_eq!(a.current_time(), Some(40.0));
    assert_eq!(a.play_state(), PlayState::Running);
}

#[test]
fn reversed_with_fill_backwards_parks_just_inside_start() {
    let rig = Rig::new();
    let a = rig.animate(EffectTiming::with_duration(100.0).fill(FillMode::Backwards));
    rig.timers.advance_by(50.0);
    a.reverse();
    assert_eq!(a.playback_rate(), -1.0);
    rig.timers.advance_by(50.0);
    assert_eq!(a.play_state(), PlayState::Finished);
    let time = a.current_time().unwrap();
    assert!((time - BOUNDARY_EPSILON_MS).abs() < 1e-9, "time = {time}");
}

#[test]
fn reversed_without_fill_parks_at_total() {
    let rig = Rig::new();
    let a = rig.animate(100.0);
    rig.timers.advance_by(50.0);
    a.reverse();
    rig.timers.advance_by(50.0);
    assert_eq!(a.play_state(), PlayState::Finished);
    assert_eq!(a.current_time(), Some(100.0));
}

#[test]
fn reverse_keeps_paused_state() {
    let rig = Rig::new();
    let a = rig.animate(100.0);
    a.pause();
    a.reverse();
    assert_eq!(a.play_state(), PlayState::Paused);
    assert_eq!(a.playback_rate(), -1.0);
}

#[test]
fn play_backward_from_idle_starts_at_end() {
    let rig = Rig::new();
    let a = rig.animate(EffectTiming::with_duration(100.0).end_delay(20.0));
    a.cancel();
    a.set_playback_rate(-1.0);
    a.play();
    assert_eq!(a.current_time(), Some(120.0));
}

#[test]
fn infinite_animation_ignores_finish() {
    let rig = Rig::new();
    let a = rig.animate(EffectTiming::with_duration(100.0).iterations(Iterations::Infinite));
    a.finish();
    assert_eq!(a.play_state(), PlayState::Running);
    assert_eq!(rig.timers.pending_tasks(), 0);
    rig.timers.advance_by(1000.0);
    assert_eq!(a.current_time(), Some(1000.0));
}

#[test]
fn reflection_restarts_the_css_animation() {
    let rig = Rig::new();
    let a = rig.animate(100.0);
    rig.timers.advance_by(50.0);
    rig.element.clear_log();
    a.pause();
    let writes = rig.element.writes();
    let tail = &writes[writes.len() - 5..];
    assert_eq!(
        tail,
        &[
            StyleWrite::Set(AnimationProperty::Name, String::new()),
            StyleWrite::Layout,
            StyleWrite::Set(AnimationProperty::Delay, "-50ms".to_string()),
            StyleWrite::Set(AnimationProperty::PlayState, "paused".to_string()),
            StyleWrite::Set(AnimationProperty::Name, a.id().to_string()),
        ]
    );
}

#[test]
fn alternate_odd_iteration_plays_backward() {
    let rig = Rig::new();
    let a = rig.animate(
        EffectTiming::with_duration(100.0)
            .iterations(Iterations::Count(2.0))
            .direction(PlaybackDirection::Alternate),
    );
    a.pause();
    a.set_current_time(30.0);
    assert_eq!(rig.style(AnimationProperty::Delay).as_deref(), Some("-30ms"));
    a.set_current_time(130.0);
    assert_eq!(rig.style(AnimationProperty::Delay).as_deref(), Some("-70ms"));
}

#[test]
fn callbacks_may_call_back_into_the_handle() {
    let rig = Rig::new();
    let a = rig.animate(100.0);
    let replay = a.clone();
    a.set_onfinish(move || replay.play());
    a.finish();
    assert_eq!(a.play_state(), PlayState::Running);
    assert_eq!(a.current_time(), Some(0.0));
    a.clear_callbacks();
}

#[test]
fn dropped_handle_turns_completion_into_no_op() {
    let rig = Rig::new();
    let a = rig.animate(100.0);
    drop(a);
    assert_eq!(rig.timers.run_until_idle(), 1);
    assert_eq!(rig.style(AnimationProperty::PlayState).as_deref(), Some("running"));
}

#[test]
fn state_names_match_waapi() {
    let names: Vec<&str> = [
        PlayState::Idle,
        PlayState::Running,
        PlayState::Paused,
        PlayState::Finished,
    ]
    .into_iter()
    .map(PlayState::as_str)
    .collect();
    assert_eq!(names, ["idle", "running", "paused", "finished"]);
    assert_eq!(
        serde_json::to_string(&PlayState::Finished).unwrap(),
        "\"finished\""
    );
}
