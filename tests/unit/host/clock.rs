use super::*;

#[test]
fn virtual_clock_only_moves_forward() {
    let clock = VirtualClock::starting_at(10.0);
    clock.advance(5.0);
    assert_eq!(clock.now_ms(), 15.0);
    clock.set(3.0);
    assert_eq!(clock.now_ms(), 15.0);
    clock.wait_until(40.0);
    assert_eq!(clock.now_ms(), 40.0);
}

#[test]
fn virtual_clock_ignores_infinite_deadlines() {
    let clock = VirtualClock::new();
    clock.wait_until(f64::INFINITY);
    assert_eq!(clock.now_ms(), 0.0);
}

#[test]
fn system_clock_is_monotonic() {
    let clock = SystemClock::new();
    let a = clock.now_ms();
    clock.wait_until(a + 1.0);
    let b = clock.now_ms();
    assert!(b >= a + 1.0);
}
