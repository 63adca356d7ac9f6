use std::rc::Rc;
use std::time::Duration;

use super::manual_clock;
use crate::timer::{Clock, CountdownTimer};

#[test]
fn timer_fires_once_at_deadline() {
    let (clock, handle) = manual_clock();
    let mut t = CountdownTimer::from_millis(100, true, handle);
    assert!(t.is_running());
    clock.advance_millis(99);
    assert!(!t.just_expired());
    clock.advance_millis(1);
    assert!(t.just_expired());
    assert!(!t.just_expired());
    assert!(!t.is_running());
    clock.advance_millis(1000);
    assert!(!t.just_expired());
}

#[test]
fn timer_reset_rearms_from_now() {
    let (clock, handle) = manual_clock();
    let mut t = CountdownTimer::from_millis(50, true, handle);
    clock.advance_millis(40);
    t.reset();
    clock.advance_millis(40);
    assert!(!t.just_expired());
    assert_eq!(t.remaining(), Some(Duration::from_millis(10)));
    clock.advance_millis(10);
    assert!(t.just_expired());

    t.reset();
    assert!(t.is_running());
    clock.advance_millis(50);
    assert!(t.just_expired());
}

#[test]
fn timer_created_stopped_never_fires_until_reset() {
    let (clock, handle) = manual_clock();
    let mut t = CountdownTimer::from_millis(10, false, handle);
    assert!(!t.is_running());
    assert_eq!(t.remaining(), None);
    clock.advance_millis(100);
    assert!(!t.just_expired());
    t.reset();
    clock.advance_millis(10);
    assert!(t.just_expired());
}

#[test]
fn timer_stop_cancels_pending_expiry() {
    let (clock, handle) = manual_clock();
    let mut t = CountdownTimer::from_millis(10, true, handle);
    t.stop();
    clock.advance_millis(20);
    assert!(!t.just_expired());
}

#[test]
fn timer_sleep_until_expired_advances_manual_clock() {
    let (clock, handle) = manual_clock();
    let mut t = CountdownTimer::new(Duration::from_secs(3), true, Rc::clone(&handle));
    clock.advance_millis(500);
    t.sleep_until_expired();
    assert_eq!(clock.elapsed(), Duration::from_secs(3));
    assert!(t.just_expired());
    assert_eq!(t.duration(), Duration::from_secs(3));
}

#[test]
fn manual_clock_moves_only_when_told() {
    let (clock, handle) = manual_clock();
    let t0 = handle.now();
    assert_eq!(handle.now(), t0);
    handle.sleep(Duration::from_millis(7));
    clock.advance(Duration::from_millis(3));
    assert_eq!(handle.now() - t0, Duration::from_millis(10));
}
