use super::*;

#[test]
fn system_clock_is_after_epoch() {
    assert!(SystemClock.now_ms() > 0);
}

#[test]
fn manual_clock_clones_share_time() {
    let clock = ManualClock::new(100);
    let handle = clock.clone();

    handle.advance(5);
    assert_eq!(clock.now_ms(), 105);

    handle.set(7);
    assert_eq!(clock.now_ms(), 7);
}

#[test]
fn manual_clock_advance_saturates() {
    let clock = ManualClock::new(i64::MAX - 1);
    clock.advance(10);
    assert_eq!(clock.now_ms(), i64::MAX);
}

#[test]
fn boxed_clock_delegates() {
    let manual = ManualClock::new(42);
    let boxed: Box<dyn Clock> = Box::new(manual.clone());
    manual.advance(1);
    assert_eq!(boxed.now_ms(), 43);
}
