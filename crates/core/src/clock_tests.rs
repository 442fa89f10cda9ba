// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

#[test]
fn system_clock_does_not_go_backwards() {
    let clock = SystemClock;
    let t1 = clock.now();
    let t2 = clock.now();
    assert!(t2 >= t1);
}

#[test]
fn fake_clock_can_be_advanced() {
    let clock = FakeClock::new();
    let t1 = clock.now();
    clock.advance(Duration::seconds(60));
    let t2 = clock.now();
    assert_eq!(t2 - t1, Duration::seconds(60));
}

#[test]
fn fake_clock_is_cloneable_and_shared() {
    let clock1 = FakeClock::new();
    let clock2 = clock1.clone();
    let t1 = clock1.now();
    clock2.advance(Duration::seconds(30));
    let t2 = clock1.now();
    assert_eq!(t2 - t1, Duration::seconds(30));
}

#[test]
fn fake_clock_set_pins_time() {
    let instant = Utc.with_ymd_and_hms(2018, 3, 1, 12, 0, 0).unwrap();
    let clock = FakeClock::new();
    clock.set(instant);
    assert_eq!(clock.now(), instant);
    assert_eq!(FakeClock::at(instant).now(), instant);
}
