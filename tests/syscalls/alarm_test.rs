//! Process alarm tests.

use super::common::{serial, wait_for};
use clock_bridge::alarm_slot::AlarmSlot;
use clock_bridge::signals::{InterruptHandler, InterruptSignal};
use clock_bridge::ClockBridge;
use clock_common::config::BridgeConfig;
use std::time::Duration;

fn bridge() -> ClockBridge {
    // The handler keeps a stray expiry from terminating the test process
    ClockBridge::new(BridgeConfig {
        handle_sigalrm: true,
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn test_alarm_then_cancel_reports_remaining() {
    let _guard = serial();
    let bridge = bridge();

    for seconds in [1, 5, 60] {
        assert_eq!(bridge.alarm(seconds), 0);
        let left = bridge.alarm(0);
        assert!((0..=seconds).contains(&left), "left={left} seconds={seconds}");
    }
}

#[test]
fn test_alarm_last_writer_wins() {
    let _guard = serial();
    let bridge = bridge();

    assert_eq!(bridge.alarm(30), 0);
    let replaced = bridge.alarm(10);
    assert!((29..=30).contains(&replaced), "replaced={replaced}");

    let pending = bridge.alarm_slot().pending().expect("alarm should be pending");
    assert_eq!(pending.seconds, 10);

    let cancelled = bridge.alarm(0);
    assert!((9..=10).contains(&cancelled), "cancelled={cancelled}");
    assert!(AlarmSlot::global().pending().is_none());
}

#[test]
fn test_cancel_without_pending_alarm() {
    let _guard = serial();
    let _ = AlarmSlot::global().cancel();
    assert_eq!(AlarmSlot::global().cancel(), 0);
}

#[test]
fn test_alarm_expiry_is_delivered() {
    let _guard = serial();
    let bridge = bridge();
    let handler = InterruptHandler::install(InterruptSignal::Alarm).unwrap();
    let before = handler.deliveries();

    bridge.alarm(1);
    assert!(wait_for(Duration::from_secs(3), || handler.deliveries() > before));
    assert!(bridge.alarm_slot().pending().is_none());
}

#[test]
fn test_negative_alarm_passes_through() {
    let _guard = serial();
    let bridge = bridge();
    let _ = bridge.alarm(0);

    // -1 arms u32::MAX seconds; reading it back wraps to a negative i32.
    assert_eq!(bridge.alarm(-1), 0);
    let pending = bridge.alarm_slot().pending().expect("alarm should be pending");
    assert_eq!(pending.seconds, u32::MAX);

    let back = bridge.alarm(0);
    assert!((-2..=-1).contains(&back), "back={back}");
}
