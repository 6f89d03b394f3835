//! Interruption of blocking calls by a directed signal.

use super::common::{serial, spawn_sleeper};
use clock_bridge::marshal::{FieldObject, FieldValue};
use clock_bridge::signals::{InterruptHandler, InterruptSignal};
use clock_bridge::ClockBridge;
use clock_common::error::BridgeError;
use clock_common::time::{TimeValue, NANOS_PER_SEC};
use nix::errno::Errno;

fn handler() -> InterruptHandler {
    InterruptHandler::install(InterruptSignal::User1).unwrap()
}

#[test]
fn test_interrupted_nanosleep_reports_remainder() {
    let _guard = serial();
    let handler = handler();

    let sleeper = spawn_sleeper(|| {
        let mut left = TimeValue::zero();
        let result = ClockBridge::default().nanosleep(&TimeValue::new(5, 0), Some(&mut left));
        (result, left)
    });
    handler.interrupt_thread(sleeper.thread).unwrap();
    let ((result, left), elapsed) = sleeper.handle.join().unwrap();

    let err = result.unwrap_err();
    assert_eq!(err.as_system_call().map(|e| e.errno), Some(Errno::EINTR));
    assert!(left.is_normalized());

    let expected = 5.0 - elapsed.as_secs_f64();
    assert!(
        (left.as_secs_f64() - expected).abs() < 0.1,
        "left={left} elapsed={elapsed:?}"
    );
}

#[test]
fn test_interrupted_nanosleep_writes_field_object() {
    let _guard = serial();
    let handler = handler();

    let sleeper = spawn_sleeper(|| {
        let duration = FieldObject::timespec("ts", TimeValue::new(5, 0));
        let mut left = FieldObject::timespec("ts", TimeValue::zero());
        let result = ClockBridge::default().nanosleep(&duration, Some(&mut left));
        (result, duration, left)
    });
    handler.interrupt_thread(sleeper.thread).unwrap();
    let ((result, duration, left), _) = sleeper.handle.join().unwrap();

    assert!(matches!(result, Err(BridgeError::SystemCall(e)) if e.is_interrupted()));
    assert_eq!(duration.get("tv_sec"), Some(&FieldValue::Long(5)));
    match (left.get("tv_sec"), left.get("tv_nsec")) {
        (Some(FieldValue::Long(sec)), Some(FieldValue::Long(nsec))) => {
            assert!((4..5).contains(sec), "sec={sec}");
            assert!((0..NANOS_PER_SEC).contains(nsec), "nsec={nsec}");
        }
        other => panic!("remainder not written: {other:?}"),
    }
}

#[test]
fn test_interrupted_nanosleep_without_remainder() {
    let _guard = serial();
    let handler = handler();

    let sleeper = spawn_sleeper(|| ClockBridge::default().nanosleep(&TimeValue::new(5, 0), None));
    handler.interrupt_thread(sleeper.thread).unwrap();
    let (result, elapsed) = sleeper.handle.join().unwrap();

    assert!(result.unwrap_err().as_system_call().is_some_and(|e| e.is_interrupted()));
    assert!(elapsed.as_secs() < 5);
}

#[test]
fn test_interrupted_sleep_returns_unslept_seconds() {
    let _guard = serial();
    let handler = handler();

    let sleeper = spawn_sleeper(|| ClockBridge::default().sleep(5));
    handler.interrupt_thread(sleeper.thread).unwrap();
    let (unslept, _) = sleeper.handle.join().unwrap();

    assert!((1..=5).contains(&unslept), "unslept={unslept}");
}

#[test]
fn test_interrupted_usleep_is_an_error() {
    let _guard = serial();
    let handler = handler();

    let sleeper = spawn_sleeper(|| ClockBridge::default().usleep(900_000));
    handler.interrupt_thread(sleeper.thread).unwrap();
    let (result, _) = sleeper.handle.join().unwrap();

    let err = result.unwrap_err();
    assert_eq!(err.as_system_call().map(|e| e.errno), Some(Errno::EINTR));
}

#[test]
fn test_negative_usleep_reaches_the_os() {
    let _guard = serial();
    let handler = handler();

    // -1 becomes u32::MAX microseconds; only an interruption ends the wait.
    let sleeper = spawn_sleeper(|| ClockBridge::default().usleep(-1));
    handler.interrupt_thread(sleeper.thread).unwrap();
    let (result, elapsed) = sleeper.handle.join().unwrap();

    let err = result.unwrap_err();
    assert_eq!(err.as_system_call().map(|e| e.errno), Some(Errno::EINTR));
    assert!(elapsed.as_millis() >= 100, "elapsed={elapsed:?}");
}
