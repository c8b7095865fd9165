// SPDX-FileCopyrightText: 2025 Matthew Milner <matterhorn103@proton.me>
// SPDX-License-Identifier: MIT

//! Tests that change process-wide flags. They take a shared lock so that
//! no two of them run at once, and restore the defaults when done.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use auto_uncertainties::{
    config::{self, Settings},
    dispatch::{dispatch, Arg, Dispatched},
    format::DisplayRounding,
    Magnitude, UScalar, UVector, Uncertainty, UncertaintyError,
};
use ndarray::array;

static FLAGS: Mutex<()> = Mutex::new(());

/// Holds the lock and resets every flag on drop, even after a failure.
struct Defaults<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl Drop for Defaults<'_> {
    fn drop(&mut self) {
        Settings::default().apply();
    }
}

fn lock() -> Defaults<'static> {
    let guard = FLAGS.lock().unwrap_or_else(PoisonError::into_inner);
    Settings::default().apply();
    Defaults { _guard: guard }
}

/// Runs `f` with a subscriber that writes into the returned buffer.
fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let writer = {
        let buffer = Arc::clone(&buffer);
        move || SharedWriter(Arc::clone(&buffer))
    };
    let subscriber = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.lock().unwrap_or_else(PoisonError::into_inner).clone();
    (result, String::from_utf8_lossy(&bytes).into_owned())
}

struct SharedWriter(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn vector() -> UVector {
    UVector::new(vec![1.5, 2.5], vec![0.1, 0.2]).unwrap()
}

#[test]
fn downcast_warns_by_default() {
    let _flags = lock();
    let v = vector();
    let (plain, logs) = capture_logs(|| v.to_array());
    assert_eq!(plain.unwrap(), array![1.5, 2.5]);
    assert!(logs.contains("WARN"), "{logs}");
    assert!(logs.contains("to_array"), "{logs}");
    assert!(logs.contains("stripped"), "{logs}");
}

#[test]
fn downcast_fails_when_strict() {
    let _flags = lock();
    config::set_downcast_error(true);
    let v = vector();
    assert_eq!(
        v.to_array().unwrap_err(),
        UncertaintyError::Downcast {
            operation: "to_array".into()
        }
    );
    let u = Uncertainty::from(v.clone());
    assert!(matches!(u.to_plain(), Err(UncertaintyError::Downcast { .. })));
    assert!(matches!(
        dispatch("floor", &[Arg::from(&v)]),
        Err(UncertaintyError::Downcast { .. })
    ));
}

#[test]
fn strip_function_returns_plain_values() {
    let _flags = lock();
    let v = vector();
    let (result, logs) = capture_logs(|| dispatch("floor", &[Arg::from(&v)]));
    let Dispatched::Plain(floored) = result.unwrap() else {
        panic!("expected a plain result");
    };
    assert_eq!(floored, Magnitude::from(vec![1.0, 2.0]));
    assert!(logs.contains("floor"), "{logs}");
}

#[test]
fn scalars_are_not_downcasts() {
    let _flags = lock();
    config::set_downcast_error(true);
    let x = Uncertainty::new(2.0, 0.1).unwrap();
    assert_eq!(x.to_plain().unwrap(), Magnitude::Scalar(2.0));
}

#[test]
fn pdg_display() {
    let _flags = lock();
    let x = UScalar::new(25.0, 0.2236).unwrap();
    assert_eq!(x.to_string(), "25 +/- 0.2236");
    config::set_display_rounding(DisplayRounding::Pdg);
    assert_eq!(x.to_string(), "25.0 +/- 0.22");
    let v = Uncertainty::new(vec![25.0], 0.2236).unwrap();
    assert_eq!(v.to_string(), "[25.0 +/- 0.22]");
}

#[test]
fn comparisons_with_error() {
    let _flags = lock();
    let a = UScalar::new(1.0, 0.6).unwrap();
    let b = UScalar::new(2.0, 0.9).unwrap();
    assert!(a != b);
    assert!(a < b);
    config::set_compare_with_error(true);
    assert!(a == b);
    assert!(!(a < b));
    assert!(a <= b);
    let far = UScalar::new(5.0, 0.1).unwrap();
    assert!(a < far);
    let left = UVector::from_sequence(&[a, a]);
    let right = UVector::from_sequence(&[b, far]);
    assert_eq!(left.eq_elements(&right).unwrap(), array![true, false]);
}

#[test]
fn settings_round_trip() {
    let _flags = lock();
    assert_eq!(Settings::current(), Settings::default());
    let settings: Settings =
        serde_json::from_str(r#"{"downcast-error": true, "display-rounding": "pdg"}"#).unwrap();
    settings.apply();
    assert!(config::downcast_error());
    assert!(!config::compare_with_error());
    assert_eq!(config::display_rounding(), DisplayRounding::Pdg);
    assert_eq!(Settings::current(), settings);
}
