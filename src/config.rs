// SPDX-FileCopyrightText: 2025 Matthew Milner <matterhorn103@proton.me>
// SPDX-License-Identifier: MIT

//! Process-wide switches that change how uncertain quantities behave.
//!
//! Each flag is read once at the start of the operation that uses it.
//! Flags are expected to be set at startup or between computations, not
//! while other threads are in the middle of propagating values.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, UncertaintyError},
    format::DisplayRounding,
};

static DOWNCAST_ERROR: AtomicBool = AtomicBool::new(false);
static COMPARE_WITH_ERROR: AtomicBool = AtomicBool::new(false);
static DISPLAY_ROUNDING: AtomicU8 = AtomicU8::new(DisplayRounding::General as u8);

/// Returns true if stripping an uncertainty is an error rather than a warning.
#[inline]
pub fn downcast_error() -> bool {
    DOWNCAST_ERROR.load(Ordering::Relaxed)
}

/// Makes downcasts fail with [`UncertaintyError::Downcast`] (`true`) or
/// warn and proceed (`false`, the default).
pub fn set_downcast_error(strict: bool) {
    DOWNCAST_ERROR.store(strict, Ordering::Relaxed);
}

/// Returns true if comparisons treat values within their combined standard
/// deviation as equal.
#[inline]
pub fn compare_with_error() -> bool {
    COMPARE_WITH_ERROR.load(Ordering::Relaxed)
}

/// Turns error-aware comparisons on or off. Off by default, in which case
/// only nominal values are compared.
pub fn set_compare_with_error(enabled: bool) {
    COMPARE_WITH_ERROR.store(enabled, Ordering::Relaxed);
}

/// The rounding mode used when displaying uncertain quantities.
#[inline]
pub fn display_rounding() -> DisplayRounding {
    DisplayRounding::from_u8(DISPLAY_ROUNDING.load(Ordering::Relaxed))
}

pub fn set_display_rounding(mode: DisplayRounding) {
    DISPLAY_ROUNDING.store(mode as u8, Ordering::Relaxed);
}

/// A snapshot of every global flag.
///
/// Useful for loading the flags from a host application's configuration
/// file, or for saving and restoring them around a block of code.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    pub downcast_error: bool,
    pub compare_with_error: bool,
    pub display_rounding: DisplayRounding,
}

impl Settings {
    /// Reads the flags currently in effect.
    pub fn current() -> Self {
        Self {
            downcast_error: downcast_error(),
            compare_with_error: compare_with_error(),
            display_rounding: display_rounding(),
        }
    }

    /// Makes these settings the process-wide ones.
    pub fn apply(self) {
        set_downcast_error(self.downcast_error);
        set_compare_with_error(self.compare_with_error);
        set_display_rounding(self.display_rounding);
        tracing::debug!(settings = ?self, "applied uncertainty settings");
    }
}

/// Runs `strip` if stripping the uncertainty from `operation` is allowed.
///
/// With strict downcasting off this logs a warning and proceeds, otherwise
/// it fails without calling `strip`.
pub(crate) fn downcast<T>(operation: &str, len: usize, strip: impl FnOnce() -> T) -> Result<T> {
    if downcast_error() {
        return Err(UncertaintyError::Downcast {
            operation: operation.to_string(),
        });
    }
    tracing::warn!(
        operation,
        len,
        "the uncertainty is stripped when downcasting to a plain array"
    );
    Ok(strip())
}
