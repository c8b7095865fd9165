// SPDX-FileCopyrightText: 2025 Matthew Milner <matterhorn103@proton.me>
// SPDX-License-Identifier: MIT

//! Text representation of (value, error) pairs.
//!
//! Formatting is only ever used for display; no computation goes through
//! the rounded strings.

use num_traits::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Significant digits used by the general format, as in C's `%g`.
const GENERAL_PRECISION: usize = 6;

/// Largest number of decimal places a `Decimal` can carry.
const MAX_DECIMAL_SCALE: i32 = 28;

/// How value and error are rounded when displayed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum DisplayRounding {
    /// Both numbers in `%g` style, independent of each other.
    #[default]
    General = 0,
    /// Particle Data Group convention: the error gets 2 significant digits
    /// and the value is rounded to match.
    Pdg = 1,
}

impl DisplayRounding {
    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Pdg,
            _ => Self::General,
        }
    }
}

/// Formats a value and its error as `"value +/- error"`.
///
/// In [`DisplayRounding::Pdg`] mode a zero or non-finite error (or a
/// non-finite value) falls back to the general format, since there is no
/// leading digit to round to.
pub fn format_pair(value: f64, error: f64, mode: DisplayRounding) -> String {
    if mode == DisplayRounding::Pdg {
        if let Some((value, error)) = pdg_round(value, error) {
            return format!("{value} +/- {error}");
        }
    }
    format!("{} +/- {}", format_g(value), format_g(error))
}

/// Formats a float the way C's `%g` does with the default precision of 6.
///
/// ```
/// # use auto_uncertainties::format::format_g;
/// assert_eq!(format_g(25.0), "25");
/// assert_eq!(format_g(0.223606797749979), "0.223607");
/// assert_eq!(format_g(1.5e-7), "1.5e-07");
/// assert_eq!(format_g(123456789.0), "1.23457e+08");
/// ```
pub fn format_g(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    // Let the standard library do the rounding so the exponent accounts for
    // carries such as 9.999995 -> 1.00000e1
    let scientific = format!("{:.*e}", GENERAL_PRECISION - 1, x);
    let (mantissa, exponent) = split_exponent(&scientific);
    if exponent < -4 || exponent >= GENERAL_PRECISION as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{sign}{:02}",
            trim_fraction(mantissa),
            exponent.unsigned_abs()
        )
    } else {
        let places = (GENERAL_PRECISION as i32 - 1 - exponent) as usize;
        trim_fraction(&format!("{x:.places$}")).to_string()
    }
}

/// Rounds a pair following the PDG convention.
///
/// The error is rounded to 2 significant digits. The value is rounded to the
/// decimal place of the error's leading digit, or to 2 significant digits of
/// its own, whichever keeps more decimal places.
///
/// Returns `None` if either number is not finite, the error is zero, or
/// either needs more than 28 decimal places.
pub fn pdg_round(value: f64, error: f64) -> Option<(String, String)> {
    if !value.is_finite() || !error.is_finite() || error == 0.0 {
        return None;
    }
    let error_exponent = leading_exponent(error);
    let error_places = 1 - error_exponent;
    let value_places = if value == 0.0 {
        -error_exponent
    } else {
        (-error_exponent).max(1 - leading_exponent(value))
    };
    Some((
        round_at(value, value_places)?.to_string(),
        round_at(error, error_places)?.to_string(),
    ))
}

/// Decimal exponent of the leading digit after rounding to 2 significant
/// digits.
fn leading_exponent(x: f64) -> i32 {
    let scientific = format!("{x:.1e}");
    split_exponent(&scientific).1
}

/// Rounds `x` to `places` decimal places, keeping trailing zeros.
///
/// A negative `places` rounds to tens, hundreds and so on.
fn round_at(x: f64, places: i32) -> Option<Decimal> {
    if places > MAX_DECIMAL_SCALE {
        return None;
    }
    let mut n = Decimal::from_f64(x)?;
    if places >= 0 {
        n.rescale(places as u32);
        Some(n)
    } else {
        let factor = Decimal::from_u64(10_u64.checked_pow(places.unsigned_abs())?)?;
        let rounded = (n / factor).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        rounded.checked_mul(factor)
    }
}

fn split_exponent(scientific: &str) -> (&str, i32) {
    match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse().unwrap_or(0)),
        None => (scientific, 0),
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
