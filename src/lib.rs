//! Linear propagation of measurement uncertainty.
//!
//! Every quantity is a nominal value with a standard deviation, treated as
//! normally distributed and independent of every other quantity. Scalars
//! ([`UScalar`]) propagate through a fixed table of closed-form derivatives;
//! vectors ([`UVector`]) additionally support array functions such as sums
//! and means, propagated through a Jacobian obtained by automatic
//! differentiation.
//!
//! ```
//! use auto_uncertainties::{UScalar, UVector};
//!
//! let a = UScalar::new(10.0, 3.0).unwrap();
//! let b = UScalar::new(20.0, 4.0).unwrap();
//! assert_eq!((a + b).to_string(), "30 +/- 5");
//!
//! let v = UVector::new(vec![0.0, 2.5, 5.0, 7.5, 10.0], vec![0.1; 5]).unwrap();
//! assert_eq!(v.sum().unwrap().to_string(), "25 +/- 0.223607");
//! ```

pub mod autodiff;
pub mod config;
pub mod derivative;
pub mod dispatch;
mod error;
pub mod format;
pub mod jacobian;
mod magnitude;
mod numeric;
mod scalar;
mod uncertainty;
mod vector;

pub use error::{Result, UncertaintyError};
pub use magnitude::Magnitude;
pub use numeric::{nominal_values, std_devs, UncertainNumeric};
pub use scalar::{linear_error, propagate, UScalar};
pub use uncertainty::Uncertainty;
pub use vector::UVector;
