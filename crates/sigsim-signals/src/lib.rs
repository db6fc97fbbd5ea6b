//! Discrete-time signals for offline simulation of continuous systems.
//!
//! A signal carries its value and successive time derivatives up to a
//! declared order, kept mutually consistent by an explicit Euler update:
//! each step injects one raw sample at an anchor order, differentiates it
//! upward and integrates downward.
//!
//! # Variants
//!
//! - [`Forced`]: raw sample is a function of elapsed simulated time
//! - [`Computed`]: raw sample is a function of the signal's own derivatives
//!   and of other signals read through [`SignalReader`] handles
//! - [`Delayed`]: another signal's derivatives a fixed time in the past,
//!   linearly interpolated from a pruned delay line
//! - [`Smoothed`]: sliding-window least-squares polynomial fit with
//!   analytic derivatives (Savitzky-Golay style)
//!
//! # Stepping
//!
//! Signals are stepped explicitly by the caller, in the order the intended
//! numerical scheme requires; nothing here infers dependency order. A
//! [`Schedule`] keeps a fixed caller-chosen order and can drive a whole run.

pub mod computed;
pub mod config;
pub mod delayed;
pub mod derivatives;
pub mod error;
pub mod fit;
pub mod forced;
pub mod reader;
pub mod schedule;
pub mod signal;
pub mod smoothed;

pub use computed::Computed;
pub use config::{DelayConfig, RunOptions, SmoothingConfig};
pub use delayed::Delayed;
pub use derivatives::Derivatives;
pub use error::{SignalError, SignalResult};
pub use fit::{PolynomialFit, fit_polynomial};
pub use forced::Forced;
pub use reader::SignalReader;
pub use schedule::{Probe, Schedule, Trace};
pub use signal::{Signal, StepSignal, euler_update};
pub use smoothed::Smoothed;
