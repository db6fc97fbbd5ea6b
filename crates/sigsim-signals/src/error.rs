//! Error types for signal operations.

use sigsim_core::{CoreError, Real};
use thiserror::Error;

/// Result type for signal operations.
pub type SignalResult<T> = Result<T, SignalError>;

/// Errors that can occur while building or stepping signals.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SignalError {
    /// Invalid argument provided to a constructor.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Anchor index above the declared order.
    #[error("Anchor index {anchor} exceeds signal order {order}")]
    AnchorOutOfRange { anchor: usize, order: usize },

    /// Derivative index outside `0..=order`.
    #[error("Derivative index out of range (index={index}, order={order})")]
    IndexOob { index: usize, order: usize },

    /// Negative or non-finite time increment.
    #[error("Invalid time step: {dt}")]
    InvalidStep { dt: Real },

    /// Orders above the anchor cannot be differentiated over a zero step.
    #[error("Zero time step with anchor {anchor} below order {order}: division by zero")]
    ZeroStep { anchor: usize, order: usize },

    /// Fewer distinct time points than polynomial coefficients.
    #[error("Under-determined fit: {samples} distinct samples for degree {degree}")]
    UnderdeterminedFit { samples: usize, degree: usize },

    /// Least-squares solver failure.
    #[error("Polynomial fit failed: {what}")]
    FitFailed { what: &'static str },

    /// NaN or infinity produced by a sample source or the fit.
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: Real },

    /// Direct initialization after the signal has been stepped.
    #[error("Derivatives can only be initialized before the first step")]
    AlreadyStepped,

    /// A step failed; carries the signal identity and simulated time.
    #[error("Signal '{label}' failed at t={time}: {source}")]
    Step {
        label: String,
        time: Real,
        #[source]
        source: Box<SignalError>,
    },
}

impl SignalError {
    /// Wrap `self` with the identity of the signal whose step failed.
    pub fn at(self, label: &str, time: Real) -> Self {
        SignalError::Step {
            label: label.to_string(),
            time,
            source: Box::new(self),
        }
    }

    /// Innermost error, stripping any `Step` context.
    pub fn root(&self) -> &SignalError {
        match self {
            SignalError::Step { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<CoreError> for SignalError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::NonFinite { what, value } => SignalError::NonFinite { what, value },
            CoreError::InvalidArg { what } => SignalError::InvalidArg { what },
        }
    }
}
