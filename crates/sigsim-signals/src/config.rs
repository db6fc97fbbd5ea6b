//! Serializable construction and run parameters.

use serde::{Deserialize, Serialize};
use sigsim_core::Real;

use crate::error::{SignalError, SignalResult};

/// Parameters of a [`Smoothed`](crate::Smoothed) signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Highest derivative reported.
    pub order: usize,
    /// Degree of the fitted polynomial.
    pub degree: usize,
    /// Duration of the sliding window (seconds).
    pub window: Real,
}

impl SmoothingConfig {
    pub fn new(order: usize, degree: usize, window: Real) -> Self {
        Self {
            order,
            degree,
            window,
        }
    }

    /// # Errors
    ///
    /// Returns error if `window` is not a positive finite duration.
    pub fn validate(&self) -> SignalResult<()> {
        if !self.window.is_finite() || self.window <= 0.0 {
            return Err(SignalError::InvalidArg {
                what: "window must be positive",
            });
        }
        Ok(())
    }

    /// Number of orders actually recovered from the fit.
    pub fn fitted_orders(&self) -> usize {
        self.degree.min(self.order)
    }
}

/// Parameters of a [`Delayed`](crate::Delayed) signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayConfig {
    /// Delay duration (seconds).
    pub delay: Real,
}

impl DelayConfig {
    pub fn validate(&self) -> SignalResult<()> {
        if !self.delay.is_finite() || self.delay < 0.0 {
            return Err(SignalError::InvalidArg {
                what: "delay must be non-negative",
            });
        }
        Ok(())
    }
}

/// Options for a [`Schedule::run`](crate::Schedule::run) loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Fixed time step (seconds)
    pub dt: Real,
    /// Final simulation time (seconds). Absolute: a schedule that has
    /// already advanced to `t` runs on from `t` to `t_end`, not for `t_end`
    /// more seconds.
    pub t_end: Real,
    /// Maximum number of steps (safety limit)
    pub max_steps: usize,
    /// Record every N-th step (decimation)
    pub record_every: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dt: 1e-2,
            t_end: 1.0,
            max_steps: 1_000_000,
            record_every: 1,
        }
    }
}

impl RunOptions {
    pub fn validate(&self) -> SignalResult<()> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(SignalError::InvalidArg {
                what: "dt must be positive",
            });
        }
        if !self.t_end.is_finite() || self.t_end < 0.0 {
            return Err(SignalError::InvalidArg {
                what: "t_end must be non-negative",
            });
        }
        if self.max_steps == 0 {
            return Err(SignalError::InvalidArg {
                what: "max_steps must be positive",
            });
        }
        if self.record_every == 0 {
            return Err(SignalError::InvalidArg {
                what: "record_every must be positive",
            });
        }
        Ok(())
    }
}
