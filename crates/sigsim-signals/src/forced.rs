//! Signals driven by an explicit function of elapsed time.

use std::fmt;

use sigsim_core::{Real, ensure_finite};

use crate::derivatives::Derivatives;
use crate::error::SignalResult;
use crate::signal::{Signal, StepSignal, check_anchor, check_dt};

/// Signal whose `anchor`-th derivative is `force(t)` at each step.
///
/// `t` is the simulated time reached by the step being taken, i.e. the
/// signal's elapsed time plus `dt`.
///
/// # Example
///
/// ```
/// use sigsim_signals::{Forced, StepSignal};
///
/// let mut ramp = Forced::new(1, 0, |t| t).unwrap();
/// for _ in 0..10 {
///     ramp.step(0.1).unwrap();
/// }
/// assert!((ramp.get(0).unwrap() - 1.0).abs() < 1e-12);
/// assert!((ramp.get(1).unwrap() - 1.0).abs() < 1e-9);
/// ```
pub struct Forced<F> {
    base: Signal,
    anchor: usize,
    force: F,
}

impl<F> Forced<F>
where
    F: FnMut(Real) -> Real,
{
    /// Create a forced signal carrying derivatives `0..=order`.
    ///
    /// # Errors
    ///
    /// Returns error if `anchor > order`.
    pub fn new(order: usize, anchor: usize, force: F) -> SignalResult<Self> {
        check_anchor(anchor, order)?;
        let mut base = Signal::new(order);
        base.set_label("forced");
        Ok(Self {
            base,
            anchor,
            force,
        })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.base.set_label(label);
        self
    }

    pub fn anchor(&self) -> usize {
        self.anchor
    }

    fn try_step(&mut self, dt: Real) -> SignalResult<Derivatives> {
        let dt = check_dt(dt)?;
        let t = self.base.elapsed() + dt;
        let raw = ensure_finite((self.force)(t), "forced sample")?;
        self.base.apply_euler_step(raw, self.anchor, dt)
    }
}

impl<F> StepSignal for Forced<F>
where
    F: FnMut(Real) -> Real,
{
    fn step(&mut self, dt: Real) -> SignalResult<Derivatives> {
        self.try_step(dt)
            .map_err(|e| e.at(self.base.label(), self.base.elapsed() + dt))
    }

    fn clear(&mut self) {
        self.base.clear();
    }

    fn base(&self) -> &Signal {
        &self.base
    }

    fn base_mut(&mut self) -> &mut Signal {
        &mut self.base
    }
}

impl<F> fmt::Debug for Forced<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Forced")
            .field("base", &self.base)
            .field("anchor", &self.anchor)
            .finish_non_exhaustive()
    }
}
