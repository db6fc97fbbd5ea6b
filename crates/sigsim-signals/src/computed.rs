//! Signals computed from their own derivatives and other signals.

use std::fmt;

use sigsim_core::{Real, ensure_finite};

use crate::derivatives::Derivatives;
use crate::error::SignalResult;
use crate::reader::SignalReader;
use crate::signal::{Signal, StepSignal, check_anchor, check_dt};

/// Signal whose `anchor`-th derivative is `compute(own, inputs)` at each step.
///
/// `own` is the signal's vector *before* the step (explicit scheme) and
/// `inputs` are the readers declared at construction, in order. Whether the
/// inputs have already been stepped this round is decided by the order in
/// which the caller steps the graph.
///
/// # Example
///
/// ```
/// use sigsim_signals::{Computed, Forced, StepSignal};
///
/// let mut cmd = Forced::new(0, 0, |_| 1.0).unwrap();
/// // x'' = 3 * (cmd - x')
/// let mut pos = Computed::new(2, 2, vec![cmd.reader()], |me, inputs| {
///     Ok(3.0 * (inputs[0].get(0)? - me.get(1)?))
/// })
/// .unwrap();
///
/// for _ in 0..500 {
///     cmd.step(0.01).unwrap();
///     pos.step(0.01).unwrap();
/// }
/// assert!((pos.get(1).unwrap() - 1.0).abs() < 1e-3);
/// ```
pub struct Computed<F> {
    base: Signal,
    anchor: usize,
    inputs: Vec<SignalReader>,
    compute: F,
}

impl<F> Computed<F>
where
    F: FnMut(&Derivatives, &[SignalReader]) -> SignalResult<Real>,
{
    /// Create a computed signal carrying derivatives `0..=order`.
    ///
    /// # Errors
    ///
    /// Returns error if `anchor > order`.
    pub fn new(
        order: usize,
        anchor: usize,
        inputs: Vec<SignalReader>,
        compute: F,
    ) -> SignalResult<Self> {
        check_anchor(anchor, order)?;
        let mut base = Signal::new(order);
        base.set_label("computed");
        Ok(Self {
            base,
            anchor,
            inputs,
            compute,
        })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.base.set_label(label);
        self
    }

    pub fn anchor(&self) -> usize {
        self.anchor
    }

    pub fn inputs(&self) -> &[SignalReader] {
        &self.inputs
    }

    /// Append an input after construction and return its index.
    ///
    /// Feedback loops need this: at least one signal in a cycle has to exist
    /// before the signal it reads.
    pub fn connect(&mut self, input: SignalReader) -> usize {
        self.inputs.push(input);
        self.inputs.len() - 1
    }

    fn try_step(&mut self, dt: Real) -> SignalResult<Derivatives> {
        let dt = check_dt(dt)?;
        let raw = {
            let own = self.base.view();
            (self.compute)(&own, &self.inputs)?
        };
        let raw = ensure_finite(raw, "computed sample")?;
        self.base.apply_euler_step(raw, self.anchor, dt)
    }
}

impl<F> StepSignal for Computed<F>
where
    F: FnMut(&Derivatives, &[SignalReader]) -> SignalResult<Real>,
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

impl<F> fmt::Debug for Computed<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("base", &self.base)
            .field("anchor", &self.anchor)
            .field("inputs", &self.inputs.len())
            .finish_non_exhaustive()
    }
}
