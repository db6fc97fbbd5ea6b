//! Signal base container and the Euler consistency update.
//!
//! Every signal variant owns a [`Signal`]: a fixed-length derivative vector
//! plus the bookkeeping shared by all variants (label, elapsed simulated time,
//! step count). Variants differ only in where the raw sample of each step
//! comes from; propagating that sample to the other derivative orders is
//! done here.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use sigsim_core::{Real, Time, ensure_finite, seconds};
use tracing::trace;

use crate::derivatives::Derivatives;
use crate::error::{SignalError, SignalResult};
use crate::reader::SignalReader;

/// Propagate a raw sample injected at `anchor` to every other order.
///
/// Orders above the anchor are backward finite differences of the freshly
/// updated order below; orders below are forward-Euler integrated from the
/// previous order above. `old` is left untouched.
pub fn euler_update(
    old: &Derivatives,
    raw: Real,
    anchor: usize,
    dt: Real,
) -> SignalResult<Derivatives> {
    let order = old.order();
    check_anchor(anchor, order)?;
    if dt == 0.0 && anchor < order {
        return Err(SignalError::ZeroStep { anchor, order });
    }

    let prev = old.as_slice();
    let mut new = Derivatives::zeros(order);
    let next = new.as_mut_slice();
    next[anchor] = raw;
    for o in anchor + 1..=order {
        next[o] = (next[o - 1] - prev[o - 1]) / dt;
    }
    for o in (0..anchor).rev() {
        next[o] = prev[o] + dt * prev[o + 1];
    }
    for v in next.iter() {
        ensure_finite(*v, "euler derivative")?;
    }
    Ok(new)
}

pub(crate) fn check_anchor(anchor: usize, order: usize) -> SignalResult<()> {
    if anchor > order {
        return Err(SignalError::AnchorOutOfRange { anchor, order });
    }
    Ok(())
}

pub(crate) fn check_dt(dt: Real) -> SignalResult<Real> {
    if !dt.is_finite() || dt < 0.0 {
        return Err(SignalError::InvalidStep { dt });
    }
    Ok(dt)
}

/// Base container shared by all signal variants.
#[derive(Debug)]
pub struct Signal {
    label: String,
    values: Rc<RefCell<Derivatives>>,
    elapsed: Real,
    steps: u64,
}

impl Signal {
    /// Zero-initialized signal carrying derivatives `0..=order`.
    pub fn new(order: usize) -> Self {
        Self {
            label: "signal".to_string(),
            values: Rc::new(RefCell::new(Derivatives::zeros(order))),
            elapsed: 0.0,
            steps: 0,
        }
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn order(&self) -> usize {
        self.values.borrow().order()
    }

    /// Derivative `i`; fails outside `0..=order`.
    pub fn get(&self, i: usize) -> SignalResult<Real> {
        self.values.borrow().get(i)
    }

    /// Copy of the current derivative vector.
    pub fn derivatives(&self) -> Derivatives {
        self.values.borrow().clone()
    }

    /// Set derivative `i` directly. Only allowed before the first step.
    pub fn init(&mut self, i: usize, value: Real) -> SignalResult<()> {
        if self.steps > 0 {
            return Err(SignalError::AlreadyStepped);
        }
        self.values.borrow_mut().set(i, value)
    }

    /// Reset to the construction-time state.
    pub fn clear(&mut self) {
        self.values.borrow_mut().fill_zero();
        self.elapsed = 0.0;
        self.steps = 0;
    }

    /// Read-only handle for signals that depend on this one.
    pub fn reader(&self) -> SignalReader {
        SignalReader::new(Rc::clone(&self.values))
    }

    /// Simulated time accumulated by successful steps.
    pub fn elapsed(&self) -> Real {
        self.elapsed
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Inject `raw` at `anchor` and run the Euler update over `dt`.
    pub fn apply_euler_step(
        &mut self,
        raw: Real,
        anchor: usize,
        dt: Real,
    ) -> SignalResult<Derivatives> {
        let dt = check_dt(dt)?;
        let new = euler_update(&self.values.borrow(), raw, anchor, dt)?;
        Ok(self.commit(new, dt))
    }

    pub(crate) fn view(&self) -> Ref<'_, Derivatives> {
        self.values.borrow()
    }

    /// Swap in a fully computed vector and advance the clock.
    pub(crate) fn commit(&mut self, new: Derivatives, dt: Real) -> Derivatives {
        debug_assert_eq!(new.len(), self.values.borrow().len());
        self.elapsed += dt;
        self.steps += 1;
        trace!(signal = %self.label, dt, t = self.elapsed, values = ?new, "step");
        *self.values.borrow_mut() = new.clone();
        new
    }
}

/// Common surface of every steppable signal variant.
pub trait StepSignal {
    /// Advance by `dt` and return the updated derivative vector.
    fn step(&mut self, dt: Real) -> SignalResult<Derivatives>;

    /// Reset vector, clock and any history to the construction-time state.
    fn clear(&mut self);

    fn base(&self) -> &Signal;

    fn base_mut(&mut self) -> &mut Signal;

    fn get(&self, i: usize) -> SignalResult<Real> {
        self.base().get(i)
    }

    fn derivatives(&self) -> Derivatives {
        self.base().derivatives()
    }

    fn reader(&self) -> SignalReader {
        self.base().reader()
    }

    fn label(&self) -> &str {
        self.base().label()
    }

    fn order(&self) -> usize {
        self.base().order()
    }

    fn elapsed(&self) -> Real {
        self.base().elapsed()
    }

    /// Pre-run initialization of derivative `i`.
    fn init(&mut self, i: usize, value: Real) -> SignalResult<()> {
        self.base_mut().init(i, value)
    }

    /// [`step`](StepSignal::step) with a unit-carrying time increment.
    fn advance(&mut self, dt: Time) -> SignalResult<Derivatives> {
        self.step(seconds(dt))
    }
}
