//! Fixed-length derivative vectors.

use std::fmt;
use std::ops::Index;

use sigsim_core::Real;

use crate::error::{SignalError, SignalResult};

/// Value and successive time derivatives of a signal.
///
/// Entry `k` is the `k`-th time derivative; the length is `order + 1` and
/// never changes after construction.
#[derive(Clone, PartialEq)]
pub struct Derivatives(Box<[Real]>);

impl Derivatives {
    /// All-zero vector holding orders `0..=order`.
    pub fn zeros(order: usize) -> Self {
        Self(vec![0.0; order + 1].into_boxed_slice())
    }

    /// Build a vector from explicit entries. At least one entry is required.
    pub fn from_values(values: impl Into<Vec<Real>>) -> SignalResult<Self> {
        let values = values.into();
        if values.is_empty() {
            return Err(SignalError::InvalidArg {
                what: "derivative vector needs at least one entry",
            });
        }
        Ok(Self(values.into_boxed_slice()))
    }

    /// `[value, 0, 0, ...]` holding orders `0..=order`.
    pub fn passthrough(order: usize, value: Real) -> Self {
        let mut out = Self::zeros(order);
        out.0[0] = value;
        out
    }

    /// Highest derivative index.
    pub fn order(&self) -> usize {
        self.0.len() - 1
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Derivative `i`, bounds-checked.
    pub fn get(&self, i: usize) -> SignalResult<Real> {
        self.0.get(i).copied().ok_or(SignalError::IndexOob {
            index: i,
            order: self.order(),
        })
    }

    /// Overwrite derivative `i`, bounds-checked.
    pub fn set(&mut self, i: usize, value: Real) -> SignalResult<()> {
        let order = self.order();
        let slot = self
            .0
            .get_mut(i)
            .ok_or(SignalError::IndexOob { index: i, order })?;
        *slot = value;
        Ok(())
    }

    pub fn as_slice(&self) -> &[Real] {
        &self.0
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Real] {
        &mut self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = Real> + '_ {
        self.0.iter().copied()
    }

    pub fn fill_zero(&mut self) {
        self.0.fill(0.0);
    }

    /// `from + c * (to - from)`, entry by entry. Both vectors share an order.
    pub fn lerp(from: &Self, to: &Self, c: Real) -> Self {
        debug_assert_eq!(from.len(), to.len());
        let values: Vec<Real> = from
            .iter()
            .zip(to.iter())
            .map(|(a, b)| a + c * (b - a))
            .collect();
        Self(values.into_boxed_slice())
    }
}

impl Index<usize> for Derivatives {
    type Output = Real;

    fn index(&self, i: usize) -> &Real {
        &self.0[i]
    }
}

impl fmt::Debug for Derivatives {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}
