//! Read-only handles onto another signal's derivative vector.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use sigsim_core::Real;

use crate::derivatives::Derivatives;
use crate::error::SignalResult;

/// Shared, read-only view of a signal's current derivatives.
///
/// Readers are how signal graphs couple: a [`Computed`](crate::Computed) or
/// [`Smoothed`](crate::Smoothed) signal receives the readers it depends on,
/// and a [`Delayed`](crate::Delayed) signal holds its source's reader. A
/// reader observes whatever the owning signal last committed and has no way
/// to mutate it.
#[derive(Clone)]
pub struct SignalReader {
    values: Rc<RefCell<Derivatives>>,
}

impl SignalReader {
    pub(crate) fn new(values: Rc<RefCell<Derivatives>>) -> Self {
        Self { values }
    }

    /// Derivative `i` of the observed signal.
    pub fn get(&self, i: usize) -> SignalResult<Real> {
        self.values.borrow().get(i)
    }

    /// Owned copy of the observed vector.
    pub fn snapshot(&self) -> Derivatives {
        self.values.borrow().clone()
    }

    pub fn order(&self) -> usize {
        self.values.borrow().order()
    }

    /// True when both readers observe the same signal.
    pub fn same_signal(&self, other: &SignalReader) -> bool {
        Rc::ptr_eq(&self.values, &other.values)
    }
}

impl fmt::Debug for SignalReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SignalReader")
            .field(&*self.values.borrow())
            .finish()
    }
}
