//! Sliding-window polynomial smoothing and differentiation.
//!
//! Raw samples are kept over a window of fixed *duration* (not a fixed
//! count), so irregular sampling is handled naturally. At each step a
//! low-degree polynomial is fitted to the window by least squares and the
//! value and derivatives at the current instant are read from its
//! coefficients (Savitzky-Golay style).

use std::collections::VecDeque;
use std::fmt;

use sigsim_core::{Real, ensure_finite, factorial};
use tracing::debug;

use crate::config::SmoothingConfig;
use crate::derivatives::Derivatives;
use crate::error::SignalResult;
use crate::fit::fit_polynomial;
use crate::reader::SignalReader;
use crate::signal::{Signal, StepSignal, check_dt};

/// Signal smoothed from `sample(own, inputs)` over a sliding time window.
///
/// While less than `window` of history has been buffered the raw sample is
/// passed through with zero derivatives. Once the window has filled, each
/// step keeps only the newest samples spanning `window`, fits a degree
/// `degree` polynomial to them and reports
/// `value[o] = p[o] * o!` for `o <= min(degree, order)`.
///
/// A fit that has fewer than `degree + 1` distinct sample times is rejected
/// with [`SignalError::UnderdeterminedFit`](crate::SignalError::UnderdeterminedFit)
/// and leaves the signal untouched.
pub struct Smoothed<F> {
    base: Signal,
    config: SmoothingConfig,
    inputs: Vec<SignalReader>,
    sample: F,
    increments: VecDeque<Real>,
    samples: VecDeque<Real>,
    filled: bool,
}

impl<F> Smoothed<F>
where
    F: FnMut(&Derivatives, &[SignalReader]) -> SignalResult<Real>,
{
    /// # Errors
    ///
    /// Returns error if `window` is not a positive finite duration.
    pub fn new(
        order: usize,
        degree: usize,
        window: Real,
        inputs: Vec<SignalReader>,
        sample: F,
    ) -> SignalResult<Self> {
        Self::from_config(SmoothingConfig::new(order, degree, window), inputs, sample)
    }

    pub fn from_config(
        config: SmoothingConfig,
        inputs: Vec<SignalReader>,
        sample: F,
    ) -> SignalResult<Self> {
        config.validate()?;
        let mut base = Signal::new(config.order);
        base.set_label("smoothed");
        Ok(Self {
            base,
            config,
            inputs,
            sample,
            increments: VecDeque::new(),
            samples: VecDeque::new(),
            filled: false,
        })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.base.set_label(label);
        self
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

    pub fn config(&self) -> &SmoothingConfig {
        &self.config
    }

    pub fn degree(&self) -> usize {
        self.config.degree
    }

    pub fn window(&self) -> Real {
        self.config.window
    }

    /// Number of raw samples currently buffered.
    pub fn window_len(&self) -> usize {
        self.samples.len()
    }

    /// Smallest number of newest samples spanning the window, if the
    /// buffered history is long enough.
    fn window_span(&self) -> Option<usize> {
        let mut span = 0.0;
        for (n, dt) in self.increments.iter().enumerate() {
            span += dt;
            if span >= self.config.window {
                return Some(n + 1);
            }
        }
        None
    }

    /// Keep only the newest `keep` samples.
    fn prune(&mut self, keep: usize) {
        let dropped = self.samples.len().saturating_sub(keep);
        if dropped > 0 {
            self.increments.truncate(keep);
            self.samples.truncate(keep);
            debug!(signal = %self.base.label(), dropped, kept = keep, "smoothing window pruned");
        }
    }

    /// Fit the newest `n` samples; `raw` is the newest one.
    fn fit_window(&self, n: usize, raw: Real) -> SignalResult<Derivatives> {
        let mut times = Vec::with_capacity(n);
        let mut t = 0.0;
        for dt in self.increments.iter().take(n) {
            times.push(t);
            t -= dt;
        }
        let values: Vec<Real> = self.samples.iter().take(n).map(|v| v - raw).collect();

        let fit = fit_polynomial(&times, &values, self.config.degree)?;
        let p = fit.coefficients();

        let mut out = Derivatives::zeros(self.config.order);
        let slots = out.as_mut_slice();
        slots[0] = raw + p[0];
        for o in 1..=self.config.fitted_orders() {
            slots[o] = p[o] * factorial(o);
        }
        Ok(out)
    }

    fn estimate(&mut self, raw: Real) -> SignalResult<Derivatives> {
        let Some(n) = self.window_span() else {
            return Ok(Derivatives::passthrough(self.config.order, raw));
        };
        let out = self.fit_window(n, raw)?;
        if !self.filled {
            self.filled = true;
            debug!(signal = %self.base.label(), samples = n, window = self.config.window, "smoothing window filled");
        }
        self.prune(n);
        Ok(out)
    }

    fn try_step(&mut self, dt: Real) -> SignalResult<Derivatives> {
        let dt = check_dt(dt)?;
        let raw = {
            let own = self.base.view();
            (self.sample)(&own, &self.inputs)?
        };
        let raw = ensure_finite(raw, "smoothed sample")?;

        self.increments.push_front(dt);
        self.samples.push_front(raw);
        match self.estimate(raw) {
            Ok(out) => Ok(self.base.commit(out, dt)),
            Err(e) => {
                self.increments.pop_front();
                self.samples.pop_front();
                Err(e)
            }
        }
    }
}

impl<F> StepSignal for Smoothed<F>
where
    F: FnMut(&Derivatives, &[SignalReader]) -> SignalResult<Real>,
{
    fn step(&mut self, dt: Real) -> SignalResult<Derivatives> {
        self.try_step(dt)
            .map_err(|e| e.at(self.base.label(), self.base.elapsed() + dt))
    }

    fn clear(&mut self) {
        self.base.clear();
        self.increments.clear();
        self.samples.clear();
        self.filled = false;
    }

    fn base(&self) -> &Signal {
        &self.base
    }

    fn base_mut(&mut self) -> &mut Signal {
        &mut self.base
    }
}

impl<F> fmt::Debug for Smoothed<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Smoothed")
            .field("base", &self.base)
            .field("config", &self.config)
            .field("buffered", &self.samples.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignalError;
    use crate::forced::Forced;

    #[test]
    fn passthrough_until_window_fills() {
        let mut src = Forced::new(0, 0, |t| 2.0 + 3.0 * t).unwrap();
        let mut s = Smoothed::new(2, 1, 0.5, vec![src.reader()], |_, inputs| inputs[0].get(0))
            .unwrap();
        for _ in 0..4 {
            src.step(0.1).unwrap();
            let v = s.step(0.1).unwrap();
            assert_eq!(v[0], src.get(0).unwrap());
            assert_eq!(v[1], 0.0);
            assert_eq!(v[2], 0.0);
        }
        assert_eq!(s.window_len(), 4);
    }

    #[test]
    fn linear_signal_recovered_exactly() {
        let (a, b) = (2.0, 3.0);
        let mut src = Forced::new(0, 0, move |t| a + b * t).unwrap();
        let mut s = Smoothed::new(2, 2, 0.5, vec![src.reader()], |_, inputs| inputs[0].get(0))
            .unwrap();
        for _ in 0..30 {
            src.step(0.1).unwrap();
            s.step(0.1).unwrap();
        }
        let t = src.elapsed();
        assert!((s.get(0).unwrap() - (a + b * t)).abs() < 1e-9);
        assert!((s.get(1).unwrap() - b).abs() < 1e-8);
        assert!(s.get(2).unwrap().abs() < 1e-6);
    }

    #[test]
    fn window_pruned_to_minimal_span() {
        let mut s = Smoothed::new(1, 1, 0.25, vec![], |_, _| Ok(1.0)).unwrap();
        for _ in 0..20 {
            s.step(0.1).unwrap();
        }
        // 0.1 + 0.1 + 0.1 is the first cumulative sum reaching 0.25
        assert_eq!(s.window_len(), 3);
        assert!((s.get(0).unwrap() - 1.0).abs() < 1e-12);
        assert!(s.get(1).unwrap().abs() < 1e-12);
    }

    #[test]
    fn orders_above_degree_stay_zero() {
        let mut src = Forced::new(0, 0, |t| t * t).unwrap();
        let mut s = Smoothed::new(3, 1, 0.3, vec![src.reader()], |_, inputs| inputs[0].get(0))
            .unwrap();
        for _ in 0..20 {
            src.step(0.05).unwrap();
            s.step(0.05).unwrap();
        }
        assert!(s.get(1).unwrap() > 0.0);
        assert_eq!(s.get(2).unwrap(), 0.0);
        assert_eq!(s.get(3).unwrap(), 0.0);
    }

    #[test]
    fn underdetermined_window_rejected_and_rolled_back() {
        // one increment already spans the window: a single retained sample
        // cannot determine a line
        let mut s = Smoothed::new(1, 1, 0.05, vec![], |_, _| Ok(1.0))
            .unwrap()
            .with_label("sg");
        let err = s.step(0.1).unwrap_err();
        assert_eq!(
            err.root(),
            &SignalError::UnderdeterminedFit {
                samples: 1,
                degree: 1
            }
        );
        assert!(format!("{err}").contains("sg"));
        assert_eq!(s.window_len(), 0);
        assert_eq!(s.elapsed(), 0.0);
        assert_eq!(s.derivatives().as_slice(), &[0.0, 0.0]);
    }

    #[test]
    fn zero_increments_do_not_count_as_distinct_times() {
        let mut s = Smoothed::new(1, 2, 0.2, vec![], |_, _| Ok(0.5)).unwrap();
        s.step(0.0).unwrap();
        s.step(0.0).unwrap();
        let err = s.step(0.3).unwrap_err();
        assert!(matches!(
            err.root(),
            SignalError::UnderdeterminedFit {
                samples: 1,
                degree: 2
            }
        ));
        assert_eq!(s.window_len(), 2);
    }

    #[test]
    fn irregular_sampling_of_a_quadratic() {
        let mut src = Forced::new(0, 0, |t| 1.0 - t + 0.5 * t * t).unwrap();
        let mut s = Smoothed::new(2, 2, 0.4, vec![src.reader()], |_, inputs| inputs[0].get(0))
            .unwrap();
        let steps = [0.013, 0.04, 0.021, 0.007, 0.035];
        for k in 0..200 {
            let dt = steps[k % steps.len()];
            src.step(dt).unwrap();
            s.step(dt).unwrap();
        }
        let t = src.elapsed();
        assert!((s.get(0).unwrap() - (1.0 - t + 0.5 * t * t)).abs() < 1e-8);
        assert!((s.get(1).unwrap() - (t - 1.0)).abs() < 1e-6);
        assert!((s.get(2).unwrap() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn clear_resets_window() {
        let mut s = Smoothed::new(1, 1, 0.2, vec![], |_, _| Ok(3.0)).unwrap();
        for _ in 0..5 {
            s.step(0.1).unwrap();
        }
        s.clear();
        assert_eq!(s.window_len(), 0);
        assert_eq!(s.derivatives().as_slice(), &[0.0, 0.0]);
        assert_eq!(s.step(0.1).unwrap().as_slice(), &[3.0, 0.0]);
    }

    #[test]
    fn invalid_window_rejected() {
        assert!(Smoothed::new(1, 1, 0.0, vec![], |_, _| Ok(0.0)).is_err());
    }
}
