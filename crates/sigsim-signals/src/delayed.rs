//! Fixed time delay over another signal's derivative history.

use std::collections::VecDeque;

use sigsim_core::{Real, ensure_non_negative};
use tracing::debug;

use crate::config::DelayConfig;
use crate::derivatives::Derivatives;
use crate::error::SignalResult;
use crate::reader::SignalReader;
use crate::signal::{Signal, StepSignal, check_dt};

/// Snapshot of the source taken at one step.
#[derive(Debug, Clone)]
struct Sample {
    dt: Real,
    values: Derivatives,
}

/// Reports the source's derivative vector `delay` time units in the past.
///
/// Each step records `(dt, source snapshot)` at the front of a delay line,
/// locates the two snapshots bracketing the delayed instant, and linearly
/// interpolates between them. Snapshots older than the bracket are dropped
/// after every step, so the line holds roughly `delay / dt` entries.
///
/// Until the recorded history spans `delay`, the output is all zeros.
#[derive(Debug)]
pub struct Delayed {
    base: Signal,
    source: SignalReader,
    delay: Real,
    history: VecDeque<Sample>,
    primed: bool,
}

impl Delayed {
    /// Delay `source` by `delay` (same order as the source).
    ///
    /// # Errors
    ///
    /// Returns error if `delay` is negative or not finite.
    pub fn new(source: SignalReader, delay: Real) -> SignalResult<Self> {
        let delay = ensure_non_negative(delay, "delay")?;
        let mut base = Signal::new(source.order());
        base.set_label("delayed");
        Ok(Self {
            base,
            source,
            delay,
            history: VecDeque::new(),
            primed: false,
        })
    }

    pub fn from_config(source: SignalReader, config: &DelayConfig) -> SignalResult<Self> {
        config.validate()?;
        Self::new(source, config.delay)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.base.set_label(label);
        self
    }

    pub fn delay(&self) -> Real {
        self.delay
    }

    pub fn source(&self) -> &SignalReader {
        &self.source
    }

    /// Number of snapshots currently held in the delay line.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Total time spanned by the delay line.
    pub fn history_span(&self) -> Real {
        self.history.iter().map(|s| s.dt).sum()
    }

    /// Index of the first snapshot whose cumulative increment reaches the
    /// delay, together with the cumulative time before it.
    fn bracket(&self) -> Option<(usize, Real)> {
        let mut elapsed = 0.0;
        for (i, sample) in self.history.iter().enumerate() {
            let before = elapsed;
            elapsed += sample.dt;
            if elapsed >= self.delay {
                return Some((i, before));
            }
        }
        None
    }

    /// Keep only the newest `keep` snapshots.
    fn prune(&mut self, keep: usize) {
        let dropped = self.history.len().saturating_sub(keep);
        if dropped > 0 {
            self.history.truncate(keep);
            debug!(signal = %self.base.label(), dropped, kept = keep, "delay line pruned");
        }
    }

    fn try_step(&mut self, dt: Real) -> SignalResult<Derivatives> {
        let dt = check_dt(dt)?;
        if self.delay == 0.0 {
            self.history.clear();
            return Ok(self.base.commit(self.source.snapshot(), dt));
        }

        self.history.push_front(Sample {
            dt,
            values: self.source.snapshot(),
        });

        let Some((i, before)) = self.bracket() else {
            return Ok(self.base.commit(Derivatives::zeros(self.source.order()), dt));
        };
        if !self.primed {
            self.primed = true;
            debug!(signal = %self.base.label(), delay = self.delay, samples = i + 1, "delay line primed");
        }

        let newer = match i {
            0 => Derivatives::zeros(self.source.order()),
            _ => self.history[i - 1].values.clone(),
        };
        let older = &self.history[i];
        let c = (self.delay - before) / older.dt;
        let value = Derivatives::lerp(&newer, &older.values, c);

        self.prune(i + 1);
        Ok(self.base.commit(value, dt))
    }
}

impl StepSignal for Delayed {
    fn step(&mut self, dt: Real) -> SignalResult<Derivatives> {
        self.try_step(dt)
            .map_err(|e| e.at(self.base.label(), self.base.elapsed() + dt))
    }

    fn clear(&mut self) {
        self.base.clear();
        self.history.clear();
        self.primed = false;
    }

    fn base(&self) -> &Signal {
        &self.base
    }

    fn base_mut(&mut self) -> &mut Signal {
        &mut self.base
    }
}
