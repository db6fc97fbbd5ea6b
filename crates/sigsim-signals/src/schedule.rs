//! Caller-ordered stepping of a signal graph.
//!
//! A [`Schedule`] steps its members in exactly the order they were pushed;
//! it never reorders them from their data dependencies. Push producers
//! before the signals that read them for an explicit scheme, or deliberately
//! after them to approximate an implicit one.

use sigsim_core::Real;
use tracing::{debug, warn};

use crate::config::RunOptions;
use crate::error::{SignalError, SignalResult};
use crate::reader::SignalReader;
use crate::signal::StepSignal;

/// One recorded quantity: derivative `order` of the signal behind `reader`.
#[derive(Debug, Clone)]
pub struct Probe {
    pub name: String,
    pub reader: SignalReader,
    pub order: usize,
}

impl Probe {
    pub fn new(name: impl Into<String>, reader: SignalReader, order: usize) -> Self {
        Self {
            name: name.into(),
            reader,
            order,
        }
    }
}

/// Recorded time series of a run.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    /// Time points (seconds)
    pub t: Vec<Real>,
    /// `(probe name, samples)`, one entry per probe, aligned with `t`.
    pub series: Vec<(String, Vec<Real>)>,
}

impl Trace {
    pub fn series(&self, name: &str) -> Option<&[Real]> {
        self.series
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn last(&self, name: &str) -> Option<Real> {
        self.series(name).and_then(|v| v.last().copied())
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }
}

/// Ordered collection of signals stepped together.
#[derive(Default)]
pub struct Schedule {
    members: Vec<Box<dyn StepSignal>>,
    time: Real,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `signal` to the stepping order and return a reader on it.
    pub fn push<S: StepSignal + 'static>(&mut self, signal: S) -> SignalReader {
        let reader = signal.reader();
        self.members.push(Box::new(signal));
        reader
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member labels in stepping order.
    pub fn labels(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.label()).collect()
    }

    /// Time reached by the last complete round of steps.
    pub fn time(&self) -> Real {
        self.time
    }

    /// Step every member once, in order. Stops at the first failure; members
    /// already stepped this round keep their new state.
    pub fn step_all(&mut self, dt: Real) -> SignalResult<()> {
        for member in self.members.iter_mut() {
            if let Err(e) = member.step(dt) {
                warn!(signal = %member.label(), t = self.time + dt, error = %e, "step failed");
                return Err(e);
            }
        }
        self.time += dt;
        Ok(())
    }

    pub fn clear_all(&mut self) {
        for member in self.members.iter_mut() {
            member.clear();
        }
        self.time = 0.0;
    }

    /// Step the schedule with a fixed `dt` until `t_end`, recording `probes`.
    ///
    /// The run starts from the schedule's current [`time`](Self::time) and
    /// stops at the absolute `t_end`; nothing is stepped if that time has
    /// already been reached. The initial state is recorded before the first
    /// step.
    pub fn run(&mut self, opts: &RunOptions, probes: &[Probe]) -> SignalResult<Trace> {
        opts.validate()?;
        for probe in probes {
            let order = probe.reader.order();
            if probe.order > order {
                return Err(SignalError::IndexOob {
                    index: probe.order,
                    order,
                });
            }
        }

        let mut trace = Trace {
            t: Vec::new(),
            series: probes.iter().map(|p| (p.name.clone(), Vec::new())).collect(),
        };
        let record = |trace: &mut Trace, t: Real| -> SignalResult<()> {
            trace.t.push(t);
            for (probe, (_, values)) in probes.iter().zip(trace.series.iter_mut()) {
                values.push(probe.reader.get(probe.order)?);
            }
            Ok(())
        };

        let t_start = self.time;
        record(&mut trace, t_start)?;

        let mut step = 0;
        while t_start + (step as Real) * opts.dt < opts.t_end - 0.5 * opts.dt {
            if step >= opts.max_steps {
                warn!(max_steps = opts.max_steps, t = self.time, "run stopped at step limit");
                break;
            }
            self.step_all(opts.dt)?;
            step += 1;
            if step % opts.record_every == 0 {
                record(&mut trace, self.time)?;
            }
        }
        debug!(steps = step, t = self.time, recorded = trace.len(), "run complete");
        Ok(trace)
    }
}
