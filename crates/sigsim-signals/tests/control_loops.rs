//! Coupled signal graphs: speed-commanded device under feedback control,
//! with and without a delayed position sensor.

use sigsim_signals::{
    Computed, Delayed, Derivatives, Forced, Probe, RunOptions, Schedule, SignalReader,
    SignalResult, StepSignal, Trace,
};

const GAIN: f64 = 3.0;
const SENSOR_DELAY: f64 = 1.0;
const KP: f64 = 5.0;
const KD: f64 = 1.0;

fn step_target() -> impl StepSignal + 'static {
    Forced::new(0, 0, |t| if t > 1.0 { 1.0 } else { 0.0 })
        .expect("valid target")
        .with_label("target")
}

/// Position driven through a speed command: `x'' = gain * (cmd - x')`,
/// observed by a sensor lagging by `delay`.
fn cmd_vel_device(cmd: SignalReader, gain: f64, delay: f64) -> (impl StepSignal + 'static, Delayed) {
    let position = Computed::new(2, 2, vec![cmd], move |me, inputs| {
        Ok(gain * (inputs[0].get(0)? - me.get(1)?))
    })
    .expect("valid position")
    .with_label("position");
    let sensor = Delayed::new(position.reader(), delay)
        .expect("valid delay")
        .with_label("position_sensor");
    (position, sensor)
}

/// `cmd = KP * e + KD * e'`
fn pd_command(error: SignalReader) -> impl StepSignal + 'static {
    Computed::new(0, 0, vec![error], |_, inputs| {
        Ok(KP * inputs[0].get(0)? + KD * inputs[0].get(1)?)
    })
    .expect("valid command")
    .with_label("cmd_vel")
}

/// `e = inputs[0] - inputs[1]`, second input connected later.
fn difference(
    lhs: SignalReader,
) -> Computed<impl FnMut(&Derivatives, &[SignalReader]) -> SignalResult<f64>> {
    Computed::new(1, 0, vec![lhs], |_, inputs| {
        Ok(inputs[0].get(0)? - inputs[1].get(0)?)
    })
    .expect("valid error")
}

fn run(schedule: &mut Schedule, t_end: f64, probes: &[Probe]) -> Trace {
    let opts = RunOptions {
        dt: 0.01,
        t_end,
        max_steps: 10_000,
        record_every: 1,
    };
    schedule.run(&opts, probes).expect("run should succeed")
}

fn max_deviation_after(trace: &Trace, name: &str, t_from: f64, target: f64) -> f64 {
    trace
        .t
        .iter()
        .zip(trace.series(name).expect("probe recorded"))
        .filter(|(t, _)| **t > t_from)
        .map(|(_, x)| (x - target).abs())
        .fold(0.0, f64::max)
}

#[test]
fn undelayed_feedback_settles_on_target() {
    let target = step_target();
    let mut error = difference(target.reader()).with_label("error");
    let cmd = pd_command(error.reader());
    let (position, sensor) = cmd_vel_device(cmd.reader(), GAIN, SENSOR_DELAY);
    error.connect(position.reader());

    let probes = [
        Probe::new("position", position.reader(), 0),
        Probe::new("speed", position.reader(), 1),
        Probe::new("sensor", sensor.reader(), 0),
    ];
    let mut schedule = Schedule::new();
    schedule.push(target);
    schedule.push(error);
    schedule.push(cmd);
    schedule.push(position);
    schedule.push(sensor);

    let trace = run(&mut schedule, 15.0, &probes);
    assert!(max_deviation_after(&trace, "position", 6.0, 1.0) < 1e-3);
    assert!(trace.last("speed").unwrap().abs() < 1e-3);
    // sensor reports the settled position one second later
    assert!(max_deviation_after(&trace, "sensor", 8.0, 1.0) < 1e-3);
}

#[test]
fn sensor_lags_position_by_delay() {
    let mut cmd = Forced::new(0, 0, |t| if t > 1.0 { 1.0 } else { 0.0 }).unwrap();
    let (mut position, mut sensor) = cmd_vel_device(cmd.reader(), GAIN, SENSOR_DELAY);

    let dt = 0.01;
    let mut history = Vec::new();
    for _ in 0..600 {
        cmd.step(dt).unwrap();
        position.step(dt).unwrap();
        sensor.step(dt).unwrap();
        history.push(position.get(0).unwrap());
        if history.len() > 101 {
            // the delayed instant sits between two stored snapshots about
            // one delay back
            let around = &history[history.len() - 101..history.len() - 98];
            let lo = around.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = around.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let s = sensor.get(0).unwrap();
            assert!(s >= lo - 1e-12 && s <= hi + 1e-12);
        }
    }
    assert!(sensor.get(0).unwrap() < position.get(0).unwrap());
}

#[test]
fn delayed_feedback_without_compensation_diverges() {
    let target = step_target();
    let mut error = difference(target.reader()).with_label("error");
    let cmd = pd_command(error.reader());
    let (position, sensor) = cmd_vel_device(cmd.reader(), GAIN, SENSOR_DELAY);
    error.connect(sensor.reader());

    let probes = [Probe::new("position", position.reader(), 0)];
    let mut schedule = Schedule::new();
    schedule.push(target);
    schedule.push(error);
    schedule.push(cmd);
    schedule.push(position);
    schedule.push(sensor);

    let trace = run(&mut schedule, 20.0, &probes);
    assert!(max_deviation_after(&trace, "position", 1.0, 1.0) > 10.0);
}

/// Smith predictor: the controller sees the real sensor corrected by
/// `model_position - model_sensor`.
fn smith_predictor(model_gain: f64, model_delay: f64, t_end: f64) -> Trace {
    let target = step_target();
    let mut error = difference(target.reader()).with_label("error");
    let mut smith_error = Computed::new(1, 0, vec![error.reader()], |_, inputs| {
        let prediction = inputs[1].get(0)? - inputs[2].get(0)?;
        Ok(inputs[0].get(0)? - prediction)
    })
    .unwrap()
    .with_label("smith_error");
    let cmd = pd_command(smith_error.reader());

    let (position, sensor) = cmd_vel_device(cmd.reader(), GAIN, SENSOR_DELAY);
    let (model_position, model_sensor) = cmd_vel_device(cmd.reader(), model_gain, model_delay);
    error.connect(sensor.reader());
    smith_error.connect(model_position.reader());
    smith_error.connect(model_sensor.reader());

    let probes = [
        Probe::new("position", position.reader(), 0),
        Probe::new("sensor", sensor.reader(), 0),
        Probe::new("model_sensor", model_sensor.reader(), 0),
    ];
    let mut schedule = Schedule::new();
    schedule.push(target);
    schedule.push(error);
    schedule.push(smith_error);
    schedule.push(cmd);
    schedule.push(position);
    schedule.push(sensor);
    schedule.push(model_position);
    schedule.push(model_sensor);
    run(&mut schedule, t_end, &probes)
}

#[test]
fn smith_predictor_with_exact_model_settles() {
    let trace = smith_predictor(GAIN, SENSOR_DELAY, 20.0);
    assert!(max_deviation_after(&trace, "position", 8.0, 1.0) < 1e-3);
    assert!(max_deviation_after(&trace, "position", 0.0, 0.0) < 1.2);
    assert_eq!(trace.series("sensor"), trace.series("model_sensor"));
}

#[test]
fn smith_predictor_tolerates_model_mismatch() {
    let trace = smith_predictor(0.9 * GAIN, 1.1 * SENSOR_DELAY, 30.0);
    assert!(max_deviation_after(&trace, "position", 20.0, 1.0) < 1e-3);
}

#[test]
fn delayed_maximum_of_sine_and_its_slope() {
    let tau = 2.0_f64.sqrt();
    let dt = 0.01;
    let mut f = Forced::new(1, 0, f64::sin).unwrap();
    let mut g = Computed::new(1, 0, vec![f.reader()], |_, inputs| {
        Ok(inputs[0].get(0)?.max(inputs[0].get(1)?))
    })
    .unwrap();
    let mut h = Delayed::new(g.reader(), tau).unwrap();

    // a'' = -0.1 from a = 0.2, a' = 0.3
    let mut a = Computed::new(2, 2, vec![], |_, _| Ok(-0.1)).unwrap();
    a.init(0, 0.2).unwrap();
    a.init(1, 0.3).unwrap();

    for _ in 0..2000 {
        f.step(dt).unwrap();
        g.step(dt).unwrap();
        h.step(dt).unwrap();
        a.step(dt).unwrap();
        let t = f.elapsed();
        if t > tau + 2.0 * dt {
            let expected = (t - tau).sin().max((t - tau).cos());
            assert!((h.get(0).unwrap() - expected).abs() < 2e-2);
        }
    }
    let t = a.elapsed();
    let exact = 0.2 + 0.3 * t - 0.05 * t * t;
    assert!((a.get(0).unwrap() - exact).abs() < 0.05);
}
