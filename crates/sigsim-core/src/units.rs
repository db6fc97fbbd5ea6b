// sigsim-core/src/units.rs

use uom::si::f64::Time as UomTime;

/// Simulated time span (SI, f64)
pub type Time = UomTime;

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

/// Raw seconds carried by a time span; signals step on plain `f64`.
#[inline]
pub fn seconds(t: Time) -> f64 {
    use uom::si::time::second;
    t.get::<second>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_round_trip() {
        assert_eq!(seconds(s(2.0)), 2.0);
        assert_eq!(seconds(s(0.25) + s(0.5)), 0.75);
    }
}
