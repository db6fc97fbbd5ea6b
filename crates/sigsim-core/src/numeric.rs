use crate::CoreError;

/// Floating point type used throughout the framework
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Accept `v` only if it is finite and `>= 0`.
pub fn ensure_non_negative(v: Real, what: &'static str) -> Result<Real, CoreError> {
    let v = ensure_finite(v, what)?;
    if v < 0.0 {
        return Err(CoreError::InvalidArg { what });
    }
    Ok(v)
}

/// `n!` as a float. Exact for the small orders signals carry.
pub fn factorial(n: usize) -> Real {
    (1..=n).fold(1.0, |acc, k| acc * k as Real)
}
