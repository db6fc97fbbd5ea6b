//! sigsim-core: shared foundation for the signal framework.
//!
//! Contains:
//! - numeric (Real + finiteness checks + float helpers)
//! - units (uom time type + constructors)
//! - error (shared error type)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use units::*;
