//! Series utilities: date filtering, trailing-anomaly trimming, and smoothing.

pub mod filter;
pub mod smooth;
pub mod trim;

pub use filter::*;
pub use smooth::*;
pub use trim::*;
