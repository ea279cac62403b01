//! Core detrending algorithm
//!
//! Modules for per-class statistics and planar trend removal over
//! co-registered mask/data grids.

pub mod detrend;

pub use detrend::{process, DetrendOutput, DetrendParams, Detrender};
