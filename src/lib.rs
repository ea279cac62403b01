//! terratrend: per-class raster statistics and planar trend removal
//!
//! Given a categorical mask raster and a co-registered data raster of
//! identical dimensions, this library computes the per-class mean,
//! subtracts it, fits a planar trend z = a*x + b*y + c per class by
//! least squares over pixel coordinates, subtracts the trend, and
//! writes a new raster holding the detrended residuals.

pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use crate::core::detrend::{process, DetrendOutput, DetrendParams, Detrender};
pub use crate::io::raster::{read_raster, write_raster, Raster};
pub use crate::types::{
    ClassStats, DataGrid, GeoTransform, GridReal, MaskGrid, TrendError, TrendModel, TrendResult,
};
