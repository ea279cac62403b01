pub mod raster;

pub use raster::{read_raster, write_raster, Raster};
