//! Thin GDAL-backed raster access layer.
//!
//! A raster is read as a single-band 2D grid together with its no-data
//! sentinel and enough spatial metadata (projection, geotransform) to
//! construct a matching output raster later.

use crate::types::{GeoTransform, TrendError, TrendResult};
use gdal::raster::{Buffer, GdalType};
use gdal::{Dataset, DriverManager};
use ndarray::Array2;
use std::path::Path;

/// A single-band pixel grid and the metadata needed to write a sibling raster
#[derive(Debug, Clone)]
pub struct Raster<T> {
    pub grid: Array2<T>,
    /// Declared no-data sentinel, if any
    pub no_data: Option<f64>,
    /// Projection in WKT, empty when the source declares none
    pub projection: String,
    pub geo_transform: GeoTransform,
}

impl<T> Raster<T> {
    /// Grid shape as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.grid.dim()
    }
}

/// Read band 1 of a raster file into memory.
///
/// The pixel type conversion is delegated to GDAL, so an integer mask can
/// be read as `i32` and a measurement band as `f32` regardless of the
/// on-disk type. Any failure to open or read the band is a load error that
/// aborts the whole operation.
pub fn read_raster<T, P>(path: P) -> TrendResult<Raster<T>>
where
    T: GdalType + Copy,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    log::debug!("Reading raster: {}", path.display());

    let load_err = |source| TrendError::Load {
        path: path.to_path_buf(),
        source,
    };

    let dataset = Dataset::open(path).map_err(load_err)?;
    let (width, height) = dataset.raster_size();
    // Plain grids without georeferencing fall back to the identity transform
    let geo_transform = dataset
        .geo_transform()
        .map(GeoTransform::from_gdal)
        .unwrap_or_default();
    let projection = dataset.projection();

    let band = dataset.rasterband(1).map_err(load_err)?;
    let no_data = band.no_data_value();
    let buffer = band
        .read_as::<T>((0, 0), (width, height), (width, height), None)
        .map_err(load_err)?;

    let grid = Array2::from_shape_vec((height, width), buffer.data)
        .map_err(|e| TrendError::Processing(format!("failed to reshape raster data: {}", e)))?;

    log::debug!(
        "Read {}x{} grid, no-data: {:?}",
        height,
        width,
        no_data
    );

    Ok(Raster {
        grid,
        no_data,
        projection,
        geo_transform,
    })
}

/// Write a grid as a single-band float GeoTIFF.
///
/// Projection and geotransform are copied verbatim from the source raster's
/// metadata, and the chosen no-data value is recorded on the band. The
/// dataset is flushed before returning.
pub fn write_raster<P: AsRef<Path>>(
    path: P,
    grid: &Array2<f32>,
    projection: &str,
    geo_transform: &GeoTransform,
    no_data: f64,
) -> TrendResult<()> {
    let path = path.as_ref();
    log::info!("Writing output raster: {}", path.display());

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let (height, width) = grid.dim();

    let mut dataset =
        driver.create_with_band_type::<f32, _>(path, width as isize, height as isize, 1)?;

    dataset.set_geo_transform(&geo_transform.to_gdal())?;
    if !projection.is_empty() {
        dataset.set_projection(projection)?;
    }

    let mut band = dataset.rasterband(1)?;
    band.set_no_data_value(Some(no_data))?;

    let flat_data: Vec<f32> = grid.iter().cloned().collect();
    let buffer = Buffer::new((width, height), flat_data);
    band.write((0, 0), (width, height), &buffer)?;

    dataset.flush_cache();

    log::info!("Output written to {}", path.display());
    Ok(())
}
