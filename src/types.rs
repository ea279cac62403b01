use ndarray::Array2;
use std::path::PathBuf;

/// Real-valued measurement data
pub type GridReal = f32;

/// 2D grid of continuous measurements (rows x cols)
pub type DataGrid = Array2<GridReal>;

/// 2D grid of integer class labels (rows x cols)
pub type MaskGrid = Array2<i32>;

/// Geospatial transformation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Build from GDAL's six-element affine array
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self {
            top_left_x: gt[0],
            pixel_width: gt[1],
            rotation_x: gt[2],
            top_left_y: gt[3],
            rotation_y: gt[4],
            pixel_height: gt[5],
        }
    }

    /// Convert back to GDAL's six-element affine array
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        // Identity transform: pixel coordinates are map coordinates
        Self::from_gdal([0.0, 1.0, 0.0, 0.0, 0.0, -1.0])
    }
}

/// Planar trend surface z = a*x + b*y + c over pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendModel {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl std::fmt::Display for TrendModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "a={} b={} c={}", self.a, self.b, self.c)
    }
}

/// Per-class statistics produced by one detrending run
#[derive(Debug, Clone)]
pub struct ClassStats {
    /// Class label in the mask grid
    pub label: i32,
    /// Number of valid samples after masking
    pub count: usize,
    /// Arithmetic mean of the valid samples
    pub mean: GridReal,
    /// Fitted plane, None when the class had 3 or fewer samples
    pub trend: Option<TrendModel>,
}

/// Error types for detrending operations
#[derive(Debug, thiserror::Error)]
pub enum TrendError {
    #[error("failed to open raster {}: {}", path.display(), source)]
    Load {
        path: PathBuf,
        #[source]
        source: gdal::errors::GdalError,
    },

    #[error("mask and data grids have inconsistent shapes: {mask:?} vs {data:?}")]
    ShapeMismatch {
        mask: (usize, usize),
        data: (usize, usize),
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("processing error: {0}")]
    Processing(String),
}

/// Result type for detrending operations
pub type TrendResult<T> = Result<T, TrendError>;
