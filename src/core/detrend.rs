use crate::io::raster::{read_raster, write_raster, Raster};
use crate::types::{
    ClassStats, DataGrid, GridReal, MaskGrid, TrendError, TrendModel, TrendResult,
};
use nalgebra::{DMatrix, DVector};
use std::path::Path;

/// Parameters for per-class detrending
#[derive(Debug, Clone)]
pub struct DetrendParams {
    /// Ordered set of class labels to process; labels absent from the
    /// mask are skipped, labels present in the mask but not listed here
    /// are ignored entirely.
    pub classes: Vec<i32>,
    /// Trend fitting requires strictly more samples than this
    pub min_trend_samples: usize,
    /// Output no-data value used when the data raster declares none
    pub default_no_data: f64,
}

impl Default for DetrendParams {
    fn default() -> Self {
        Self {
            classes: vec![1, 2, 3],
            min_trend_samples: 3,
            default_no_data: -9999.0,
        }
    }
}

/// Result of one detrending run
#[derive(Debug, Clone)]
pub struct DetrendOutput {
    /// Detrended residual grid, same shape as the inputs
    pub grid: DataGrid,
    /// Statistics for every class that had valid samples
    pub stats: Vec<ClassStats>,
    /// No-data value to declare on the output raster
    pub no_data: f64,
}

/// Per-class statistics and planar trend removal engine
pub struct Detrender {
    params: DetrendParams,
}

impl Detrender {
    /// Create a detrender with explicit parameters
    pub fn new(params: DetrendParams) -> Self {
        Self { params }
    }

    /// Create a detrender with the standard parameters (classes 1, 2, 3)
    pub fn standard() -> Self {
        Self::new(DetrendParams::default())
    }

    /// Complete file-to-file pipeline: load both rasters, detrend, write
    /// the residual raster with the data raster's spatial metadata.
    ///
    /// Load failures and a mask/data shape mismatch abort the run before
    /// any output is created.
    pub fn process(
        &self,
        mask_path: impl AsRef<Path>,
        data_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
    ) -> TrendResult<Vec<ClassStats>> {
        let mask: Raster<i32> = read_raster(mask_path)?;
        let data: Raster<GridReal> = read_raster(data_path)?;

        let mask_no_data = mask.no_data.map(|v| v as i32);
        let data_no_data = data.no_data.map(|v| v as GridReal);

        let result = self.detrend(&mask.grid, mask_no_data, &data.grid, data_no_data)?;

        write_raster(
            output_path,
            &result.grid,
            &data.projection,
            &data.geo_transform,
            result.no_data,
        )?;

        Ok(result.stats)
    }

    /// Detrend an in-memory data grid guided by a class mask grid.
    ///
    /// For every configured class label: select the pixels carrying that
    /// label (excluding both rasters' no-data sentinels and NaN data),
    /// subtract the class mean, then fit a plane z = a*x + b*y + c to the
    /// mean-removed residuals and subtract it where selected. Classes
    /// with no valid pixels are skipped; classes with too few samples
    /// keep only the mean adjustment.
    pub fn detrend(
        &self,
        mask: &MaskGrid,
        mask_no_data: Option<i32>,
        data: &DataGrid,
        data_no_data: Option<GridReal>,
    ) -> TrendResult<DetrendOutput> {
        if mask.dim() != data.dim() {
            return Err(TrendError::ShapeMismatch {
                mask: mask.dim(),
                data: data.dim(),
            });
        }

        let mut output = data.clone();
        let mut stats = Vec::new();

        for &label in &self.params.classes {
            let (pixels, mut samples) =
                select_class(mask, data, label, mask_no_data, data_no_data);

            if pixels.is_empty() {
                log::warn!("No valid data for class {}. Skipping.", label);
                continue;
            }

            let mean = class_mean(&samples);
            log::info!("Class {}: mean={}", label, mean);

            // Mean removal happens both in the shared output grid and in
            // the per-class sample vector; the trend is fit to the
            // mean-removed residuals, not the raw values.
            for &(row, col) in &pixels {
                output[[row, col]] -= mean;
            }
            for sample in samples.iter_mut() {
                *sample -= mean;
            }

            let trend = if samples.len() > self.params.min_trend_samples {
                let model = fit_plane(&pixels, &samples)?;
                for &(row, col) in &pixels {
                    let surface = model.a * col as f64 + model.b * row as f64 + model.c;
                    output[[row, col]] -= surface as GridReal;
                }
                log::info!("Class {}: trend coefficients {}", label, model);
                Some(model)
            } else {
                log::warn!(
                    "Class {}: only {} valid samples, skipping trend fit",
                    label,
                    samples.len()
                );
                None
            };

            stats.push(ClassStats {
                label,
                count: pixels.len(),
                mean,
                trend,
            });
        }

        let no_data = self.finalize_no_data(&mut output, mask, mask_no_data, data_no_data);

        Ok(DetrendOutput {
            grid: output,
            stats,
            no_data,
        })
    }

    /// Decide the output no-data value and sentinel-adjust the grid.
    ///
    /// With a declared data sentinel, pixels still equal to it become NaN
    /// and the sentinel is kept as the output no-data value. Without one,
    /// the default sentinel is declared and additionally stamped wherever
    /// the mask grid equals its own sentinel.
    fn finalize_no_data(
        &self,
        output: &mut DataGrid,
        mask: &MaskGrid,
        mask_no_data: Option<i32>,
        data_no_data: Option<GridReal>,
    ) -> f64 {
        if let Some(nd) = data_no_data {
            output.mapv_inplace(|v| if v == nd { GridReal::NAN } else { v });
            return nd as f64;
        }

        if let Some(mask_nd) = mask_no_data {
            let fill = self.params.default_no_data as GridReal;
            let (rows, cols) = output.dim();
            for row in 0..rows {
                for col in 0..cols {
                    if mask[[row, col]] == mask_nd {
                        output[[row, col]] = fill;
                    }
                }
            }
        }
        self.params.default_no_data
    }
}

/// Detrend with the standard class set {1, 2, 3}.
///
/// Minimal public entry point: three concrete paths, success or failure.
pub fn process(
    mask_path: impl AsRef<Path>,
    data_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> TrendResult<Vec<ClassStats>> {
    Detrender::standard().process(mask_path, data_path, output_path)
}

/// Select the valid pixels of one class.
///
/// A pixel belongs to the selection iff its mask value equals the label,
/// is not the mask's no-data sentinel, and its data value is neither the
/// data sentinel nor NaN. An undefined sentinel excludes nothing.
fn select_class(
    mask: &MaskGrid,
    data: &DataGrid,
    label: i32,
    mask_no_data: Option<i32>,
    data_no_data: Option<GridReal>,
) -> (Vec<(usize, usize)>, Vec<GridReal>) {
    let (rows, cols) = mask.dim();
    let mut pixels = Vec::new();
    let mut samples = Vec::new();

    for row in 0..rows {
        for col in 0..cols {
            let m = mask[[row, col]];
            if m != label {
                continue;
            }
            if mask_no_data == Some(m) {
                continue;
            }
            let v = data[[row, col]];
            if data_no_data == Some(v) {
                continue;
            }
            if v.is_nan() {
                continue;
            }
            pixels.push((row, col));
            samples.push(v);
        }
    }

    (pixels, samples)
}

/// Arithmetic mean with f64 accumulation
fn class_mean(samples: &[GridReal]) -> GridReal {
    let sum: f64 = samples.iter().map(|&v| v as f64).sum();
    (sum / samples.len() as f64) as GridReal
}

/// Fit a plane z = a*x + b*y + c to the residual samples by ordinary
/// least squares. The SVD solve returns the minimum-norm solution when
/// the design matrix is rank deficient (collinear or repeated points),
/// so degenerate selections never fail the fit.
fn fit_plane(pixels: &[(usize, usize)], residuals: &[GridReal]) -> TrendResult<TrendModel> {
    let n = residuals.len();
    let mut design = DMatrix::<f64>::zeros(n, 3);
    let mut rhs = DVector::<f64>::zeros(n);

    for (i, (&(row, col), &z)) in pixels.iter().zip(residuals).enumerate() {
        design[(i, 0)] = col as f64; // x
        design[(i, 1)] = row as f64; // y
        design[(i, 2)] = 1.0;
        rhs[i] = z as f64;
    }

    let svd = design.svd(true, true);
    let coeffs = svd
        .solve(&rhs, 1.0e-12)
        .map_err(|e| TrendError::Processing(e.to_string()))?;

    Ok(TrendModel {
        a: coeffs[0],
        b: coeffs[1],
        c: coeffs[2],
    })
}
