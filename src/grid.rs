//! Raster helpers shared by every grid-level driver.
use nalgebra::DMatrix;

use crate::error::ConfigError;

/// Cells of the study area. `true` marks a cell that is simulated.
#[derive(Clone, Debug)]
pub struct StudyMask {
    valid: DMatrix<bool>,
}

impl StudyMask {
    pub fn new(valid: DMatrix<bool>) -> Self {
        StudyMask { valid }
    }

    /// Build a mask from a raster where cells equal to `no_data_value` are
    /// outside the study area.
    pub fn from_raster(raster: &DMatrix<f64>, no_data_value: f64) -> Self {
        StudyMask {
            valid: raster.map(|v| v != no_data_value),
        }
    }

    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        self.valid[(row, col)]
    }

    pub fn shape(&self) -> (usize, usize) {
        self.valid.shape()
    }
}

/// `true` when the cell should be simulated under an optional mask.
pub(crate) fn in_study_area(mask: Option<&StudyMask>, row: usize, col: usize) -> bool {
    mask.is_none_or(|m| m.is_valid(row, col))
}

/// Latitude of each cell, linear across rows from `lat_max` on the first row
/// to `lat_min` on the last one [decimal degrees].
pub fn latitude_map(lat_min: f64, lat_max: f64, height: usize, width: usize) -> DMatrix<f64> {
    let step = if height > 1 {
        (lat_max - lat_min) / (height - 1) as f64
    } else {
        0.0
    };
    DMatrix::from_fn(height, width, |row, _| lat_max - step * row as f64)
}

pub(crate) fn check_shape(
    name: &'static str,
    found: (usize, usize),
    expected: (usize, usize),
) -> Result<(), ConfigError> {
    if found == expected {
        Ok(())
    } else {
        Err(ConfigError::ShapeMismatch {
            name,
            expected,
            found,
        })
    }
}
