//! Air frost index and permafrost zoning from yearly degree-day sums.
use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::daily_inputs::ClimateGrid;
use crate::grid::{StudyMask, check_shape, in_study_area};
use crate::error::ConfigError;

const CONTINUOUS_ABOVE: f64 = 0.625;
const DISCONTINUOUS_ABOVE: f64 = 0.57;
const SPORADIC_ABOVE: f64 = 0.495;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermafrostClass {
    Continuous = 1,
    Discontinuous = 2,
    Sporadic = 3,
    None = 4,
}

impl PermafrostClass {
    pub fn from_frost_index(fi: f64) -> Self {
        if fi > CONTINUOUS_ABOVE {
            PermafrostClass::Continuous
        } else if fi > DISCONTINUOUS_ABOVE {
            PermafrostClass::Discontinuous
        } else if fi > SPORADIC_ABOVE {
            PermafrostClass::Sporadic
        } else {
            PermafrostClass::None
        }
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Class of a code read back from a class grid.
    pub fn from_code(code: f64) -> Option<Self> {
        [
            PermafrostClass::Continuous,
            PermafrostClass::Discontinuous,
            PermafrostClass::Sporadic,
            PermafrostClass::None,
        ]
        .into_iter()
        .find(|c| f64::from(c.code()) == code)
    }

    /// Continuous and discontinuous zones are left out of crop simulation.
    pub fn excludes_cropping(self) -> bool {
        matches!(self, PermafrostClass::Continuous | PermafrostClass::Discontinuous)
    }
}

/// Frost index `sqrt(F) / (sqrt(F) + sqrt(T))` from daily mean temperatures,
/// with F the freezing and T the thawing degree-day sum. 0 when both are 0.
pub fn frost_index(mean_t: &[f64]) -> f64 {
    let thawing: f64 = mean_t.iter().filter(|&&t| t > 0.0).sum();
    let freezing: f64 = -mean_t.iter().filter(|&&t| t < 0.0).sum::<f64>();
    let (sf, st) = (freezing.sqrt(), thawing.sqrt());
    if sf + st == 0.0 { 0.0 } else { sf / (sf + st) }
}

// Frost index and permafrost class rasters
#[derive(Clone, Debug)]
pub struct PermafrostGrids {
    pub frost_index: DMatrix<f64>, // Air frost index [0-1]
    pub class: DMatrix<f64>,       // PermafrostClass code (1-4)
}

pub fn permafrost_grids(
    climate: &ClimateGrid,
    mask: Option<&StudyMask>,
    no_data: f64,
) -> Result<PermafrostGrids, ConfigError> {
    let (height, width) = climate.shape();
    if let Some(mask) = mask {
        check_shape("mask", mask.shape(), (height, width))?;
    }
    let cells: Vec<Option<(f64, PermafrostClass)>> = (0..height * width)
        .into_par_iter()
        .map(|idx| {
            let (row, col) = (idx / width, idx % width);
            in_study_area(mask, row, col).then(|| {
                let fi = frost_index(&climate.cell(row, col).mean_t());
                (fi, PermafrostClass::from_frost_index(fi))
            })
        })
        .collect();

    let mut frost = DMatrix::from_element(height, width, no_data);
    let mut class = DMatrix::from_element(height, width, no_data);
    for (idx, cell) in cells.into_iter().enumerate() {
        if let Some((fi, pc)) = cell {
            let (row, col) = (idx / width, idx % width);
            frost[(row, col)] = fi;
            class[(row, col)] = f64::from(pc.code());
        }
    }
    Ok(PermafrostGrids {
        frost_index: frost,
        class,
    })
}
