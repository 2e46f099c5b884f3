//! Growing-period orchestration for a single cell and for a whole grid.
use nalgebra::DMatrix;
use rayon::prelude::*;

use super::constants::{
    ET_RATIO_THRESHOLD, LGPT5_THRESHOLD, LGPT10_THRESHOLD, REFERENCE_ROOT_DEPTH, REFERENCE_SA,
    YEAR_DAYS,
};
use super::processes::{self, BucketState, DayForcing};
use crate::daily_inputs::{ClimateGrid, DailyClimate, monthly_means};
use crate::error::ConfigError;
use crate::grid::{StudyMask, check_shape, in_study_area};

// Growing periods of one cell [days]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GrowingPeriod {
    pub lgp: u32,    // Moisture- and temperature-limited growing period
    pub lgpt5: u32,  // Days with mean temperature >= 5 C
    pub lgpt10: u32, // Days with mean temperature >= 10 C
}

/// Daily ETa and ETm of the reference bucket over one year.
pub fn simulate_bucket(climate: &DailyClimate, lgpt5: u32) -> (Vec<f64>, Vec<f64>) {
    let days = climate.days();
    let mean_t = climate.mean_t();
    let peak = processes::rain_peak(
        &monthly_means(&climate.precip),
        &monthly_means(&mean_t),
        lgpt5,
        days,
    );
    let capacity = REFERENCE_SA * REFERENCE_ROOT_DEPTH;

    let mut state = BucketState::default();
    let mut eta = Vec::with_capacity(days);
    let mut etm = Vec::with_capacity(days);
    for day in 0..days {
        let forcing = DayForcing {
            max_t: climate.max_t[day],
            mean_t: mean_t[day],
            precip: climate.precip[day],
            pet: climate.pet[day],
        };
        let in_peak = peak.is_some_and(|w| w.contains(day));
        let (next, fluxes) = processes::eta_step(&state, &forcing, in_peak, capacity);
        eta.push(fluxes.eta);
        etm.push(fluxes.etm);
        state = next;
    }
    (eta, etm)
}

/// Length of growing period: days of the year whose trailing ETa/ETm ratio
/// reaches the threshold while the mean temperature is at least 5 C.
pub fn length_of_growing_period(climate: &DailyClimate, lgpt5: u32) -> u32 {
    let (eta, etm) = simulate_bucket(climate, lgpt5);
    let ratio = processes::trailing_et_ratio(&eta, &etm);
    let mean_t = climate.mean_t();
    ratio
        .iter()
        .zip(&mean_t)
        .take(YEAR_DAYS)
        .filter(|&(&r, &t)| r >= ET_RATIO_THRESHOLD && t >= LGPT5_THRESHOLD)
        .count() as u32
}

pub fn growing_period(climate: &DailyClimate) -> GrowingPeriod {
    let mean_t = climate.mean_t();
    let lgpt5 = processes::thermal_growing_days(&mean_t, LGPT5_THRESHOLD);
    let lgpt10 = processes::thermal_growing_days(&mean_t, LGPT10_THRESHOLD);
    GrowingPeriod {
        lgp: length_of_growing_period(climate, lgpt5),
        lgpt5,
        lgpt10,
    }
}

// LGP, LGPt5 and LGPt10 rasters [days]; masked cells hold the no-data value
#[derive(Clone, Debug)]
pub struct GrowingPeriodGrids {
    pub lgp: DMatrix<f64>,
    pub lgpt5: DMatrix<f64>,
    pub lgpt10: DMatrix<f64>,
}

impl GrowingPeriodGrids {
    pub fn shape(&self) -> (usize, usize) {
        self.lgp.shape()
    }

    pub fn validate(&self, shape: (usize, usize)) -> Result<(), ConfigError> {
        check_shape("lgp", self.lgp.shape(), shape)?;
        check_shape("lgpt5", self.lgpt5.shape(), shape)?;
        check_shape("lgpt10", self.lgpt10.shape(), shape)
    }

    /// Growing periods of a cell, `None` when any of them is not a number.
    pub fn at(&self, row: usize, col: usize) -> Option<GrowingPeriod> {
        let days = |grid: &DMatrix<f64>| {
            let v = grid[(row, col)];
            v.is_finite().then(|| v.clamp(0.0, YEAR_DAYS as f64) as u32)
        };
        Some(GrowingPeriod {
            lgp: days(&self.lgp)?,
            lgpt5: days(&self.lgpt5)?,
            lgpt10: days(&self.lgpt10)?,
        })
    }
}

/// Growing periods of every cell in the study area.
pub fn growing_period_grids(
    climate: &ClimateGrid,
    mask: Option<&StudyMask>,
    no_data: f64,
) -> Result<GrowingPeriodGrids, ConfigError> {
    let (height, width) = climate.shape();
    if let Some(mask) = mask {
        check_shape("mask", mask.shape(), (height, width))?;
    }
    let cells: Vec<Option<GrowingPeriod>> = (0..height * width)
        .into_par_iter()
        .map(|idx| {
            let (row, col) = (idx / width, idx % width);
            in_study_area(mask, row, col).then(|| growing_period(climate.cell(row, col)))
        })
        .collect();

    let mut grids = GrowingPeriodGrids {
        lgp: DMatrix::from_element(height, width, no_data),
        lgpt5: DMatrix::from_element(height, width, no_data),
        lgpt10: DMatrix::from_element(height, width, no_data),
    };
    for (idx, cell) in cells.into_iter().enumerate() {
        if let Some(gp) = cell {
            let at = (idx / width, idx % width);
            grids.lgp[at] = f64::from(gp.lgp);
            grids.lgpt5[at] = f64::from(gp.lgpt5);
            grids.lgpt10[at] = f64::from(gp.lgpt10);
        }
    }
    tracing::debug!(height, width, "growing period grids computed");
    Ok(grids)
}
