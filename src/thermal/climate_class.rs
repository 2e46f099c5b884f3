//! Thermal climate classification of a cell from its yearly temperature and
//! rainfall seasonality.
use nalgebra::DMatrix;

use crate::daily_inputs::{ClimateGrid, DailyClimate, monthly_means};
use crate::error::ConfigError;
use crate::grid::{StudyMask, check_shape, in_study_area};

/// Temperature lapse rate used to reduce temperatures to sea level [C per 100 m].
pub const LAPSE_RATE_PER_100M: f64 = 0.55;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThermalClimate {
    TropicalLowland = 1,
    TropicalHighland = 2,
    SubtropicsLowRainfall = 3,
    SubtropicsSummerRainfall = 4,
    SubtropicsWinterRainfall = 5,
    OceanicTemperate = 6,
    SubContinentalTemperate = 7,
    ContinentalTemperate = 8,
    OceanicBoreal = 9,
    SubContinentalBoreal = 10,
    ContinentalBoreal = 11,
    Arctic = 12,
}

impl ThermalClimate {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Classify one cell. `elevation` in metres, `latitude` in decimal degrees.
pub fn classify(climate: &DailyClimate, elevation: f64, latitude: f64) -> ThermalClimate {
    let mean_t = climate.mean_t();
    let sea_level_offset = elevation / 100.0 * LAPSE_RATE_PER_100M;
    let sea_level_t: Vec<f64> = mean_t.iter().map(|t| t + sea_level_offset).collect();
    let p_by_pet: Vec<f64> = climate
        .precip
        .iter()
        .zip(&climate.pet)
        .map(|(&p, &pet)| if pet != 0.0 { p / pet } else { 0.0 })
        .collect();

    let monthly_t = monthly_means(&mean_t);
    let monthly_sea_t = monthly_means(&sea_level_t);
    let monthly_p_by_pet = monthly_means(&p_by_pet);

    let summer: f64 = monthly_p_by_pet[3..9].iter().sum();
    let winter: f64 = monthly_p_by_pet[9..].iter().chain(&monthly_p_by_pet[..3]).sum();
    let min_sea_t = monthly_sea_t.iter().copied().fold(f64::INFINITY, f64::min);
    let max_sea_t = monthly_sea_t.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max_sea_t - min_sea_t;
    let warm_months = monthly_sea_t.iter().filter(|&&t| t >= 10.0).count();

    let by_range = |oceanic, sub_continental, continental| {
        if range <= 20.0 {
            oceanic
        } else if range <= 35.0 {
            sub_continental
        } else {
            continental
        }
    };

    if min_sea_t >= 18.0 && range < 15.0 {
        let annual_mean = monthly_t.iter().sum::<f64>() / 12.0;
        if annual_mean < 20.0 {
            ThermalClimate::TropicalHighland
        } else {
            ThermalClimate::TropicalLowland
        }
    } else if min_sea_t >= 5.0 && warm_months >= 8 {
        let annual_precip: f64 = climate.precip.iter().sum();
        // Summer is April-September in the north, October-March in the south.
        let summer_rain = if latitude >= 0.0 {
            summer >= winter
        } else {
            summer < winter
        };
        if annual_precip < 250.0 {
            ThermalClimate::SubtropicsLowRainfall
        } else if summer_rain {
            ThermalClimate::SubtropicsSummerRainfall
        } else {
            ThermalClimate::SubtropicsWinterRainfall
        }
    } else if warm_months >= 4 {
        by_range(
            ThermalClimate::OceanicTemperate,
            ThermalClimate::SubContinentalTemperate,
            ThermalClimate::ContinentalTemperate,
        )
    } else if warm_months >= 1 {
        by_range(
            ThermalClimate::OceanicBoreal,
            ThermalClimate::SubContinentalBoreal,
            ThermalClimate::ContinentalBoreal,
        )
    } else {
        ThermalClimate::Arctic
    }
}

/// Thermal climate code (1-12) of every cell; masked cells hold `no_data`.
pub fn thermal_climate_grid(
    climate: &ClimateGrid,
    elevation: &DMatrix<f64>,
    latitude: &DMatrix<f64>,
    mask: Option<&StudyMask>,
    no_data: f64,
) -> Result<DMatrix<f64>, ConfigError> {
    let shape = climate.shape();
    check_shape("elevation", elevation.shape(), shape)?;
    check_shape("latitude", latitude.shape(), shape)?;
    if let Some(mask) = mask {
        check_shape("mask", mask.shape(), shape)?;
    }
    Ok(DMatrix::from_fn(shape.0, shape.1, |row, col| {
        if in_study_area(mask, row, col) {
            f64::from(
                classify(climate.cell(row, col), elevation[(row, col)], latitude[(row, col)]).code(),
            )
        } else {
            no_data
        }
    }))
}
