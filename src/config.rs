//! Run configuration: crop, soil, screening options and the start-day sweep.
use nalgebra::DMatrix;
use serde::Deserialize;

use crate::crop_params::{CropParams, CropRecord};
use crate::error::ConfigError;
use crate::grid::{StudyMask, check_shape};
use crate::permafrost::PermafrostClass;
use crate::soil_water::SoilWaterParams;
use crate::thermal::climate_class::ThermalClimate;
use crate::thermal::screening::WindowScreening;

// Candidate planting days, 1-based day of year, inclusive
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Sweep {
    pub start_doy: usize,
    pub end_doy: usize,
    pub step_doy: usize,
    pub leap_year: bool, // Input series carry 366 days
}

impl Default for Sweep {
    fn default() -> Self {
        Sweep {
            start_doy: 1,
            end_doy: 365,
            step_doy: 1,
            leap_year: false,
        }
    }
}

impl Sweep {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn expected_days(&self) -> usize {
        if self.leap_year { 366 } else { 365 }
    }

    pub fn validate(&self, days: usize) -> Result<(), ConfigError> {
        if days != self.expected_days() {
            return Err(ConfigError::SeriesLength {
                name: "climate",
                expected: self.expected_days(),
                found: days,
            });
        }
        if self.step_doy == 0 {
            return Err(ConfigError::InvalidSweep("step_doy must be at least 1".into()));
        }
        if self.start_doy == 0 || self.start_doy > self.end_doy || self.end_doy > days {
            return Err(ConfigError::InvalidSweep(format!(
                "days {}..={} do not fit a {days}-day year",
                self.start_doy, self.end_doy
            )));
        }
        Ok(())
    }

    /// Candidate start days in sweep order.
    pub fn start_days(&self) -> impl Iterator<Item = usize> {
        (self.start_doy..=self.end_doy).step_by(self.step_doy.max(1))
    }

    pub fn candidate_count(&self) -> usize {
        self.start_days().count()
    }

    /// Day of year of the `index`-th candidate.
    pub fn start_day_at(&self, index: usize) -> usize {
        self.start_doy + index * self.step_doy
    }
}

// Cells whose thermal climate is listed are not cropped
#[derive(Clone, Debug)]
pub struct ThermalClimateScreening {
    pub classes: DMatrix<f64>, // Thermal climate code per cell (1-12)
    pub excluded: Vec<ThermalClimate>,
}

impl ThermalClimateScreening {
    pub fn excludes(&self, row: usize, col: usize) -> bool {
        let code = self.classes[(row, col)];
        self.excluded.iter().any(|c| f64::from(c.code()) == code)
    }
}

// Cells with continuous or discontinuous permafrost are not cropped
#[derive(Clone, Debug)]
pub struct PermafrostScreening {
    pub classes: DMatrix<f64>, // Permafrost class code per cell (1-4)
}

impl PermafrostScreening {
    pub fn excludes(&self, row: usize, col: usize) -> bool {
        PermafrostClass::from_code(self.classes[(row, col)])
            .is_some_and(PermafrostClass::excludes_cropping)
    }
}

/// Optional screening stages of a run.
#[derive(Clone, Debug, Default)]
pub struct Screening {
    pub thermal_climate: Option<ThermalClimateScreening>,
    pub permafrost: Option<PermafrostScreening>,
    pub window: WindowScreening,
}

impl Screening {
    /// Window screening taken from the crop record's optional tables.
    pub fn from_record(record: &CropRecord) -> Self {
        Screening {
            window: WindowScreening {
                lgpt: None,
                tsum: record.tsum,
                temperature_profile: (!record.temperature_profile_rules.is_empty())
                    .then(|| record.temperature_profile_rules.clone()),
            },
            ..Screening::default()
        }
    }

    pub fn validate(&self, shape: (usize, usize)) -> Result<(), ConfigError> {
        if let Some(tc) = &self.thermal_climate {
            check_shape("thermal_climate", tc.classes.shape(), shape)?;
        }
        if let Some(pf) = &self.permafrost {
            check_shape("permafrost", pf.classes.shape(), shape)?;
        }
        self.window.validate()
    }
}

/// Everything a run needs besides the gridded inputs.
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    pub crop: CropParams,
    pub soil: SoilWaterParams,
    pub screening: Screening,
    pub sweep: Sweep,
    pub mask: Option<StudyMask>,
    pub no_data: f64,
}

impl SimulationConfig {
    /// Default soil, no screening, full-year sweep, no mask.
    pub fn new(crop: CropParams) -> Self {
        SimulationConfig {
            crop,
            soil: SoilWaterParams::default(),
            screening: Screening::default(),
            sweep: Sweep::default(),
            mask: None,
            no_data: f64::NAN,
        }
    }

    pub fn from_record(record: &CropRecord) -> Self {
        SimulationConfig {
            screening: Screening::from_record(record),
            ..SimulationConfig::new(record.params.clone())
        }
    }

    pub fn validate(&self, shape: (usize, usize), days: usize) -> Result<(), ConfigError> {
        self.crop.validate()?;
        if let Some(mask) = &self.mask {
            check_shape("mask", mask.shape(), shape)?;
        }
        self.soil.validate(shape, self.mask.as_ref())?;
        self.screening.validate(shape)?;
        self.sweep.validate(days)
    }
}
