use nalgebra::DMatrix;

use crate::error::ConfigError;
use crate::grid::{StudyMask, check_shape, in_study_area};

// Available soil-moisture holding capacity, one value or one per cell
#[derive(Clone, Debug)]
pub enum SoilCapacity {
    Uniform(f64),          // [mm/m]
    PerCell(DMatrix<f64>), // [mm/m]
}

// Soil water storage parameters used by the crop water balance
#[derive(Clone, Debug)]
pub struct SoilWaterParams {
    pub capacity: SoilCapacity,  // Available soil moisture holding capacity Sa
    pub depletion_fraction: f64, // Depletion fraction pc below which ETa < ETm [-]
}

impl SoilWaterParams {
    pub fn new(sa: f64, pc: f64) -> Self {
        SoilWaterParams {
            capacity: SoilCapacity::Uniform(sa),
            depletion_fraction: pc,
        }
    }

    pub fn with_capacity_grid(sa: DMatrix<f64>, pc: f64) -> Self {
        SoilWaterParams {
            capacity: SoilCapacity::PerCell(sa),
            depletion_fraction: pc,
        }
    }

    /// Sa for a given cell [mm/m].
    pub fn capacity_at(&self, row: usize, col: usize) -> f64 {
        match &self.capacity {
            SoilCapacity::Uniform(sa) => *sa,
            SoilCapacity::PerCell(grid) => grid[(row, col)],
        }
    }

    /// Cells outside `mask` may hold no-data capacities; they are never simulated.
    pub fn validate(
        &self,
        shape: (usize, usize),
        mask: Option<&StudyMask>,
    ) -> Result<(), ConfigError> {
        if !(self.depletion_fraction > 0.0 && self.depletion_fraction < 1.0) {
            return Err(ConfigError::InvalidSoil(format!(
                "depletion fraction {} is outside (0, 1)",
                self.depletion_fraction
            )));
        }
        match &self.capacity {
            SoilCapacity::Uniform(sa) if *sa < 0.0 || !sa.is_finite() => Err(
                ConfigError::InvalidSoil(format!("soil moisture capacity {sa} must be >= 0")),
            ),
            SoilCapacity::Uniform(_) => Ok(()),
            SoilCapacity::PerCell(grid) => {
                check_shape("soil_capacity", grid.shape(), shape)?;
                for col in 0..grid.ncols() {
                    for row in 0..grid.nrows() {
                        let sa = grid[(row, col)];
                        if in_study_area(mask, row, col) && (sa < 0.0 || !sa.is_finite()) {
                            return Err(ConfigError::InvalidSoil(format!(
                                "soil moisture capacity {sa} at ({row}, {col}) must be >= 0"
                            )));
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

impl Default for SoilWaterParams {
    fn default() -> Self {
        SoilWaterParams::new(100.0, 0.5)
    }
}
