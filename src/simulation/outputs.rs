//! Output grids of a crop-cycle simulation.
//!
//! Cells outside the study area hold the run's no-data value. Cells skipped by
//! permafrost or thermal-climate screening hold zeros.
use nalgebra::DMatrix;

use crate::cycle_length::ResolvedCycles;

// Best candidate cycle of one regime
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BestCycle {
    pub yield_kg_ha: f64, // Maximum attainable yield [kg/ha]
    pub start_day: usize, // Planting day of year of that yield (1-based)
    pub fc1: f64,         // Thermal reduction factor at the best day [-]
    pub fc2: f64,         // Moisture reduction factor at the best day [-]
}

/// Per-cell result of the start-day search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellResult {
    pub rainfed: BestCycle,
    pub irrigated: BestCycle,
    pub cycles: ResolvedCycles,
}

#[derive(Clone, Debug)]
pub struct SimulationOutputs {
    pub yield_rainfed: DMatrix<f64>,     // [kg/ha]
    pub yield_irrigated: DMatrix<f64>,   // [kg/ha]
    pub start_day_rainfed: DMatrix<f64>, // Crop calendar, day of year
    pub start_day_irrigated: DMatrix<f64>,
    pub fc1_rainfed: DMatrix<f64>,
    pub fc1_irrigated: DMatrix<f64>,
    pub fc2: DMatrix<f64>, // Rainfed only
    pub cycle_len_rainfed: DMatrix<f64>, // Cycle length code: days, 0 or -1
    pub cycle_len_irrigated: DMatrix<f64>,
}

impl SimulationOutputs {
    /// All grids filled with `no_data`.
    pub fn new(height: usize, width: usize, no_data: f64) -> Self {
        let grid = || DMatrix::from_element(height, width, no_data);
        SimulationOutputs {
            yield_rainfed: grid(),
            yield_irrigated: grid(),
            start_day_rainfed: grid(),
            start_day_irrigated: grid(),
            fc1_rainfed: grid(),
            fc1_irrigated: grid(),
            fc2: grid(),
            cycle_len_rainfed: grid(),
            cycle_len_irrigated: grid(),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.yield_rainfed.shape()
    }

    pub fn write_cell(&mut self, row: usize, col: usize, cell: &CellResult) {
        let at = (row, col);
        self.yield_rainfed[at] = cell.rainfed.yield_kg_ha;
        self.start_day_rainfed[at] = cell.rainfed.start_day as f64;
        self.fc1_rainfed[at] = cell.rainfed.fc1;
        self.fc2[at] = cell.rainfed.fc2;
        self.yield_irrigated[at] = cell.irrigated.yield_kg_ha;
        self.start_day_irrigated[at] = cell.irrigated.start_day as f64;
        self.fc1_irrigated[at] = cell.irrigated.fc1;
        self.cycle_len_rainfed[at] = cell.cycles.rainfed.length.code() as f64;
        self.cycle_len_irrigated[at] = cell.cycles.irrigated.length.code() as f64;
    }

    /// Zero every output of a cell that is not cropped.
    pub fn write_skipped(&mut self, row: usize, col: usize) {
        let at = (row, col);
        for grid in [
            &mut self.yield_rainfed,
            &mut self.yield_irrigated,
            &mut self.start_day_rainfed,
            &mut self.start_day_irrigated,
            &mut self.fc1_rainfed,
            &mut self.fc1_irrigated,
            &mut self.fc2,
            &mut self.cycle_len_rainfed,
            &mut self.cycle_len_irrigated,
        ] {
            grid[at] = 0.0;
        }
    }
}
