//! Grid driver of the crop-cycle simulation.
//!
//! Every cell in the study area is screened, its cycle lengths are resolved
//! from the growing-period grids, and every candidate planting day is swept
//! for both water regimes. Cells are processed in parallel and written back in
//! cell order, so outputs do not depend on scheduling.
pub mod outputs;
pub mod search;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::biomass::{BiomassModel, GaezBiomass};
use crate::config::SimulationConfig;
use crate::crop_water::{CropWaterModel, StagedWaterBalance};
use crate::cycle_length;
use crate::daily_inputs::ClimateGrid;
use crate::error::SimulationError;
use crate::grid::{check_shape, in_study_area};
use crate::growing_period::GrowingPeriodGrids;
use crate::pipeline::CellContext;

pub use outputs::{BestCycle, CellResult, SimulationOutputs};
pub use search::{SweepContext, best_cycle};

/// Gridded inputs of a run, all of the climate grid's shape.
#[derive(Clone, Copy, Debug)]
pub struct SimulationInputs<'a> {
    pub climate: &'a ClimateGrid,
    pub latitude: &'a DMatrix<f64>, // [degrees]
    pub growing: &'a GrowingPeriodGrids,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SkipReason {
    Permafrost,
    ThermalClimate,
    NoGrowingPeriod,
}

#[derive(Debug)]
enum CellOutcome {
    Masked,
    Skipped(SkipReason),
    Simulated(CellResult),
}

/// Crop-cycle simulation over a grid, generic over its yield collaborators.
#[derive(Clone, Debug)]
pub struct CropSimulation<B = GaezBiomass, W = StagedWaterBalance> {
    config: SimulationConfig,
    biomass: B,
    water: W,
}

impl CropSimulation {
    pub fn new(config: SimulationConfig) -> Self {
        CropSimulation {
            config,
            biomass: GaezBiomass,
            water: StagedWaterBalance,
        }
    }
}

impl<B: BiomassModel, W: CropWaterModel> CropSimulation<B, W> {
    pub fn with_models(config: SimulationConfig, biomass: B, water: W) -> Self {
        CropSimulation {
            config,
            biomass,
            water,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run the start-day search over every cell.
    ///
    /// `cancel` is checked before each cell; once it is set the run stops
    /// with [`SimulationError::Cancelled`].
    pub fn run(
        &self,
        inputs: &SimulationInputs<'_>,
        cancel: Option<&AtomicBool>,
    ) -> Result<SimulationOutputs, SimulationError> {
        let shape = inputs.climate.shape();
        let (height, width) = shape;
        self.config.validate(shape, inputs.climate.days())?;
        check_shape("latitude", inputs.latitude.shape(), shape)?;
        inputs.growing.validate(shape)?;

        let sweep = &self.config.sweep;
        tracing::info!(
            height,
            width,
            start_doy = sweep.start_doy,
            end_doy = sweep.end_doy,
            step_doy = sweep.step_doy,
            "starting crop cycle simulation"
        );

        let context = SweepContext {
            biomass: &self.biomass,
            water: &self.water,
            screening: &self.config.screening.window,
            sweep,
        };
        let total = height * width;
        let progress_step = (total / 10).max(1);
        let done = AtomicUsize::new(0);

        let outcomes: Vec<CellOutcome> = (0..total)
            .into_par_iter()
            .map(|idx| {
                if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                    return Err(SimulationError::Cancelled);
                }
                let outcome = self.run_cell(idx / width, idx % width, inputs, &context);
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                if finished % progress_step == 0 {
                    tracing::debug!(finished, total, "cells processed");
                }
                outcome
            })
            .collect::<Result<Vec<_>, SimulationError>>()?;

        let mut out = SimulationOutputs::new(height, width, self.config.no_data);
        let (mut simulated, mut frozen, mut excluded) = (0usize, 0usize, 0usize);
        for (idx, outcome) in outcomes.iter().enumerate() {
            let (row, col) = (idx / width, idx % width);
            match outcome {
                CellOutcome::Masked => {}
                CellOutcome::Skipped(reason) => {
                    out.write_skipped(row, col);
                    match reason {
                        SkipReason::Permafrost => frozen += 1,
                        SkipReason::ThermalClimate | SkipReason::NoGrowingPeriod => excluded += 1,
                    }
                }
                CellOutcome::Simulated(cell) => {
                    out.write_cell(row, col, cell);
                    simulated += 1;
                }
            }
        }
        tracing::info!(
            simulated,
            skipped_permafrost = frozen,
            skipped_other = excluded,
            "crop cycle simulation finished"
        );
        Ok(out)
    }

    fn run_cell(
        &self,
        row: usize,
        col: usize,
        inputs: &SimulationInputs<'_>,
        context: &SweepContext<'_, B, W>,
    ) -> Result<CellOutcome, SimulationError> {
        let screening = &self.config.screening;
        if !in_study_area(self.config.mask.as_ref(), row, col) {
            tracing::debug!(row, col, "cell outside study area");
            return Ok(CellOutcome::Masked);
        }
        let skip = |reason: SkipReason| {
            tracing::debug!(row, col, ?reason, "cell skipped");
            Ok(CellOutcome::Skipped(reason))
        };
        if screening.permafrost.as_ref().is_some_and(|pf| pf.excludes(row, col)) {
            return skip(SkipReason::Permafrost);
        }
        if screening
            .thermal_climate
            .as_ref()
            .is_some_and(|tc| tc.excludes(row, col))
        {
            return skip(SkipReason::ThermalClimate);
        }
        let Some(period) = inputs.growing.at(row, col) else {
            return skip(SkipReason::NoGrowingPeriod);
        };

        let crop = &self.config.crop;
        let cycles = cycle_length::resolve(&period, crop);
        let cell = CellContext {
            crop,
            latitude: inputs.latitude[(row, col)],
            sa: self.config.soil.capacity_at(row, col),
            pc: self.config.soil.depletion_fraction,
        };
        let result = context.run_cell(row, col, inputs.climate.cell(row, col), &cycles, &cell)?;
        Ok(CellOutcome::Simulated(result))
    }
}
