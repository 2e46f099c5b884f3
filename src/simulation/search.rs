//! Start-day search and best-cycle selection for one cell.
use super::outputs::{BestCycle, CellResult};
use crate::biomass::BiomassModel;
use crate::config::Sweep;
use crate::crop_water::CropWaterModel;
use crate::cycle_length::{RegimeCycle, ResolvedCycles};
use crate::daily_inputs::{DailyClimate, TiledClimate};
use crate::error::SimulationError;
use crate::growing_period::constants::YEAR_DAYS;
use crate::pipeline::{self, CellContext, CycleEstimate};
use crate::thermal::screening::WindowScreening;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Regime {
    Rainfed,
    Irrigated,
}

/// Per-day results of one regime, checked as they are appended.
#[derive(Debug)]
pub struct CandidateLog {
    row: usize,
    col: usize,
    estimates: Vec<CycleEstimate>,
}

impl CandidateLog {
    pub fn new(row: usize, col: usize, capacity: usize) -> Self {
        CandidateLog {
            row,
            col,
            estimates: Vec::with_capacity(capacity),
        }
    }

    /// Append the result of candidate `index`, starting on `day`.
    pub fn push(
        &mut self,
        index: usize,
        day: usize,
        estimate: CycleEstimate,
    ) -> Result<(), SimulationError> {
        if !estimate.is_finite() {
            return Err(self.violation(day, format!("undefined estimate {estimate:?}")));
        }
        if !estimate.in_range() {
            return Err(self.violation(day, format!("estimate out of range {estimate:?}")));
        }
        self.estimates.push(estimate);
        if self.estimates.len() != index + 1 {
            return Err(self.violation(
                day,
                format!(
                    "{} results recorded for candidate {index}",
                    self.estimates.len()
                ),
            ));
        }
        Ok(())
    }

    fn violation(&self, day: usize, detail: String) -> SimulationError {
        tracing::error!(row = self.row, col = self.col, day, %detail, "contract violation");
        SimulationError::ContractViolation {
            row: self.row,
            col: self.col,
            day,
            detail,
        }
    }

    pub fn estimates(&self) -> &[CycleEstimate] {
        &self.estimates
    }
}

/// First candidate with the maximum yield; earlier days win ties.
pub fn best_cycle(estimates: &[CycleEstimate], sweep: &Sweep) -> Option<BestCycle> {
    let mut index = 0;
    for (i, e) in estimates.iter().enumerate().skip(1) {
        if e.yield_kg_ha > estimates[index].yield_kg_ha {
            index = i;
        }
    }
    let best = estimates.get(index)?;
    Some(BestCycle {
        yield_kg_ha: best.yield_kg_ha,
        start_day: sweep.start_day_at(index),
        fc1: best.fc1,
        fc2: best.fc2,
    })
}

/// Shared, read-only inputs of every cell's sweep.
pub struct SweepContext<'a, B: ?Sized, W: ?Sized> {
    pub biomass: &'a B,
    pub water: &'a W,
    pub screening: &'a WindowScreening,
    pub sweep: &'a Sweep,
}

impl<B, W> SweepContext<'_, B, W>
where
    B: BiomassModel + ?Sized,
    W: CropWaterModel + ?Sized,
{
    /// Sweep every candidate start day of one cell and keep the best per regime.
    pub fn run_cell(
        &self,
        row: usize,
        col: usize,
        climate: &DailyClimate,
        cycles: &ResolvedCycles,
        cell: &CellContext<'_>,
    ) -> Result<CellResult, SimulationError> {
        let tiled = climate.tiled();
        let n = self.sweep.candidate_count();
        let mut rainfed = CandidateLog::new(row, col, n);
        let mut irrigated = CandidateLog::new(row, col, n);

        for (index, day) in self.sweep.start_days().enumerate() {
            let start = day - 1;
            let (rain, irr) = if climate.mean_t_at(start) < cell.crop.min_temp {
                (CycleEstimate::default(), CycleEstimate::default())
            } else {
                (
                    self.evaluate(&tiled, start, &cycles.rainfed, cell, Regime::Rainfed),
                    self.evaluate(&tiled, start, &cycles.irrigated, cell, Regime::Irrigated),
                )
            };
            rainfed.push(index, day, rain)?;
            irrigated.push(index, day, irr)?;
        }

        let unplanted = BestCycle {
            start_day: self.sweep.start_doy,
            ..BestCycle::default()
        };
        Ok(CellResult {
            rainfed: best_cycle(rainfed.estimates(), self.sweep).unwrap_or(unplanted),
            irrigated: best_cycle(irrigated.estimates(), self.sweep).unwrap_or(unplanted),
            cycles: *cycles,
        })
    }

    /// Result of one regime for a cycle starting on zero-based day `start`.
    pub fn evaluate(
        &self,
        tiled: &TiledClimate,
        start: usize,
        regime: &RegimeCycle,
        cell: &CellContext<'_>,
        which: Regime,
    ) -> CycleEstimate {
        let Some(len) = regime.length.days() else {
            return CycleEstimate::default();
        };
        let len = len as usize;
        let screen_len = if cell.crop.perennial { YEAR_DAYS } else { len };
        let screened = tiled.window(start, screen_len);
        let fc1 = self.screening.reduction_factor(screened.min_t, screened.max_t);

        let window = tiled.window(start, len);
        match which {
            Regime::Rainfed => {
                pipeline::estimate_rainfed(self.biomass, self.water, &window, regime, cell, fc1)
            }
            Regime::Irrigated => {
                pipeline::estimate_irrigated(self.biomass, &window, regime, cell, fc1)
            }
        }
    }
}
