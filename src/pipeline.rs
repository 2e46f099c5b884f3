//! Yield estimate of a single candidate cycle.
use crate::biomass::{BiomassCrop, BiomassModel};
use crate::crop_params::CropParams;
use crate::crop_water::{CropWaterModel, WaterRequest};
use crate::cycle_length::RegimeCycle;
use crate::daily_inputs::ClimateWindow;

// Result of one candidate start day for one regime
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CycleEstimate {
    pub yield_kg_ha: f64, // [kg/ha]
    pub fc1: f64,         // Thermal reduction factor [-]
    pub fc2: f64,         // Moisture reduction factor [-], rainfed only
}

impl CycleEstimate {
    pub fn is_finite(&self) -> bool {
        self.yield_kg_ha.is_finite() && self.fc1.is_finite() && self.fc2.is_finite()
    }

    /// Non-negative yield with both reduction factors in [0, 1].
    pub fn in_range(&self) -> bool {
        let unit = 0.0..=1.0;
        self.yield_kg_ha >= 0.0 && unit.contains(&self.fc1) && unit.contains(&self.fc2)
    }
}

// Cell-level inputs shared by every candidate day
#[derive(Clone, Copy, Debug)]
pub struct CellContext<'a> {
    pub crop: &'a CropParams,
    pub latitude: f64, // [degrees]
    pub sa: f64,       // [mm/m]
    pub pc: f64,       // [-]
}

fn biomass_crop(crop: &CropParams, regime: &RegimeCycle) -> BiomassCrop {
    BiomassCrop {
        lai: regime.lai,
        hi: regime.hi,
        legume: crop.legume,
        adaptability: crop.adaptability,
    }
}

/// Thermally screened potential yield reduced for moisture stress.
pub fn estimate_rainfed<B, W>(
    biomass: &B,
    water: &W,
    window: &ClimateWindow<'_>,
    regime: &RegimeCycle,
    cell: &CellContext<'_>,
    fc1: f64,
) -> CycleEstimate
where
    B: BiomassModel + ?Sized,
    W: CropWaterModel + ?Sized,
{
    if fc1 <= 0.0 {
        return CycleEstimate::default();
    }
    let potential =
        biomass.potential_yield(window, &biomass_crop(cell.crop, regime), cell.latitude) * fc1;
    let limited = water.water_limited(
        window,
        &WaterRequest {
            crop: cell.crop,
            potential_yield: potential,
            sa: cell.sa,
            pc: cell.pc,
        },
    );
    CycleEstimate {
        yield_kg_ha: limited.yield_kg_ha,
        fc1,
        fc2: limited.fc2,
    }
}

/// Thermally screened potential yield; irrigation removes moisture stress.
pub fn estimate_irrigated<B>(
    biomass: &B,
    window: &ClimateWindow<'_>,
    regime: &RegimeCycle,
    cell: &CellContext<'_>,
    fc1: f64,
) -> CycleEstimate
where
    B: BiomassModel + ?Sized,
{
    if fc1 <= 0.0 {
        return CycleEstimate::default();
    }
    let potential =
        biomass.potential_yield(window, &biomass_crop(cell.crop, regime), cell.latitude);
    CycleEstimate {
        yield_kg_ha: potential * fc1,
        fc1,
        fc2: 0.0,
    }
}
