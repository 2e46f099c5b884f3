//! Potential (radiation and temperature limited) crop yield.
//!
//! [`GaezBiomass`] follows the GAEZ net-biomass formulation: a gross
//! photosynthesis rate blended from clear and overcast sky rates, corrected
//! for leaf area and reduced by maintenance respiration over the cycle.
use std::f64::consts::PI;

use crate::daily_inputs::{ClimateWindow, W_M2_TO_MJ_M2_DAY};

/// Crop inputs of the biomass model for one water regime.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomassCrop {
    pub lai: f64,
    pub hi: f64,
    pub legume: bool,
    pub adaptability: u8,
}

/// Estimates the potential yield of one crop cycle.
///
/// Implementations are shared across the worker threads of a grid run.
pub trait BiomassModel: Sync {
    /// Potential yield [kg/ha] of a cycle spanning `window` at `latitude`
    /// [degrees]. Must be finite and non-negative; a run aborts with a
    /// contract violation otherwise.
    fn potential_yield(&self, window: &ClimateWindow<'_>, crop: &BiomassCrop, latitude: f64)
    -> f64;
}

const SOLAR_CONSTANT: f64 = 0.0820; // [MJ/m2/min]
const CLEAR_SKY_FRACTION: f64 = 0.75; // Rso / Ra at sea level
const CLEAR_GROSS_PER_MJ: f64 = 15.3; // bc per MJ/m2/day of clear-sky radiation [kg/ha]
const OVERCAST_TO_CLEAR: f64 = 0.53; // bo / bc
const NET_BIOMASS_COEFF: f64 = 0.36;
const RESPIRATION_LEGUME: f64 = 0.0108; // c30 [1/day]
const RESPIRATION_NON_LEGUME: f64 = 0.0283; // c30 [1/day]
const FULL_COVER_LAI: f64 = 5.0;

// Maximum photosynthesis response per adaptability class:
// (lower limit, optimum start, optimum end, upper limit) [C], peak rate [kg/ha/h]
const PM_RESPONSE: [(f64, f64, f64, f64, f64); 4] = [
    (5.0, 15.0, 20.0, 30.0, 20.0),
    (10.0, 20.0, 30.0, 40.0, 32.0),
    (10.0, 25.0, 30.0, 45.0, 60.0),
    (5.0, 20.0, 25.0, 35.0, 45.0),
];

#[derive(Clone, Copy, Debug, Default)]
pub struct GaezBiomass;

impl BiomassModel for GaezBiomass {
    fn potential_yield(&self, window: &ClimateWindow<'_>, crop: &BiomassCrop, latitude: f64) -> f64 {
        if window.is_empty() || crop.lai <= 0.0 || crop.hi <= 0.0 {
            return 0.0;
        }
        let n = window.len() as f64;
        let mean_t = window.mean_t().sum::<f64>() / n;
        let mean_rg = window.short_rad.iter().sum::<f64>() * W_M2_TO_MJ_M2_DAY / n;
        let mean_rse = (0..window.len())
            .map(|i| CLEAR_SKY_FRACTION * extraterrestrial_radiation(latitude, window.doy(i)))
            .sum::<f64>()
            / n;

        let bgm = gross_photosynthesis(mean_rse, mean_rg, max_photosynthesis(crop.adaptability, mean_t));
        let c30 = if crop.legume {
            RESPIRATION_LEGUME
        } else {
            RESPIRATION_NON_LEGUME
        };
        let ct = c30 * (0.044 + 0.0019 * mean_t + 0.001 * mean_t * mean_t);
        let bn = NET_BIOMASS_COEFF * bgm * lai_correction(crop.lai) / (1.0 / n + 0.25 * ct);
        (bn * crop.hi).max(0.0)
    }
}

/// Daily extraterrestrial radiation Ra [MJ/m2/day] (FAO-56 eq. 21).
pub fn extraterrestrial_radiation(latitude: f64, doy: usize) -> f64 {
    let phi = latitude.to_radians();
    let j = 2.0 * PI * doy as f64 / 365.0;
    let dr = 1.0 + 0.033 * j.cos();
    let delta = 0.409 * (j - 1.39).sin();
    let ws = (-phi.tan() * delta.tan()).clamp(-1.0, 1.0).acos();
    let ra = 24.0 * 60.0 / PI
        * SOLAR_CONSTANT
        * dr
        * (ws * phi.sin() * delta.sin() + phi.cos() * delta.cos() * ws.sin());
    ra.max(0.0)
}

/// Maximum leaf photosynthesis rate Pm [kg/ha/h] at mean temperature `t`.
pub fn max_photosynthesis(adaptability: u8, t: f64) -> f64 {
    let idx = usize::from(adaptability.clamp(1, 4) - 1);
    let (lo, opt_lo, opt_hi, hi, peak) = PM_RESPONSE[idx];
    if t <= lo || t >= hi {
        0.0
    } else if t < opt_lo {
        peak * (t - lo) / (opt_lo - lo)
    } else if t <= opt_hi {
        peak
    } else {
        peak * (hi - t) / (hi - opt_hi)
    }
}

// Gross biomass production rate bgm [kg/ha/day]
fn gross_photosynthesis(rse: f64, rg: f64, pm: f64) -> f64 {
    if rse <= 0.0 {
        return 0.0;
    }
    let bc = CLEAR_GROSS_PER_MJ * rse;
    let bo = OVERCAST_TO_CLEAR * bc;
    let overcast = ((rse - 0.5 * rg) / (0.8 * rse)).clamp(0.0, 1.0);
    let bgm = if pm >= 20.0 {
        overcast * (0.8 + 0.01 * pm) * bo + (1.0 - overcast) * (0.5 + 0.025 * pm) * bc
    } else {
        overcast * (0.5 + 0.025 * pm) * bo + (1.0 - overcast) * 0.05 * pm * bc
    };
    bgm.max(0.0)
}

fn lai_correction(lai: f64) -> f64 {
    if lai >= FULL_COVER_LAI {
        1.0
    } else {
        (0.3424 + 0.9051 * lai.log10()).max(0.0)
    }
}
