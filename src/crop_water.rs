//! Water-limited yield of a rainfed crop cycle.
//!
//! [`StagedWaterBalance`] runs a daily root-zone bucket over the cycle and
//! converts the per-stage evapotranspiration deficits into a yield reduction
//! factor `fc2` through the FAO-33 yield response factors.
use crate::crop_params::CropParams;
use crate::daily_inputs::ClimateWindow;

/// Inputs of a water-limited yield estimate beyond the climate window.
#[derive(Clone, Copy, Debug)]
pub struct WaterRequest<'a> {
    pub crop: &'a CropParams,
    pub potential_yield: f64, // Thermally screened potential yield [kg/ha]
    pub sa: f64,              // Available soil moisture holding capacity [mm/m]
    pub pc: f64,              // Soil water depletion fraction [-]
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WaterLimitedYield {
    pub yield_kg_ha: f64,
    pub fc2: f64,
}

/// Reduces a potential yield for moisture stress over one crop cycle.
///
/// Implementations are shared across the worker threads of a grid run. The
/// returned yield must be finite and non-negative with `fc2` in [0, 1]; a run
/// aborts with a contract violation otherwise.
pub trait CropWaterModel: Sync {
    fn water_limited(&self, window: &ClimateWindow<'_>, request: &WaterRequest<'_>)
    -> WaterLimitedYield;
}

// FAO-56 climatic adjustment ranges for mid and late season kc
const WIND_RANGE: (f64, f64) = (1.0, 6.0); // [m/s]
const RH_MIN_RANGE: (f64, f64) = (20.0, 80.0); // [%]
const KC_END_ADJUST_FROM: f64 = 0.45;

#[derive(Clone, Copy, Debug, Default)]
pub struct StagedWaterBalance;

impl CropWaterModel for StagedWaterBalance {
    fn water_limited(
        &self,
        window: &ClimateWindow<'_>,
        request: &WaterRequest<'_>,
    ) -> WaterLimitedYield {
        if window.is_empty() || request.potential_yield <= 0.0 {
            return WaterLimitedYield::default();
        }
        let crop = request.crop;
        let stages = stage_bounds(window.len(), &crop.stage_per);
        let kc = daily_kc(window, crop, &stages);

        let mut stage_eta = [0.0; 4];
        let mut stage_etm = [0.0; 4];
        let mut wb = 0.0;
        for day in 0..window.len() {
            let stage = stages.iter().position(|&end| day < end).unwrap_or(3);
            let capacity = request.sa * root_depth(day, crop, &stages);
            let threshold = (1.0 - request.pc) * capacity;
            let available = wb + window.precip[day];
            let etm = kc[day] * window.pet[day];
            let eta = if available >= threshold {
                etm
            } else {
                etm * available / threshold
            }
            .min(available)
            .max(0.0);
            wb = (available - eta).clamp(0.0, capacity);
            stage_eta[stage] += eta;
            stage_etm[stage] += etm;
        }

        let whole = response(
            crop.yloss_f_all,
            stage_eta.iter().sum(),
            stage_etm.iter().sum(),
        );
        let fc2 = if crop.perennial {
            whole
        } else {
            let staged = (0..4)
                .filter(|&s| stage_etm[s] > 0.0)
                .map(|s| response(crop.yloss_f[s], stage_eta[s], stage_etm[s]))
                .product::<f64>();
            staged.min(whole)
        }
        .clamp(0.0, 1.0);

        WaterLimitedYield {
            yield_kg_ha: request.potential_yield * fc2,
            fc2,
        }
    }
}

// Relative yield 1 - ky (1 - ETa/ETm), floored at zero
fn response(ky: f64, eta: f64, etm: f64) -> f64 {
    let ratio = if etm > 0.0 { eta / etm } else { 1.0 };
    (1.0 - ky * (1.0 - ratio)).max(0.0)
}

/// Exclusive end day of each growth stage for a cycle of `n` days.
pub fn stage_bounds(n: usize, stage_per: &[f64; 4]) -> [usize; 4] {
    let mut bounds = [n; 4];
    let mut cumulative = 0.0_f64;
    for (bound, &per) in bounds.iter_mut().zip(&stage_per[..3]) {
        cumulative += per;
        *bound = ((n as f64 * cumulative / 100.0).round() as usize).min(n);
    }
    bounds
}

fn root_depth(day: usize, crop: &CropParams, stages: &[usize; 4]) -> f64 {
    let growth_days = stages[1];
    if growth_days == 0 || day >= growth_days {
        crop.d2
    } else {
        crop.d1 + (crop.d2 - crop.d1) * day as f64 / growth_days as f64
    }
}

/// Daily crop coefficient over the cycle.
pub fn daily_kc(window: &ClimateWindow<'_>, crop: &CropParams, stages: &[usize; 4]) -> Vec<f64> {
    let n = window.len();
    if crop.perennial {
        return vec![crop.kc_all; n];
    }
    let kc_ini = crop.kc[0];
    let kc_mid = adjust_kc(crop.kc[1], window, stages[1], stages[2], crop.height);
    let kc_end = if crop.kc[2] >= KC_END_ADJUST_FROM {
        adjust_kc(crop.kc[2], window, stages[2], n, crop.height)
    } else {
        crop.kc[2]
    };

    let ramp = |from: f64, to: f64, day: usize, start: usize, end: usize| {
        if end > start {
            from + (to - from) * (day - start) as f64 / (end - start) as f64
        } else {
            to
        }
    };
    (0..n)
        .map(|day| {
            if day < stages[0] {
                kc_ini
            } else if day < stages[1] {
                ramp(kc_ini, kc_mid, day, stages[0], stages[1])
            } else if day < stages[2] {
                kc_mid
            } else {
                ramp(kc_mid, kc_end, day, stages[2], n)
            }
        })
        .collect()
}

// FAO-56 eq. 62: kc + [0.04 (u2 - 2) - 0.004 (RHmin - 45)] (h / 3)^0.3
fn adjust_kc(kc: f64, window: &ClimateWindow<'_>, start: usize, end: usize, height: f64) -> f64 {
    if end <= start {
        return kc;
    }
    let days = (end - start) as f64;
    let u2 = window.wind[start..end].iter().sum::<f64>() / days;
    let rh = 100.0 * window.rel_humidity[start..end].iter().sum::<f64>() / days;
    let u2 = u2.clamp(WIND_RANGE.0, WIND_RANGE.1);
    let rh = rh.clamp(RH_MIN_RANGE.0, RH_MIN_RANGE.1);
    (kc + (0.04 * (u2 - 2.0) - 0.004 * (rh - 45.0)) * (height.max(0.0) / 3.0).powf(0.3)).max(0.0)
}
