//! Growing-period process functions.
//!
//! Pure functions for the daily soil-moisture bucket, the rain-peak window and
//! the ETa/ETm growing-day test.
use super::constants::{
    BASE_DEPLETION, DEPLETION_PET_SLOPE, ET_WINDOW_DAYS, KC_LADDER, KC_RAMP_PER_DAY,
    LGPT5_THRESHOLD, MAX_DEPLETION, MIN_DEPLETION, SNOW_MELT_COEFF, SNOW_MELT_THRESHOLD,
};
use crate::daily_inputs::{month_length, month_start};

/// Number of days with mean temperature at or above `threshold`.
pub fn thermal_growing_days(mean_t: &[f64], threshold: f64) -> u32 {
    mean_t.iter().filter(|&&t| t >= threshold).count() as u32
}

/// Soil water depletion fraction below which ETa < ETm, as a function of
/// the day's evaporative demand.
pub fn depletion_fraction(pet: f64) -> f64 {
    (BASE_DEPLETION + DEPLETION_PET_SLOPE * (5.0 - pet)).clamp(MIN_DEPLETION, MAX_DEPLETION)
}

/// Warm-season window anchored on the wettest warm month.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeakWindow {
    pub start: usize, // Zero-based first day
    pub len: usize,   // [days]
    pub days: usize,  // Length of the year the window wraps in
}

impl PeakWindow {
    pub fn contains(&self, day: usize) -> bool {
        (day + self.days - self.start) % self.days < self.len
    }
}

/// Locate the rain-peak window of a cell.
///
/// The window is `lgpt5` days long and centred on the middle of the wettest
/// month among months with a mean temperature of at least 5 C (the wettest
/// month overall when no month is that warm). No window without any warm day;
/// the whole year when every day is warm.
pub fn rain_peak(
    monthly_precip: &[f64; 12],
    monthly_mean_t: &[f64; 12],
    lgpt5: u32,
    days: usize,
) -> Option<PeakWindow> {
    let len = lgpt5 as usize;
    if len == 0 {
        return None;
    }
    if len >= days {
        return Some(PeakWindow {
            start: 0,
            len: days,
            days,
        });
    }

    let wettest = |warm_only: bool| {
        (0..12)
            .filter(|&m| !warm_only || monthly_mean_t[m] >= LGPT5_THRESHOLD)
            .fold(None, |best: Option<usize>, m| match best {
                Some(b) if monthly_precip[b] >= monthly_precip[m] => Some(b),
                _ => Some(m),
            })
    };
    let month = wettest(true).or_else(|| wettest(false)).unwrap_or(0);
    let centre = month_start(month) + month_length(month) / 2;
    let start = (centre + days - len / 2) % days;
    Some(PeakWindow { start, len, days })
}

// Running state of the growing-period bucket
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BucketState {
    pub soil_water: f64, // Wb [mm]
    pub snow: f64,       // Sb [mm water equivalent]
    pub kc: f64,         // Crop coefficient of the previous day [-]
}

// One day of forcing for the bucket
#[derive(Clone, Copy, Debug)]
pub struct DayForcing {
    pub max_t: f64,  // [C]
    pub mean_t: f64, // [C]
    pub precip: f64, // [mm/day]
    pub pet: f64,    // [mm/day]
}

// Evapotranspiration of one day
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DayFluxes {
    pub eta: f64, // Actual evapotranspiration [mm/day]
    pub etm: f64, // Maximum evapotranspiration [mm/day]
}

/// Advance the bucket by one day.
///
/// `capacity` is the bucket size Sa * D [mm]; `in_peak` tells whether the day
/// falls inside the rain-peak window.
pub fn eta_step(
    state: &BucketState,
    day: &DayForcing,
    in_peak: bool,
    capacity: f64,
) -> (BucketState, DayFluxes) {
    let mut snow = state.snow;

    let (water_input, kc) = if day.max_t <= SNOW_MELT_THRESHOLD && day.mean_t <= 0.0 {
        // Precipitation accumulates as snow.
        snow += day.precip;
        (0.0, KC_LADDER[0])
    } else {
        let melt = (SNOW_MELT_COEFF * (day.max_t - SNOW_MELT_THRESHOLD)).clamp(0.0, snow);
        snow -= melt;
        let kc = if day.mean_t <= 0.0 || snow > 0.0 {
            KC_LADDER[1]
        } else if day.mean_t < LGPT5_THRESHOLD {
            KC_LADDER[2]
        } else if in_peak {
            (state.kc.max(KC_LADDER[3]) + KC_RAMP_PER_DAY).min(KC_LADDER[4])
        } else {
            KC_LADDER[3]
        };
        (day.precip + melt, kc)
    };

    let etm = kc * day.pet;
    let available = state.soil_water + water_input;
    let threshold = (1.0 - depletion_fraction(day.pet)) * capacity;
    let eta = if available >= threshold {
        etm
    } else {
        etm * available / threshold
    };
    let eta = eta.min(available).max(0.0);
    let soil_water = (available - eta).clamp(0.0, capacity);

    (
        BucketState {
            soil_water,
            snow,
            kc,
        },
        DayFluxes { eta, etm },
    )
}

/// Trailing ETa/ETm ratio for each day of the year.
///
/// The series are read as a repeating year: the window of day `i` covers the
/// `ET_WINDOW_DAYS` days ending on `i`, reaching back into the end of the year
/// for the first days. A window without demand has ratio 0.
pub fn trailing_et_ratio(eta: &[f64], etm: &[f64]) -> Vec<f64> {
    let n = eta.len();
    let doubled = |v: &[f64]| -> Vec<f64> { v.iter().chain(v).copied().collect() };
    let (eta2, etm2) = (doubled(eta), doubled(etm));
    (0..n)
        .map(|i| {
            let end = i + n + 1;
            let start = end.saturating_sub(ET_WINDOW_DAYS);
            let demand: f64 = etm2[start..end].iter().sum();
            if demand > 0.0 {
                eta2[start..end].iter().sum::<f64>() / demand
            } else {
                0.0
            }
        })
        .collect()
}
