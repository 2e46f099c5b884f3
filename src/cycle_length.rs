//! Crop cycle length per water regime, with the perennial adjustment of leaf
//! area and harvest indices.
use crate::crop_params::CropParams;
use crate::growing_period::GrowingPeriod;

/// Minimum germination temperature up to which irrigated perennials use LGPt5
/// rather than LGPt10 [C].
pub const LGPT5_GERMINATION_LIMIT: f64 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleLength {
    /// The growing period is shorter than the minimum cycle length.
    NoGrowingSeason,
    /// The capped perennial length still falls short of the minimum.
    AdjustedTooShort,
    /// Cycle length in days.
    Usable(u32),
}

impl CycleLength {
    /// Integer code used in cycle-length rasters: 0, -1 or the length.
    pub fn code(self) -> i64 {
        match self {
            CycleLength::NoGrowingSeason => 0,
            CycleLength::AdjustedTooShort => -1,
            CycleLength::Usable(days) => i64::from(days),
        }
    }

    pub fn days(self) -> Option<u32> {
        match self {
            CycleLength::Usable(days) => Some(days),
            CycleLength::NoGrowingSeason | CycleLength::AdjustedTooShort => None,
        }
    }
}

// Cycle length and the leaf area / harvest indices active for one regime
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegimeCycle {
    pub length: CycleLength,
    pub lai: f64, // Leaf area index used by the biomass model [-]
    pub hi: f64,  // Harvest index used by the biomass model [-]
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedCycles {
    pub rainfed: RegimeCycle,
    pub irrigated: RegimeCycle,
}

/// Decide whether a cycle fits the cell's growing periods, and how long it is.
pub fn resolve(period: &GrowingPeriod, crop: &CropParams) -> ResolvedCycles {
    if crop.perennial {
        let thermal = if crop.min_temp <= LGPT5_GERMINATION_LIMIT {
            period.lgpt5
        } else {
            period.lgpt10
        };
        ResolvedCycles {
            rainfed: perennial_cycle(period.lgp, crop),
            irrigated: perennial_cycle(thermal, crop),
        }
    } else {
        let annual = |available: u32| RegimeCycle {
            length: if available >= crop.min_cycle_len {
                CycleLength::Usable(crop.cycle_len)
            } else {
                CycleLength::NoGrowingSeason
            },
            lai: crop.lai,
            hi: crop.hi,
        };
        ResolvedCycles {
            rainfed: annual(period.lgp),
            irrigated: annual(period.lgpt5),
        }
    }
}

fn perennial_cycle(available: u32, crop: &CropParams) -> RegimeCycle {
    if available < crop.min_cycle_len {
        return RegimeCycle {
            length: CycleLength::NoGrowingSeason,
            lai: crop.lai,
            hi: crop.hi,
        };
    }
    let effective = available.min(crop.max_cycle_len);
    let (lai, hi) = adjust_for_perennial(crop, effective);
    let length = if effective < crop.min_cycle_len {
        CycleLength::AdjustedTooShort
    } else {
        CycleLength::Usable(effective)
    };
    RegimeCycle { length, lai, hi }
}

/// Perennial LAI and HI for an effective cycle length, floored at zero.
pub fn adjust_for_perennial(crop: &CropParams, effective_len: u32) -> (f64, f64) {
    let len = f64::from(effective_len);
    let lai = crop.lai * (len - crop.a_lai) / crop.b_lai;
    let hi = crop.hi * (len - crop.a_hi) / crop.b_hi;
    (lai.max(0.0), hi.max(0.0))
}
