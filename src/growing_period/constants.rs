//! Growing-period engine constants.

// -- Reference soil --
// The growing period is a climate property computed before any crop cycle is
// resolved, so it runs on a fixed reference soil rather than the crop's own
// rooting depth and the run's soil capacity.

/// Available soil moisture holding capacity of the reference soil [mm/m].
pub const REFERENCE_SA: f64 = 100.0;

/// Rooting depth of the reference soil [m].
pub const REFERENCE_ROOT_DEPTH: f64 = 1.0;

// -- Snow --

/// Maximum temperature at or below which precipitation is stored as snow [C].
pub const SNOW_MELT_THRESHOLD: f64 = 0.0;

/// Degree-day snow melt coefficient [mm/C/day].
pub const SNOW_MELT_COEFF: f64 = 5.5;

// -- Crop coefficient ladder --

/// kc while snow accumulates, during melt, on cold days, on warm days outside
/// and at the peak of the rain-peak window.
pub const KC_LADDER: [f64; 5] = [0.0, 0.1, 0.2, 0.5, 1.0];

/// Daily kc increase inside the rain-peak window [1/day].
pub const KC_RAMP_PER_DAY: f64 = 0.1;

// -- Depletion fraction --

/// Depletion fraction at a PET of 5 mm/day [-].
pub const BASE_DEPLETION: f64 = 0.5;

/// Change of depletion fraction per mm/day of PET below 5 mm/day.
pub const DEPLETION_PET_SLOPE: f64 = 0.04;

pub const MIN_DEPLETION: f64 = 0.1;
pub const MAX_DEPLETION: f64 = 0.8;

// -- Growing-day test --

/// Length of the trailing ETa/ETm averaging window [days].
pub const ET_WINDOW_DAYS: usize = 10;

/// Minimum ETa/ETm ratio of a growing day [-].
pub const ET_RATIO_THRESHOLD: f64 = 0.4;

/// Mean temperature thresholds of the thermal growing periods [C].
pub const LGPT5_THRESHOLD: f64 = 5.0;
pub const LGPT10_THRESHOLD: f64 = 10.0;

/// Days counted by the growing period.
pub const YEAR_DAYS: usize = 365;
