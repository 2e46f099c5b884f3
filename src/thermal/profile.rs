//! Temperature profile of a crop cycle.
//!
//! Days are binned by mean temperature into nine 5 C bands and split by
//! whether the temperature is rising (A) or falling (B) towards the next day.
//! Class 1 is the warmest band (>= 30 C), class 9 the coldest (< -5 C).
use serde::Deserialize;

/// Lower edges of the bands for classes 1..=8; class 9 is everything below.
const BAND_LOWER_EDGES: [f64; 8] = [30.0, 25.0, 20.0, 15.0, 10.0, 5.0, 0.0, -5.0];

pub const N_CLASSES: usize = 18;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Hash)]
pub enum ProfileClass {
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    A7,
    A8,
    A9,
    B1,
    B2,
    B3,
    B4,
    B5,
    B6,
    B7,
    B8,
    B9,
}

impl ProfileClass {
    pub const fn index(self) -> usize {
        self as usize
    }
}

fn band(mean_t: f64) -> usize {
    BAND_LOWER_EDGES
        .iter()
        .position(|&edge| mean_t >= edge)
        .unwrap_or(BAND_LOWER_EDGES.len())
}

// Share of window days in each class [%]
#[derive(Clone, Debug, PartialEq)]
pub struct TemperatureProfile {
    shares: [f64; N_CLASSES],
}

impl TemperatureProfile {
    /// Classify a series of daily mean temperatures. The trend of the last
    /// day is taken against the first one.
    pub fn from_mean_t(mean_t: &[f64]) -> Self {
        let mut counts = [0usize; N_CLASSES];
        let n = mean_t.len();
        for (i, &t) in mean_t.iter().enumerate() {
            let next = mean_t[(i + 1) % n];
            let offset = if next >= t { 0 } else { 9 };
            counts[offset + band(t)] += 1;
        }
        let mut shares = [0.0; N_CLASSES];
        if n > 0 {
            for (share, count) in shares.iter_mut().zip(counts) {
                *share = 100.0 * count as f64 / n as f64;
            }
        }
        TemperatureProfile { shares }
    }

    pub fn share(&self, class: ProfileClass) -> f64 {
        self.shares[class.index()]
    }

    /// Combined share of several classes [%].
    pub fn total(&self, classes: &[ProfileClass]) -> f64 {
        classes.iter().map(|&c| self.share(c)).sum()
    }
}
