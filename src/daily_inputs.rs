use crate::error::ConfigError;

/// Humidity is kept away from 0 and 1 so vapour-pressure terms stay finite.
pub const MIN_REL_HUMIDITY: f64 = 0.05;
pub const MAX_REL_HUMIDITY: f64 = 0.99;

/// W/m2 averaged over a day -> MJ/m2/day.
pub const W_M2_TO_MJ_M2_DAY: f64 = 86_400.0 / 1_000_000.0;

const MONTH_DAYS: [usize; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const MONTH_DAYS_LEAP: [usize; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

// Daily climate of a single grid cell for one year (365 or 366 days)
#[derive(Clone, Debug, Default)]
pub struct DailyClimate {
    pub min_t: Vec<f64>,        // Daily minimum temperature [C]
    pub max_t: Vec<f64>,        // Daily maximum temperature [C]
    pub precip: Vec<f64>,       // Daily total precipitation [mm/day]
    pub short_rad: Vec<f64>,    // Daily short-wave radiation [W/m2]
    pub wind: Vec<f64>,         // Daily wind speed at 2 m [m/s]
    pub rel_humidity: Vec<f64>, // Daily relative humidity [fraction 0-1]
    pub pet: Vec<f64>,          // Daily potential evapotranspiration [mm/day]
}

impl DailyClimate {
    /// Checks that every series covers the same full year and clamps
    /// humidity, radiation and wind into their physical ranges.
    pub fn sanitized(mut self) -> Result<Self, ConfigError> {
        let days = self.min_t.len();
        if days != 365 && days != 366 {
            return Err(ConfigError::SeriesLength {
                name: "min_t",
                expected: 365,
                found: days,
            });
        }
        let lengths = [
            ("max_t", self.max_t.len()),
            ("precip", self.precip.len()),
            ("short_rad", self.short_rad.len()),
            ("wind", self.wind.len()),
            ("rel_humidity", self.rel_humidity.len()),
            ("pet", self.pet.len()),
        ];
        for (name, found) in lengths {
            if found != days {
                return Err(ConfigError::SeriesLength {
                    name,
                    expected: days,
                    found,
                });
            }
        }

        for rh in &mut self.rel_humidity {
            *rh = rh.clamp(MIN_REL_HUMIDITY, MAX_REL_HUMIDITY);
        }
        for r in &mut self.short_rad {
            *r = r.max(0.0);
        }
        for w in &mut self.wind {
            *w = w.max(0.0);
        }
        Ok(self)
    }

    pub fn days(&self) -> usize {
        self.min_t.len()
    }

    pub fn mean_t_at(&self, day: usize) -> f64 {
        0.5 * (self.min_t[day] + self.max_t[day])
    }

    pub fn mean_t(&self) -> Vec<f64> {
        self.min_t
            .iter()
            .zip(&self.max_t)
            .map(|(lo, hi)| 0.5 * (lo + hi))
            .collect()
    }

    /// The year repeated twice, so a cycle starting late in the year can run
    /// into the next one without index arithmetic.
    pub fn tiled(&self) -> TiledClimate {
        TiledClimate {
            days: self.days(),
            min_t: twice(&self.min_t),
            max_t: twice(&self.max_t),
            precip: twice(&self.precip),
            short_rad: twice(&self.short_rad),
            wind: twice(&self.wind),
            rel_humidity: twice(&self.rel_humidity),
            pet: twice(&self.pet),
        }
    }
}

fn twice(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len() * 2);
    out.extend_from_slice(values);
    out.extend_from_slice(values);
    out
}

// Two consecutive copies of a cell's year
#[derive(Clone, Debug)]
pub struct TiledClimate {
    days: usize,
    min_t: Vec<f64>,
    max_t: Vec<f64>,
    precip: Vec<f64>,
    short_rad: Vec<f64>,
    wind: Vec<f64>,
    rel_humidity: Vec<f64>,
    pet: Vec<f64>,
}

impl TiledClimate {
    pub fn days(&self) -> usize {
        self.days
    }

    /// Slice `len` days starting at zero-based day `start`. `start` must be
    /// inside the first year and `len` at most one year.
    pub fn window(&self, start: usize, len: usize) -> ClimateWindow<'_> {
        let end = start + len;
        ClimateWindow {
            first_doy: start + 1,
            year_days: self.days,
            min_t: &self.min_t[start..end],
            max_t: &self.max_t[start..end],
            precip: &self.precip[start..end],
            short_rad: &self.short_rad[start..end],
            wind: &self.wind[start..end],
            rel_humidity: &self.rel_humidity[start..end],
            pet: &self.pet[start..end],
        }
    }
}

// Climate of one candidate crop cycle
#[derive(Clone, Copy, Debug)]
pub struct ClimateWindow<'a> {
    pub first_doy: usize,           // 1-based day of year of the first day
    pub year_days: usize,           // Length of the tiled year [days]
    pub min_t: &'a [f64],           // [C]
    pub max_t: &'a [f64],           // [C]
    pub precip: &'a [f64],          // [mm/day]
    pub short_rad: &'a [f64],       // [W/m2]
    pub wind: &'a [f64],            // [m/s]
    pub rel_humidity: &'a [f64],    // [fraction]
    pub pet: &'a [f64],             // [mm/day]
}

impl ClimateWindow<'_> {
    pub fn len(&self) -> usize {
        self.min_t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.min_t.is_empty()
    }

    pub fn mean_t(&self) -> impl Iterator<Item = f64> + '_ {
        self.min_t.iter().zip(self.max_t).map(|(lo, hi)| 0.5 * (lo + hi))
    }

    /// Day of year (1..=`year_days`) of the `i`-th day of the window, wrapped.
    pub fn doy(&self, i: usize) -> usize {
        (self.first_doy - 1 + i) % self.year_days + 1
    }
}

/// Average a daily series into 12 calendar-month means.
pub(crate) fn monthly_means(values: &[f64]) -> [f64; 12] {
    let lengths = if values.len() == 366 {
        &MONTH_DAYS_LEAP
    } else {
        &MONTH_DAYS
    };
    let mut means = [0.0; 12];
    let mut start = 0;
    for (month, &n) in lengths.iter().enumerate() {
        let end = (start + n).min(values.len());
        if end > start {
            means[month] = values[start..end].iter().sum::<f64>() / (end - start) as f64;
        }
        start = end;
    }
    means
}

/// Zero-based first day of each calendar month in a 365-day year.
pub(crate) fn month_start(month: usize) -> usize {
    MONTH_DAYS[..month].iter().sum()
}

pub(crate) fn month_length(month: usize) -> usize {
    MONTH_DAYS[month]
}

// Daily climate for every cell of a raster, stored row-major
#[derive(Clone, Debug)]
pub struct ClimateGrid {
    height: usize,
    width: usize,
    days: usize,
    cells: Vec<DailyClimate>,
}

impl ClimateGrid {
    pub fn new(height: usize, width: usize, cells: Vec<DailyClimate>) -> Result<Self, ConfigError> {
        if cells.len() != height * width {
            return Err(ConfigError::SeriesLength {
                name: "cells",
                expected: height * width,
                found: cells.len(),
            });
        }
        let cells = cells
            .into_iter()
            .map(DailyClimate::sanitized)
            .collect::<Result<Vec<_>, _>>()?;
        let days = cells.first().map(DailyClimate::days).unwrap_or(365);
        if let Some(bad) = cells.iter().find(|c| c.days() != days) {
            return Err(ConfigError::SeriesLength {
                name: "cells",
                expected: days,
                found: bad.days(),
            });
        }
        Ok(ClimateGrid {
            height,
            width,
            days,
            cells,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn days(&self) -> usize {
        self.days
    }

    pub fn cell(&self, row: usize, col: usize) -> &DailyClimate {
        &self.cells[row * self.width + col]
    }
}
