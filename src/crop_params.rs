use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::thermal::screening::{TemperatureProfileRule, TsumThresholds};

/// Longest cycle a single year of climate can hold [days].
pub const MAX_CYCLE_DAYS: u32 = 365;

// Crop-specific parameters for one simulation run
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CropParams {
    pub lai: f64,                 // Leaf area index [-]
    pub hi: f64,                  // Harvest index [-]
    pub legume: bool,             // Nitrogen-fixing crop
    pub adaptability: u8,         // Photosynthetic adaptability class (1-4)
    pub cycle_len: u32,           // Nominal crop cycle length [days]
    pub min_cycle_len: u32,       // Minimum cycle length [days]
    pub max_cycle_len: u32,       // Maximum cycle length [days]
    pub d1: f64,                  // Rooting depth at the start of the cycle [m]
    pub d2: f64,                  // Rooting depth at maturity [m]
    pub min_temp: f64,            // Minimum mean temperature to start a cycle [C]
    pub a_lai: f64,               // Perennial LAI adjustment offset [days]
    pub b_lai: f64,               // Perennial LAI adjustment scale [days]
    pub a_hi: f64,                // Perennial HI adjustment offset [days]
    pub b_hi: f64,                // Perennial HI adjustment scale [days]
    pub height: f64,              // Plant height [m]
    pub perennial: bool,          // Perennial (true) or annual (false)
    pub stage_per: [f64; 4],      // Share of the cycle in each growth stage [%]
    pub kc: [f64; 3],             // Crop coefficients: initial, mid-season, end [-]
    pub kc_all: f64,              // Crop coefficient over the whole cycle [-]
    pub yloss_f: [f64; 4],        // Yield response factor per growth stage [-]
    pub yloss_f_all: f64,         // Yield response factor over the whole cycle [-]
}

impl CropParams {
    /// Check the invariants every downstream stage relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: String| ConfigError::InvalidCrop { field, reason };

        if self.cycle_len == 0 || self.cycle_len > MAX_CYCLE_DAYS {
            return Err(invalid(
                "cycle_len",
                format!("{} is outside 1..={MAX_CYCLE_DAYS}", self.cycle_len),
            ));
        }
        if self.max_cycle_len > MAX_CYCLE_DAYS {
            return Err(invalid(
                "max_cycle_len",
                format!("{} exceeds {MAX_CYCLE_DAYS}", self.max_cycle_len),
            ));
        }
        if !(self.min_cycle_len <= self.cycle_len && self.cycle_len <= self.max_cycle_len) {
            return Err(invalid(
                "cycle_len",
                format!(
                    "expected min_cycle_len <= cycle_len <= max_cycle_len, got {} <= {} <= {}",
                    self.min_cycle_len, self.cycle_len, self.max_cycle_len
                ),
            ));
        }
        if !(1..=4).contains(&self.adaptability) {
            return Err(invalid(
                "adaptability",
                format!("{} is not one of 1, 2, 3, 4", self.adaptability),
            ));
        }
        if !self.b_lai.is_finite() || self.b_lai == 0.0 {
            return Err(invalid("b_lai", format!("{} must be finite and non-zero", self.b_lai)));
        }
        if !self.b_hi.is_finite() || self.b_hi == 0.0 {
            return Err(invalid("b_hi", format!("{} must be finite and non-zero", self.b_hi)));
        }
        for (field, value) in [
            ("min_temp", self.min_temp),
            ("a_lai", self.a_lai),
            ("a_hi", self.a_hi),
        ] {
            if !value.is_finite() {
                return Err(invalid(field, format!("{value} must be finite")));
            }
        }
        for (field, value) in [
            ("lai", self.lai),
            ("hi", self.hi),
            ("height", self.height),
            ("kc_all", self.kc_all),
            ("yloss_f_all", self.yloss_f_all),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(invalid(field, format!("{value} must be finite and >= 0")));
            }
        }
        if self.kc.iter().any(|k| !(*k >= 0.0 && k.is_finite())) {
            return Err(invalid("kc", format!("{:?} must be finite and >= 0", self.kc)));
        }
        if self.yloss_f.iter().any(|k| !(*k >= 0.0 && k.is_finite())) {
            return Err(invalid(
                "yloss_f",
                format!("{:?} must be finite and >= 0", self.yloss_f),
            ));
        }
        if !(self.d1 > 0.0 && self.d2 >= self.d1 && self.d2.is_finite()) {
            return Err(invalid(
                "d2",
                format!("expected 0 < d1 <= d2, got d1 = {}, d2 = {}", self.d1, self.d2),
            ));
        }
        let stage_total: f64 = self.stage_per.iter().sum();
        if !((stage_total - 100.0).abs() <= 0.5) || self.stage_per.iter().any(|&p| !(p >= 0.0)) {
            return Err(invalid(
                "stage_per",
                format!("stage percentages must be >= 0 and sum to 100, got {stage_total}"),
            ));
        }
        Ok(())
    }
}

// One crop entry of the crop library, with its optional screening tables
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CropRecord {
    #[serde(flatten)]
    pub params: CropParams,
    #[serde(default)]
    pub tsum: Option<TsumThresholds>,
    #[serde(default)]
    pub temperature_profile_rules: Vec<TemperatureProfileRule>,
}

impl CropRecord {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.params.validate()?;
        if let Some(tsum) = &self.tsum {
            tsum.validate()?;
        }
        for rule in &self.temperature_profile_rules {
            rule.validate()?;
        }
        Ok(())
    }
}

/// Crop parameter table keyed by crop name. Names are matched case-insensitively.
#[derive(Clone, Debug, Default)]
pub struct CropLibrary {
    crops: HashMap<String, CropRecord>,
}

impl CropLibrary {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let raw: HashMap<String, CropRecord> = toml::from_str(toml_str)?;
        let crops = raw
            .into_iter()
            .map(|(name, record)| (name.to_lowercase(), record))
            .collect();
        Ok(CropLibrary { crops })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let toml_str = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&toml_str)
    }

    /// Look up and validate a crop.
    pub fn crop(&self, crop_name: &str) -> Result<CropRecord, ConfigError> {
        let record = self
            .crops
            .get(&crop_name.to_lowercase())
            .ok_or_else(|| ConfigError::UnknownCrop(crop_name.to_string()))?;
        record.validate()?;
        Ok(record.clone())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.crops.keys().map(String::as_str)
    }
}
