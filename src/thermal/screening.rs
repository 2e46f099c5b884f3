//! Thermal suitability screening of a candidate crop cycle.
//!
//! Each configured stage yields a factor in [0, 1]; the cycle's `fc1` is the
//! smallest of them. A stage that is not configured leaves `fc1` untouched.
use serde::Deserialize;

use super::profile::{ProfileClass, TemperatureProfile};
use crate::error::ConfigError;

/// Factor assigned to a value sitting exactly on a sub-optimal threshold.
pub const SUB_OPTIMAL_FACTOR: f64 = 0.75;

// Thermal growing period thresholds for mean temperature > 0, >= 5, >= 10 C
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LgptScreening {
    pub not_suitable: [f64; 3], // At or below: not suitable [days]
    pub optimal: [f64; 3],      // At or above: optimal [days]
}

impl LgptScreening {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (ns, opt) in self.not_suitable.iter().zip(&self.optimal) {
            if ns > opt {
                return Err(ConfigError::InvalidScreening(format!(
                    "LGPt not-suitable threshold {ns} exceeds optimum {opt}"
                )));
            }
        }
        Ok(())
    }

    fn factor(&self, mean_t: &[f64]) -> f64 {
        let periods = [
            mean_t.iter().filter(|&&t| t > 0.0).count() as f64,
            mean_t.iter().filter(|&&t| t >= 5.0).count() as f64,
            mean_t.iter().filter(|&&t| t >= 10.0).count() as f64,
        ];
        periods
            .iter()
            .zip(self.not_suitable.iter().zip(&self.optimal))
            .map(|(&days, (&ns, &opt))| ramp(days, ns, opt))
            .fold(1.0, f64::min)
    }
}

// Accumulated heat unit bounds [C day], ordered lns <= lso <= lo <= ho <= hso <= hns
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct TsumThresholds {
    pub lns: f64, // Lower bound, not suitable
    pub lso: f64, // Lower bound, sub-optimal
    pub lo: f64,  // Lower bound, optimal
    pub ho: f64,  // Upper bound, optimal
    pub hso: f64, // Upper bound, sub-optimal
    pub hns: f64, // Upper bound, not suitable
}

impl TsumThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ordered = [self.lns, self.lso, self.lo, self.ho, self.hso, self.hns];
        if ordered.windows(2).all(|w| w[0] <= w[1]) {
            Ok(())
        } else {
            Err(ConfigError::InvalidScreening(format!(
                "TSUM thresholds must be non-decreasing, got {ordered:?}"
            )))
        }
    }

    fn factor(&self, mean_t: &[f64]) -> f64 {
        let tsum: f64 = mean_t.iter().map(|t| t.max(0.0)).sum();
        if tsum <= self.lns || tsum >= self.hns {
            0.0
        } else if tsum < self.lso {
            SUB_OPTIMAL_FACTOR * ramp(tsum, self.lns, self.lso)
        } else if tsum < self.lo {
            SUB_OPTIMAL_FACTOR + (1.0 - SUB_OPTIMAL_FACTOR) * ramp(tsum, self.lso, self.lo)
        } else if tsum <= self.ho {
            1.0
        } else if tsum <= self.hso {
            1.0 - (1.0 - SUB_OPTIMAL_FACTOR) * ramp(tsum, self.ho, self.hso)
        } else {
            SUB_OPTIMAL_FACTOR * (1.0 - ramp(tsum, self.hso, self.hns))
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleDirection {
    AtMost,  // Smaller shares are better
    AtLeast, // Larger shares are better
}

// Crop-specific constraint on the temperature profile of a cycle
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TemperatureProfileRule {
    pub classes: Vec<ProfileClass>, // Classes whose shares are summed
    pub direction: RuleDirection,
    pub optimal: f64,      // [%]
    pub sub_optimal: f64,  // [%]
    pub not_suitable: f64, // [%]
}

impl TemperatureProfileRule {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ordered = match self.direction {
            RuleDirection::AtMost => {
                self.optimal <= self.sub_optimal && self.sub_optimal <= self.not_suitable
            }
            RuleDirection::AtLeast => {
                self.optimal >= self.sub_optimal && self.sub_optimal >= self.not_suitable
            }
        };
        if self.classes.is_empty() {
            return Err(ConfigError::InvalidScreening(
                "temperature profile rule without classes".into(),
            ));
        }
        if !ordered {
            return Err(ConfigError::InvalidScreening(format!(
                "temperature profile rule on {:?} has unordered thresholds",
                self.classes
            )));
        }
        Ok(())
    }

    fn factor(&self, profile: &TemperatureProfile) -> f64 {
        let value = profile.total(&self.classes);
        // Mirror at-least rules so both directions read "lower is better".
        let (v, opt, sub, ns) = match self.direction {
            RuleDirection::AtMost => (value, self.optimal, self.sub_optimal, self.not_suitable),
            RuleDirection::AtLeast => (-value, -self.optimal, -self.sub_optimal, -self.not_suitable),
        };
        if v <= opt {
            1.0
        } else if v <= sub {
            1.0 - (1.0 - SUB_OPTIMAL_FACTOR) * ramp(v, opt, sub)
        } else if v < ns {
            SUB_OPTIMAL_FACTOR * (1.0 - ramp(v, sub, ns))
        } else {
            0.0
        }
    }
}

/// Linear 0 -> 1 between `lower` and `upper`, saturating outside.
fn ramp(value: f64, lower: f64, upper: f64) -> f64 {
    if value <= lower {
        0.0
    } else if value >= upper {
        1.0
    } else {
        (value - lower) / (upper - lower)
    }
}

// Screening stages applied to every candidate cycle window
#[derive(Clone, Debug, Default)]
pub struct WindowScreening {
    pub lgpt: Option<LgptScreening>,
    pub tsum: Option<TsumThresholds>,
    pub temperature_profile: Option<Vec<TemperatureProfileRule>>,
}

impl WindowScreening {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(lgpt) = &self.lgpt {
            lgpt.validate()?;
        }
        if let Some(tsum) = &self.tsum {
            tsum.validate()?;
        }
        for rule in self.temperature_profile.iter().flatten() {
            rule.validate()?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.lgpt.is_none() && self.tsum.is_none() && self.temperature_profile.is_none()
    }

    /// Thermal reduction factor `fc1` of a window given its daily extremes.
    pub fn reduction_factor(&self, min_t: &[f64], max_t: &[f64]) -> f64 {
        if self.is_empty() {
            return 1.0;
        }
        let mean_t: Vec<f64> = min_t.iter().zip(max_t).map(|(lo, hi)| 0.5 * (lo + hi)).collect();

        let mut fc1: f64 = 1.0;
        if let Some(lgpt) = &self.lgpt {
            fc1 = fc1.min(lgpt.factor(&mean_t));
        }
        if let Some(tsum) = &self.tsum {
            fc1 = fc1.min(tsum.factor(&mean_t));
        }
        if let Some(rules) = &self.temperature_profile {
            let profile = TemperatureProfile::from_mean_t(&mean_t);
            fc1 = rules.iter().map(|r| r.factor(&profile)).fold(fc1, f64::min);
        }
        fc1.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn tsum() -> TsumThresholds {
        TsumThresholds {
            lns: 1000.0,
            lso: 1200.0,
            lo: 1400.0,
            ho: 2000.0,
            hso: 2200.0,
            hns: 2400.0,
        }
    }

    fn flat(mean: f64, days: usize) -> (Vec<f64>, Vec<f64>) {
        (vec![mean - 5.0; days], vec![mean + 5.0; days])
    }

    #[test]
    fn no_stages_means_fully_suitable() {
        let (lo, hi) = flat(-10.0, 100);
        assert_eq!(WindowScreening::default().reduction_factor(&lo, &hi), 1.0);
    }

    #[test]
    fn lgpt_ramps_between_thresholds() {
        let screening = WindowScreening {
            lgpt: Some(LgptScreening {
                not_suitable: [50.0, 50.0, 50.0],
                optimal: [150.0, 150.0, 150.0],
            }),
            ..Default::default()
        };
        let (lo, hi) = flat(20.0, 100);
        assert_abs_diff_eq!(screening.reduction_factor(&lo, &hi), 0.5);
        let (lo, hi) = flat(20.0, 40);
        assert_eq!(screening.reduction_factor(&lo, &hi), 0.0);
    }

    #[test]
    fn tsum_factor_follows_thresholds() {
        let t = tsum();
        let mean = |total: f64| vec![total / 100.0; 100];
        assert_eq!(t.factor(&mean(900.0)), 0.0);
        assert_abs_diff_eq!(t.factor(&mean(1100.0)), 0.375, epsilon = 1e-12);
        assert_abs_diff_eq!(t.factor(&mean(1200.0)), 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(t.factor(&mean(1300.0)), 0.875, epsilon = 1e-12);
        assert_eq!(t.factor(&mean(1700.0)), 1.0);
        assert_abs_diff_eq!(t.factor(&mean(2100.0)), 0.875, epsilon = 1e-12);
        assert_abs_diff_eq!(t.factor(&mean(2300.0)), 0.375, epsilon = 1e-12);
        assert_eq!(t.factor(&mean(2500.0)), 0.0);
    }

    #[test]
    fn tsum_ignores_frost_days() {
        let mut mean_t = vec![15.0; 100];
        mean_t.extend(vec![-20.0; 50]);
        assert_eq!(tsum().factor(&mean_t), 1.0);
    }

    #[test]
    fn unordered_tsum_is_rejected() {
        let mut t = tsum();
        t.lo = 900.0;
        assert!(t.validate().is_err());
        assert!(tsum().validate().is_ok());
    }

    #[test]
    fn at_most_rule_penalises_cold_days() {
        let rule = TemperatureProfileRule {
            classes: vec![ProfileClass::A9, ProfileClass::B9],
            direction: RuleDirection::AtMost,
            optimal: 0.0,
            sub_optimal: 10.0,
            not_suitable: 20.0,
        };
        let mut mean_t = vec![20.0; 90];
        mean_t.extend(vec![-10.0; 10]);
        let profile = TemperatureProfile::from_mean_t(&mean_t);
        assert_abs_diff_eq!(rule.factor(&profile), 0.75, epsilon = 1e-12);

        mean_t = vec![20.0; 100];
        let profile = TemperatureProfile::from_mean_t(&mean_t);
        assert_eq!(rule.factor(&profile), 1.0);
    }

    #[test]
    fn at_least_rule_requires_warm_days() {
        let rule = TemperatureProfileRule {
            classes: vec![ProfileClass::A3, ProfileClass::B3],
            direction: RuleDirection::AtLeast,
            optimal: 80.0,
            sub_optimal: 60.0,
            not_suitable: 40.0,
        };
        assert!(rule.validate().is_ok());
        let mut mean_t = vec![22.0; 50];
        mean_t.extend(vec![12.0; 50]);
        let profile = TemperatureProfile::from_mean_t(&mean_t);
        assert_abs_diff_eq!(rule.factor(&profile), 0.375, epsilon = 1e-12);
    }

    #[test]
    fn stages_combine_by_minimum() {
        let screening = WindowScreening {
            lgpt: Some(LgptScreening {
                not_suitable: [0.0, 0.0, 0.0],
                optimal: [10.0, 10.0, 10.0],
            }),
            tsum: Some(tsum()),
            temperature_profile: None,
        };
        // 100 days at 12 C: tsum 1200 -> 0.75, LGPt optimal.
        let (lo, hi) = flat(12.0, 100);
        assert_abs_diff_eq!(screening.reduction_factor(&lo, &hi), 0.75, epsilon = 1e-12);
    }
}
