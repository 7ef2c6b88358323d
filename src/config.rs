//! Engine settings.
//!
//! Every tunable used by the workforce, rate and efficiency formulas lives
//! here so a host can ship a preset as JSON. Missing fields fall back to the
//! values in [`crate::balance`].

use serde::{Deserialize, Serialize};

use crate::balance;
use crate::error::{EngineError, EngineResult};

/// Tunables for a running engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Exponent applied to the capacity metric
    pub workforce_exponent: f64,
    /// Workers per packet
    pub workforce_per_packet: u32,
    /// Floor on any workforce cap
    pub min_workforce: u32,
    /// Multiplier on the workforce cap of human-rated facilities
    pub human_rated_workforce_bonus: f64,
    /// Scale on squared size when mass is unlimited
    pub size_metric_scale: f64,
    /// Non-pad mass term weight
    pub hangar_mass_weight: f64,
    /// Non-pad work term weight
    pub hangar_work_weight: f64,
    /// Non-pad work scale
    pub hangar_work_scale: f64,
    /// Build points per worker per day
    pub build_rate_per_worker: f64,
    /// Rate multiplier while rushing
    pub rush_rate_multiplier: f64,
    /// Upkeep multiplier while rushing
    pub rush_cost_multiplier: f64,
    /// Center-wide pad construction rate (build points per day)
    pub pad_construction_rate: f64,
    /// Starting efficiency for new pools
    pub min_efficiency: f64,
    /// Efficiency ceiling
    pub max_efficiency: f64,
    /// Daily efficiency gain factor
    pub efficiency_gain_per_day: f64,
    pub rollout_work_fraction: f64,
    pub reconditioning_work_fraction: f64,
    pub airlaunch_work_fraction: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            workforce_exponent: balance::WORKFORCE_EXPONENT,
            workforce_per_packet: balance::WORKFORCE_PER_PACKET,
            min_workforce: balance::MIN_WORKFORCE,
            human_rated_workforce_bonus: balance::HUMAN_RATED_WORKFORCE_BONUS,
            size_metric_scale: balance::SIZE_METRIC_SCALE,
            hangar_mass_weight: balance::HANGAR_MASS_WEIGHT,
            hangar_work_weight: balance::HANGAR_WORK_WEIGHT,
            hangar_work_scale: balance::HANGAR_WORK_SCALE,
            build_rate_per_worker: balance::BUILD_RATE_PER_WORKER,
            rush_rate_multiplier: balance::RUSH_RATE_MULTIPLIER,
            rush_cost_multiplier: balance::RUSH_COST_MULTIPLIER,
            pad_construction_rate: balance::PAD_CONSTRUCTION_RATE,
            min_efficiency: balance::MIN_EFFICIENCY,
            max_efficiency: balance::MAX_EFFICIENCY,
            efficiency_gain_per_day: balance::EFFICIENCY_GAIN_PER_DAY,
            rollout_work_fraction: balance::ROLLOUT_WORK_FRACTION,
            reconditioning_work_fraction: balance::RECONDITIONING_WORK_FRACTION,
            airlaunch_work_fraction: balance::AIRLAUNCH_WORK_FRACTION,
        }
    }
}

impl EngineSettings {
    /// Validate settings values.
    pub fn validate(&self) -> EngineResult<()> {
        if self.workforce_per_packet == 0 {
            return Err(EngineError::Config("workforce_per_packet must be greater than 0".into()));
        }
        if self.min_workforce == 0 {
            return Err(EngineError::Config("min_workforce must be greater than 0".into()));
        }
        let positive = [
            ("workforce_exponent", self.workforce_exponent),
            ("human_rated_workforce_bonus", self.human_rated_workforce_bonus),
            ("size_metric_scale", self.size_metric_scale),
            ("hangar_work_scale", self.hangar_work_scale),
            ("build_rate_per_worker", self.build_rate_per_worker),
            ("rush_rate_multiplier", self.rush_rate_multiplier),
            ("rush_cost_multiplier", self.rush_cost_multiplier),
            ("pad_construction_rate", self.pad_construction_rate),
            ("min_efficiency", self.min_efficiency),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(EngineError::Config(format!("{name} must be greater than 0")));
            }
        }
        if self.hangar_mass_weight < 0.0 || self.hangar_work_weight < 0.0 {
            return Err(EngineError::Config("hangar weights must not be negative".into()));
        }
        if self.min_efficiency > self.max_efficiency {
            return Err(EngineError::Config(
                "min_efficiency must not exceed max_efficiency".into(),
            ));
        }
        if self.efficiency_gain_per_day < 0.0 {
            return Err(EngineError::Config("efficiency_gain_per_day must not be negative".into()));
        }
        Ok(())
    }

    /// Parse settings from a JSON string and validate.
    pub fn from_json_str(input: &str) -> EngineResult<Self> {
        let settings: EngineSettings = serde_json::from_str(input)
            .map_err(|e| EngineError::Config(format!("parse error: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rate multiplier for the rush flag
    pub fn rush_rate(&self, rushing: bool) -> f64 {
        if rushing {
            self.rush_rate_multiplier
        } else {
            1.0
        }
    }

    /// Upkeep multiplier for the rush flag
    pub fn rush_cost(&self, rushing: bool) -> f64 {
        if rushing {
            self.rush_cost_multiplier
        } else {
            1.0
        }
    }
}
