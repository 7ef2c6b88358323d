/// Workforce and rate model.
/// Works out how many workers a complex can support, turns workers into a
/// build rate through a pluggable rate model, and shares elapsed time across
/// the items of a queue.

use crate::config::EngineSettings;
use crate::descriptor::{FacilityCategory, FacilityDescriptor, Size3};

// ==========================================
// Workforce caps
// ==========================================

/// Raw capacity metric before bonuses and packet scaling.
/// Mass^exponent when mass is bounded, otherwise scaled squared size.
fn raw_capacity(settings: &EngineSettings, mass_max: Option<f64>, size_max: Size3) -> f64 {
    match mass_max {
        Some(mass) => mass.max(0.0).powf(settings.workforce_exponent),
        None => size_max.sqr_magnitude() * settings.size_metric_scale,
    }
}

fn packets_to_workforce(settings: &EngineSettings, packets: f64) -> u32 {
    let workers = (packets * settings.workforce_per_packet as f64).ceil();
    settings.min_workforce.max(workers as u32)
}

/// Maximum workforce for a capacity envelope
pub fn max_workforce_calc(
    settings: &EngineSettings,
    mass_max: Option<f64>,
    size_max: Size3,
    human_rated: bool,
) -> u32 {
    let bonus = if human_rated {
        settings.human_rated_workforce_bonus
    } else {
        1.0
    };
    packets_to_workforce(settings, raw_capacity(settings, mass_max, size_max) * bonus)
}

/// Maximum workforce a descriptor supports.
/// `human_rated_override` replaces the descriptor's own rating when set.
pub fn max_workforce(
    settings: &EngineSettings,
    descriptor: &FacilityDescriptor,
    human_rated_override: Option<bool>,
) -> u32 {
    max_workforce_calc(
        settings,
        descriptor.mass_max,
        descriptor.size_max,
        human_rated_override.unwrap_or(descriptor.human_rated),
    )
}

/// Maximum workforce that can work on one item of the given mass and work.
///
/// Pads cap non-human-rated items on a human-rated pad at the non-human-rated
/// maximum. Other facilities blend a mass term and a work term, each raised
/// to the workforce exponent.
pub fn max_workforce_for(
    settings: &EngineSettings,
    descriptor: &FacilityDescriptor,
    mass: f64,
    build_points: f64,
    human_rated: bool,
) -> u32 {
    if descriptor.category == FacilityCategory::Pad {
        let rated = descriptor.human_rated && human_rated;
        return max_workforce(settings, descriptor, Some(rated));
    }

    let mut mass_term = raw_capacity(settings, Some(mass), Size3::default());
    if descriptor.human_rated && human_rated {
        mass_term *= settings.human_rated_workforce_bonus;
    }
    let work_term = (build_points.max(0.0) * settings.hangar_work_scale).powf(settings.workforce_exponent);
    packets_to_workforce(
        settings,
        mass_term * settings.hangar_mass_weight + work_term * settings.hangar_work_weight,
    )
}

// ==========================================
// Rate model
// ==========================================

/// Inputs to a build rate model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateInput {
    pub workforce: u32,
    /// Workers usable on non-human-rated work
    pub non_human_rated_cap: u32,
    pub efficiency: f64,
    /// Strategy-driven multiplier for the facility category
    pub strategy_multiplier: f64,
    pub rush_multiplier: f64,
    /// Whether the work being rated is human-rated
    pub human_rated: bool,
}

/// Turns workers into build points per day.
/// Treated as a black box by the engine; it must be pure.
pub trait BuildRateModel {
    fn build_rate(&self, input: &RateInput) -> f64;
}

/// Linear rate: usable workers x rate per worker x multipliers.
///
/// Non-human-rated work can only use `non_human_rated_cap` workers, so the
/// human-rating term is the rate of the workers above that cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardRateModel {
    pub rate_per_worker: f64,
}

impl StandardRateModel {
    pub fn new(rate_per_worker: f64) -> Self {
        Self { rate_per_worker }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(settings.build_rate_per_worker)
    }

    fn per_worker(&self, input: &RateInput) -> f64 {
        (self.rate_per_worker
            * input.efficiency
            * input.strategy_multiplier
            * input.rush_multiplier)
            .max(0.0)
    }

    /// Extra rate human-rated work gets over the same work unrated
    pub fn human_rating_term(&self, input: &RateInput) -> f64 {
        let capped = input.workforce.min(input.non_human_rated_cap);
        (input.workforce - capped) as f64 * self.per_worker(input)
    }
}

impl Default for StandardRateModel {
    fn default() -> Self {
        Self::from_settings(&EngineSettings::default())
    }
}

impl BuildRateModel for StandardRateModel {
    fn build_rate(&self, input: &RateInput) -> f64 {
        let workers = if input.human_rated {
            input.workforce
        } else {
            input.workforce.min(input.non_human_rated_cap)
        };
        workers as f64 * self.per_worker(input)
    }
}

// ==========================================
// Distribution
// ==========================================

/// Anything in a time-consuming queue
pub trait WorkItem {
    /// Work still needed to complete
    fn remaining_work(&self) -> f64;
    /// Rate assigned at the last recomputation
    fn rate(&self) -> f64;
}

/// How a queue shares elapsed time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    /// Queue order; leftover time after an item completes spills to the next.
    /// An item that cannot progress blocks everything behind it.
    Sequential,
    /// Every item progresses for the full elapsed time at its own rate
    Concurrent,
}

/// Progress each item earns over `elapsed` days. Never reorders the queue.
pub fn distribute<T: WorkItem>(policy: Distribution, elapsed: f64, items: &[T]) -> Vec<f64> {
    let mut deltas = vec![0.0; items.len()];
    if elapsed <= 0.0 {
        return deltas;
    }
    match policy {
        Distribution::Concurrent => {
            for (delta, item) in deltas.iter_mut().zip(items) {
                let rate = item.rate().max(0.0);
                *delta = (rate * elapsed).min(item.remaining_work().max(0.0));
            }
        }
        Distribution::Sequential => {
            let mut time_left = elapsed;
            for (delta, item) in deltas.iter_mut().zip(items) {
                let remaining = item.remaining_work().max(0.0);
                if remaining <= 0.0 {
                    continue;
                }
                let rate = item.rate();
                if rate <= 0.0 {
                    break;
                }
                let time_needed = remaining / rate;
                if time_needed <= time_left {
                    *delta = remaining;
                    time_left -= time_needed;
                } else {
                    *delta = rate * time_left;
                    break;
                }
            }
        }
    }
    deltas
}
