/// Tuning parameters for launch complex balance.
/// Centralizes constants that affect workforce capacity, build rates and
/// how quickly shared efficiency grows. `EngineSettings` takes its defaults
/// from here.

// ==========================================
// Workforce
// ==========================================

/// Exponent applied to the capacity metric (mass or size) for workforce caps
pub const WORKFORCE_EXPONENT: f64 = 0.75;

/// Workforce scales into rate capacity in packets of this size
pub const WORKFORCE_PER_PACKET: u32 = 10;

/// No facility can ever support fewer workers than this
pub const MIN_WORKFORCE: u32 = 1;

/// Workforce bonus for human-rated facilities
pub const HUMAN_RATED_WORKFORCE_BONUS: f64 = 1.5;

/// Scale applied to the squared size magnitude when mass is unlimited
pub const SIZE_METRIC_SCALE: f64 = 0.01;

/// Weight of the mass-derived term for non-pad facilities
pub const HANGAR_MASS_WEIGHT: f64 = 0.25;

/// Weight of the work-derived term for non-pad facilities
pub const HANGAR_WORK_WEIGHT: f64 = 0.75;

/// Scale applied to build points before the exponent for non-pad facilities
pub const HANGAR_WORK_SCALE: f64 = 0.000_015;

// ==========================================
// Rates
// ==========================================

/// Build points produced per worker per day at full efficiency
pub const BUILD_RATE_PER_WORKER: f64 = 1.0;

/// Rate multiplier while rushing
pub const RUSH_RATE_MULTIPLIER: f64 = 1.5;

/// Upkeep multiplier while rushing (reported to maintenance accounting)
pub const RUSH_COST_MULTIPLIER: f64 = 2.0;

/// Build points per day applied to pad constructions across the whole center
pub const PAD_CONSTRUCTION_RATE: f64 = 50.0;

// ==========================================
// Efficiency
// ==========================================

/// Efficiency a freshly created pool starts at
pub const MIN_EFFICIENCY: f64 = 0.5;

/// Efficiency ceiling
pub const MAX_EFFICIENCY: f64 = 1.0;

/// Fraction of the remaining gap to max efficiency closed per fully staffed day
pub const EFFICIENCY_GAIN_PER_DAY: f64 = 0.002;

// ==========================================
// Operations work
// ==========================================

/// Rollout work as a fraction of the vessel's total build points
pub const ROLLOUT_WORK_FRACTION: f64 = 0.1;

/// Pad reconditioning work as a fraction of the launched vessel's build points
pub const RECONDITIONING_WORK_FRACTION: f64 = 0.05;

/// Airlaunch preparation work as a fraction of the vessel's build points
pub const AIRLAUNCH_WORK_FRACTION: f64 = 0.25;

// ==========================================
// Pads
// ==========================================

/// Supported tonnage at each structural pad level (level = index)
pub const PAD_TONNAGE_LEVELS: [f64; 5] = [15.0, 60.0, 300.0, 1_000.0, 3_500.0];

/// Minimum supported mass as a fraction of the maximum
pub const MIN_MASS_FRACTION: f64 = 0.75;

/// Fractional pad level for a facility rated to `mass_max` tons.
/// Interpolates linearly between the tonnage levels; unlimited mass is the top level.
pub fn pad_fractional_level(mass_max: Option<f64>) -> f64 {
    let top = (PAD_TONNAGE_LEVELS.len() - 1) as f64;
    let mass = match mass_max {
        Some(m) => m,
        None => return top,
    };
    if mass <= PAD_TONNAGE_LEVELS[0] {
        return 0.0;
    }
    for i in 1..PAD_TONNAGE_LEVELS.len() {
        let lo = PAD_TONNAGE_LEVELS[i - 1];
        let hi = PAD_TONNAGE_LEVELS[i];
        if mass <= hi {
            return (i - 1) as f64 + (mass - lo) / (hi - lo);
        }
    }
    top
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_fractional_level_bounds() {
        assert_eq!(pad_fractional_level(Some(1.0)), 0.0);
        assert_eq!(pad_fractional_level(Some(15.0)), 0.0);
        assert_eq!(pad_fractional_level(None), 4.0);
        assert_eq!(pad_fractional_level(Some(10_000.0)), 4.0);
    }

    #[test]
    fn test_pad_fractional_level_interpolates() {
        // Halfway between 60t and 300t
        assert!((pad_fractional_level(Some(180.0)) - 1.5).abs() < 1e-9);
        assert!((pad_fractional_level(Some(60.0)) - 1.0).abs() < 1e-9);
        assert!((pad_fractional_level(Some(1_000.0)) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_work_weights_sum_to_one() {
        assert!((HANGAR_MASS_WEIGHT + HANGAR_WORK_WEIGHT - 1.0).abs() < 1e-12);
        assert!(MIN_EFFICIENCY < MAX_EFFICIENCY);
    }
}
