/// Facility descriptors: what a launch complex is built to handle.
///
/// A descriptor is replaced wholesale when the player modifies a complex.
/// Mass and size bounds give a partial order that efficiency pools use to
/// decide whether two complexes are similar enough to share experience.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::balance::{pad_fractional_level, MIN_MASS_FRACTION};

/// What kind of facility this is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacilityCategory {
    /// Vertical launch complex with one or more pads
    Pad,
    /// Horizontal fabrication hangar (runway / airlaunch)
    Hangar,
}

/// A 3D size bound in meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Size3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn sqr_magnitude(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }
}

/// Capacity envelope of a launch complex
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityDescriptor {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "lcType")]
    pub category: FacilityCategory,
    #[serde(rename = "isHumanRated", default)]
    pub human_rated: bool,
    /// Maximum vessel mass in tons; `None` is unlimited
    #[serde(rename = "massMax", default)]
    pub mass_max: Option<f64>,
    /// Mass the complex was originally built for
    #[serde(rename = "massOrig", default)]
    pub mass_orig: Option<f64>,
    #[serde(rename = "sizeMax", default)]
    pub size_max: Size3,
    /// Resource name to throughput
    #[serde(rename = "resourcesHandled", default)]
    pub resources_handled: BTreeMap<String, f64>,
}

impl FacilityDescriptor {
    /// Create a descriptor with no resource handling
    pub fn new(
        name: &str,
        category: FacilityCategory,
        mass_max: Option<f64>,
        size_max: Size3,
        human_rated: bool,
    ) -> Self {
        Self {
            name: name.to_string(),
            category,
            human_rated,
            mass_max,
            mass_orig: mass_max,
            size_max,
            resources_handled: BTreeMap::new(),
        }
    }

    /// The hangar every space center starts with
    pub fn starting_hangar() -> Self {
        Self::new(
            "Hangar",
            FacilityCategory::Hangar,
            None,
            Size3::new(40.0, 10.0, 40.0),
            true,
        )
    }

    /// True when the capacity envelope matches the starting hangar (name ignored)
    pub fn matches_starting_hangar(&self) -> bool {
        let hangar = Self::starting_hangar();
        self.category == hangar.category
            && self.mass_max == hangar.mass_max
            && self.size_max == hangar.size_max
            && self.human_rated == hangar.human_rated
    }

    pub fn is_pad(&self) -> bool {
        self.category == FacilityCategory::Pad
    }

    /// Minimum supported mass (0 when unlimited)
    pub fn mass_min(&self) -> f64 {
        match self.mass_max {
            Some(m) => (m * MIN_MASS_FRACTION).floor(),
            None => 0.0,
        }
    }

    /// Fractional structural level for pads built to this descriptor
    pub fn pad_fractional_level(&self) -> f64 {
        pad_fractional_level(self.mass_max)
    }

    /// Integer capacity tier used by closeness matching
    pub fn capacity_tier(&self) -> i32 {
        match self.category {
            FacilityCategory::Pad => self.pad_fractional_level().floor() as i32,
            FacilityCategory::Hangar => 0,
        }
    }

    /// Similarity to another descriptor in [0, 1].
    /// 1.0 means same category, human rating and capacity tier.
    pub fn closeness(&self, other: &FacilityDescriptor) -> f64 {
        if self.category != other.category || self.human_rated != other.human_rated {
            return 0.0;
        }
        if self.capacity_tier() == other.capacity_tier() {
            return 1.0;
        }
        match (self.mass_max, other.mass_max) {
            (Some(a), Some(b)) if a > 0.0 && b > 0.0 => a.min(b) / a.max(b),
            (None, None) => 1.0,
            _ => 0.0,
        }
    }

    /// e.g. "45-60t" or "unlimited"
    pub fn supported_mass_text(&self) -> String {
        match self.mass_max {
            Some(m) => format!("{:.0}-{:.0}t", self.mass_min(), m),
            None => "unlimited".to_string(),
        }
    }

    /// e.g. "40x40x10m" (length x width x height)
    pub fn supported_size_text(&self) -> String {
        let s = self.size_max;
        format!("{:.0}x{:.0}x{:.0}m", s.z, s.x, s.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad(mass: f64, human_rated: bool) -> FacilityDescriptor {
        FacilityDescriptor::new(
            "Pad",
            FacilityCategory::Pad,
            Some(mass),
            Size3::new(5.0, 30.0, 5.0),
            human_rated,
        )
    }

    #[test]
    fn test_starting_hangar() {
        let hangar = FacilityDescriptor::starting_hangar();
        assert_eq!(hangar.category, FacilityCategory::Hangar);
        assert!(hangar.mass_max.is_none());
        assert!(hangar.matches_starting_hangar());

        let mut renamed = hangar.clone();
        renamed.name = "Main Hangar".into();
        assert!(renamed.matches_starting_hangar());

        assert!(!pad(60.0, false).matches_starting_hangar());
    }

    #[test]
    fn test_mass_min_and_text() {
        let d = pad(60.0, false);
        assert_eq!(d.mass_min(), 45.0);
        assert_eq!(d.supported_mass_text(), "45-60t");
        assert_eq!(d.supported_size_text(), "5x5x30m");
        assert_eq!(FacilityDescriptor::starting_hangar().supported_mass_text(), "unlimited");
    }

    #[test]
    fn test_closeness_exact_tier() {
        // 100t and 200t are both tier 1 (60-300t)
        assert_eq!(pad(100.0, false).closeness(&pad(200.0, false)), 1.0);
        assert_eq!(pad(100.0, false).closeness(&pad(100.0, false)), 1.0);
    }

    #[test]
    fn test_closeness_mismatches() {
        assert_eq!(pad(100.0, true).closeness(&pad(100.0, false)), 0.0);
        assert_eq!(
            pad(100.0, false).closeness(&FacilityDescriptor::starting_hangar()),
            0.0
        );
        let c = pad(50.0, false).closeness(&pad(100.0, false));
        assert!((c - 0.5).abs() < 1e-9);
        assert!(c < 1.0);
    }

    #[test]
    fn test_closeness_is_symmetric() {
        let a = pad(40.0, false);
        let b = pad(900.0, false);
        assert_eq!(a.closeness(&b), b.closeness(&a));
    }
}
