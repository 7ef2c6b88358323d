/// Vessels under construction or waiting in storage.

use serde::{Deserialize, Serialize};

use crate::ids::{FacilityId, ItemId};
use crate::workforce::WorkItem;

/// A vessel in a complex's build list or warehouse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildItem {
    pub id: ItemId,
    #[serde(rename = "shipName")]
    pub name: String,
    #[serde(rename = "buildPoints")]
    pub build_points: f64,
    #[serde(rename = "integrationPoints", default)]
    pub integration_points: f64,
    /// Accumulated build points
    #[serde(default)]
    pub progress: f64,
    /// Wet mass in tons
    #[serde(default)]
    pub mass: f64,
    #[serde(rename = "humanRated", default)]
    pub human_rated: bool,
    /// Owning complex, resolved by lookup only. The queue holding the item owns it.
    #[serde(rename = "LCID", default)]
    pub facility_id: Option<FacilityId>,
    /// Rate assigned at the last recomputation
    #[serde(skip)]
    pub(crate) rate: f64,
}

impl BuildItem {
    pub fn new(
        id: ItemId,
        name: &str,
        build_points: f64,
        integration_points: f64,
        mass: f64,
        human_rated: bool,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            build_points,
            integration_points,
            progress: 0.0,
            mass,
            human_rated,
            facility_id: None,
            rate: 0.0,
        }
    }

    /// Build and integration points together
    pub fn total_points(&self) -> f64 {
        self.build_points + self.integration_points
    }

    pub fn remaining(&self) -> f64 {
        (self.total_points() - self.progress).max(0.0)
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= self.total_points()
    }

    /// Progress as a fraction (0.0 to 1.0)
    pub fn progress_fraction(&self) -> f64 {
        let total = self.total_points();
        if total > 0.0 {
            (self.progress / total).min(1.0)
        } else {
            1.0
        }
    }

    pub fn current_rate(&self) -> f64 {
        self.rate
    }

    /// Days left at the current rate, `None` if not progressing
    pub fn days_remaining(&self) -> Option<f64> {
        if self.is_complete() {
            Some(0.0)
        } else if self.rate > 0.0 {
            Some(self.remaining() / self.rate)
        } else {
            None
        }
    }

    pub fn link_to_facility(&mut self, facility: FacilityId) {
        self.facility_id = Some(facility);
    }
}

impl WorkItem for BuildItem {
    fn remaining_work(&self) -> f64 {
        self.remaining()
    }

    fn rate(&self) -> f64 {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn vessel() -> BuildItem {
        BuildItem::new(Uuid::from_u128(9), "Sounding Rocket", 800.0, 200.0, 12.0, false)
    }

    #[test]
    fn test_progress_tracking() {
        let mut item = vessel();
        assert_eq!(item.total_points(), 1000.0);
        assert_eq!(item.remaining(), 1000.0);
        assert!(!item.is_complete());

        item.progress = 250.0;
        assert_eq!(item.progress_fraction(), 0.25);
        assert_eq!(item.remaining(), 750.0);

        item.progress = 1200.0;
        assert!(item.is_complete());
        assert_eq!(item.remaining(), 0.0);
        assert_eq!(item.progress_fraction(), 1.0);
    }

    #[test]
    fn test_days_remaining() {
        let mut item = vessel();
        assert_eq!(item.days_remaining(), None);
        item.rate = 50.0;
        assert_eq!(item.days_remaining(), Some(20.0));
    }

    #[test]
    fn test_legacy_record_defaults() {
        let item: BuildItem = serde_json::from_str(
            r#"{ "id": "00000000-0000-0000-0000-000000000009", "shipName": "Old", "buildPoints": 10.0 }"#,
        )
        .unwrap();
        assert_eq!(item.integration_points, 0.0);
        assert_eq!(item.facility_id, None);
        assert!(!item.human_rated);
    }
}
