/// Pre-launch operations and pad construction queue items.
/// Rollout, rollback and reconditioning share one queue; airlaunch
/// preparation and pad construction each have their own.

use serde::{Deserialize, Serialize};

use crate::ids::{ItemId, PadId};
use crate::workforce::WorkItem;

// ==========================================
// Recon / rollout
// ==========================================

/// What a recon/rollout item is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReconRolloutKind {
    /// Turnaround after a launch
    Reconditioning,
    /// Moving a vessel onto the pad
    Rollout,
    /// Moving a vessel back off the pad
    Rollback,
}

/// Pad-level operation against one launch site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconRollout {
    pub id: ItemId,
    #[serde(rename = "RRType")]
    pub kind: ReconRolloutKind,
    /// Launch site (pad name) the operation runs on
    #[serde(rename = "launchPadID")]
    pub launch_site: String,
    /// Vessel being moved, if any
    #[serde(rename = "associatedID", default)]
    pub vessel_id: Option<ItemId>,
    #[serde(rename = "BP")]
    pub build_points: f64,
    #[serde(default)]
    pub progress: f64,
    #[serde(rename = "humanRated", default)]
    pub human_rated: bool,
    #[serde(skip)]
    pub(crate) rate: f64,
}

impl ReconRollout {
    pub fn new(
        id: ItemId,
        kind: ReconRolloutKind,
        launch_site: &str,
        vessel_id: Option<ItemId>,
        build_points: f64,
        human_rated: bool,
    ) -> Self {
        Self {
            id,
            kind,
            launch_site: launch_site.to_string(),
            vessel_id,
            build_points,
            progress: 0.0,
            human_rated,
            rate: 0.0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= self.build_points
    }

    pub fn current_rate(&self) -> f64 {
        self.rate
    }
}

impl WorkItem for ReconRollout {
    fn remaining_work(&self) -> f64 {
        (self.build_points - self.progress).max(0.0)
    }

    fn rate(&self) -> f64 {
        self.rate
    }
}

// ==========================================
// Airlaunch
// ==========================================

/// Mounting a vessel on its carrier, or taking it off again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AirlaunchDirection {
    Prep,
    Unprep,
}

/// Airlaunch preparation of one stored vessel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirlaunchPrep {
    pub id: ItemId,
    pub direction: AirlaunchDirection,
    #[serde(rename = "associatedID")]
    pub vessel_id: ItemId,
    #[serde(rename = "BP")]
    pub build_points: f64,
    #[serde(default)]
    pub progress: f64,
    #[serde(rename = "humanRated", default)]
    pub human_rated: bool,
    #[serde(skip)]
    pub(crate) rate: f64,
}

impl AirlaunchPrep {
    pub fn new(
        id: ItemId,
        direction: AirlaunchDirection,
        vessel_id: ItemId,
        build_points: f64,
        human_rated: bool,
    ) -> Self {
        Self {
            id,
            direction,
            vessel_id,
            build_points,
            progress: 0.0,
            human_rated,
            rate: 0.0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= self.build_points
    }

    pub fn current_rate(&self) -> f64 {
        self.rate
    }
}

impl WorkItem for AirlaunchPrep {
    fn remaining_work(&self) -> f64 {
        (self.build_points - self.progress).max(0.0)
    }

    fn rate(&self) -> f64 {
        self.rate
    }
}

// ==========================================
// Pad construction
// ==========================================

/// Construction or rebuild of one pad. Progressed center-wide, not by the
/// complex's workforce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PadConstruction {
    pub id: ItemId,
    #[serde(rename = "padID")]
    pub pad_id: PadId,
    pub name: String,
    #[serde(rename = "BP")]
    pub build_points: f64,
    #[serde(default)]
    pub progress: f64,
    /// Funds committed to the construction
    #[serde(default)]
    pub cost: f64,
}

impl PadConstruction {
    pub fn new(id: ItemId, pad_id: PadId, name: &str, build_points: f64, cost: f64) -> Self {
        Self {
            id,
            pad_id,
            name: name.to_string(),
            build_points,
            progress: 0.0,
            cost,
        }
    }

    pub fn remaining(&self) -> f64 {
        (self.build_points - self.progress).max(0.0)
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= self.build_points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_recon_rollout_progress() {
        let mut rr = ReconRollout::new(
            Uuid::from_u128(1),
            ReconRolloutKind::Rollout,
            "LC-1",
            Some(Uuid::from_u128(2)),
            100.0,
            false,
        );
        assert!(!rr.is_complete());
        assert_eq!(rr.remaining_work(), 100.0);
        rr.progress = 100.0;
        assert!(rr.is_complete());
        assert_eq!(rr.remaining_work(), 0.0);
    }

    #[test]
    fn test_pad_construction_progress() {
        let mut pc = PadConstruction::new(Uuid::from_u128(3), Uuid::from_u128(4), "LC-2", 500.0, 1e6);
        pc.progress = 200.0;
        assert_eq!(pc.remaining(), 300.0);
        pc.progress = 600.0;
        assert!(pc.is_complete());
    }

    #[test]
    fn test_kind_names_persist() {
        let json = serde_json::to_string(&ReconRolloutKind::Reconditioning).unwrap();
        assert_eq!(json, "\"Reconditioning\"");
        let dir: AirlaunchDirection = serde_json::from_str("\"Unprep\"").unwrap();
        assert_eq!(dir, AirlaunchDirection::Unprep);
    }
}
