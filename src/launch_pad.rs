/// Launch pad lifecycle
///
/// A pad is one physical launch structure owned by a Pad-category complex.
/// Its state moves through construction, launch turnaround and destruction;
/// every transition is checked so a pad can never skip reconditioning or
/// launch while destroyed.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::ids::PadId;

/// Pad states, declared in increasing severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PadState {
    /// Operational and idle
    Free,
    /// Vessel integrated or rolling out
    Busy,
    /// Post-launch turnaround
    Reconditioning,
    /// Being built, rebuilt or upgraded
    UnderConstruction,
    /// Non-operational after destruction
    Destroyed,
}

/// One physical pad
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchPad {
    pub id: PadId,
    pub name: String,
    /// Structural level, floor of `fractional_level`
    pub level: i32,
    pub fractional_level: f64,
    state: PadState,
    /// Host-owned destruction data, carried through save/load untouched
    pub destruction_state: serde_json::Value,
}

impl LaunchPad {
    /// A pad ready to use
    pub fn new_operational(id: PadId, name: &str, fractional_level: f64) -> Self {
        Self::with_state(id, name, fractional_level, PadState::Free)
    }

    /// A pad that becomes usable once its construction completes
    pub fn new_under_construction(id: PadId, name: &str, fractional_level: f64) -> Self {
        Self::with_state(id, name, fractional_level, PadState::UnderConstruction)
    }

    pub(crate) fn with_state(id: PadId, name: &str, fractional_level: f64, state: PadState) -> Self {
        Self {
            id,
            name: name.to_string(),
            level: fractional_level.floor() as i32,
            fractional_level,
            state,
            destruction_state: serde_json::Value::Null,
        }
    }

    pub fn state(&self) -> PadState {
        self.state
    }

    /// Operational pads can take rollouts and launches
    pub fn is_operational(&self) -> bool {
        matches!(
            self.state,
            PadState::Free | PadState::Busy | PadState::Reconditioning
        )
    }

    pub fn is_free(&self) -> bool {
        self.state == PadState::Free
    }

    /// Set the fractional level and re-derive the structural level
    pub fn set_level(&mut self, fractional_level: f64) {
        self.fractional_level = fractional_level;
        self.level = fractional_level.floor() as i32;
    }

    /// Old saves only stored the integer level
    pub fn migrate_from_old_state(&mut self) {
        if self.fractional_level == -1.0 {
            self.fractional_level = self.level as f64;
        }
    }

    fn transition(
        &mut self,
        allowed: &[PadState],
        to: PadState,
        action: &'static str,
    ) -> EngineResult<PadState> {
        if !allowed.contains(&self.state) {
            return Err(EngineError::InvalidPadTransition {
                from: self.state,
                action,
            });
        }
        tracing::debug!(pad = %self.name, from = ?self.state, to = ?to, "pad transition");
        self.state = to;
        Ok(to)
    }

    /// Destroyed pads are rebuilt through a construction
    pub fn begin_rebuild(&mut self) -> EngineResult<PadState> {
        self.transition(&[PadState::Destroyed], PadState::UnderConstruction, "begin rebuild")
    }

    pub fn complete_construction(&mut self) -> EngineResult<PadState> {
        self.transition(
            &[PadState::UnderConstruction],
            PadState::Free,
            "complete construction",
        )
    }

    pub fn begin_rollout(&mut self) -> EngineResult<PadState> {
        self.transition(&[PadState::Free], PadState::Busy, "begin rollout")
    }

    pub fn complete_rollout(&mut self) -> EngineResult<PadState> {
        self.transition(&[PadState::Busy], PadState::Free, "complete rollout")
    }

    /// After a launch, from the pad the vessel left
    pub fn begin_reconditioning(&mut self) -> EngineResult<PadState> {
        self.transition(
            &[PadState::Free, PadState::Busy],
            PadState::Reconditioning,
            "begin reconditioning",
        )
    }

    pub fn complete_reconditioning(&mut self) -> EngineResult<PadState> {
        self.transition(
            &[PadState::Reconditioning],
            PadState::Free,
            "complete reconditioning",
        )
    }

    /// Destruction always succeeds, whatever the pad was doing
    pub fn destroy(&mut self) -> PadState {
        tracing::info!(pad = %self.name, from = ?self.state, "pad destroyed");
        self.state = PadState::Destroyed;
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn pad() -> LaunchPad {
        LaunchPad::new_operational(Uuid::from_u128(1), "LC-1", 1.5)
    }

    #[test]
    fn test_new_pad() {
        let p = pad();
        assert_eq!(p.level, 1);
        assert_eq!(p.state(), PadState::Free);
        assert!(p.is_operational());

        let p = LaunchPad::new_under_construction(Uuid::from_u128(2), "LC-2", 2.0);
        assert_eq!(p.state(), PadState::UnderConstruction);
        assert!(!p.is_operational());
    }

    #[test]
    fn test_launch_turnaround() {
        let mut p = pad();
        assert_eq!(p.begin_rollout().unwrap(), PadState::Busy);
        assert!(p.begin_rollout().is_err());
        assert_eq!(p.complete_rollout().unwrap(), PadState::Free);
        assert_eq!(p.begin_reconditioning().unwrap(), PadState::Reconditioning);
        assert!(p.is_operational());
        // Must finish reconditioning first
        assert!(p.begin_rollout().is_err());
        assert_eq!(p.complete_reconditioning().unwrap(), PadState::Free);
    }

    #[test]
    fn test_destroy_and_rebuild() {
        let mut p = pad();
        p.begin_rollout().unwrap();
        assert_eq!(p.destroy(), PadState::Destroyed);
        assert!(!p.is_operational());
        assert!(p.complete_reconditioning().is_err());
        assert!(p.complete_construction().is_err());

        p.begin_rebuild().unwrap();
        assert_eq!(p.state(), PadState::UnderConstruction);
        p.complete_construction().unwrap();
        assert!(p.is_free());
    }

    #[test]
    fn test_invalid_transition_reports_state() {
        let mut p = pad();
        let err = p.complete_rollout().unwrap_err();
        match err {
            EngineError::InvalidPadTransition { from, action } => {
                assert_eq!(from, PadState::Free);
                assert_eq!(action, "complete rollout");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(p.state(), PadState::Free);
    }

    #[test]
    fn test_severity_order() {
        assert!(PadState::Free < PadState::Busy);
        assert!(PadState::Busy < PadState::Reconditioning);
        assert!(PadState::Reconditioning < PadState::UnderConstruction);
        assert!(PadState::UnderConstruction < PadState::Destroyed);
    }

    #[test]
    fn test_level_migration() {
        let mut p = pad();
        p.level = 3;
        p.fractional_level = -1.0;
        p.migrate_from_old_state();
        assert_eq!(p.fractional_level, 3.0);

        p.set_level(2.7);
        assert_eq!(p.level, 2);
        p.migrate_from_old_state();
        assert_eq!(p.fractional_level, 2.7);
    }
}
