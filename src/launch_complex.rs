/// Launch complexes
///
/// A launch complex owns its pads, its workforce and five queues: vessels
/// being built, finished vessels in the warehouse, pad constructions,
/// recon/rollout operations and airlaunch preparation. Every queue insert or
/// removal is recorded in an outbox of [`FacilityChange`]s which the owning
/// space center drains after each operation.

use uuid::Uuid;

use crate::build_item::BuildItem;
use crate::config::EngineSettings;
use crate::descriptor::{FacilityCategory, FacilityDescriptor};
use crate::error::{EngineError, EngineResult};
use crate::ids::{FacilityId, IdSource, ItemId, PadId};
use crate::launch_pad::{LaunchPad, PadState};
use crate::operations::{
    AirlaunchDirection, AirlaunchPrep, PadConstruction, ReconRollout, ReconRolloutKind,
};
use crate::strategy::RateModifiers;
use crate::workforce::{
    distribute, max_workforce, max_workforce_for, BuildRateModel, Distribution, RateInput,
};

// ==========================================
// Notifications
// ==========================================

/// Which queue of a complex changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    BuildList,
    Warehouse,
    PadConstructions,
    ReconRollout,
    AirlaunchPrep,
}

/// Change recorded by a complex for its container
#[derive(Debug, Clone, PartialEq)]
pub enum FacilityChange {
    /// An item was added to or removed from a queue
    Queue { queue: QueueKind, item: ItemId, added: bool },
    /// Workforce or rush state changed upkeep
    Upkeep,
}

/// Things that happened while time advanced
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A vessel finished building and moved to the warehouse
    BuildCompleted {
        facility: FacilityId,
        item: ItemId,
        name: String,
    },
    /// A recon, rollout or rollback operation finished
    OperationCompleted {
        facility: FacilityId,
        kind: ReconRolloutKind,
        launch_site: String,
    },
    /// A vessel finished airlaunch preparation
    AirlaunchCompleted {
        facility: FacilityId,
        vessel: ItemId,
        direction: AirlaunchDirection,
    },
    /// A pad construction finished and the pad is usable
    PadConstructionCompleted {
        facility: FacilityId,
        pad: PadId,
        name: String,
    },
    /// An efficiency pool grew
    EfficiencyIncreased { pool: Uuid, efficiency: f64 },
}

// ==========================================
// Launch complex
// ==========================================

/// Aggregate root for one production facility
#[derive(Debug, Clone)]
pub struct LaunchComplex {
    pub(crate) id: FacilityId,
    /// Reassigned on every descriptor edit
    pub(crate) mod_id: Uuid,
    pub(crate) name: String,
    pub(crate) descriptor: FacilityDescriptor,
    pub(crate) workforce: u32,
    pub(crate) is_rushing: bool,
    pub(crate) is_operational: bool,
    pub(crate) launch_pads: Vec<LaunchPad>,
    pub(crate) active_pad_index: usize,
    pub(crate) build_list: Vec<BuildItem>,
    pub(crate) warehouse: Vec<BuildItem>,
    pub(crate) pad_constructions: Vec<PadConstruction>,
    pub(crate) recon_rollout: Vec<ReconRollout>,
    pub(crate) airlaunch_prep: Vec<AirlaunchPrep>,
    rate: f64,
    rate_hr_capped: f64,
    strategy_multiplier: f64,
    changes: Vec<FacilityChange>,
}

impl LaunchComplex {
    /// A new operational complex. Pad complexes start with one usable pad.
    pub fn new(descriptor: FacilityDescriptor, ids: &mut dyn IdSource) -> Self {
        let mut complex = Self::empty(ids.next_id(), ids.next_id(), descriptor);
        if complex.is_pad() {
            let pad = LaunchPad::new_operational(
                ids.next_id(),
                &complex.name,
                complex.descriptor.pad_fractional_level(),
            );
            complex.launch_pads.push(pad);
        }
        complex
    }

    pub(crate) fn empty(id: FacilityId, mod_id: Uuid, descriptor: FacilityDescriptor) -> Self {
        Self {
            id,
            mod_id,
            name: descriptor.name.clone(),
            descriptor,
            workforce: 0,
            is_rushing: false,
            is_operational: true,
            launch_pads: Vec::new(),
            active_pad_index: 0,
            build_list: Vec::new(),
            warehouse: Vec::new(),
            pad_constructions: Vec::new(),
            recon_rollout: Vec::new(),
            airlaunch_prep: Vec::new(),
            rate: 0.0,
            rate_hr_capped: 0.0,
            strategy_multiplier: 1.0,
            changes: Vec::new(),
        }
    }

    pub fn id(&self) -> FacilityId {
        self.id
    }

    pub fn mod_id(&self) -> Uuid {
        self.mod_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &FacilityDescriptor {
        &self.descriptor
    }

    pub fn category(&self) -> FacilityCategory {
        self.descriptor.category
    }

    pub fn is_pad(&self) -> bool {
        self.descriptor.is_pad()
    }

    pub fn workforce(&self) -> u32 {
        self.workforce
    }

    pub fn is_rushing(&self) -> bool {
        self.is_rushing
    }

    pub fn is_operational(&self) -> bool {
        self.is_operational
    }

    /// Rate for human-rated work
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Rate for work limited to the non-human-rated workforce
    pub fn rate_hr_capped(&self) -> f64 {
        self.rate_hr_capped
    }

    pub fn strategy_multiplier(&self) -> f64 {
        self.strategy_multiplier
    }

    pub fn build_list(&self) -> &[BuildItem] {
        &self.build_list
    }

    pub fn warehouse(&self) -> &[BuildItem] {
        &self.warehouse
    }

    pub fn pad_constructions(&self) -> &[PadConstruction] {
        &self.pad_constructions
    }

    pub fn recon_rollout(&self) -> &[ReconRollout] {
        &self.recon_rollout
    }

    pub fn airlaunch_prep(&self) -> &[AirlaunchPrep] {
        &self.airlaunch_prep
    }

    /// Anything consuming the workforce
    pub fn is_active(&self) -> bool {
        !self.build_list.is_empty()
            || !self.recon_rollout.is_empty()
            || !self.airlaunch_prep.is_empty()
    }

    pub fn is_idle(&self) -> bool {
        !self.is_active()
    }

    /// Descriptor edits need every queue empty, except reconditioning
    pub fn can_modify(&self) -> bool {
        self.build_list.is_empty()
            && self.warehouse.is_empty()
            && self.pad_constructions.is_empty()
            && self.airlaunch_prep.is_empty()
            && self
                .recon_rollout
                .iter()
                .all(|r| r.kind == ReconRolloutKind::Reconditioning)
    }

    /// An untouched starting hangar
    pub fn is_empty(&self) -> bool {
        self.category() == FacilityCategory::Hangar
            && self.build_list.is_empty()
            && self.warehouse.is_empty()
            && self.airlaunch_prep.is_empty()
            && self.workforce == 0
            && self.descriptor.matches_starting_hangar()
    }

    /// Idle, unstaffed and holding nothing
    pub fn is_removable(&self) -> bool {
        self.is_idle()
            && self.workforce == 0
            && self.warehouse.is_empty()
            && self.pad_constructions.is_empty()
    }

    // ==========================================
    // Descriptor and workforce
    // ==========================================

    /// Rename the complex and its descriptor together
    pub fn rename(&mut self, name: &str) {
        tracing::info!(facility = %self.id, from = %self.name, to = name, "renamed launch complex");
        self.name = name.to_string();
        self.descriptor.name = name.to_string();
    }

    /// Replace the descriptor. Refused while any queue other than
    /// reconditioning holds work.
    pub fn modify(
        &mut self,
        settings: &EngineSettings,
        mut descriptor: FacilityDescriptor,
        ids: &mut dyn IdSource,
    ) -> EngineResult<()> {
        if !self.can_modify() {
            return Err(EngineError::CannotModify(format!(
                "{} still has queued work",
                self.name
            )));
        }
        descriptor.name = self.name.clone();
        self.descriptor = descriptor;
        self.mod_id = ids.next_id();

        if self.is_pad() {
            let level = self.descriptor.pad_fractional_level();
            for pad in &mut self.launch_pads {
                pad.set_level(level);
            }
            if self.launch_pads.is_empty() {
                self.launch_pads
                    .push(LaunchPad::new_operational(ids.next_id(), &self.name, level));
                self.active_pad_index = 0;
            }
        } else if !self.launch_pads.is_empty() {
            self.launch_pads.clear();
            let recon: Vec<ItemId> = self.recon_rollout.iter().map(|r| r.id).collect();
            for item in recon {
                self.remove_recon_rollout(item);
            }
            self.active_pad_index = 0;
        }

        let cap = self.max_workforce(settings);
        if self.workforce > cap {
            self.workforce = cap;
            self.changes.push(FacilityChange::Upkeep);
        }
        tracing::info!(facility = %self.id, name = %self.name, mod_id = %self.mod_id, "modified launch complex");
        Ok(())
    }

    pub fn max_workforce(&self, settings: &EngineSettings) -> u32 {
        max_workforce(settings, &self.descriptor, None)
    }

    /// Workforce that can work on one vessel
    pub fn max_workforce_for(&self, settings: &EngineSettings, item: &BuildItem) -> u32 {
        max_workforce_for(
            settings,
            &self.descriptor,
            item.mass,
            item.total_points(),
            item.human_rated,
        )
    }

    /// Set workforce, clamped to the cap. Returns the value applied.
    pub fn set_workforce(&mut self, settings: &EngineSettings, workforce: u32) -> u32 {
        let applied = workforce.min(self.max_workforce(settings));
        if applied != self.workforce {
            tracing::debug!(facility = %self.id, workforce = applied, "workforce changed");
            self.workforce = applied;
            self.changes.push(FacilityChange::Upkeep);
        }
        applied
    }

    pub fn set_rushing(&mut self, rushing: bool) {
        if rushing != self.is_rushing {
            self.is_rushing = rushing;
            self.changes.push(FacilityChange::Upkeep);
        }
    }

    // ==========================================
    // Rates
    // ==========================================

    /// Recompute the strategy multiplier, both facility rates and every
    /// queued item's rate. The only place rates are assigned.
    pub fn recalculate_rates(
        &mut self,
        settings: &EngineSettings,
        efficiency: f64,
        modifiers: &dyn RateModifiers,
        model: &dyn BuildRateModel,
    ) {
        self.strategy_multiplier = modifiers.rate_multiplier(self.category());
        let input = RateInput {
            workforce: self.workforce,
            non_human_rated_cap: max_workforce(settings, &self.descriptor, Some(false)),
            efficiency,
            strategy_multiplier: self.strategy_multiplier,
            rush_multiplier: settings.rush_rate(self.is_rushing),
            human_rated: true,
        };
        self.rate = model.build_rate(&input);
        self.rate_hr_capped = model.build_rate(&RateInput {
            human_rated: false,
            ..input
        });

        for i in 0..self.build_list.len() {
            let cap = self.max_workforce_for(settings, &self.build_list[i]);
            let item = &mut self.build_list[i];
            item.rate = model.build_rate(&RateInput {
                workforce: input.workforce.min(cap),
                human_rated: item.human_rated,
                ..input
            });
        }
        for item in &mut self.recon_rollout {
            item.rate = if item.human_rated { self.rate } else { self.rate_hr_capped };
        }
        for item in &mut self.airlaunch_prep {
            item.rate = if item.human_rated { self.rate } else { self.rate_hr_capped };
        }

        tracing::debug!(
            facility = %self.id,
            rate = self.rate,
            rate_hr_capped = self.rate_hr_capped,
            strategy = self.strategy_multiplier,
            "recalculated build rates"
        );
    }

    // ==========================================
    // Pads
    // ==========================================

    pub fn launch_pads(&self) -> &[LaunchPad] {
        &self.launch_pads
    }

    pub fn launch_pad_count(&self) -> usize {
        self.launch_pads.len()
    }

    pub fn active_pad_index(&self) -> usize {
        self.active_pad_index
    }

    /// The selected pad, if it exists
    pub fn active_pad(&self) -> Option<&LaunchPad> {
        self.launch_pads.get(self.active_pad_index)
    }

    pub fn pad(&self, pad: PadId) -> Option<&LaunchPad> {
        self.launch_pads.iter().find(|p| p.id == pad)
    }

    pub(crate) fn pad_mut(&mut self, pad: PadId) -> EngineResult<&mut LaunchPad> {
        self.launch_pads
            .iter_mut()
            .find(|p| p.id == pad)
            .ok_or_else(|| EngineError::NotFound(format!("pad {pad}")))
    }

    pub fn switch_to_next_pad(&mut self) -> Option<usize> {
        self.step_to_operational(true)
    }

    pub fn switch_to_previous_pad(&mut self) -> Option<usize> {
        self.step_to_operational(false)
    }

    /// Walk the pads circularly to the next operational one. Falls back to
    /// index 0 and returns `None` when no pad is operational.
    fn step_to_operational(&mut self, forward: bool) -> Option<usize> {
        let count = self.launch_pads.len();
        if count == 0 {
            self.active_pad_index = 0;
            return None;
        }
        let mut index = self.active_pad_index.min(count - 1);
        for _ in 0..count {
            index = if forward {
                (index + 1) % count
            } else {
                (index + count - 1) % count
            };
            if self.launch_pads[index].is_operational() {
                self.active_pad_index = index;
                return Some(index);
            }
        }
        tracing::debug!(facility = %self.id, "no operational pad to switch to");
        self.active_pad_index = 0;
        None
    }

    /// Select a pad directly, operational or not
    pub fn select_pad(&mut self, index: usize) -> EngineResult<usize> {
        if index >= self.launch_pads.len() {
            return Err(EngineError::NotFound(format!("pad index {index}")));
        }
        if index != self.active_pad_index {
            tracing::debug!(facility = %self.id, pad = index, "selected pad");
        }
        self.active_pad_index = index;
        Ok(index)
    }

    /// Move off a non-operational active pad when an operational one exists
    pub fn ensure_active_pad(&mut self) -> Option<usize> {
        match self.active_pad() {
            Some(pad) if pad.is_operational() => Some(self.active_pad_index),
            _ => self.step_to_operational(true),
        }
    }

    /// Most severe state over all pads
    pub fn best_state(&self) -> Option<PadState> {
        self.launch_pads.iter().map(|p| p.state()).max()
    }

    pub fn find_free_pad(&self) -> Option<&LaunchPad> {
        self.launch_pads.iter().find(|p| p.is_free())
    }

    /// Add a pad that becomes usable when its construction completes
    pub(crate) fn add_pad(&mut self, pad: LaunchPad) {
        tracing::info!(facility = %self.id, pad = %pad.name, "added launch pad");
        self.launch_pads.push(pad);
        self.ensure_active_pad();
    }

    /// Destroy a pad and move the selection off it. A construction still
    /// running on it is dropped.
    pub fn destroy_pad(&mut self, pad: PadId) -> EngineResult<PadState> {
        let state = self.pad_mut(pad)?.destroy();
        let constructions: Vec<ItemId> = self
            .pad_constructions
            .iter()
            .filter(|c| c.pad_id == pad)
            .map(|c| c.id)
            .collect();
        for id in constructions {
            self.remove_pad_construction(id);
        }
        self.ensure_active_pad();
        Ok(state)
    }

    /// Remove a pad for good, with its construction and operations
    pub fn demolish_pad(&mut self, pad: PadId) -> EngineResult<LaunchPad> {
        let index = self
            .launch_pads
            .iter()
            .position(|p| p.id == pad)
            .ok_or_else(|| EngineError::NotFound(format!("pad {pad}")))?;
        let removed = self.launch_pads.remove(index);

        let constructions: Vec<ItemId> = self
            .pad_constructions
            .iter()
            .filter(|c| c.pad_id == pad)
            .map(|c| c.id)
            .collect();
        for id in constructions {
            self.remove_pad_construction(id);
        }
        let operations: Vec<ItemId> = self
            .recon_rollout
            .iter()
            .filter(|r| r.launch_site == removed.name)
            .map(|r| r.id)
            .collect();
        for id in operations {
            self.remove_recon_rollout(id);
        }

        if index < self.active_pad_index {
            self.active_pad_index -= 1;
        }
        if self.active_pad_index >= self.launch_pads.len() {
            self.active_pad_index = 0;
        }
        self.ensure_active_pad();
        tracing::info!(facility = %self.id, pad = %removed.name, "demolished launch pad");
        Ok(removed)
    }

    // ==========================================
    // Queues
    // ==========================================

    fn record(&mut self, queue: QueueKind, item: ItemId, added: bool) {
        tracing::debug!(facility = %self.id, ?queue, %item, added, "queue changed");
        self.changes.push(FacilityChange::Queue { queue, item, added });
    }

    /// Changes recorded since the last drain
    pub fn take_changes(&mut self) -> Vec<FacilityChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn add_build(&mut self, mut item: BuildItem) {
        item.link_to_facility(self.id);
        let id = item.id;
        self.build_list.push(item);
        self.record(QueueKind::BuildList, id, true);
    }

    pub fn remove_build(&mut self, item: ItemId) -> Option<BuildItem> {
        let pos = self.build_list.iter().position(|b| b.id == item)?;
        let removed = self.build_list.remove(pos);
        self.record(QueueKind::BuildList, item, false);
        Some(removed)
    }

    pub fn add_to_warehouse(&mut self, mut item: BuildItem) {
        item.link_to_facility(self.id);
        let id = item.id;
        self.warehouse.push(item);
        self.record(QueueKind::Warehouse, id, true);
    }

    pub fn remove_from_warehouse(&mut self, item: ItemId) -> Option<BuildItem> {
        let pos = self.warehouse.iter().position(|b| b.id == item)?;
        let removed = self.warehouse.remove(pos);
        self.record(QueueKind::Warehouse, item, false);
        Some(removed)
    }

    pub fn find_vessel(&self, item: ItemId) -> Option<&BuildItem> {
        self.build_list
            .iter()
            .chain(self.warehouse.iter())
            .find(|b| b.id == item)
    }

    pub fn add_pad_construction(&mut self, construction: PadConstruction) {
        let id = construction.id;
        self.pad_constructions.push(construction);
        self.record(QueueKind::PadConstructions, id, true);
    }

    pub fn remove_pad_construction(&mut self, item: ItemId) -> Option<PadConstruction> {
        let pos = self.pad_constructions.iter().position(|c| c.id == item)?;
        let removed = self.pad_constructions.remove(pos);
        self.record(QueueKind::PadConstructions, item, false);
        Some(removed)
    }

    pub(crate) fn pad_construction_mut(&mut self, item: ItemId) -> Option<&mut PadConstruction> {
        self.pad_constructions.iter_mut().find(|c| c.id == item)
    }

    pub fn add_recon_rollout(&mut self, item: ReconRollout) {
        let id = item.id;
        self.recon_rollout.push(item);
        self.record(QueueKind::ReconRollout, id, true);
    }

    pub fn remove_recon_rollout(&mut self, item: ItemId) -> Option<ReconRollout> {
        let pos = self.recon_rollout.iter().position(|r| r.id == item)?;
        let removed = self.recon_rollout.remove(pos);
        self.record(QueueKind::ReconRollout, item, false);
        Some(removed)
    }

    pub fn add_airlaunch_prep(&mut self, item: AirlaunchPrep) {
        let id = item.id;
        self.airlaunch_prep.push(item);
        self.record(QueueKind::AirlaunchPrep, id, true);
    }

    pub fn remove_airlaunch_prep(&mut self, item: ItemId) -> Option<AirlaunchPrep> {
        let pos = self.airlaunch_prep.iter().position(|a| a.id == item)?;
        let removed = self.airlaunch_prep.remove(pos);
        self.record(QueueKind::AirlaunchPrep, item, false);
        Some(removed)
    }

    /// Reconditioning running on a launch site
    pub fn get_reconditioning(&self, launch_site: &str) -> Option<&ReconRollout> {
        self.get_recon_rollout(Some(ReconRolloutKind::Reconditioning), launch_site)
    }

    /// First operation on a launch site, of the given kind or any kind
    pub fn get_recon_rollout(
        &self,
        kind: Option<ReconRolloutKind>,
        launch_site: &str,
    ) -> Option<&ReconRollout> {
        self.recon_rollout
            .iter()
            .find(|r| r.launch_site == launch_site && kind.map_or(true, |k| r.kind == k))
    }

    // ==========================================
    // Time
    // ==========================================

    /// Progress the three time-consuming queues by `elapsed` days using the
    /// rates of the last recomputation, then settle completed items.
    ///
    /// Each queue has its own pass; none reads another's progress.
    pub fn advance(&mut self, elapsed: f64) -> Vec<EngineEvent> {
        let builds = distribute(Distribution::Sequential, elapsed, &self.build_list);
        let operations = distribute(Distribution::Concurrent, elapsed, &self.recon_rollout);
        let airlaunch = distribute(Distribution::Sequential, elapsed, &self.airlaunch_prep);

        for (item, delta) in self.build_list.iter_mut().zip(builds) {
            item.progress += delta;
        }
        for (item, delta) in self.recon_rollout.iter_mut().zip(operations) {
            item.progress += delta;
        }
        for (item, delta) in self.airlaunch_prep.iter_mut().zip(airlaunch) {
            item.progress += delta;
        }

        let mut events = Vec::new();
        self.settle_builds(&mut events);
        self.settle_operations(&mut events);
        self.settle_airlaunch(&mut events);
        events
    }

    fn settle_builds(&mut self, events: &mut Vec<EngineEvent>) {
        let done: Vec<ItemId> = self
            .build_list
            .iter()
            .filter(|b| b.is_complete())
            .map(|b| b.id)
            .collect();
        for id in done {
            if let Some(mut item) = self.remove_build(id) {
                item.rate = 0.0;
                tracing::info!(facility = %self.id, vessel = %item.name, "vessel completed");
                events.push(EngineEvent::BuildCompleted {
                    facility: self.id,
                    item: item.id,
                    name: item.name.clone(),
                });
                self.add_to_warehouse(item);
            }
        }
    }

    fn settle_operations(&mut self, events: &mut Vec<EngineEvent>) {
        let done: Vec<ItemId> = self
            .recon_rollout
            .iter()
            .filter(|r| r.is_complete())
            .map(|r| r.id)
            .collect();
        for id in done {
            let Some(op) = self.remove_recon_rollout(id) else {
                continue;
            };
            let facility = self.id;
            match self.launch_pads.iter_mut().find(|p| p.name == op.launch_site) {
                Some(pad) => {
                    let result = match op.kind {
                        ReconRolloutKind::Reconditioning => pad.complete_reconditioning(),
                        ReconRolloutKind::Rollout | ReconRolloutKind::Rollback => {
                            pad.complete_rollout()
                        }
                    };
                    if let Err(e) = result {
                        tracing::warn!(%facility, site = %op.launch_site, error = %e, "operation finished on a pad in the wrong state");
                    }
                }
                None => {
                    tracing::warn!(%facility, site = %op.launch_site, "operation finished for an unknown launch site");
                }
            }
            events.push(EngineEvent::OperationCompleted {
                facility,
                kind: op.kind,
                launch_site: op.launch_site,
            });
        }
    }

    fn settle_airlaunch(&mut self, events: &mut Vec<EngineEvent>) {
        let done: Vec<ItemId> = self
            .airlaunch_prep
            .iter()
            .filter(|a| a.is_complete())
            .map(|a| a.id)
            .collect();
        for id in done {
            if let Some(prep) = self.remove_airlaunch_prep(id) {
                events.push(EngineEvent::AirlaunchCompleted {
                    facility: self.id,
                    vessel: prep.vessel_id,
                    direction: prep.direction,
                });
            }
        }
    }
}
