/// Space center: every launch complex plus the state they share.
///
/// The space center owns the complexes, the efficiency registry, the
/// center-wide pad construction list and the player's saved plans. All
/// mutation goes through it so that queue changes reach the construction
/// mirror and the maintenance collaborator, and so rates are recomputed
/// whenever something they depend on changes.

use std::collections::BTreeMap;

use crate::build_item::BuildItem;
use crate::config::EngineSettings;
use crate::descriptor::{FacilityCategory, FacilityDescriptor};
use crate::efficiency::EfficiencyRegistry;
use crate::error::{EngineError, EngineResult};
use crate::ids::{FacilityId, IdSource, ItemId, PadId, RandomIds};
use crate::launch_complex::{EngineEvent, FacilityChange, LaunchComplex, QueueKind};
use crate::launch_pad::LaunchPad;
use crate::operations::{
    AirlaunchDirection, AirlaunchPrep, PadConstruction, ReconRollout, ReconRolloutKind,
};
use crate::strategy::{Effect, EffectId, StrategyEffects};
use crate::workforce::{BuildRateModel, StandardRateModel};

/// Upkeep accounting that must be redone when a complex changes.
/// Notifications are one-way; nothing is read back.
pub trait MaintenanceScheduler {
    fn schedule_recalculation(&mut self, facility: FacilityId);
}

/// Drops every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMaintenance;

impl MaintenanceScheduler for NoMaintenance {
    fn schedule_recalculation(&mut self, _facility: FacilityId) {}
}

/// Entry of the center-wide pad construction list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructionRef {
    pub facility: FacilityId,
    pub item: ItemId,
}

pub struct SpaceCenter {
    pub(crate) settings: EngineSettings,
    pub(crate) facilities: Vec<LaunchComplex>,
    pub(crate) efficiency: EfficiencyRegistry,
    pub(crate) constructions: Vec<ConstructionRef>,
    /// Saved vessel plans by name
    pub(crate) plans: BTreeMap<String, BuildItem>,
    effects: StrategyEffects,
    rate_model: Box<dyn BuildRateModel>,
    pub(crate) ids: Box<dyn IdSource>,
    maintenance: Box<dyn MaintenanceScheduler>,
}

impl SpaceCenter {
    /// A fresh center holding only the starting hangar
    pub fn new(settings: EngineSettings) -> Self {
        let mut center = Self::without_facilities(settings);
        let hangar = LaunchComplex::new(FacilityDescriptor::starting_hangar(), center.ids.as_mut());
        center.facilities.push(hangar);
        center.recalculate_all_rates();
        center
    }

    pub(crate) fn without_facilities(settings: EngineSettings) -> Self {
        Self {
            efficiency: EfficiencyRegistry::from_settings(&settings),
            rate_model: Box::new(StandardRateModel::from_settings(&settings)),
            settings,
            facilities: Vec::new(),
            constructions: Vec::new(),
            plans: BTreeMap::new(),
            effects: StrategyEffects::new(),
            ids: Box::new(RandomIds),
            maintenance: Box::new(NoMaintenance),
        }
    }

    pub fn with_ids(mut self, ids: Box<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_rate_model(mut self, model: Box<dyn BuildRateModel>) -> Self {
        self.rate_model = model;
        self.recalculate_all_rates();
        self
    }

    pub fn with_maintenance(mut self, maintenance: Box<dyn MaintenanceScheduler>) -> Self {
        self.maintenance = maintenance;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn facilities(&self) -> &[LaunchComplex] {
        &self.facilities
    }

    pub fn facility(&self, id: FacilityId) -> Option<&LaunchComplex> {
        self.facilities.iter().find(|f| f.id() == id)
    }

    /// The bootstrap hangar, always at index 0
    pub fn starting_hangar(&self) -> Option<&LaunchComplex> {
        self.facilities.first()
    }

    pub fn efficiency(&self) -> &EfficiencyRegistry {
        &self.efficiency
    }

    /// Efficiency a complex works at. Hangars always work at the maximum;
    /// a pad without a pool yet works at the minimum.
    pub fn efficiency_of(&self, facility: FacilityId) -> f64 {
        facility_efficiency(&self.efficiency, self.facility(facility))
    }

    /// Upkeep multiplier the maintenance side charges for a complex
    pub fn cost_multiplier(&self, facility: FacilityId) -> Option<f64> {
        self.facility(facility)
            .map(|f| self.settings.rush_cost(f.is_rushing()))
    }

    pub fn constructions(&self) -> &[ConstructionRef] {
        &self.constructions
    }

    pub fn plans(&self) -> &BTreeMap<String, BuildItem> {
        &self.plans
    }

    /// Store a plan under its vessel name, replacing any previous one
    pub fn save_plan(&mut self, mut plan: BuildItem) {
        plan.facility_id = None;
        self.plans.insert(plan.name.clone(), plan);
    }

    pub fn remove_plan(&mut self, name: &str) -> Option<BuildItem> {
        self.plans.remove(name)
    }

    pub fn effects(&self) -> &StrategyEffects {
        &self.effects
    }

    fn index_of(&self, id: FacilityId) -> EngineResult<usize> {
        self.facilities
            .iter()
            .position(|f| f.id() == id)
            .ok_or_else(|| EngineError::NotFound(format!("facility {id}")))
    }

    // ==========================================
    // Facility lifecycle
    // ==========================================

    /// Build a new complex. Pad complexes join or create an efficiency pool.
    pub fn commission_facility(&mut self, descriptor: FacilityDescriptor) -> FacilityId {
        let complex = LaunchComplex::new(descriptor, self.ids.as_mut());
        let id = complex.id();
        if complex.is_pad() {
            self.efficiency
                .get_or_create(id, complex.descriptor(), true, self.ids.as_mut());
        }
        tracing::info!(facility = %id, name = %complex.name(), "commissioned launch complex");
        self.facilities.push(complex);
        let index = self.facilities.len() - 1;
        self.recalculate(index);
        self.maintenance.schedule_recalculation(id);
        id
    }

    /// Replace a complex's descriptor and move it to the matching pool
    pub fn modify_facility(
        &mut self,
        id: FacilityId,
        descriptor: FacilityDescriptor,
    ) -> EngineResult<()> {
        let index = self.index_of(id)?;
        self.facilities[index].modify(&self.settings, descriptor, self.ids.as_mut())?;

        let complex = &self.facilities[index];
        if complex.category() == FacilityCategory::Pad {
            self.efficiency
                .rebind(id, complex.descriptor(), self.ids.as_mut());
        } else {
            self.efficiency.remove_facility(id);
        }
        self.recalculate_pool_members(id);
        self.maintenance.schedule_recalculation(id);
        self.drain_changes(index);
        Ok(())
    }

    /// Remove an idle, empty, unstaffed complex. The starting hangar stays.
    pub fn remove_facility(&mut self, id: FacilityId) -> EngineResult<LaunchComplex> {
        let index = self.index_of(id)?;
        if index == 0 {
            return Err(EngineError::NotRemovable("the starting hangar is permanent".into()));
        }
        if !self.facilities[index].is_removable() {
            return Err(EngineError::NotRemovable(format!(
                "{} is busy or staffed",
                self.facilities[index].name()
            )));
        }
        let removed = self.facilities.remove(index);
        self.efficiency.remove_facility(id);
        self.constructions.retain(|c| c.facility != id);
        self.maintenance.schedule_recalculation(id);
        tracing::info!(facility = %id, name = %removed.name(), "removed launch complex");
        Ok(removed)
    }

    pub fn rename_facility(&mut self, id: FacilityId, name: &str) -> EngineResult<()> {
        let index = self.index_of(id)?;
        self.facilities[index].rename(name);
        Ok(())
    }

    /// Set workforce, clamped to the complex's cap. Returns the value applied.
    pub fn set_workforce(&mut self, id: FacilityId, workforce: u32) -> EngineResult<u32> {
        let index = self.index_of(id)?;
        let applied = self.facilities[index].set_workforce(&self.settings, workforce);
        self.recalculate(index);
        self.drain_changes(index);
        Ok(applied)
    }

    pub fn set_rushing(&mut self, id: FacilityId, rushing: bool) -> EngineResult<()> {
        let index = self.index_of(id)?;
        self.facilities[index].set_rushing(rushing);
        self.recalculate(index);
        self.drain_changes(index);
        Ok(())
    }

    // ==========================================
    // Pads
    // ==========================================

    pub fn switch_to_next_pad(&mut self, id: FacilityId) -> EngineResult<Option<usize>> {
        let index = self.index_of(id)?;
        Ok(self.facilities[index].switch_to_next_pad())
    }

    pub fn switch_to_previous_pad(&mut self, id: FacilityId) -> EngineResult<Option<usize>> {
        let index = self.index_of(id)?;
        Ok(self.facilities[index].switch_to_previous_pad())
    }

    pub fn select_pad(&mut self, id: FacilityId, pad_index: usize) -> EngineResult<usize> {
        let index = self.index_of(id)?;
        self.facilities[index].select_pad(pad_index)
    }

    /// Add a pad to a Pad complex. It becomes usable when its construction
    /// completes.
    pub fn queue_pad_construction(
        &mut self,
        id: FacilityId,
        name: &str,
        build_points: f64,
        cost: f64,
    ) -> EngineResult<PadId> {
        let index = self.index_of(id)?;
        if !self.facilities[index].is_pad() {
            return Err(EngineError::CannotModify(format!(
                "{} has no launch pads",
                self.facilities[index].name()
            )));
        }
        let pad_id = self.ids.next_id();
        let level = self.facilities[index].descriptor().pad_fractional_level();
        let pad = LaunchPad::new_under_construction(pad_id, name, level);
        let construction =
            PadConstruction::new(self.ids.next_id(), pad_id, name, build_points, cost);

        let complex = &mut self.facilities[index];
        complex.add_pad(pad);
        complex.add_pad_construction(construction);
        self.drain_changes(index);
        Ok(pad_id)
    }

    /// Destroy a pad. Operations running on it are dropped.
    pub fn destroy_pad(&mut self, id: FacilityId, pad: PadId) -> EngineResult<()> {
        let index = self.index_of(id)?;
        let complex = &mut self.facilities[index];
        complex.destroy_pad(pad)?;
        let site = complex.pad(pad).map(|p| p.name.clone()).unwrap_or_default();
        let dropped: Vec<ItemId> = complex
            .recon_rollout()
            .iter()
            .filter(|r| r.launch_site == site)
            .map(|r| r.id)
            .collect();
        for item in dropped {
            complex.remove_recon_rollout(item);
        }
        self.drain_changes(index);
        Ok(())
    }

    /// Start rebuilding a destroyed pad
    pub fn rebuild_pad(
        &mut self,
        id: FacilityId,
        pad: PadId,
        build_points: f64,
        cost: f64,
    ) -> EngineResult<ItemId> {
        let index = self.index_of(id)?;
        let item = self.ids.next_id();
        let complex = &mut self.facilities[index];
        let target = complex.pad_mut(pad)?;
        target.begin_rebuild()?;
        let construction = PadConstruction::new(item, pad, &target.name.clone(), build_points, cost);
        complex.add_pad_construction(construction);
        self.drain_changes(index);
        Ok(item)
    }

    pub fn demolish_pad(&mut self, id: FacilityId, pad: PadId) -> EngineResult<LaunchPad> {
        let index = self.index_of(id)?;
        let removed = self.facilities[index].demolish_pad(pad)?;
        self.drain_changes(index);
        Ok(removed)
    }

    // ==========================================
    // Queues
    // ==========================================

    /// Queue a vessel for construction
    pub fn add_build_item(&mut self, id: FacilityId, item: BuildItem) -> EngineResult<ItemId> {
        let index = self.index_of(id)?;
        let item_id = item.id;
        self.facilities[index].add_build(item);
        self.recalculate(index);
        self.drain_changes(index);
        Ok(item_id)
    }

    /// A new vessel with a fresh id, queued for construction
    pub fn queue_vessel(
        &mut self,
        id: FacilityId,
        name: &str,
        build_points: f64,
        integration_points: f64,
        mass: f64,
        human_rated: bool,
    ) -> EngineResult<ItemId> {
        let item = BuildItem::new(
            self.ids.next_id(),
            name,
            build_points,
            integration_points,
            mass,
            human_rated,
        );
        self.add_build_item(id, item)
    }

    pub fn cancel_build(&mut self, id: FacilityId, item: ItemId) -> EngineResult<BuildItem> {
        let index = self.index_of(id)?;
        let removed = self.facilities[index]
            .remove_build(item)
            .ok_or_else(|| EngineError::NotFound(format!("build item {item}")))?;
        self.drain_changes(index);
        Ok(removed)
    }

    /// Scrap a stored vessel
    pub fn scrap_vessel(&mut self, id: FacilityId, item: ItemId) -> EngineResult<BuildItem> {
        let index = self.index_of(id)?;
        let removed = self.facilities[index]
            .remove_from_warehouse(item)
            .ok_or_else(|| EngineError::NotFound(format!("stored vessel {item}")))?;
        self.drain_changes(index);
        Ok(removed)
    }

    fn stored_vessel(&self, index: usize, vessel: ItemId) -> EngineResult<BuildItem> {
        self.facilities[index]
            .warehouse()
            .iter()
            .find(|v| v.id == vessel)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("stored vessel {vessel}")))
    }

    /// Roll a stored vessel out onto a free pad
    pub fn request_rollout(
        &mut self,
        id: FacilityId,
        vessel: ItemId,
        pad: PadId,
    ) -> EngineResult<ItemId> {
        let index = self.index_of(id)?;
        let stored = self.stored_vessel(index, vessel)?;
        let item = self.ids.next_id();
        let build_points = stored.total_points() * self.settings.rollout_work_fraction;

        let complex = &mut self.facilities[index];
        let target = complex.pad_mut(pad)?;
        target.begin_rollout()?;
        let site = target.name.clone();
        complex.add_recon_rollout(ReconRollout::new(
            item,
            ReconRolloutKind::Rollout,
            &site,
            Some(vessel),
            build_points,
            stored.human_rated,
        ));
        self.recalculate(index);
        self.drain_changes(index);
        Ok(item)
    }

    /// Bring a vessel back off a pad, cancelling its rollout if still running
    pub fn request_rollback(
        &mut self,
        id: FacilityId,
        vessel: ItemId,
        pad: PadId,
    ) -> EngineResult<ItemId> {
        let index = self.index_of(id)?;
        let stored = self.stored_vessel(index, vessel)?;
        let item = self.ids.next_id();
        let build_points = stored.total_points() * self.settings.rollout_work_fraction;

        let complex = &mut self.facilities[index];
        let site = complex
            .pad(pad)
            .map(|p| p.name.clone())
            .ok_or_else(|| EngineError::NotFound(format!("pad {pad}")))?;
        let pending = complex
            .get_recon_rollout(Some(ReconRolloutKind::Rollout), &site)
            .filter(|r| r.vessel_id == Some(vessel))
            .map(|r| (r.id, r.progress));
        let progress = match pending {
            Some((rollout, progress)) => {
                complex.remove_recon_rollout(rollout);
                progress
            }
            None => {
                complex.pad_mut(pad)?.begin_rollout()?;
                0.0
            }
        };
        let mut rollback = ReconRollout::new(
            item,
            ReconRolloutKind::Rollback,
            &site,
            Some(vessel),
            build_points,
            stored.human_rated,
        );
        // Undoing a partial rollout takes as long as the part already done
        if pending.is_some() {
            rollback.progress = (build_points - progress).max(0.0);
        }
        complex.add_recon_rollout(rollback);
        self.recalculate(index);
        self.drain_changes(index);
        Ok(item)
    }

    /// Launch a stored vessel from a pad. The vessel leaves the warehouse
    /// and the pad goes into reconditioning.
    pub fn launch(&mut self, id: FacilityId, vessel: ItemId, pad: PadId) -> EngineResult<BuildItem> {
        let index = self.index_of(id)?;
        let stored = self.stored_vessel(index, vessel)?;
        let item = self.ids.next_id();
        let build_points = stored.total_points() * self.settings.reconditioning_work_fraction;

        let complex = &mut self.facilities[index];
        let target = complex.pad_mut(pad)?;
        if !target.is_operational() {
            return Err(EngineError::InvalidPadTransition {
                from: target.state(),
                action: "launch",
            });
        }
        target.begin_reconditioning()?;
        let site = target.name.clone();

        let pending: Vec<ItemId> = complex
            .recon_rollout()
            .iter()
            .filter(|r| r.launch_site == site && r.kind == ReconRolloutKind::Rollout)
            .map(|r| r.id)
            .collect();
        for rollout in pending {
            complex.remove_recon_rollout(rollout);
        }

        let launched = complex
            .remove_from_warehouse(vessel)
            .ok_or_else(|| EngineError::NotFound(format!("stored vessel {vessel}")))?;
        complex.add_recon_rollout(ReconRollout::new(
            item,
            ReconRolloutKind::Reconditioning,
            &site,
            None,
            build_points,
            false,
        ));
        tracing::info!(facility = %id, vessel = %launched.name, site = %site, "vessel launched");
        self.recalculate(index);
        self.drain_changes(index);
        Ok(launched)
    }

    /// Mount a stored vessel on its carrier, or take it off again
    pub fn request_airlaunch_prep(
        &mut self,
        id: FacilityId,
        vessel: ItemId,
        direction: AirlaunchDirection,
    ) -> EngineResult<ItemId> {
        let index = self.index_of(id)?;
        let stored = self.stored_vessel(index, vessel)?;
        let item = self.ids.next_id();
        let build_points = stored.total_points() * self.settings.airlaunch_work_fraction;
        self.facilities[index].add_airlaunch_prep(AirlaunchPrep::new(
            item,
            direction,
            vessel,
            build_points,
            stored.human_rated,
        ));
        self.recalculate(index);
        self.drain_changes(index);
        Ok(item)
    }

    // ==========================================
    // Strategy effects
    // ==========================================

    pub fn apply_effect(&mut self, effect: Effect) -> EffectId {
        let id = self.effects.apply(effect);
        self.recalculate_all_rates();
        id
    }

    pub fn unapply_effect(&mut self, id: EffectId) -> Option<Effect> {
        let removed = self.effects.unapply(id);
        if removed.is_some() {
            self.recalculate_all_rates();
        }
        removed
    }

    // ==========================================
    // Rates and time
    // ==========================================

    fn recalculate(&mut self, index: usize) {
        let efficiency = facility_efficiency(&self.efficiency, self.facilities.get(index));
        if let Some(complex) = self.facilities.get_mut(index) {
            complex.recalculate_rates(
                &self.settings,
                efficiency,
                &self.effects,
                self.rate_model.as_ref(),
            );
        }
    }

    /// Recompute the complex and everything sharing its pool
    fn recalculate_pool_members(&mut self, id: FacilityId) {
        let mut members: Vec<FacilityId> = self
            .efficiency
            .pool_for(id)
            .map(|p| p.members().collect())
            .unwrap_or_default();
        if !members.contains(&id) {
            members.push(id);
        }
        for member in members {
            if let Ok(index) = self.index_of(member) {
                self.recalculate(index);
            }
        }
    }

    pub fn recalculate_all_rates(&mut self) {
        for index in 0..self.facilities.len() {
            self.recalculate(index);
        }
    }

    /// Advance every complex by `days`.
    ///
    /// Rates are recomputed first, each complex progresses its queues,
    /// pad constructions progress center-wide, then efficiency grows and
    /// rates are recomputed against it.
    pub fn advance(&mut self, days: f64) -> Vec<EngineEvent> {
        if days <= 0.0 {
            return Vec::new();
        }
        self.recalculate_all_rates();

        let mut events = Vec::new();
        for complex in &mut self.facilities {
            events.extend(complex.advance(days));
        }
        self.progress_constructions(days, &mut events);
        self.accumulate_efficiency(days, &mut events);
        self.recalculate_all_rates();

        for index in 0..self.facilities.len() {
            self.drain_changes(index);
        }
        events
    }

    /// FIFO over the center-wide list at the center construction rate
    fn progress_constructions(&mut self, days: f64, events: &mut Vec<EngineEvent>) {
        let mut budget = self.settings.pad_construction_rate * days;
        let mut finished = Vec::new();
        let mut dangling = Vec::new();

        for entry in &self.constructions {
            if budget <= 0.0 {
                break;
            }
            let construction = self
                .facilities
                .iter_mut()
                .find(|f| f.id() == entry.facility)
                .and_then(|f| f.pad_construction_mut(entry.item));
            let Some(construction) = construction else {
                dangling.push(*entry);
                continue;
            };
            let work = construction.remaining().min(budget);
            construction.progress += work;
            budget -= work;
            if construction.is_complete() {
                finished.push(*entry);
            }
        }

        for entry in dangling {
            tracing::warn!(facility = %entry.facility, item = %entry.item, "pad construction has no owner");
            self.constructions.retain(|c| *c != entry);
        }
        for entry in finished {
            self.complete_construction(entry, events);
        }
    }

    fn complete_construction(&mut self, entry: ConstructionRef, events: &mut Vec<EngineEvent>) {
        let Ok(index) = self.index_of(entry.facility) else {
            return;
        };
        let complex = &mut self.facilities[index];
        let Some(construction) = complex.remove_pad_construction(entry.item) else {
            return;
        };
        match complex.pad_mut(construction.pad_id) {
            Ok(pad) => {
                if let Err(e) = pad.complete_construction() {
                    tracing::warn!(pad = %construction.name, error = %e, "construction finished on a pad in the wrong state");
                }
            }
            Err(e) => {
                tracing::warn!(pad = %construction.name, error = %e, "construction finished for a missing pad");
            }
        }
        complex.ensure_active_pad();
        tracing::info!(facility = %entry.facility, pad = %construction.name, "pad construction completed");
        events.push(EngineEvent::PadConstructionCompleted {
            facility: entry.facility,
            pad: construction.pad_id,
            name: construction.name,
        });
        self.drain_changes(index);
    }

    /// Busy, operational pad complexes grow their pool towards the maximum
    fn accumulate_efficiency(&mut self, days: f64, events: &mut Vec<EngineEvent>) {
        let max = self.efficiency.max_efficiency();
        for complex in &self.facilities {
            if !complex.is_pad() || !complex.is_operational() || !complex.is_active() {
                continue;
            }
            let Some(pool) = self.efficiency.pool_for(complex.id()) else {
                continue;
            };
            let cap = complex.max_workforce(&self.settings);
            let utilisation = complex.workforce() as f64 / cap.max(1) as f64;
            let delta =
                self.settings.efficiency_gain_per_day * days * (max - pool.efficiency()) * utilisation;
            if delta <= 0.0 {
                continue;
            }
            let pool_id = pool.id;
            if let Some(efficiency) = self.efficiency.increase_efficiency(pool_id, delta, false) {
                events.push(EngineEvent::EfficiencyIncreased {
                    pool: pool_id,
                    efficiency,
                });
            }
        }
    }

    /// Mirror pad constructions and notify upkeep accounting
    fn drain_changes(&mut self, index: usize) {
        let Some(complex) = self.facilities.get_mut(index) else {
            return;
        };
        let facility = complex.id();
        let changes = complex.take_changes();
        if changes.is_empty() {
            return;
        }
        for change in changes {
            if let FacilityChange::Queue {
                queue: QueueKind::PadConstructions,
                item,
                added,
            } = change
            {
                let entry = ConstructionRef { facility, item };
                if added {
                    self.constructions.push(entry);
                } else {
                    self.constructions.retain(|c| *c != entry);
                }
            }
        }
        self.maintenance.schedule_recalculation(facility);
    }
}

/// Efficiency a complex works at
fn facility_efficiency(registry: &EfficiencyRegistry, complex: Option<&LaunchComplex>) -> f64 {
    match complex {
        Some(c) if c.category() == FacilityCategory::Pad => registry
            .efficiency_for(c.id())
            .unwrap_or(registry.min_efficiency()),
        _ => registry.max_efficiency(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Size3;
    use crate::ids::SeededIds;
    use crate::launch_pad::PadState;
    use crate::strategy::TransactionReason;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder(Rc<RefCell<Vec<FacilityId>>>);

    impl MaintenanceScheduler for Recorder {
        fn schedule_recalculation(&mut self, facility: FacilityId) {
            self.0.borrow_mut().push(facility);
        }
    }

    fn center(seed: u64) -> SpaceCenter {
        SpaceCenter::new(EngineSettings::default()).with_ids(Box::new(SeededIds::new(seed)))
    }

    fn pad(name: &str, mass: f64) -> FacilityDescriptor {
        FacilityDescriptor::new(
            name,
            FacilityCategory::Pad,
            Some(mass),
            Size3::new(10.0, 40.0, 10.0),
            false,
        )
    }

    #[test]
    fn test_starting_hangar_bootstrap() {
        let sc = center(1);
        assert_eq!(sc.facilities().len(), 1);
        let hangar = sc.starting_hangar().unwrap();
        assert!(hangar.is_empty());
        assert_eq!(sc.efficiency_of(hangar.id()), 1.0);
        assert!(sc.efficiency().pools().is_empty());
    }

    #[test]
    fn test_starting_hangar_not_removable() {
        let mut sc = center(2);
        let hangar = sc.facilities()[0].id();
        assert!(matches!(sc.remove_facility(hangar), Err(EngineError::NotRemovable(_))));
    }

    #[test]
    fn test_commission_joins_pool() {
        let mut sc = center(3);
        let a = sc.commission_facility(pad("LC-1", 50.0));
        let b = sc.commission_facility(pad("LC-2", 55.0));
        assert_eq!(sc.efficiency().pools().len(), 1);
        assert_eq!(sc.efficiency().pool_for(a).map(|p| p.id), sc.efficiency().pool_for(b).map(|p| p.id));
        assert_eq!(sc.efficiency_of(a), sc.settings().min_efficiency);
    }

    #[test]
    fn test_removal_cleans_pool() {
        let mut sc = center(4);
        let a = sc.commission_facility(pad("LC-1", 60.0));
        let b = sc.commission_facility(pad("LC-2", 60.0));
        sc.remove_facility(a).unwrap();
        assert_eq!(sc.efficiency().pools()[0].member_count(), 1);
        sc.remove_facility(b).unwrap();
        assert!(sc.efficiency().pools().is_empty());
    }

    #[test]
    fn test_busy_facility_not_removable() {
        let mut sc = center(5);
        let a = sc.commission_facility(pad("LC-1", 60.0));
        sc.set_workforce(a, 10).unwrap();
        assert!(sc.remove_facility(a).is_err());
        sc.set_workforce(a, 0).unwrap();
        let item = sc.queue_vessel(a, "V", 100.0, 0.0, 10.0, false).unwrap();
        assert!(sc.remove_facility(a).is_err());
        sc.cancel_build(a, item).unwrap();
        assert!(sc.remove_facility(a).is_ok());
    }

    #[test]
    fn test_maintenance_notified() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sc = center(6).with_maintenance(Box::new(Recorder(log.clone())));
        let a = sc.commission_facility(pad("LC-1", 60.0));
        sc.queue_vessel(a, "V", 100.0, 0.0, 10.0, false).unwrap();
        assert_eq!(log.borrow().as_slice(), &[a, a]);
    }

    #[test]
    fn test_rush_cost_multiplier() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sc = center(16).with_maintenance(Box::new(Recorder(log.clone())));
        let a = sc.commission_facility(pad("LC-1", 60.0));
        assert_eq!(sc.cost_multiplier(a), Some(1.0));
        let before = log.borrow().len();
        sc.set_rushing(a, true).unwrap();
        assert_eq!(log.borrow().len(), before + 1);
        assert_eq!(sc.cost_multiplier(a), Some(sc.settings().rush_cost_multiplier));
        assert_eq!(sc.cost_multiplier(uuid::Uuid::nil()), None);
    }

    #[test]
    fn test_pad_construction_mirrored_and_completed() {
        let mut sc = center(7);
        let a = sc.commission_facility(pad("LC-1", 60.0));
        let new_pad = sc.queue_pad_construction(a, "LC-1 B", 100.0, 5000.0).unwrap();
        assert_eq!(sc.constructions().len(), 1);
        assert_eq!(
            sc.facility(a).unwrap().pad(new_pad).map(|p| p.state()),
            Some(PadState::UnderConstruction)
        );

        // 50 points per day
        let events = sc.advance(1.0);
        assert!(events.is_empty());
        let events = sc.advance(1.0);
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::PadConstructionCompleted { pad, .. } if *pad == new_pad)));
        assert!(sc.constructions().is_empty());
        assert_eq!(sc.facility(a).unwrap().pad(new_pad).map(|p| p.state()), Some(PadState::Free));
    }

    #[test]
    fn test_destroy_drops_unfinished_construction() {
        let mut sc = center(17);
        let a = sc.commission_facility(pad("LC-1", 60.0));
        let new_pad = sc.queue_pad_construction(a, "LC-1 B", 100.0, 500.0).unwrap();
        sc.destroy_pad(a, new_pad).unwrap();
        assert!(sc.constructions().is_empty());
        assert!(sc.facility(a).unwrap().pad_constructions().is_empty());

        sc.rebuild_pad(a, new_pad, 10000.0, 5000.0).unwrap();
        assert_eq!(sc.constructions().len(), 1);
        sc.advance(2.0);
        assert_eq!(
            sc.facility(a).unwrap().pad(new_pad).map(|p| p.state()),
            Some(PadState::UnderConstruction)
        );
    }

    #[test]
    fn test_launch_and_recondition() {
        let mut sc = center(8);
        let a = sc.commission_facility(pad("LC-1", 60.0));
        sc.set_workforce(a, 20).unwrap();
        let vessel = sc.queue_vessel(a, "Probe", 40.0, 0.0, 10.0, false).unwrap();
        sc.advance(10.0);
        assert_eq!(sc.facility(a).unwrap().warehouse().len(), 1);

        let pad_id = sc.facility(a).unwrap().launch_pads()[0].id;
        sc.request_rollout(a, vessel, pad_id).unwrap();
        assert_eq!(sc.facility(a).unwrap().best_state(), Some(PadState::Busy));

        let launched = sc.launch(a, vessel, pad_id).unwrap();
        assert_eq!(launched.name, "Probe");
        let lc = sc.facility(a).unwrap();
        assert!(lc.warehouse().is_empty());
        assert_eq!(lc.recon_rollout().len(), 1);
        assert_eq!(lc.recon_rollout()[0].kind, ReconRolloutKind::Reconditioning);
        assert_eq!(lc.best_state(), Some(PadState::Reconditioning));

        sc.advance(10.0);
        assert_eq!(sc.facility(a).unwrap().best_state(), Some(PadState::Free));
    }

    #[test]
    fn test_strategy_effect_changes_rate() {
        let mut sc = center(9);
        let a = sc.commission_facility(pad("LC-1", 60.0));
        sc.set_workforce(a, 20).unwrap();
        let base = sc.facility(a).unwrap().rate();
        let effect = sc.apply_effect(Effect::CurrencyModifier {
            currency: crate::strategy::Currency::Rate,
            reasons: vec![TransactionReason::RateIntegrationPad],
            multiplier: 1.25,
            invert_if_negative: false,
            flip_positive: false,
        });
        assert!((sc.facility(a).unwrap().rate() - base * 1.25).abs() < 1e-9);
        sc.unapply_effect(effect);
        assert!((sc.facility(a).unwrap().rate() - base).abs() < 1e-9);
    }

    #[test]
    fn test_efficiency_grows_while_busy() {
        let mut sc = center(10);
        let a = sc.commission_facility(pad("LC-1", 60.0));
        let cap = sc.facility(a).unwrap().max_workforce(sc.settings());
        sc.set_workforce(a, cap).unwrap();
        sc.queue_vessel(a, "Big", 1e9, 0.0, 10.0, false).unwrap();
        let before = sc.efficiency_of(a);
        let rate_before = sc.facility(a).unwrap().rate();
        sc.advance(30.0);
        let after = sc.efficiency_of(a);
        assert!(after > before);
        assert!(after <= sc.settings().max_efficiency);
        assert!(sc.facility(a).unwrap().rate() > rate_before);
    }

    #[test]
    fn test_modify_moves_pool() {
        let mut sc = center(11);
        let a = sc.commission_facility(pad("LC-1", 60.0));
        let b = sc.commission_facility(pad("LC-2", 60.0));
        sc.modify_facility(b, pad("LC-2", 1000.0)).unwrap();
        assert_eq!(sc.efficiency().pools().len(), 2);
        assert_ne!(
            sc.efficiency().pool_for(a).map(|p| p.id),
            sc.efficiency().pool_for(b).map(|p| p.id)
        );
        assert!(sc.efficiency().bindings_consistent());
    }

    #[test]
    fn test_plans_last_write_wins() {
        let mut sc = center(12);
        sc.save_plan(BuildItem::new(uuid::Uuid::from_u128(1), "Plan", 10.0, 0.0, 1.0, false));
        sc.save_plan(BuildItem::new(uuid::Uuid::from_u128(2), "Plan", 20.0, 0.0, 1.0, false));
        assert_eq!(sc.plans().len(), 1);
        assert_eq!(sc.plans()["Plan"].build_points, 20.0);
        assert!(sc.remove_plan("Plan").is_some());
    }
}
