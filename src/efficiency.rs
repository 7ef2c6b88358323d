/// Shared efficiency pools.
///
/// Launch complexes with matching descriptors share one growing efficiency
/// value. The registry is the only owner of pools and of facility-to-pool
/// bindings; facilities look their pool up by id instead of holding a
/// reference, so a facility can never point at a pool it is not a member of.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::EngineSettings;
use crate::descriptor::FacilityDescriptor;
use crate::ids::{FacilityId, IdSource, PoolId};

/// One shared efficiency value and the facilities drawing on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyPool {
    pub id: PoolId,
    efficiency: f64,
    /// Descriptor of the facility that created the pool
    pub reference: FacilityDescriptor,
    members: BTreeSet<FacilityId>,
}

impl EfficiencyPool {
    pub fn new(id: PoolId, efficiency: f64, reference: FacilityDescriptor) -> Self {
        Self {
            id,
            efficiency,
            reference,
            members: BTreeSet::new(),
        }
    }

    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    pub fn contains(&self, facility: FacilityId) -> bool {
        self.members.contains(&facility)
    }

    pub fn members(&self) -> impl Iterator<Item = FacilityId> + '_ {
        self.members.iter().copied()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Add `delta` (negative deltas are ignored), clamped to `max` unless overcap is allowed
    fn increase(&mut self, delta: f64, max: f64, allow_overcap: bool) -> f64 {
        if delta > 0.0 {
            self.efficiency += delta;
            if !allow_overcap && self.efficiency > max {
                self.efficiency = max;
            }
        }
        self.efficiency
    }
}

/// Index of every pool, keyed by facility binding
#[derive(Debug, Clone)]
pub struct EfficiencyRegistry {
    pools: Vec<EfficiencyPool>,
    bindings: HashMap<FacilityId, PoolId>,
    min_efficiency: f64,
    max_efficiency: f64,
}

impl EfficiencyRegistry {
    pub fn new(min_efficiency: f64, max_efficiency: f64) -> Self {
        Self {
            pools: Vec::new(),
            bindings: HashMap::new(),
            min_efficiency,
            max_efficiency,
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(settings.min_efficiency, settings.max_efficiency)
    }

    pub fn min_efficiency(&self) -> f64 {
        self.min_efficiency
    }

    pub fn max_efficiency(&self) -> f64 {
        self.max_efficiency
    }

    /// All pools in creation order
    pub fn pools(&self) -> &[EfficiencyPool] {
        &self.pools
    }

    pub fn get(&self, pool: PoolId) -> Option<&EfficiencyPool> {
        self.pools.iter().find(|p| p.id == pool)
    }

    /// Pool the facility is bound to, if any
    pub fn pool_for(&self, facility: FacilityId) -> Option<&EfficiencyPool> {
        self.bindings.get(&facility).and_then(|id| self.get(*id))
    }

    pub fn efficiency_for(&self, facility: FacilityId) -> Option<f64> {
        self.pool_for(facility).map(|p| p.efficiency)
    }

    /// Closest pool to a descriptor and its closeness.
    /// Ties keep the earliest pool.
    pub fn find_closest(&self, descriptor: &FacilityDescriptor) -> Option<(PoolId, f64)> {
        let mut best: Option<(PoolId, f64)> = None;
        for pool in &self.pools {
            let closeness = pool.reference.closeness(descriptor);
            if best.map_or(true, |(_, c)| closeness > c) {
                best = Some((pool.id, closeness));
            }
        }
        best
    }

    /// Current pool of the facility, else the first exact match, else a new
    /// pool when `allow_create`. `None` means efficiency is not available yet.
    pub fn get_or_create(
        &mut self,
        facility: FacilityId,
        descriptor: &FacilityDescriptor,
        allow_create: bool,
        ids: &mut dyn IdSource,
    ) -> Option<PoolId> {
        if let Some(pool) = self.bindings.get(&facility) {
            return Some(*pool);
        }

        if let Some((pool, closeness)) = self.find_closest(descriptor) {
            if closeness == 1.0 {
                self.bind(facility, pool);
                return Some(pool);
            }
        }

        if !allow_create {
            return None;
        }
        let pool = self.create_pool(descriptor, self.min_efficiency, ids);
        self.bind(facility, pool);
        Some(pool)
    }

    /// Move a facility whose descriptor changed to the pool matching its new
    /// descriptor. The old pool is deleted in the same step if left empty.
    ///
    /// A pool created for the move starts from the old pool's efficiency,
    /// scaled by how close the old reference is to the new descriptor.
    pub fn rebind(
        &mut self,
        facility: FacilityId,
        descriptor: &FacilityDescriptor,
        ids: &mut dyn IdSource,
    ) -> Option<PoolId> {
        let old = self.unbind(facility);
        let carried = old.and_then(|pool| self.get(pool)).map(|pool| {
            let closeness = pool.reference.closeness(descriptor);
            self.min_efficiency + (pool.efficiency - self.min_efficiency).max(0.0) * closeness
        });

        let pool_count = self.pools.len();
        let new = self.get_or_create(facility, descriptor, true, ids);
        if self.pools.len() > pool_count {
            if let (Some(new), Some(start)) = (new, carried) {
                if let Some(pool) = self.pools.iter_mut().find(|p| p.id == new) {
                    pool.efficiency = start.max(self.min_efficiency);
                }
            }
        }

        if let Some(old) = old {
            self.remove_if_empty(old);
        }
        self.check_bindings();
        new
    }

    /// Detach a facility and delete its pool if that was the last member.
    /// Returns true if the facility was bound.
    pub fn remove_facility(&mut self, facility: FacilityId) -> bool {
        match self.unbind(facility) {
            Some(pool) => {
                self.remove_if_empty(pool);
                self.check_bindings();
                true
            }
            None => {
                self.clear_empty();
                false
            }
        }
    }

    /// Unbind every facility `keep` rejects. Pools left empty stay until
    /// [`clear_empty`](Self::clear_empty).
    pub fn retain_facilities(&mut self, keep: impl Fn(FacilityId) -> bool) {
        let dropped: Vec<FacilityId> = self.bindings.keys().copied().filter(|f| !keep(*f)).collect();
        for facility in dropped {
            tracing::warn!(%facility, "efficiency pool member is not a live facility, unbinding");
            self.unbind(facility);
        }
        for pool in &mut self.pools {
            pool.members.retain(|f| keep(*f));
        }
        self.check_bindings();
    }

    /// Delete every pool without members
    pub fn clear_empty(&mut self) {
        let before = self.pools.len();
        self.pools.retain(|p| !p.is_empty());
        if self.pools.len() != before {
            tracing::debug!(removed = before - self.pools.len(), "cleared empty efficiency pools");
        }
    }

    /// Add to a pool's efficiency. Returns the new value.
    pub fn increase_efficiency(
        &mut self,
        pool: PoolId,
        delta: f64,
        allow_overcap: bool,
    ) -> Option<f64> {
        let max = self.max_efficiency;
        self.pools
            .iter_mut()
            .find(|p| p.id == pool)
            .map(|p| p.increase(delta, max, allow_overcap))
    }

    /// Explicit reset, the only way efficiency goes down
    pub fn reset_efficiency(&mut self, pool: PoolId, value: f64) -> Option<f64> {
        let (min, max) = (self.min_efficiency, self.max_efficiency);
        self.pools.iter_mut().find(|p| p.id == pool).map(|p| {
            p.efficiency = value.clamp(min, max);
            p.efficiency
        })
    }

    /// Rebuild from saved pools. A facility listed in several pools stays in
    /// the first one; empty pools are dropped.
    pub fn restore(&mut self, pools: Vec<EfficiencyPool>) {
        self.pools.clear();
        self.bindings.clear();
        for mut pool in pools {
            let duplicates: Vec<FacilityId> = pool
                .members
                .iter()
                .copied()
                .filter(|f| self.bindings.contains_key(f))
                .collect();
            for facility in duplicates {
                tracing::warn!(%facility, pool = %pool.id, "facility listed in several efficiency pools");
                pool.members.remove(&facility);
            }
            for facility in &pool.members {
                self.bindings.insert(*facility, pool.id);
            }
            self.pools.push(pool);
        }
        self.clear_empty();
    }

    fn create_pool(
        &mut self,
        descriptor: &FacilityDescriptor,
        efficiency: f64,
        ids: &mut dyn IdSource,
    ) -> PoolId {
        let id = ids.next_id();
        tracing::debug!(pool = %id, name = %descriptor.name, "created efficiency pool");
        self.pools.push(EfficiencyPool::new(id, efficiency, descriptor.clone()));
        id
    }

    fn bind(&mut self, facility: FacilityId, pool: PoolId) {
        if let Some(p) = self.pools.iter_mut().find(|p| p.id == pool) {
            p.members.insert(facility);
            self.bindings.insert(facility, pool);
        }
    }

    fn unbind(&mut self, facility: FacilityId) -> Option<PoolId> {
        let pool = self.bindings.remove(&facility)?;
        if let Some(p) = self.pools.iter_mut().find(|p| p.id == pool) {
            p.members.remove(&facility);
        }
        Some(pool)
    }

    fn remove_if_empty(&mut self, pool: PoolId) {
        if let Some(pos) = self.pools.iter().position(|p| p.id == pool && p.is_empty()) {
            self.pools.remove(pos);
            tracing::debug!(%pool, "removed empty efficiency pool");
        }
    }

    /// Every binding must point at a pool listing the facility, and every
    /// member must be bound to the pool listing it.
    pub fn bindings_consistent(&self) -> bool {
        let bound_ok = self
            .bindings
            .iter()
            .all(|(f, p)| self.get(*p).is_some_and(|pool| pool.contains(*f)));
        let members_ok = self
            .pools
            .iter()
            .all(|pool| pool.members().all(|f| self.bindings.get(&f) == Some(&pool.id)));
        bound_ok && members_ok
    }

    fn check_bindings(&self) {
        if !self.bindings_consistent() {
            tracing::warn!("efficiency pool membership out of sync with bindings");
        }
    }
}

impl Default for EfficiencyRegistry {
    fn default() -> Self {
        Self::from_settings(&EngineSettings::default())
    }
}
