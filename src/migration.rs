//! Save migrations.
//!
//! Each step names the save version that introduced it. A save written at
//! version `v` runs every step with `step.version > v`, in ascending order,
//! exactly once per load. Steps only read legacy fields they then clear, so
//! running a step twice changes nothing the second time.

use serde_json::Value;

use crate::build_item::BuildItem;
use crate::descriptor::{FacilityCategory, FacilityDescriptor, Size3};
use crate::ids::IdSource;
use crate::launch_complex::LaunchComplex;
use crate::space_center::SpaceCenter;

/// Current save version
pub const SAVE_VERSION: u32 = 13;

/// Fields old saves stored outside today's layout, one per loaded facility
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyFields {
    /// Per-facility efficiency from before pools existed
    pub efficiency: Option<f64>,
    /// Flat descriptor fields from before the `Stats` block
    pub category: Option<FacilityCategory>,
    pub mass_max: Option<f64>,
    pub mass_orig: Option<f64>,
    pub size_max: Option<Size3>,
    pub human_rated: Option<bool>,
    /// Vessel plans once stored per facility
    pub plans: Vec<Value>,
}

/// State a migration step works on
pub struct MigrationContext<'a> {
    pub center: &'a mut SpaceCenter,
    /// Parallel to `center.facilities()`
    pub legacy: &'a mut [LegacyFields],
}

/// One ordered, idempotent upgrade
pub struct MigrationStep {
    pub version: u32,
    pub name: &'static str,
    pub apply: fn(&mut MigrationContext<'_>),
}

/// Every step, ascending by version
pub const MIGRATIONS: &[MigrationStep] = &[
    MigrationStep {
        version: 1,
        name: "double workforce",
        apply: double_workforce,
    },
    MigrationStep {
        version: 6,
        name: "legacy efficiency into pools",
        apply: legacy_efficiency,
    },
    MigrationStep {
        version: 7,
        name: "flat descriptor fields",
        apply: flat_descriptor,
    },
    MigrationStep {
        version: 8,
        name: "nil identities and starting hangar",
        apply: nil_ids_and_starting_hangar,
    },
    MigrationStep {
        version: 12,
        name: "descriptor name",
        apply: descriptor_name,
    },
    MigrationStep {
        version: 13,
        name: "legacy plans",
        apply: legacy_plans,
    },
];

/// Run every step newer than `saved_version`. Returns how many ran.
pub fn run(saved_version: u32, ctx: &mut MigrationContext<'_>) -> usize {
    let mut ran = 0;
    for step in MIGRATIONS.iter().filter(|s| saved_version < s.version) {
        tracing::info!(version = step.version, step = step.name, "running save migration");
        (step.apply)(ctx);
        ran += 1;
    }
    ran
}

fn double_workforce(ctx: &mut MigrationContext<'_>) {
    for complex in &mut ctx.center.facilities {
        complex.workforce = complex.workforce.saturating_mul(2);
    }
}

/// Give a facility saved without an id a fresh one and point its vessels at it
fn assign_missing_id(complex: &mut LaunchComplex, ids: &mut dyn IdSource) {
    if !complex.id.is_nil() {
        return;
    }
    complex.id = ids.next_id();
    tracing::info!(facility = %complex.id, name = %complex.name, "assigned missing facility id");
    let id = complex.id;
    for item in complex.build_list.iter_mut().chain(complex.warehouse.iter_mut()) {
        item.link_to_facility(id);
    }
}

/// A legacy per-facility efficiency raises the pool the facility belongs
/// to, else the first exact-match pool, else a new pool. The first match
/// wins when several pools qualify.
fn legacy_efficiency(ctx: &mut MigrationContext<'_>) {
    let center = &mut *ctx.center;
    for (complex, legacy) in center.facilities.iter_mut().zip(ctx.legacy.iter_mut()) {
        if !complex.is_pad() {
            continue;
        }
        let Some(value) = legacy.efficiency.take() else {
            continue;
        };
        // Pools are keyed by facility id, so the nil id must not be bound
        assign_missing_id(complex, center.ids.as_mut());

        let registry = &mut center.efficiency;
        let bound = registry.pool_for(complex.id).map(|p| p.id);
        let exact = registry
            .find_closest(&complex.descriptor)
            .filter(|(_, closeness)| *closeness == 1.0)
            .map(|(pool, _)| pool);
        let pool = if bound.is_some() {
            bound
        } else if exact.is_some() {
            exact
        } else {
            registry.get_or_create(complex.id, &complex.descriptor, true, center.ids.as_mut())
        };
        let Some(pool) = pool else {
            continue;
        };
        if registry.get(pool).is_some_and(|p| p.efficiency() < value) {
            registry.reset_efficiency(pool, value);
        }
    }
}

/// Unlimited mass used to be written as a huge or negative number
fn legacy_mass(mass: f64) -> Option<f64> {
    (mass.is_finite() && mass > 0.0 && mass < 1e30).then_some(mass)
}

/// Descriptor for a record saved before the `Stats` block existed. The
/// category defaults to Pad.
pub(crate) fn flat_layout_descriptor(name: &str, legacy: &LegacyFields) -> FacilityDescriptor {
    let mut d = FacilityDescriptor::new(
        name,
        FacilityCategory::Pad,
        legacy.mass_max.and_then(legacy_mass),
        legacy.size_max.unwrap_or_default(),
        legacy.human_rated.unwrap_or(false),
    );
    apply_flat_fields(&mut d, legacy);
    d
}

fn apply_flat_fields(d: &mut FacilityDescriptor, legacy: &LegacyFields) {
    if let Some(category) = legacy.category {
        d.category = category;
    }
    if let Some(mass) = legacy.mass_max {
        d.mass_max = legacy_mass(mass);
    }
    if let Some(mass) = legacy.mass_orig {
        d.mass_orig = legacy_mass(mass);
    }
    if let Some(size) = legacy.size_max {
        d.size_max = size;
    }
    if let Some(rated) = legacy.human_rated {
        d.human_rated = rated;
    }
}

fn flat_descriptor(ctx: &mut MigrationContext<'_>) {
    for (complex, legacy) in ctx.center.facilities.iter_mut().zip(ctx.legacy.iter_mut()) {
        apply_flat_fields(&mut complex.descriptor, legacy);
        legacy.category = None;
        legacy.mass_max = None;
        legacy.mass_orig = None;
        legacy.size_max = None;
        legacy.human_rated = None;
        if complex.descriptor.is_pad() {
            let level = complex.descriptor.pad_fractional_level();
            for pad in &mut complex.launch_pads {
                if pad.fractional_level < 0.0 {
                    pad.set_level(level);
                }
            }
        }
    }
}

fn nil_ids_and_starting_hangar(ctx: &mut MigrationContext<'_>) {
    let center = &mut *ctx.center;
    for complex in &mut center.facilities {
        assign_missing_id(complex, center.ids.as_mut());
        if complex.mod_id.is_nil() {
            complex.mod_id = center.ids.next_id();
        }
    }

    let Some(first) = center.facilities.first_mut() else {
        return;
    };
    let d = &first.descriptor;
    if d.category != FacilityCategory::Hangar || d.mass_max.is_some() {
        tracing::warn!(facility = %first.id, "first facility is not the starting hangar, resetting it");
        let mut hangar = FacilityDescriptor::starting_hangar();
        hangar.name = first.name.clone();
        first.descriptor = hangar;
        first.launch_pads.clear();
        first.recon_rollout.clear();
        first.active_pad_index = 0;
        let id = first.id;
        center.efficiency.remove_facility(id);
    }
}

fn descriptor_name(ctx: &mut MigrationContext<'_>) {
    for complex in &mut ctx.center.facilities {
        complex.descriptor.name = complex.name.clone();
    }
}

/// Plans move to the center-wide table by vessel name; later entries
/// replace earlier ones
fn legacy_plans(ctx: &mut MigrationContext<'_>) {
    for legacy in ctx.legacy.iter_mut() {
        for value in std::mem::take(&mut legacy.plans) {
            match serde_json::from_value::<BuildItem>(value) {
                Ok(mut plan) => {
                    plan.facility_id = None;
                    ctx.center.plans.remove(&plan.name);
                    ctx.center.plans.insert(plan.name.clone(), plan);
                }
                Err(e) => tracing::warn!(error = %e, "skipping unreadable legacy plan"),
            }
        }
    }
}
