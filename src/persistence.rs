//! Save and load.
//!
//! A save is one JSON document: the version it was written at, the
//! efficiency pools, one record per launch complex and the plan table.
//! Loading is tolerant: an unreadable item or facility is skipped with a
//! warning, and only a document that is not valid JSON fails.

use std::collections::{BTreeMap, BTreeSet};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::build_item::BuildItem;
use crate::config::EngineSettings;
use crate::descriptor::{FacilityCategory, FacilityDescriptor, Size3};
use crate::efficiency::EfficiencyPool;
use crate::error::{EngineError, EngineResult};
use crate::ids::{FacilityId, IdSource, PadId};
use crate::launch_complex::LaunchComplex;
use crate::launch_pad::{LaunchPad, PadState};
use crate::migration::{self, LegacyFields, MigrationContext, SAVE_VERSION};
use crate::operations::{AirlaunchPrep, PadConstruction, ReconRollout};
use crate::space_center::{ConstructionRef, SpaceCenter};

// ==========================================
// Records
// ==========================================

/// Whole save document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveFile {
    #[serde(rename = "saveVersion", default)]
    pub version: u32,
    #[serde(rename = "EfficiencyPools", default)]
    pub pools: Vec<Value>,
    #[serde(rename = "LaunchComplexes", default)]
    pub facilities: Vec<Value>,
    #[serde(rename = "Plans", default)]
    pub plans: BTreeMap<String, Value>,
}

fn operational_default() -> bool {
    true
}

fn unset_level() -> f64 {
    -1.0
}

/// One launch complex as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityRecord {
    #[serde(rename = "LCName", default)]
    pub name: String,
    #[serde(rename = "ActiveLPID", default)]
    pub active_pad_index: usize,
    #[serde(default = "operational_default")]
    pub operational: bool,
    /// Nil when the save predates facility ids
    #[serde(default)]
    pub id: Uuid,
    #[serde(rename = "modID", default)]
    pub mod_id: Uuid,
    #[serde(rename = "Engineers", default)]
    pub workforce: u32,
    #[serde(rename = "IsRushing", default)]
    pub is_rushing: bool,
    #[serde(rename = "Stats", default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<FacilityDescriptor>,
    #[serde(rename = "BuildList", default)]
    pub build_list: Vec<Value>,
    #[serde(rename = "Warehouse", default)]
    pub warehouse: Vec<Value>,
    #[serde(rename = "PadConstructions", default)]
    pub pad_constructions: Vec<Value>,
    #[serde(rename = "Recon_Rollout", default)]
    pub recon_rollout: Vec<Value>,
    #[serde(rename = "Airlaunch_Prep", default)]
    pub airlaunch_prep: Vec<Value>,
    #[serde(rename = "LaunchPads", default)]
    pub launch_pads: Vec<Value>,

    // Legacy layout, read only
    #[serde(rename = "EfficiencyEngineers", default, skip_serializing)]
    pub legacy_efficiency: Option<f64>,
    #[serde(rename = "lcType", default, skip_serializing)]
    pub legacy_category: Option<FacilityCategory>,
    #[serde(rename = "massMax", default, skip_serializing)]
    pub legacy_mass_max: Option<f64>,
    #[serde(rename = "massOrig", default, skip_serializing)]
    pub legacy_mass_orig: Option<f64>,
    #[serde(rename = "sizeMax", default, skip_serializing)]
    pub legacy_size_max: Option<Size3>,
    #[serde(rename = "IsHumanRated", default, skip_serializing)]
    pub legacy_human_rated: Option<bool>,
    #[serde(rename = "Plans", default, skip_serializing)]
    pub legacy_plans: Vec<Value>,
}

/// One pad as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PadRecord {
    #[serde(default)]
    pub id: PadId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub level: i32,
    #[serde(rename = "fractionalLevel", default = "unset_level")]
    pub fractional_level: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<PadState>,
    /// Older saves only knew operational or not
    #[serde(rename = "isOperational", default, skip_serializing)]
    pub legacy_operational: Option<bool>,
    #[serde(rename = "DestructionState", default)]
    pub destruction_state: Value,
}

impl PadRecord {
    fn from_pad(pad: &LaunchPad) -> Self {
        Self {
            id: pad.id,
            name: pad.name.clone(),
            level: pad.level,
            fractional_level: pad.fractional_level,
            state: Some(pad.state()),
            legacy_operational: None,
            destruction_state: pad.destruction_state.clone(),
        }
    }

    /// Nil ids are replaced and unset fractional levels derived from the
    /// integer level, whatever the save version
    fn into_pad(self, ids: &mut dyn IdSource) -> LaunchPad {
        let id = if self.id.is_nil() {
            ids.next_id()
        } else {
            self.id
        };
        // No construction survives for an old non-operational pad, so it
        // comes back destroyed and can be rebuilt
        let state = self.state.unwrap_or(match self.legacy_operational {
            Some(false) => PadState::Destroyed,
            _ => PadState::Free,
        });
        let mut pad = LaunchPad::with_state(id, &self.name, self.fractional_level, state);
        pad.level = self.level;
        pad.migrate_from_old_state();
        if pad.fractional_level >= 0.0 {
            pad.level = pad.fractional_level.floor() as i32;
        }
        pad.destruction_state = self.destruction_state;
        pad
    }
}

fn encode_all<T: Serialize>(items: &[T]) -> EngineResult<Vec<Value>> {
    items
        .iter()
        .map(|item| serde_json::to_value(item).map_err(EngineError::from))
        .collect()
}

/// Decode what can be decoded, skipping the rest
fn decode_all<T: DeserializeOwned>(values: Vec<Value>, what: &str, owner: &str) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!(owner, what, index, error = %e, "skipping unreadable record");
                None
            }
        })
        .collect()
}

impl FacilityRecord {
    pub fn from_complex(complex: &LaunchComplex) -> EngineResult<Self> {
        let pads: Vec<PadRecord> = complex.launch_pads.iter().map(PadRecord::from_pad).collect();
        Ok(Self {
            name: complex.name.clone(),
            active_pad_index: complex.active_pad_index,
            operational: complex.is_operational,
            id: complex.id,
            mod_id: complex.mod_id,
            workforce: complex.workforce,
            is_rushing: complex.is_rushing,
            stats: Some(complex.descriptor.clone()),
            build_list: encode_all(&complex.build_list)?,
            warehouse: encode_all(&complex.warehouse)?,
            pad_constructions: encode_all(&complex.pad_constructions)?,
            recon_rollout: encode_all(&complex.recon_rollout)?,
            airlaunch_prep: encode_all(&complex.airlaunch_prep)?,
            launch_pads: encode_all(&pads)?,
            legacy_efficiency: None,
            legacy_category: None,
            legacy_mass_max: None,
            legacy_mass_orig: None,
            legacy_size_max: None,
            legacy_human_rated: None,
            legacy_plans: Vec::new(),
        })
    }

    /// Rebuild the complex and split off the legacy fields for migration.
    /// Build items are linked to the complex; a nil modification id is
    /// replaced. A nil facility id is left for the migration steps.
    pub fn into_parts(self, ids: &mut dyn IdSource) -> (LaunchComplex, LegacyFields) {
        let legacy = LegacyFields {
            efficiency: self.legacy_efficiency,
            category: self.legacy_category,
            mass_max: self.legacy_mass_max,
            mass_orig: self.legacy_mass_orig,
            size_max: self.legacy_size_max,
            human_rated: self.legacy_human_rated,
            plans: self.legacy_plans,
        };
        let descriptor = match self.stats {
            Some(stats) => stats,
            None => migration::flat_layout_descriptor(&self.name, &legacy),
        };
        let mod_id = if self.mod_id.is_nil() {
            ids.next_id()
        } else {
            self.mod_id
        };
        let owner = self.name.as_str();

        let mut complex = LaunchComplex::empty(self.id, mod_id, descriptor);
        complex.name = self.name.clone();
        complex.workforce = self.workforce;
        complex.is_rushing = self.is_rushing;
        complex.is_operational = self.operational;
        complex.active_pad_index = self.active_pad_index;
        complex.build_list = decode_all(self.build_list, "build item", owner);
        complex.warehouse = decode_all(self.warehouse, "stored vessel", owner);
        complex.pad_constructions = decode_all(self.pad_constructions, "pad construction", owner);
        complex.recon_rollout = decode_all::<ReconRollout>(self.recon_rollout, "recon/rollout", owner);
        complex.airlaunch_prep = decode_all::<AirlaunchPrep>(self.airlaunch_prep, "airlaunch prep", owner);
        complex.launch_pads = decode_all::<PadRecord>(self.launch_pads, "launch pad", owner)
            .into_iter()
            .map(|pad| pad.into_pad(ids))
            .collect();
        relink_items(&mut complex);
        (complex, legacy)
    }
}

/// Point every vessel at the complex whose queue holds it
fn relink_items(complex: &mut LaunchComplex) {
    let id = complex.id;
    for item in complex.build_list.iter_mut().chain(complex.warehouse.iter_mut()) {
        if let Some(owner) = item.facility_id {
            if owner != id && !owner.is_nil() {
                tracing::warn!(vessel = %item.name, %owner, facility = %id, "vessel linked to another facility, relinking");
            }
        }
        item.link_to_facility(id);
    }
}

// ==========================================
// Save / load
// ==========================================

/// Serialize a space center to a JSON string at the current version
pub fn save(center: &SpaceCenter) -> EngineResult<String> {
    let facilities = center
        .facilities
        .iter()
        .map(|f| {
            let record = FacilityRecord::from_complex(f)?;
            serde_json::to_value(record).map_err(EngineError::from)
        })
        .collect::<EngineResult<Vec<Value>>>()?;
    let plans = center
        .plans
        .iter()
        .map(|(name, plan)| {
            serde_json::to_value(plan)
                .map(|value| (name.clone(), value))
                .map_err(EngineError::from)
        })
        .collect::<EngineResult<BTreeMap<String, Value>>>()?;
    let file = SaveFile {
        version: SAVE_VERSION,
        pools: encode_all(center.efficiency.pools())?,
        facilities,
        plans,
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

/// Rebuild a space center from a save, migrating it to the current version
pub fn load(
    json: &str,
    settings: EngineSettings,
    ids: Box<dyn IdSource>,
) -> EngineResult<SpaceCenter> {
    let file: SaveFile = serde_json::from_str(json)?;
    let mut center = SpaceCenter::without_facilities(settings).with_ids(ids);

    center
        .efficiency
        .restore(decode_all::<EfficiencyPool>(file.pools, "efficiency pool", "save"));
    center.plans = file
        .plans
        .into_iter()
        .filter_map(|(name, value)| match serde_json::from_value::<BuildItem>(value) {
            Ok(plan) => Some((name, plan)),
            Err(e) => {
                tracing::warn!(plan = %name, error = %e, "skipping unreadable plan");
                None
            }
        })
        .collect();

    let mut legacy = Vec::new();
    for record in decode_all::<FacilityRecord>(file.facilities, "launch complex", "save") {
        let (complex, fields) = record.into_parts(center.ids.as_mut());
        center.facilities.push(complex);
        legacy.push(fields);
    }

    let ran = migration::run(
        file.version,
        &mut MigrationContext {
            center: &mut center,
            legacy: &mut legacy,
        },
    );
    tracing::info!(
        saved = file.version,
        current = SAVE_VERSION,
        migrations = ran,
        facilities = center.facilities.len(),
        "loaded save"
    );

    settle_after_load(&mut center);
    Ok(center)
}

/// Restore invariants a save cannot be trusted to hold
fn settle_after_load(center: &mut SpaceCenter) {
    if center.facilities.is_empty() {
        tracing::warn!("save has no facilities, adding the starting hangar");
        let hangar = LaunchComplex::new(FacilityDescriptor::starting_hangar(), center.ids.as_mut());
        center.facilities.push(hangar);
    }

    let settings = center.settings.clone();
    for complex in &mut center.facilities {
        if complex.id.is_nil() {
            complex.id = center.ids.next_id();
            tracing::warn!(facility = %complex.id, name = %complex.name, "facility had no id");
        }
        relink_items(complex);

        let cap = complex.max_workforce(&settings);
        if complex.workforce > cap {
            tracing::warn!(facility = %complex.id, workforce = complex.workforce, cap, "workforce above cap, clamping");
            complex.workforce = cap;
        }
        for pad in &mut complex.launch_pads {
            let building = complex.pad_constructions.iter().any(|c| c.pad_id == pad.id);
            if pad.state() == PadState::UnderConstruction && !building {
                tracing::warn!(facility = %complex.id, pad = %pad.name, "pad under construction without a construction, marking destroyed");
                pad.destroy();
            }
        }
        if complex.active_pad_index >= complex.launch_pads.len() {
            complex.active_pad_index = 0;
        }
        complex.ensure_active_pad();

        if complex.is_pad() {
            center
                .efficiency
                .get_or_create(complex.id, &complex.descriptor, true, center.ids.as_mut());
        } else {
            center.efficiency.remove_facility(complex.id);
        }
    }
    let live: BTreeSet<FacilityId> = center.facilities.iter().map(|f| f.id).collect();
    center.efficiency.retain_facilities(|f| live.contains(&f));
    center.efficiency.clear_empty();

    center.constructions = center
        .facilities
        .iter()
        .flat_map(|f| {
            f.pad_constructions.iter().map(move |c: &PadConstruction| ConstructionRef {
                facility: f.id,
                item: c.id,
            })
        })
        .collect();

    for complex in &mut center.facilities {
        complex.take_changes();
    }
    center.recalculate_all_rates();
}

impl SpaceCenter {
    /// Serialize to a JSON string
    pub fn save_to_string(&self) -> EngineResult<String> {
        save(self)
    }

    /// Load from a JSON string
    pub fn load_from_str(
        json: &str,
        settings: EngineSettings,
        ids: Box<dyn IdSource>,
    ) -> EngineResult<Self> {
        load(json, settings, ids)
    }
}
