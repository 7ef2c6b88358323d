use launch_complex::build_item::BuildItem;
use launch_complex::config::EngineSettings;
use launch_complex::descriptor::{FacilityCategory, FacilityDescriptor, Size3};
use launch_complex::efficiency::EfficiencyRegistry;
use launch_complex::ids::{IdSource, SeededIds};
use launch_complex::launch_complex::LaunchComplex;
use launch_complex::launch_pad::PadState;
use launch_complex::operations::{ReconRollout, ReconRolloutKind};
use launch_complex::persistence::{self, FacilityRecord};
use launch_complex::space_center::SpaceCenter;
use launch_complex::strategy::NoModifiers;
use launch_complex::workforce::{max_workforce, RateInput, StandardRateModel};

fn pad(name: &str, mass: f64, human_rated: bool) -> FacilityDescriptor {
    FacilityDescriptor::new(
        name,
        FacilityCategory::Pad,
        Some(mass),
        Size3::new(10.0, 40.0, 10.0),
        human_rated,
    )
}

fn seeded_center(seed: u64) -> SpaceCenter {
    SpaceCenter::new(EngineSettings::default()).with_ids(Box::new(SeededIds::new(seed)))
}

#[test]
fn test_max_workforce_monotonic() {
    let settings = EngineSettings::default();
    for human_rated in [false, true] {
        let mut previous = 0;
        for step in 0..200 {
            let mass = step as f64 * 25.0;
            let cap = max_workforce(&settings, &pad("LC", mass, human_rated), None);
            assert!(cap >= settings.min_workforce);
            assert!(cap >= previous, "cap dropped at {mass}t");
            previous = cap;
        }
    }
}

#[test]
fn test_pad_switching_round_trip() {
    let mut center = seeded_center(1);
    let lc = center.commission_facility(pad("LC-1", 60.0, false));
    center.queue_pad_construction(lc, "LC-1 B", 10.0, 0.0).unwrap();
    center.queue_pad_construction(lc, "LC-1 C", 10.0, 0.0).unwrap();
    center.advance(1.0);
    assert_eq!(center.facility(lc).unwrap().best_state(), Some(PadState::Free));

    let start = center.facility(lc).unwrap().active_pad_index();
    for _ in 0..3 {
        let index = center.switch_to_next_pad(lc).unwrap().unwrap();
        assert!(center.facility(lc).unwrap().launch_pads()[index].is_operational());
    }
    assert_eq!(center.facility(lc).unwrap().active_pad_index(), start);

    let middle = center.facility(lc).unwrap().launch_pads()[1].id;
    center.destroy_pad(lc, middle).unwrap();
    for _ in 0..4 {
        let index = center.switch_to_previous_pad(lc).unwrap().unwrap();
        assert_ne!(index, 1);
    }
}

#[test]
fn test_pool_binding_idempotent() {
    let mut registry = EfficiencyRegistry::default();
    let mut ids = SeededIds::new(2);
    let facility = ids.next_id();
    let descriptor = pad("LC-1", 60.0, false);
    let first = registry.get_or_create(facility, &descriptor, true, &mut ids);
    let second = registry.get_or_create(facility, &descriptor, true, &mut ids);
    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(registry.pools().len(), 1);

    let other = ids.next_id();
    assert_eq!(registry.get_or_create(other, &pad("LC-9", 3000.0, true), false, &mut ids), None);
}

#[test]
fn test_save_load_round_trip() {
    let mut center = seeded_center(3);
    let lc = center.commission_facility(pad("LC-1", 60.0, false));
    center.queue_pad_construction(lc, "LC-1 B", 50.0, 1000.0).unwrap();
    let cap = center.facility(lc).unwrap().max_workforce(center.settings());
    center.set_workforce(lc, cap).unwrap();
    center.queue_vessel(lc, "Orbiter", 1e7, 2e6, 20.0, false).unwrap();
    center.queue_vessel(lc, "Lander", 5e5, 0.0, 8.0, false).unwrap();
    center.advance(12.5);
    assert!(center.efficiency_of(lc) > center.settings().min_efficiency);

    let json = persistence::save(&center).unwrap();
    let restored = persistence::load(&json, EngineSettings::default(), Box::new(SeededIds::new(4))).unwrap();

    let before = center.facility(lc).unwrap();
    let after = restored.facility(lc).unwrap();
    assert_eq!(after.mod_id(), before.mod_id());
    assert_eq!(after.name(), before.name());
    assert_eq!(after.descriptor(), before.descriptor());
    assert_eq!(after.workforce(), before.workforce());
    assert_eq!(after.active_pad_index(), before.active_pad_index());
    assert_eq!(after.launch_pads(), before.launch_pads());
    assert_eq!(after.launch_pad_count(), 2);
    assert_eq!(after.build_list(), before.build_list());
    assert_eq!(after.build_list().len(), 2);
    assert_eq!(after.rate(), before.rate());
    assert_eq!(restored.efficiency().pools(), center.efficiency().pools());
    assert_eq!(restored.efficiency_of(lc), center.efficiency_of(lc));
    assert_eq!(restored.facilities().len(), center.facilities().len());
}

fn old_pad_save(with_id: bool) -> String {
    let id = if with_id {
        r#""id": "00000000-0000-0000-0000-0000000000ce","#
    } else {
        ""
    };
    format!(
        r#"{{
        "saveVersion": 7,
        "LaunchComplexes": [
            {{ "LCName": "Hangar", "id": "00000000-0000-0000-0000-0000000000aa",
              "modID": "00000000-0000-0000-0000-0000000000ab",
              "Stats": {{ "Name": "Hangar", "lcType": "Hangar", "isHumanRated": true,
                         "sizeMax": {{ "x": 40.0, "y": 10.0, "z": 40.0 }} }} }},
            {{ "LCName": "Old Pad", {id}
              "modID": "00000000-0000-0000-0000-0000000000cd",
              "Engineers": 30,
              "IsRushing": true,
              "Stats": {{ "Name": "Old Pad", "lcType": "Pad", "isHumanRated": false, "massMax": 60.0,
                         "sizeMax": {{ "x": 10.0, "y": 40.0, "z": 10.0 }} }},
              "BuildList": [
                {{ "id": "00000000-0000-0000-0000-000000000001", "shipName": "Sat", "buildPoints": 100.0 }}
              ],
              "LaunchPads": [
                {{ "id": "00000000-0000-0000-0000-0000000000e1", "name": "Old Pad", "level": 1 }}
              ] }}
        ]
    }}"#
    )
}

/// Stored form of a facility without its own id or the back-references to it
fn record_without_id(facility: &LaunchComplex) -> serde_json::Value {
    let mut record = serde_json::to_value(FacilityRecord::from_complex(facility).unwrap()).unwrap();
    let fields = record.as_object_mut().unwrap();
    fields.remove("id");
    for item in fields["BuildList"].as_array_mut().unwrap() {
        item.as_object_mut().unwrap().remove("LCID");
    }
    record
}

#[test]
fn test_old_save_missing_id() {
    let center = persistence::load(&old_pad_save(false), EngineSettings::default(), Box::new(SeededIds::new(5))).unwrap();
    let facility = &center.facilities()[1];
    assert!(!facility.id().is_nil());
    assert_eq!(facility.name(), "Old Pad");
    assert_eq!(facility.workforce(), 30);
    assert_eq!(facility.mod_id().to_string(), "00000000-0000-0000-0000-0000000000cd");
    assert_eq!(facility.descriptor().mass_max, Some(60.0));
    assert_eq!(facility.build_list()[0].facility_id, Some(facility.id()));
    assert_eq!(facility.launch_pads()[0].fractional_level, 1.0);
    assert!(center.efficiency().pool_for(facility.id()).is_some());

    let reference = persistence::load(&old_pad_save(true), EngineSettings::default(), Box::new(SeededIds::new(5))).unwrap();
    assert_eq!(record_without_id(facility), record_without_id(&reference.facilities()[1]));
}

#[test]
fn test_flat_layout_defaults_to_pad() {
    let json = r#"{
        "saveVersion": 6,
        "LaunchComplexes": [
            { "LCName": "Hangar", "id": "00000000-0000-0000-0000-0000000000aa" },
            { "LCName": "LC-2", "id": "00000000-0000-0000-0000-0000000000bb",
              "massMax": 60.0, "sizeMax": { "x": 10.0, "y": 40.0, "z": 10.0 },
              "LaunchPads": [ { "name": "LC-2", "level": 1 } ] }
        ]
    }"#;
    let center = persistence::load(json, EngineSettings::default(), Box::new(SeededIds::new(9))).unwrap();
    assert!(center.facilities()[0].descriptor().matches_starting_hangar());
    let pad = &center.facilities()[1];
    assert_eq!(pad.category(), FacilityCategory::Pad);
    assert_eq!(pad.descriptor().mass_max, Some(60.0));
    assert_eq!(pad.launch_pad_count(), 1);
    assert!(center.efficiency().pool_for(pad.id()).is_some());
}

#[test]
fn test_legacy_efficiency_without_stats() {
    let json = r#"{
        "saveVersion": 5,
        "LaunchComplexes": [
            { "LCName": "Hangar", "id": "00000000-0000-0000-0000-0000000000aa", "lcType": "Hangar" },
            { "LCName": "LC-2", "id": "00000000-0000-0000-0000-0000000000bb",
              "lcType": "Pad", "massMax": 60.0, "EfficiencyEngineers": 0.8,
              "sizeMax": { "x": 10.0, "y": 40.0, "z": 10.0 },
              "LaunchPads": [ { "name": "LC-2", "level": 1 } ] }
        ]
    }"#;
    let center = persistence::load(json, EngineSettings::default(), Box::new(SeededIds::new(10))).unwrap();
    let pad = &center.facilities()[1];
    assert_eq!(pad.category(), FacilityCategory::Pad);
    assert!((center.efficiency_of(pad.id()) - 0.8).abs() < 1e-12);
    assert_eq!(center.efficiency().pools().len(), 1);
    assert_eq!(center.efficiency().pools()[0].reference.mass_max, Some(60.0));
}

#[test]
fn test_nil_id_pad_pool_membership() {
    let json = r#"{
        "saveVersion": 5,
        "LaunchComplexes": [
            { "LCName": "Hangar", "id": "00000000-0000-0000-0000-0000000000aa", "lcType": "Hangar" },
            { "LCName": "LC-2", "lcType": "Pad", "massMax": 60.0, "EfficiencyEngineers": 0.7,
              "sizeMax": { "x": 10.0, "y": 40.0, "z": 10.0 },
              "LaunchPads": [ { "name": "LC-2", "level": 1 } ] }
        ]
    }"#;
    let mut center = persistence::load(json, EngineSettings::default(), Box::new(SeededIds::new(11))).unwrap();
    let id = center.facilities()[1].id();
    assert!(!id.is_nil());
    let pool = center.efficiency().pool_for(id).unwrap();
    assert_eq!(pool.members().collect::<Vec<_>>(), vec![id]);
    assert!(center.efficiency().bindings_consistent());

    center.remove_facility(id).unwrap();
    assert!(center.efficiency().pools().is_empty());
}

#[test]
fn test_queue_rates_independent() {
    let settings = EngineSettings::default();
    let model = StandardRateModel::from_settings(&settings);
    let mut ids = SeededIds::new(6);

    let mut plain = LaunchComplex::new(pad("LC-1", 60.0, false), &mut ids);
    let mut busy = plain.clone();
    for lc in [&mut plain, &mut busy] {
        lc.set_workforce(&settings, 50);
        lc.add_build(BuildItem::new(uuid::Uuid::from_u128(1), "V", 1e6, 0.0, 10.0, false));
    }
    let site = busy.launch_pads()[0].name.clone();
    for i in 0..3 {
        busy.add_recon_rollout(ReconRollout::new(
            uuid::Uuid::from_u128(10 + i),
            ReconRolloutKind::Reconditioning,
            &site,
            None,
            1e6,
            false,
        ));
    }
    plain.recalculate_rates(&settings, 0.7, &NoModifiers, &model);
    busy.recalculate_rates(&settings, 0.7, &NoModifiers, &model);
    assert_eq!(plain.build_list()[0].current_rate(), busy.build_list()[0].current_rate());

    plain.advance(3.0);
    busy.advance(3.0);
    assert_eq!(plain.build_list()[0].progress, busy.build_list()[0].progress);
    assert!(busy.recon_rollout().iter().all(|r| r.progress > 0.0));
}

#[test]
fn test_human_rating_term() {
    let settings = EngineSettings::default();
    let model = StandardRateModel::from_settings(&settings);
    let mut ids = SeededIds::new(7);
    let mut lc = LaunchComplex::new(pad("LC-HR", 40.0, true), &mut ids);
    let cap = lc.max_workforce(&settings);
    assert_eq!(lc.set_workforce(&settings, cap), cap);
    lc.recalculate_rates(&settings, 0.8, &NoModifiers, &model);

    let input = RateInput {
        workforce: cap,
        non_human_rated_cap: max_workforce(&settings, lc.descriptor(), Some(false)),
        efficiency: 0.8,
        strategy_multiplier: 1.0,
        rush_multiplier: 1.0,
        human_rated: true,
    };
    let term = model.human_rating_term(&input);
    assert!(term > 0.0);
    assert!(lc.rate() >= 0.0 && lc.rate_hr_capped() >= 0.0);
    assert!((lc.rate() - lc.rate_hr_capped() - term).abs() < 1e-9);
}

#[test]
fn test_removal_shrinks_pool() {
    let mut center = seeded_center(8);
    let a = center.commission_facility(pad("LC-1", 60.0, false));
    let b = center.commission_facility(pad("LC-2", 60.0, false));
    let pool = center.efficiency().pool_for(a).map(|p| p.id).unwrap();
    assert_eq!(center.efficiency().get(pool).unwrap().member_count(), 2);

    let item = center.queue_vessel(a, "V", 10.0, 0.0, 1.0, false).unwrap();
    assert!(center.facility(a).unwrap().is_active());
    center.cancel_build(a, item).unwrap();
    assert!(!center.facility(a).unwrap().is_active());
    assert_eq!(center.facility(a).unwrap().workforce(), 0);

    center.remove_facility(a).unwrap();
    assert_eq!(center.efficiency().get(pool).unwrap().member_count(), 1);
    center.remove_facility(b).unwrap();
    assert!(center.efficiency().get(pool).is_none());
    assert!(center.efficiency().pools().is_empty());
}
