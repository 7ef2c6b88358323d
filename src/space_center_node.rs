use godot::prelude::*;

use crate::config::EngineSettings;
use crate::descriptor::{FacilityCategory, FacilityDescriptor, Size3};
use crate::ids::{FacilityId, RandomIds};
use crate::launch_complex::{EngineEvent, LaunchComplex};
use crate::persistence;
use crate::space_center::SpaceCenter;
use crate::telemetry;

/// Godot node owning the launch complex engine
#[derive(GodotClass)]
#[class(base=Node)]
pub struct SpaceCenterNode {
    base: Base<Node>,
    center: SpaceCenter,
}

#[godot_api]
impl INode for SpaceCenterNode {
    fn init(base: Base<Node>) -> Self {
        telemetry::init_tracing();
        godot_print!("SpaceCenterNode initialized");
        Self {
            base,
            center: SpaceCenter::new(EngineSettings::default()),
        }
    }
}

impl SpaceCenterNode {
    fn facility_at(&self, index: i32) -> Option<&LaunchComplex> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.center.facilities().get(i))
    }

    fn facility_id(&self, index: i32) -> Option<FacilityId> {
        self.facility_at(index).map(|f| f.id())
    }

    fn emit_facilities_changed(&mut self) {
        self.base_mut().emit_signal("facilities_changed", &[]);
    }
}

#[godot_api]
impl SpaceCenterNode {
    // ==========================================
    // Signals
    // ==========================================

    #[signal]
    fn facilities_changed();

    #[signal]
    fn build_completed(name: GString);

    #[signal]
    fn pad_construction_completed(name: GString);

    // ==========================================
    // Time
    // ==========================================

    /// Advance the simulation by `days`. Returns the number of events.
    #[func]
    pub fn advance(&mut self, days: f64) -> i32 {
        let events = self.center.advance(days);
        let count = events.len() as i32;
        for event in events {
            match event {
                EngineEvent::BuildCompleted { name, .. } => {
                    self.base_mut()
                        .emit_signal("build_completed", &[GString::from(name.as_str()).to_variant()]);
                }
                EngineEvent::PadConstructionCompleted { name, .. } => {
                    self.base_mut().emit_signal(
                        "pad_construction_completed",
                        &[GString::from(name.as_str()).to_variant()],
                    );
                }
                _ => {}
            }
        }
        if count > 0 {
            self.emit_facilities_changed();
        }
        count
    }

    // ==========================================
    // Facilities
    // ==========================================

    #[func]
    pub fn get_facility_count(&self) -> i32 {
        self.center.facilities().len() as i32
    }

    #[func]
    pub fn get_facility_name(&self, index: i32) -> GString {
        GString::from(self.facility_at(index).map(|f| f.name()).unwrap_or(""))
    }

    /// "Pad" or "Hangar"
    #[func]
    pub fn get_facility_category(&self, index: i32) -> GString {
        let category = match self.facility_at(index).map(|f| f.category()) {
            Some(FacilityCategory::Pad) => "Pad",
            Some(FacilityCategory::Hangar) => "Hangar",
            None => "",
        };
        GString::from(category)
    }

    #[func]
    pub fn get_supported_mass_text(&self, index: i32) -> GString {
        let text = self
            .facility_at(index)
            .map(|f| f.descriptor().supported_mass_text())
            .unwrap_or_default();
        GString::from(text.as_str())
    }

    #[func]
    pub fn get_supported_size_text(&self, index: i32) -> GString {
        let text = self
            .facility_at(index)
            .map(|f| f.descriptor().supported_size_text())
            .unwrap_or_default();
        GString::from(text.as_str())
    }

    /// Commission a pad complex. Returns its index.
    #[func]
    pub fn commission_pad(
        &mut self,
        name: GString,
        mass_max: f64,
        size_x: f64,
        size_y: f64,
        size_z: f64,
        human_rated: bool,
    ) -> i32 {
        let descriptor = FacilityDescriptor::new(
            &name.to_string(),
            FacilityCategory::Pad,
            Some(mass_max),
            Size3::new(size_x, size_y, size_z),
            human_rated,
        );
        self.center.commission_facility(descriptor);
        self.emit_facilities_changed();
        self.get_facility_count() - 1
    }

    #[func]
    pub fn remove_facility(&mut self, index: i32) -> bool {
        let Some(id) = self.facility_id(index) else {
            return false;
        };
        match self.center.remove_facility(id) {
            Ok(_) => {
                self.emit_facilities_changed();
                true
            }
            Err(e) => {
                godot_print!("remove_facility: {}", e);
                false
            }
        }
    }

    // ==========================================
    // Workforce and rates
    // ==========================================

    #[func]
    pub fn get_workforce(&self, index: i32) -> i32 {
        self.facility_at(index).map(|f| f.workforce() as i32).unwrap_or(0)
    }

    #[func]
    pub fn get_max_workforce(&self, index: i32) -> i32 {
        self.facility_at(index)
            .map(|f| f.max_workforce(self.center.settings()) as i32)
            .unwrap_or(0)
    }

    /// Set workforce, clamped to the cap. Returns the value applied or -1.
    #[func]
    pub fn set_workforce(&mut self, index: i32, workforce: i32) -> i32 {
        let Some(id) = self.facility_id(index) else {
            return -1;
        };
        match self.center.set_workforce(id, workforce.max(0) as u32) {
            Ok(applied) => {
                self.emit_facilities_changed();
                applied as i32
            }
            Err(_) => -1,
        }
    }

    #[func]
    pub fn get_build_rate(&self, index: i32) -> f64 {
        self.facility_at(index).map(|f| f.rate()).unwrap_or(0.0)
    }

    #[func]
    pub fn get_efficiency(&self, index: i32) -> f64 {
        self.facility_id(index)
            .map(|id| self.center.efficiency_of(id))
            .unwrap_or(0.0)
    }

    #[func]
    pub fn is_rushing(&self, index: i32) -> bool {
        self.facility_at(index).is_some_and(|f| f.is_rushing())
    }

    #[func]
    pub fn set_rushing(&mut self, index: i32, rushing: bool) -> bool {
        let Some(id) = self.facility_id(index) else {
            return false;
        };
        let ok = self.center.set_rushing(id, rushing).is_ok();
        if ok {
            self.emit_facilities_changed();
        }
        ok
    }

    // ==========================================
    // Pads
    // ==========================================

    #[func]
    pub fn get_pad_count(&self, index: i32) -> i32 {
        self.facility_at(index)
            .map(|f| f.launch_pad_count() as i32)
            .unwrap_or(0)
    }

    #[func]
    pub fn get_active_pad_name(&self, index: i32) -> GString {
        GString::from(
            self.facility_at(index)
                .and_then(|f| f.active_pad())
                .map(|p| p.name.as_str())
                .unwrap_or(""),
        )
    }

    /// Returns the new active index, or -1 when no pad is operational
    #[func]
    pub fn switch_to_next_pad(&mut self, index: i32) -> i32 {
        let Some(id) = self.facility_id(index) else {
            return -1;
        };
        match self.center.switch_to_next_pad(id) {
            Ok(Some(pad)) => pad as i32,
            _ => -1,
        }
    }

    #[func]
    pub fn switch_to_previous_pad(&mut self, index: i32) -> i32 {
        let Some(id) = self.facility_id(index) else {
            return -1;
        };
        match self.center.switch_to_previous_pad(id) {
            Ok(Some(pad)) => pad as i32,
            _ => -1,
        }
    }

    // ==========================================
    // Builds
    // ==========================================

    #[func]
    pub fn queue_vessel(
        &mut self,
        index: i32,
        name: GString,
        build_points: f64,
        integration_points: f64,
        mass: f64,
        human_rated: bool,
    ) -> bool {
        let Some(id) = self.facility_id(index) else {
            return false;
        };
        let ok = self
            .center
            .queue_vessel(id, &name.to_string(), build_points, integration_points, mass, human_rated)
            .is_ok();
        if ok {
            self.emit_facilities_changed();
        }
        ok
    }

    /// Names of vessels under construction, in queue order
    #[func]
    pub fn get_build_names(&self, index: i32) -> Array<GString> {
        let mut result = Array::new();
        if let Some(facility) = self.facility_at(index) {
            for item in facility.build_list() {
                result.push(&GString::from(item.name.as_str()));
            }
        }
        result
    }

    /// Progress fraction of one queued vessel
    #[func]
    pub fn get_build_progress(&self, index: i32, item: i32) -> f64 {
        self.facility_at(index)
            .and_then(|f| usize::try_from(item).ok().and_then(|i| f.build_list().get(i)))
            .map(|b| b.progress_fraction())
            .unwrap_or(0.0)
    }

    #[func]
    pub fn get_warehouse_names(&self, index: i32) -> Array<GString> {
        let mut result = Array::new();
        if let Some(facility) = self.facility_at(index) {
            for item in facility.warehouse() {
                result.push(&GString::from(item.name.as_str()));
            }
        }
        result
    }

    // ==========================================
    // Save / load
    // ==========================================

    #[func]
    pub fn save_to_string(&self) -> GString {
        match persistence::save(&self.center) {
            Ok(json) => GString::from(json.as_str()),
            Err(e) => {
                godot_print!("save failed: {}", e);
                GString::new()
            }
        }
    }

    #[func]
    pub fn load_from_string(&mut self, json: GString) -> bool {
        let settings = self.center.settings().clone();
        match persistence::load(&json.to_string(), settings, Box::new(RandomIds)) {
            Ok(center) => {
                self.center = center;
                self.emit_facilities_changed();
                true
            }
            Err(e) => {
                godot_print!("load failed: {}", e);
                false
            }
        }
    }
}
