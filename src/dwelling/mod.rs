pub mod components;
pub mod validate;

use serde::{Deserialize, Serialize};

use crate::economics::FuelKind;
use crate::weather::Climate;

pub use components::{
    Attic, AtticKind, BillingRecord, CoolingEquipment, CoolingSystem, Door, DoorCondition,
    DuctLocation, DuctSystem, EndUse, Foundation, FoundationKind, Glazing, HeatingEquipment,
    HeatingSystem, ItemizedItem, Leakiness, LightingFixture, Mandate, Refrigerator, Wall,
    WallInsulationType, WaterHeater, Window,
};

/// Complete description of one dwelling: every physical component plus the
/// global parameters the simulation needs. Loaded once from the input
/// file; the interaction engine mutates only its own working copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DwellingState {
    pub label: String,
    pub floor_area_sqft: f64,
    #[serde(default = "default_heating_setpoint")]
    pub heating_setpoint_f: f64,
    #[serde(default = "default_cooling_setpoint")]
    pub cooling_setpoint_f: f64,
    /// Whole-house leakage, CFM at 50 Pa.
    pub infiltration_cfm50: f64,
    #[serde(default)]
    pub walls: Vec<Wall>,
    #[serde(default)]
    pub windows: Vec<Window>,
    #[serde(default)]
    pub doors: Vec<Door>,
    #[serde(default)]
    pub attics: Vec<Attic>,
    #[serde(default)]
    pub foundations: Vec<Foundation>,
    #[serde(default)]
    pub ducts: Option<DuctSystem>,
    pub heating: HeatingSystem,
    #[serde(default)]
    pub cooling: Option<CoolingSystem>,
    #[serde(default)]
    pub water_heater: Option<WaterHeater>,
    #[serde(default)]
    pub refrigerator: Option<Refrigerator>,
    #[serde(default)]
    pub lighting: Vec<LightingFixture>,
    #[serde(default)]
    pub itemized: Vec<ItemizedItem>,
    #[serde(default)]
    pub billing: Vec<BillingRecord>,
    #[serde(default)]
    pub mandates: Vec<Mandate>,
    /// Climate override; the default mixed climate applies when absent.
    #[serde(default)]
    pub climate: Option<Climate>,
}

fn default_heating_setpoint() -> f64 {
    68.0
}

fn default_cooling_setpoint() -> f64 {
    76.0
}

impl DwellingState {
    pub fn wall(&self, id: &str) -> Option<&Wall> {
        self.walls.iter().find(|w| w.id == id)
    }

    pub fn wall_mut(&mut self, id: &str) -> Option<&mut Wall> {
        self.walls.iter_mut().find(|w| w.id == id)
    }

    pub fn window(&self, id: &str) -> Option<&Window> {
        self.windows.iter().find(|w| w.id == id)
    }

    pub fn window_mut(&mut self, id: &str) -> Option<&mut Window> {
        self.windows.iter_mut().find(|w| w.id == id)
    }

    pub fn door_mut(&mut self, id: &str) -> Option<&mut Door> {
        self.doors.iter_mut().find(|d| d.id == id)
    }

    pub fn attic(&self, id: &str) -> Option<&Attic> {
        self.attics.iter().find(|a| a.id == id)
    }

    pub fn attic_mut(&mut self, id: &str) -> Option<&mut Attic> {
        self.attics.iter_mut().find(|a| a.id == id)
    }

    pub fn foundation(&self, id: &str) -> Option<&Foundation> {
        self.foundations.iter().find(|f| f.id == id)
    }

    pub fn foundation_mut(&mut self, id: &str) -> Option<&mut Foundation> {
        self.foundations.iter_mut().find(|f| f.id == id)
    }

    /// Representative single-story dwelling used by `template` output and
    /// tests: leaky, under-insulated, with an old gas furnace and central
    /// air conditioner.
    pub fn sample() -> Self {
        Self {
            label: "sample-ranch".to_string(),
            floor_area_sqft: 1250.0,
            heating_setpoint_f: 68.0,
            cooling_setpoint_f: 76.0,
            infiltration_cfm50: 3200.0,
            walls: vec![
                Wall {
                    id: "wall-north".to_string(),
                    area_sqft: 310.0,
                    cavity_r: 0.0,
                    insulation_type: WallInsulationType::Cellulose,
                    measure_group: Some(1),
                },
                Wall {
                    id: "wall-south".to_string(),
                    area_sqft: 280.0,
                    cavity_r: 0.0,
                    insulation_type: WallInsulationType::Cellulose,
                    measure_group: Some(1),
                },
                Wall {
                    id: "wall-east".to_string(),
                    area_sqft: 210.0,
                    cavity_r: 11.0,
                    insulation_type: WallInsulationType::Cellulose,
                    measure_group: None,
                },
                Wall {
                    id: "wall-west".to_string(),
                    area_sqft: 210.0,
                    cavity_r: 0.0,
                    insulation_type: WallInsulationType::Cellulose,
                    measure_group: Some(1),
                },
            ],
            windows: vec![
                Window {
                    id: "win-south".to_string(),
                    count: 4,
                    area_sqft: 12.0,
                    glazing: Glazing::Single,
                    has_storm: false,
                    leakiness: Leakiness::Loose,
                    solar_fraction: 0.9,
                    shaded: false,
                    low_e: false,
                },
                Window {
                    id: "win-north".to_string(),
                    count: 3,
                    area_sqft: 12.0,
                    glazing: Glazing::Single,
                    has_storm: false,
                    leakiness: Leakiness::Average,
                    solar_fraction: 0.2,
                    shaded: false,
                    low_e: false,
                },
            ],
            doors: vec![Door {
                id: "door-front".to_string(),
                count: 2,
                area_sqft: 20.0,
                condition: DoorCondition::Fair,
                has_storm: false,
            }],
            attics: vec![Attic {
                id: "attic-main".to_string(),
                area_sqft: 1250.0,
                existing_r: 7.0,
                kind: AtticKind::Unfloored,
                reflective_coating: false,
            }],
            foundations: vec![Foundation {
                id: "basement".to_string(),
                kind: FoundationKind::Unconditioned,
                wall_area_sqft: 620.0,
                wall_r: 2.0,
                sill_perimeter_ft: 140.0,
                sill_insulated: false,
                floor_area_sqft: 1250.0,
                floor_r: 2.0,
            }],
            ducts: Some(DuctSystem {
                id: "ducts-main".to_string(),
                location: DuctLocation::Basement,
                supply_leakage_cfm: 180.0,
                sealed: false,
                seal_cost: 0.0,
            }),
            heating: HeatingSystem {
                id: "furnace-1".to_string(),
                fuel: FuelKind::NaturalGas,
                equipment: HeatingEquipment::Furnace,
                efficiency: 0.68,
                uses_ducts: true,
                has_setback_thermostat: false,
                has_standing_pilot: true,
                has_vent_damper: false,
                has_flue_damper: false,
                tuned_recently: false,
            },
            cooling: Some(CoolingSystem {
                id: "ac-central".to_string(),
                equipment: CoolingEquipment::CentralAc,
                seer: 9.0,
                unit_count: 1,
                floor_fraction_served: 1.0,
                tuned_recently: false,
                has_whole_house_fan: false,
            }),
            water_heater: Some(WaterHeater {
                id: "dhw-1".to_string(),
                fuel: FuelKind::NaturalGas,
                energy_factor: 0.52,
                tank_r: 4.0,
                gallons_per_day: 52.0,
                wrap_installed: false,
                pipes_insulated: false,
                low_flow_installed: false,
            }),
            refrigerator: Some(Refrigerator {
                id: "fridge-1".to_string(),
                annual_kwh: 1350.0,
                replacement_kwh: 450.0,
                replacement_cost: 900.0,
            }),
            lighting: vec![LightingFixture {
                id: "lights-main".to_string(),
                count: 12,
                watts_each: 60.0,
                replacement_watts_each: 9.0,
                hours_per_day: 3.0,
            }],
            itemized: vec![],
            billing: vec![],
            mandates: vec![],
            climate: None,
        }
    }
}
