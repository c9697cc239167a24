//! Physical components of the dwelling description. Every component
//! carries a stable string id; candidate measure records reference
//! components by id so the interaction engine can detect shared-component
//! conflicts.

use serde::{Deserialize, Serialize};

use crate::catalog::MeasureKind;
use crate::economics::FuelKind;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WallInsulationType {
    Cellulose,
    Fiberglass,
    Foam,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Wall {
    pub id: String,
    pub area_sqft: f64,
    /// R-value of the existing cavity insulation alone (0 = empty cavity).
    pub cavity_r: f64,
    /// Insulation type specified for the fill measure.
    pub insulation_type: WallInsulationType,
    /// Walls sharing a measure-group number are insulated as one measure
    /// instance and must agree on insulation type.
    #[serde(default)]
    pub measure_group: Option<u32>,
}

impl Wall {
    /// Effective thermal resistance including films, sheathing and siding.
    pub fn effective_r(&self) -> f64 {
        4.0 + self.cavity_r
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Glazing {
    Single,
    Double,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Leakiness {
    Tight,
    Average,
    Loose,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Window {
    pub id: String,
    /// Identical windows described as one record.
    pub count: u32,
    /// Area of a single window, sqft.
    pub area_sqft: f64,
    pub glazing: Glazing,
    #[serde(default)]
    pub has_storm: bool,
    #[serde(default = "default_leakiness")]
    pub leakiness: Leakiness,
    /// Fraction of the solar reference gain this orientation receives.
    #[serde(default = "default_solar_fraction")]
    pub solar_fraction: f64,
    #[serde(default)]
    pub shaded: bool,
    /// Low-emissivity glazing or applied film.
    #[serde(default)]
    pub low_e: bool,
}

fn default_leakiness() -> Leakiness {
    Leakiness::Average
}

fn default_solar_fraction() -> f64 {
    0.5
}

impl Window {
    pub fn total_area(&self) -> f64 {
        self.area_sqft * f64::from(self.count)
    }

    /// Whole-assembly U-value, Btu/hr-sqft-°F.
    pub fn u_value(&self) -> f64 {
        let base: f64 = match (self.glazing, self.has_storm) {
            (Glazing::Single, false) => 1.10,
            (Glazing::Single, true) => 0.55,
            (Glazing::Double, false) => 0.49,
            (Glazing::Double, true) => 0.39,
        };
        if self.low_e {
            (base - 0.10).max(0.32)
        } else {
            base
        }
    }

    /// Fraction of incident solar gain transmitted to the zone.
    pub fn solar_transmittance(&self) -> f64 {
        let shade = if self.shaded { 0.4 } else { 1.0 };
        let film = if self.low_e { 0.55 } else { 1.0 };
        shade * film
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DoorCondition {
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Door {
    pub id: String,
    pub count: u32,
    pub area_sqft: f64,
    pub condition: DoorCondition,
    #[serde(default)]
    pub has_storm: bool,
}

impl Door {
    pub fn total_area(&self) -> f64 {
        self.area_sqft * f64::from(self.count)
    }

    pub fn u_value(&self) -> f64 {
        let base = match self.condition {
            DoorCondition::Good => 0.40,
            DoorCondition::Fair => 0.50,
            DoorCondition::Poor => 0.65,
        };
        if self.has_storm {
            base * 0.75
        } else {
            base
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AtticKind {
    /// Open joists, insulation laid between and over them.
    Unfloored,
    /// Floored storage attic; only the joist cavity can be filled.
    Floored,
    Kneewall,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attic {
    pub id: String,
    pub area_sqft: f64,
    pub existing_r: f64,
    pub kind: AtticKind,
    /// Reflective roof coating reduces the summer gain through the attic.
    #[serde(default)]
    pub reflective_coating: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FoundationKind {
    /// Heated/conditioned basement.
    Conditioned,
    /// Unconditioned but enclosed basement.
    Unconditioned,
    /// Vented crawlspace; the floor above is the thermal boundary.
    Vented,
    Slab,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Foundation {
    pub id: String,
    pub kind: FoundationKind,
    /// Above-grade + upper below-grade wall area, sqft.
    pub wall_area_sqft: f64,
    pub wall_r: f64,
    /// Perimeter of the sill box / rim joist, ft.
    pub sill_perimeter_ft: f64,
    #[serde(default)]
    pub sill_insulated: bool,
    /// Floor area over the foundation space, sqft.
    pub floor_area_sqft: f64,
    #[serde(default)]
    pub floor_r: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DuctLocation {
    ConditionedSpace,
    Attic,
    Crawlspace,
    Basement,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DuctSystem {
    pub id: String,
    pub location: DuctLocation,
    /// Measured supply leakage, CFM at operating pressure.
    pub supply_leakage_cfm: f64,
    #[serde(default)]
    pub sealed: bool,
    /// Contractor-entered sealing cost; 0 means no cost was entered.
    #[serde(default)]
    pub seal_cost: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HeatingEquipment {
    Furnace,
    Boiler,
    SpaceHeater,
    HeatPump,
    ElectricResistance,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeatingSystem {
    pub id: String,
    pub fuel: FuelKind,
    pub equipment: HeatingEquipment,
    /// Seasonal efficiency as output/input. AFUE fraction for combustion
    /// equipment, 1.0 for electric resistance, seasonal COP for heat pumps.
    pub efficiency: f64,
    #[serde(default)]
    pub uses_ducts: bool,
    #[serde(default)]
    pub has_setback_thermostat: bool,
    #[serde(default)]
    pub has_standing_pilot: bool,
    #[serde(default)]
    pub has_vent_damper: bool,
    #[serde(default)]
    pub has_flue_damper: bool,
    #[serde(default)]
    pub tuned_recently: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CoolingEquipment {
    CentralAc,
    RoomAc,
    HeatPump,
    Evaporative,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoolingSystem {
    pub id: String,
    pub equipment: CoolingEquipment,
    /// Seasonal EER, Btu/Wh.
    pub seer: f64,
    /// Number of room units for `RoomAc`, otherwise 1.
    #[serde(default = "default_unit_count")]
    pub unit_count: u32,
    /// Fraction of the floor area this system serves.
    #[serde(default = "default_floor_fraction")]
    pub floor_fraction_served: f64,
    #[serde(default)]
    pub tuned_recently: bool,
    /// A whole-house fan displaces part of the compressor load.
    #[serde(default)]
    pub has_whole_house_fan: bool,
}

fn default_unit_count() -> u32 {
    1
}

fn default_floor_fraction() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaterHeater {
    pub id: String,
    pub fuel: FuelKind,
    /// Energy factor, output/input over a standard draw.
    pub energy_factor: f64,
    pub tank_r: f64,
    pub gallons_per_day: f64,
    #[serde(default)]
    pub wrap_installed: bool,
    #[serde(default)]
    pub pipes_insulated: bool,
    #[serde(default)]
    pub low_flow_installed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Refrigerator {
    pub id: String,
    /// Metered or label annual consumption of the existing unit.
    pub annual_kwh: f64,
    /// Label consumption of the candidate replacement unit.
    pub replacement_kwh: f64,
    pub replacement_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LightingFixture {
    pub id: String,
    pub count: u32,
    pub watts_each: f64,
    pub replacement_watts_each: f64,
    pub hours_per_day: f64,
}

/// Auditor-entered repair or health-and-safety item. Required items enter
/// the package regardless of economics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemizedItem {
    pub id: String,
    pub name: String,
    pub cost: f64,
    #[serde(default)]
    pub annual_savings_dollars: f64,
    #[serde(default)]
    pub fuel: Option<FuelKind>,
    #[serde(default = "default_itemized_life")]
    pub life_years: f64,
    #[serde(default)]
    pub required: bool,
}

fn default_itemized_life() -> f64 {
    10.0
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EndUse {
    Heating,
    Cooling,
}

/// One monthly utility-bill reading for an end use, normalized to MMBtu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillingRecord {
    pub year: i32,
    /// 1-12.
    pub month: u32,
    pub end_use: EndUse,
    pub consumption_mmbtu: f64,
}

/// A program mandate: a measure the auditor must include when applicable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Mandate {
    pub kind: MeasureKind,
    #[serde(default)]
    pub reason: Option<String>,
}
