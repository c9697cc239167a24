//! Static measure metadata: the measure kinds the engine knows how to
//! evaluate, their economic categories, ranking priorities, expected
//! lifetimes, and the mutual-exclusion relation between kinds that target
//! the same physical component.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MeasureKind {
    DuctSealing,
    InfiltrationReduction,
    AtticInsulationR11,
    AtticInsulationR19,
    AtticInsulationR30,
    AtticInsulationR38,
    FillAtticCavity,
    WallInsulation,
    FoundationWallInsulation,
    SillBoxInsulation,
    FloorInsulation,
    WhiteRoofCoating,
    StormWindows,
    WindowReplacement,
    LowEWindowFilm,
    WindowShading,
    WindowSealing,
    StormDoors,
    DoorReplacement,
    SetbackThermostat,
    FurnaceTuneUp,
    FurnaceReplacement,
    HighEfficiencyFurnace,
    BoilerTuneUp,
    HighEfficiencyBoiler,
    VentDamper,
    IntermittentIgnition,
    FlueDamper,
    SpaceHeaterReplacement,
    HeatPumpReplacement,
    CentralAcReplacement,
    RoomAcReplacement,
    AcTuneUp,
    EvaporativeCooler,
    WholeHouseFan,
    WaterHeaterTankWrap,
    WaterHeaterPipeInsulation,
    LowFlowShowerheads,
    WaterHeaterReplacement,
    LightingRetrofit,
    RefrigeratorReplacement,
    ItemizedRepair,
}

impl MeasureKind {
    /// Fixed execution order for the first pass. The order matters only for
    /// component-code bookkeeping, not for economics.
    pub const ALL: [MeasureKind; 42] = [
        MeasureKind::DuctSealing,
        MeasureKind::InfiltrationReduction,
        MeasureKind::AtticInsulationR11,
        MeasureKind::AtticInsulationR19,
        MeasureKind::AtticInsulationR30,
        MeasureKind::AtticInsulationR38,
        MeasureKind::FillAtticCavity,
        MeasureKind::WallInsulation,
        MeasureKind::FoundationWallInsulation,
        MeasureKind::SillBoxInsulation,
        MeasureKind::FloorInsulation,
        MeasureKind::WhiteRoofCoating,
        MeasureKind::StormWindows,
        MeasureKind::WindowReplacement,
        MeasureKind::LowEWindowFilm,
        MeasureKind::WindowShading,
        MeasureKind::WindowSealing,
        MeasureKind::StormDoors,
        MeasureKind::DoorReplacement,
        MeasureKind::SetbackThermostat,
        MeasureKind::FurnaceTuneUp,
        MeasureKind::FurnaceReplacement,
        MeasureKind::HighEfficiencyFurnace,
        MeasureKind::BoilerTuneUp,
        MeasureKind::HighEfficiencyBoiler,
        MeasureKind::VentDamper,
        MeasureKind::IntermittentIgnition,
        MeasureKind::FlueDamper,
        MeasureKind::SpaceHeaterReplacement,
        MeasureKind::HeatPumpReplacement,
        MeasureKind::CentralAcReplacement,
        MeasureKind::RoomAcReplacement,
        MeasureKind::AcTuneUp,
        MeasureKind::EvaporativeCooler,
        MeasureKind::WholeHouseFan,
        MeasureKind::WaterHeaterTankWrap,
        MeasureKind::WaterHeaterPipeInsulation,
        MeasureKind::LowFlowShowerheads,
        MeasureKind::WaterHeaterReplacement,
        MeasureKind::LightingRetrofit,
        MeasureKind::RefrigeratorReplacement,
        MeasureKind::ItemizedRepair,
    ];

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::DuctSealing => "duct_sealing",
            Self::InfiltrationReduction => "infiltration_reduction",
            Self::AtticInsulationR11 => "attic_insulation_r11",
            Self::AtticInsulationR19 => "attic_insulation_r19",
            Self::AtticInsulationR30 => "attic_insulation_r30",
            Self::AtticInsulationR38 => "attic_insulation_r38",
            Self::FillAtticCavity => "fill_attic_cavity",
            Self::WallInsulation => "wall_insulation",
            Self::FoundationWallInsulation => "foundation_wall_insulation",
            Self::SillBoxInsulation => "sill_box_insulation",
            Self::FloorInsulation => "floor_insulation",
            Self::WhiteRoofCoating => "white_roof_coating",
            Self::StormWindows => "storm_windows",
            Self::WindowReplacement => "window_replacement",
            Self::LowEWindowFilm => "low_e_window_film",
            Self::WindowShading => "window_shading",
            Self::WindowSealing => "window_sealing",
            Self::StormDoors => "storm_doors",
            Self::DoorReplacement => "door_replacement",
            Self::SetbackThermostat => "setback_thermostat",
            Self::FurnaceTuneUp => "furnace_tune_up",
            Self::FurnaceReplacement => "furnace_replacement",
            Self::HighEfficiencyFurnace => "high_efficiency_furnace",
            Self::BoilerTuneUp => "boiler_tune_up",
            Self::HighEfficiencyBoiler => "high_efficiency_boiler",
            Self::VentDamper => "vent_damper",
            Self::IntermittentIgnition => "intermittent_ignition",
            Self::FlueDamper => "flue_damper",
            Self::SpaceHeaterReplacement => "space_heater_replacement",
            Self::HeatPumpReplacement => "heat_pump_replacement",
            Self::CentralAcReplacement => "central_ac_replacement",
            Self::RoomAcReplacement => "room_ac_replacement",
            Self::AcTuneUp => "ac_tune_up",
            Self::EvaporativeCooler => "evaporative_cooler",
            Self::WholeHouseFan => "whole_house_fan",
            Self::WaterHeaterTankWrap => "water_heater_tank_wrap",
            Self::WaterHeaterPipeInsulation => "water_heater_pipe_insulation",
            Self::LowFlowShowerheads => "low_flow_showerheads",
            Self::WaterHeaterReplacement => "water_heater_replacement",
            Self::LightingRetrofit => "lighting_retrofit",
            Self::RefrigeratorReplacement => "refrigerator_replacement",
            Self::ItemizedRepair => "itemized_repair",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::DuctSealing => "Duct sealing",
            Self::InfiltrationReduction => "Infiltration reduction",
            Self::AtticInsulationR11 => "Attic insulation R-11",
            Self::AtticInsulationR19 => "Attic insulation R-19",
            Self::AtticInsulationR30 => "Attic insulation R-30",
            Self::AtticInsulationR38 => "Attic insulation R-38",
            Self::FillAtticCavity => "Fill attic joist cavity",
            Self::WallInsulation => "Wall cavity insulation",
            Self::FoundationWallInsulation => "Foundation wall insulation",
            Self::SillBoxInsulation => "Sill box insulation",
            Self::FloorInsulation => "Floor insulation",
            Self::WhiteRoofCoating => "White roof coating",
            Self::StormWindows => "Storm windows",
            Self::WindowReplacement => "Window replacement",
            Self::LowEWindowFilm => "Low-E window film",
            Self::WindowShading => "Window shading / awnings",
            Self::WindowSealing => "Window sealing",
            Self::StormDoors => "Storm doors",
            Self::DoorReplacement => "Door replacement",
            Self::SetbackThermostat => "Setback thermostat",
            Self::FurnaceTuneUp => "Furnace tune-up",
            Self::FurnaceReplacement => "Furnace replacement",
            Self::HighEfficiencyFurnace => "High-efficiency furnace",
            Self::BoilerTuneUp => "Boiler tune-up",
            Self::HighEfficiencyBoiler => "High-efficiency boiler",
            Self::VentDamper => "Automatic vent damper",
            Self::IntermittentIgnition => "Intermittent ignition device",
            Self::FlueDamper => "Flue damper",
            Self::SpaceHeaterReplacement => "Space heater replacement",
            Self::HeatPumpReplacement => "Heat pump replacement",
            Self::CentralAcReplacement => "Central AC replacement",
            Self::RoomAcReplacement => "Room AC replacement",
            Self::AcTuneUp => "AC tune-up",
            Self::EvaporativeCooler => "Evaporative cooler",
            Self::WholeHouseFan => "Whole-house fan",
            Self::WaterHeaterTankWrap => "Water heater tank wrap",
            Self::WaterHeaterPipeInsulation => "Water heater pipe insulation",
            Self::LowFlowShowerheads => "Low-flow showerheads",
            Self::WaterHeaterReplacement => "Water heater replacement",
            Self::LightingRetrofit => "Lighting retrofit",
            Self::RefrigeratorReplacement => "Refrigerator replacement",
            Self::ItemizedRepair => "Itemized repair",
        }
    }

    pub fn econ_category(&self) -> EconCategory {
        match self {
            Self::DuctSealing
            | Self::SetbackThermostat
            | Self::FurnaceTuneUp
            | Self::FurnaceReplacement
            | Self::HighEfficiencyFurnace
            | Self::BoilerTuneUp
            | Self::HighEfficiencyBoiler
            | Self::VentDamper
            | Self::IntermittentIgnition
            | Self::FlueDamper
            | Self::SpaceHeaterReplacement
            | Self::HeatPumpReplacement => EconCategory::HeatingSystem,
            Self::CentralAcReplacement
            | Self::RoomAcReplacement
            | Self::AcTuneUp
            | Self::EvaporativeCooler
            | Self::WholeHouseFan => EconCategory::CoolingSystem,
            Self::WaterHeaterTankWrap
            | Self::WaterHeaterPipeInsulation
            | Self::LowFlowShowerheads
            | Self::WaterHeaterReplacement => EconCategory::WaterHeating,
            Self::LightingRetrofit | Self::RefrigeratorReplacement => EconCategory::Baseload,
            Self::ItemizedRepair => EconCategory::Itemized,
            _ => EconCategory::Envelope,
        }
    }

    pub fn default_priority(&self) -> PriorityClass {
        match self {
            Self::DuctSealing => PriorityClass::DuctSeal,
            Self::InfiltrationReduction => PriorityClass::Infiltration,
            _ => PriorityClass::SirRanked,
        }
    }

    pub fn default_life_years(&self) -> f64 {
        match self {
            Self::DuctSealing | Self::InfiltrationReduction | Self::WindowSealing => 10.0,
            Self::AtticInsulationR11
            | Self::AtticInsulationR19
            | Self::AtticInsulationR30
            | Self::AtticInsulationR38
            | Self::FillAtticCavity
            | Self::WallInsulation
            | Self::FoundationWallInsulation
            | Self::SillBoxInsulation
            | Self::FloorInsulation => 20.0,
            Self::WhiteRoofCoating => 8.0,
            Self::StormWindows | Self::StormDoors => 15.0,
            Self::WindowReplacement | Self::DoorReplacement => 20.0,
            Self::LowEWindowFilm | Self::WindowShading => 10.0,
            Self::SetbackThermostat => 15.0,
            Self::FurnaceTuneUp | Self::BoilerTuneUp | Self::AcTuneUp => 3.0,
            Self::FurnaceReplacement | Self::HighEfficiencyFurnace => 18.0,
            Self::HighEfficiencyBoiler => 20.0,
            Self::VentDamper | Self::FlueDamper => 10.0,
            Self::IntermittentIgnition => 10.0,
            Self::SpaceHeaterReplacement => 15.0,
            Self::HeatPumpReplacement | Self::CentralAcReplacement => 15.0,
            Self::RoomAcReplacement => 12.0,
            Self::EvaporativeCooler => 12.0,
            Self::WholeHouseFan => 15.0,
            Self::WaterHeaterTankWrap => 7.0,
            Self::WaterHeaterPipeInsulation => 10.0,
            Self::LowFlowShowerheads => 10.0,
            Self::WaterHeaterReplacement => 12.0,
            Self::LightingRetrofit => 7.0,
            Self::RefrigeratorReplacement => 15.0,
            Self::ItemizedRepair => 10.0,
        }
    }
}

impl Display for MeasureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Error)]
#[error("unknown measure kind: {0}")]
pub struct MeasureParseError(pub String);

impl FromStr for MeasureKind {
    type Err = MeasureParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        MeasureKind::ALL
            .iter()
            .find(|kind| kind.as_slug() == normalized)
            .copied()
            .ok_or_else(|| MeasureParseError(s.to_string()))
    }
}

/// Economic category, which selects the re-derivation rule in the
/// cumulative interaction engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EconCategory {
    Envelope,
    HeatingSystem,
    CoolingSystem,
    WaterHeating,
    Baseload,
    Itemized,
}

impl Display for EconCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Envelope => "envelope",
            Self::HeatingSystem => "heating system",
            Self::CoolingSystem => "cooling system",
            Self::WaterHeating => "water heating",
            Self::Baseload => "baseload",
            Self::Itemized => "itemized",
        };
        write!(f, "{label}")
    }
}

/// Ranking tier that overrides pure SIR ordering. Priority strictly
/// dominates SIR in every sort the engine performs.
///
/// `Bottom` is the sentinel appended before sorting so no real record can
/// sort past the end of the list; it never appears on a real candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PriorityClass {
    Bottom,
    NpvOnly,
    SirRanked,
    Required,
    Infiltration,
    DuctSeal,
}

impl PriorityClass {
    /// Terminal classes are never (re)installed during the cumulative pass:
    /// duct sealing is accepted up-front, NPV-only records rank last and
    /// stay out of the package.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::DuctSeal | Self::NpvOnly)
    }

    /// Classes accepted regardless of their computed SIR.
    pub fn bypasses_sir_threshold(&self) -> bool {
        matches!(self, Self::DuctSeal | Self::Infiltration | Self::Required)
    }
}

impl Display for PriorityClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Bottom => "bottom",
            Self::NpvOnly => "npv-only",
            Self::SirRanked => "sir-ranked",
            Self::Required => "required",
            Self::Infiltration => "infiltration-first",
            Self::DuctSeal => "duct-seal-first",
        };
        write!(f, "{label}")
    }
}

/// Exclusion groups. Two kinds are mutually exclusive when any group
/// contains both; two candidate *records* conflict only when their kinds
/// are exclusive and they also share an affected component.
const ATTIC_GROUP: [MeasureKind; 5] = [
    MeasureKind::AtticInsulationR11,
    MeasureKind::AtticInsulationR19,
    MeasureKind::AtticInsulationR30,
    MeasureKind::AtticInsulationR38,
    MeasureKind::FillAtticCavity,
];

const WINDOW_GLAZING_GROUP: [MeasureKind; 3] = [
    MeasureKind::StormWindows,
    MeasureKind::WindowReplacement,
    MeasureKind::LowEWindowFilm,
];

// Replacement includes new glazing treatment, so shading conflicts with it
// but not with storm windows or sealing.
const WINDOW_SHADE_GROUP: [MeasureKind; 2] =
    [MeasureKind::WindowShading, MeasureKind::WindowReplacement];

const DOOR_GROUP: [MeasureKind; 2] = [MeasureKind::StormDoors, MeasureKind::DoorReplacement];

const HEATING_GROUP: [MeasureKind; 10] = [
    MeasureKind::FurnaceTuneUp,
    MeasureKind::FurnaceReplacement,
    MeasureKind::HighEfficiencyFurnace,
    MeasureKind::BoilerTuneUp,
    MeasureKind::HighEfficiencyBoiler,
    MeasureKind::VentDamper,
    MeasureKind::IntermittentIgnition,
    MeasureKind::FlueDamper,
    MeasureKind::SpaceHeaterReplacement,
    MeasureKind::HeatPumpReplacement,
];

const COOLING_GROUP: [MeasureKind; 5] = [
    MeasureKind::CentralAcReplacement,
    MeasureKind::RoomAcReplacement,
    MeasureKind::AcTuneUp,
    MeasureKind::EvaporativeCooler,
    MeasureKind::HeatPumpReplacement,
];

const WATER_TANK_GROUP: [MeasureKind; 2] = [
    MeasureKind::WaterHeaterTankWrap,
    MeasureKind::WaterHeaterReplacement,
];

const FOUNDATION_GROUP: [MeasureKind; 2] = [
    MeasureKind::FoundationWallInsulation,
    MeasureKind::SillBoxInsulation,
];

fn exclusion_groups() -> [&'static [MeasureKind]; 8] {
    [
        &ATTIC_GROUP,
        &WINDOW_GLAZING_GROUP,
        &WINDOW_SHADE_GROUP,
        &DOOR_GROUP,
        &HEATING_GROUP,
        &COOLING_GROUP,
        &WATER_TANK_GROUP,
        &FOUNDATION_GROUP,
    ]
}

/// Symmetric exclusion relation over measure kinds.
pub fn mutually_exclusive(a: MeasureKind, b: MeasureKind) -> bool {
    if a == b {
        return false;
    }
    exclusion_groups()
        .iter()
        .any(|group| group.contains(&a) && group.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusion_relation_is_symmetric() {
        for a in MeasureKind::ALL {
            for b in MeasureKind::ALL {
                assert_eq!(
                    mutually_exclusive(a, b),
                    mutually_exclusive(b, a),
                    "asymmetric exclusion for {a} / {b}"
                );
            }
        }
    }

    #[test]
    fn same_kind_is_never_self_exclusive() {
        for kind in MeasureKind::ALL {
            assert!(!mutually_exclusive(kind, kind));
        }
    }

    #[test]
    fn storm_windows_conflict_with_replacement_but_not_sealing() {
        assert!(mutually_exclusive(
            MeasureKind::StormWindows,
            MeasureKind::WindowReplacement
        ));
        assert!(!mutually_exclusive(
            MeasureKind::StormWindows,
            MeasureKind::WindowSealing
        ));
        assert!(mutually_exclusive(
            MeasureKind::WindowShading,
            MeasureKind::WindowReplacement
        ));
        assert!(!mutually_exclusive(
            MeasureKind::WindowShading,
            MeasureKind::StormWindows
        ));
    }

    #[test]
    fn priority_order_is_duct_seal_dominant() {
        assert!(PriorityClass::DuctSeal > PriorityClass::Infiltration);
        assert!(PriorityClass::Infiltration > PriorityClass::Required);
        assert!(PriorityClass::Required > PriorityClass::SirRanked);
        assert!(PriorityClass::SirRanked > PriorityClass::NpvOnly);
        assert!(PriorityClass::NpvOnly > PriorityClass::Bottom);
    }

    #[test]
    fn slugs_round_trip() {
        for kind in MeasureKind::ALL {
            let parsed: MeasureKind = kind.as_slug().parse().expect("slug should parse");
            assert_eq!(parsed, kind);
        }
        assert!("not_a_measure".parse::<MeasureKind>().is_err());
    }
}
