//! Heating- and cooling-system measures: duct sealing, thermostat and
//! combustion retrofits, and equipment replacement. Savings derive from
//! the running baseline snapshot, so re-derivation after earlier envelope
//! measures automatically sees the reduced loads: the equipment
//! substitution divides the *current* load by the candidate efficiency.

use crate::catalog::MeasureKind;
use crate::dwelling::{
    CoolingEquipment, DuctLocation, DwellingState, HeatingEquipment,
};
use crate::economics::FuelKind;
use crate::error::AuditError;
use crate::measures::{build_candidate, Candidate, EvalContext, SavingsResult};
use crate::simulation::SETBACK_FACTOR;

const DUCT_RECOVERY: f64 = 0.6;
const VENT_DAMPER_FRACTION: f64 = 0.035;
const FLUE_DAMPER_FRACTION: f64 = 0.025;
const PILOT_FRACTION: f64 = 0.02;
const PILOT_FIXED_MMBTU: f64 = 0.4;

fn is_combustion(fuel: FuelKind) -> bool {
    matches!(
        fuel,
        FuelKind::NaturalGas | FuelKind::Oil | FuelKind::Propane | FuelKind::Kerosene
    )
}

fn heat_only(mmbtu: f64) -> SavingsResult {
    thermal(mmbtu, 0.0)
}

fn cool_only(mmbtu: f64) -> SavingsResult {
    thermal(0.0, mmbtu)
}

fn thermal(heat_mmbtu: f64, cool_mmbtu: f64) -> SavingsResult {
    SavingsResult {
        heat_mmbtu: heat_mmbtu.max(0.0),
        cool_mmbtu: cool_mmbtu.max(0.0),
        ..SavingsResult::default()
    }
}

/// Savings from substituting a new seasonal heating efficiency against
/// the current load.
fn substituted_heat_savings(ctx: &EvalContext, new_efficiency: f64) -> f64 {
    ctx.snapshot.heat_energy_mmbtu - ctx.snapshot.heat_load_mmbtu / new_efficiency
}

fn substituted_cool_savings(ctx: &EvalContext, new_seer: f64) -> f64 {
    ctx.snapshot.cool_energy_mmbtu - ctx.snapshot.cool_load_mmbtu / (new_seer / 3.412)
}

/// Applicability + savings for one kind against the current state.
/// `None` means the measure no longer applies (already installed, wrong
/// equipment, or nothing to save).
fn savings_for(kind: MeasureKind, ctx: &EvalContext) -> Option<SavingsResult> {
    let heating = &ctx.dwelling.heating;
    let cooling = ctx.dwelling.cooling.as_ref();
    match kind {
        MeasureKind::DuctSealing => {
            let ducts = ctx.dwelling.ducts.as_ref()?;
            if ducts.sealed
                || ducts.location == DuctLocation::ConditionedSpace
                || ducts.supply_leakage_cfm < 50.0
            {
                return None;
            }
            let recovered = DUCT_RECOVERY * (ducts.supply_leakage_cfm / 1000.0).min(0.30);
            let heat = if heating.uses_ducts {
                ctx.snapshot.heat_energy_mmbtu * recovered
            } else {
                0.0
            };
            let cool = cooling
                .filter(|c| {
                    matches!(
                        c.equipment,
                        CoolingEquipment::CentralAc | CoolingEquipment::HeatPump
                    )
                })
                .map(|_| ctx.snapshot.cool_energy_mmbtu * recovered)
                .unwrap_or(0.0);
            Some(thermal(heat, cool))
        }
        MeasureKind::SetbackThermostat => {
            if heating.has_setback_thermostat
                || heating.equipment == HeatingEquipment::SpaceHeater
            {
                return None;
            }
            let saving = ctx.snapshot.heat_energy_mmbtu * (1.0 - SETBACK_FACTOR);
            Some(heat_only(saving))
        }
        MeasureKind::FurnaceTuneUp => {
            if heating.equipment != HeatingEquipment::Furnace
                || !is_combustion(heating.fuel)
                || heating.tuned_recently
                || heating.efficiency >= 0.78
            {
                return None;
            }
            let new_eff = (heating.efficiency + 0.05).min(0.78);
            Some(heat_only(substituted_heat_savings(ctx, new_eff)))
        }
        MeasureKind::FurnaceReplacement => {
            if heating.equipment != HeatingEquipment::Furnace
                || !is_combustion(heating.fuel)
                || heating.efficiency >= 0.70
            {
                return None;
            }
            Some(heat_only(substituted_heat_savings(ctx, 0.80)))
        }
        MeasureKind::HighEfficiencyFurnace => {
            if heating.equipment != HeatingEquipment::Furnace
                || !is_combustion(heating.fuel)
                || heating.efficiency >= 0.82
            {
                return None;
            }
            Some(heat_only(substituted_heat_savings(ctx, 0.93)))
        }
        MeasureKind::BoilerTuneUp => {
            if heating.equipment != HeatingEquipment::Boiler
                || !is_combustion(heating.fuel)
                || heating.tuned_recently
                || heating.efficiency >= 0.78
            {
                return None;
            }
            let new_eff = (heating.efficiency + 0.04).min(0.78);
            Some(heat_only(substituted_heat_savings(ctx, new_eff)))
        }
        MeasureKind::HighEfficiencyBoiler => {
            if heating.equipment != HeatingEquipment::Boiler
                || !is_combustion(heating.fuel)
                || heating.efficiency >= 0.80
            {
                return None;
            }
            Some(heat_only(substituted_heat_savings(ctx, 0.87)))
        }
        MeasureKind::VentDamper => {
            if !is_combustion(heating.fuel)
                || heating.has_vent_damper
                || !matches!(
                    heating.equipment,
                    HeatingEquipment::Furnace | HeatingEquipment::Boiler
                )
            {
                return None;
            }
            Some(heat_only(ctx.snapshot.heat_energy_mmbtu * VENT_DAMPER_FRACTION))
        }
        MeasureKind::IntermittentIgnition => {
            if !is_combustion(heating.fuel) || !heating.has_standing_pilot {
                return None;
            }
            Some(heat_only(
                ctx.snapshot.heat_energy_mmbtu * PILOT_FRACTION + PILOT_FIXED_MMBTU,
            ))
        }
        MeasureKind::FlueDamper => {
            if !is_combustion(heating.fuel)
                || heating.has_flue_damper
                || !matches!(
                    heating.equipment,
                    HeatingEquipment::Furnace | HeatingEquipment::Boiler
                )
            {
                return None;
            }
            Some(heat_only(ctx.snapshot.heat_energy_mmbtu * FLUE_DAMPER_FRACTION))
        }
        MeasureKind::SpaceHeaterReplacement => {
            if heating.equipment != HeatingEquipment::SpaceHeater || heating.efficiency >= 0.65 {
                return None;
            }
            Some(heat_only(substituted_heat_savings(ctx, 0.78)))
        }
        MeasureKind::HeatPumpReplacement => {
            let eligible = match heating.equipment {
                HeatingEquipment::ElectricResistance => true,
                HeatingEquipment::HeatPump => heating.efficiency < 1.8,
                _ => false,
            };
            if !eligible {
                return None;
            }
            let heat = substituted_heat_savings(ctx, 2.4);
            let cool = cooling
                .filter(|c| c.seer < 13.0)
                .map(|_| substituted_cool_savings(ctx, 14.0))
                .unwrap_or(0.0);
            Some(thermal(heat, cool))
        }
        MeasureKind::CentralAcReplacement => {
            let system = cooling?;
            if system.equipment != CoolingEquipment::CentralAc || system.seer >= 10.0 {
                return None;
            }
            Some(cool_only(substituted_cool_savings(ctx, 14.0)))
        }
        MeasureKind::RoomAcReplacement => {
            let system = cooling?;
            if system.equipment != CoolingEquipment::RoomAc || system.seer >= 9.0 {
                return None;
            }
            Some(cool_only(substituted_cool_savings(ctx, 10.8)))
        }
        MeasureKind::AcTuneUp => {
            let system = cooling?;
            if system.tuned_recently
                || !matches!(
                    system.equipment,
                    CoolingEquipment::CentralAc
                        | CoolingEquipment::RoomAc
                        | CoolingEquipment::HeatPump
                )
            {
                return None;
            }
            Some(cool_only(substituted_cool_savings(ctx, system.seer * 1.1)))
        }
        MeasureKind::EvaporativeCooler => {
            let system = cooling?;
            if system.equipment == CoolingEquipment::Evaporative
                || ctx.climate.annual_cdd() < 2200.0
            {
                return None;
            }
            Some(cool_only(0.5 * ctx.snapshot.cool_energy_mmbtu))
        }
        MeasureKind::WholeHouseFan => {
            let system = cooling?;
            if system.has_whole_house_fan || ctx.climate.annual_cdd() < 800.0 {
                return None;
            }
            Some(cool_only(0.18 * ctx.snapshot.cool_energy_mmbtu))
        }
        _ => None,
    }
}

fn cost_for(kind: MeasureKind, ctx: &EvalContext) -> f64 {
    match kind {
        MeasureKind::DuctSealing => ctx
            .dwelling
            .ducts
            .as_ref()
            .map(|d| d.seal_cost)
            .unwrap_or(0.0),
        MeasureKind::SetbackThermostat => 130.0,
        MeasureKind::FurnaceTuneUp => 160.0,
        MeasureKind::FurnaceReplacement => 2600.0,
        MeasureKind::HighEfficiencyFurnace => 3800.0,
        MeasureKind::BoilerTuneUp => 180.0,
        MeasureKind::HighEfficiencyBoiler => 4600.0,
        MeasureKind::VentDamper => 260.0,
        MeasureKind::IntermittentIgnition => 220.0,
        MeasureKind::FlueDamper => 320.0,
        MeasureKind::SpaceHeaterReplacement => 1300.0,
        MeasureKind::HeatPumpReplacement => 5800.0,
        MeasureKind::CentralAcReplacement => 3400.0,
        MeasureKind::RoomAcReplacement => {
            let units = ctx
                .dwelling
                .cooling
                .as_ref()
                .map(|c| c.unit_count)
                .unwrap_or(1);
            760.0 * f64::from(units)
        }
        MeasureKind::AcTuneUp => 130.0,
        MeasureKind::EvaporativeCooler => 950.0,
        MeasureKind::WholeHouseFan => 650.0,
        _ => 0.0,
    }
}

fn components_for(kind: MeasureKind, ctx: &EvalContext) -> Vec<String> {
    let heating_id = ctx.dwelling.heating.id.clone();
    let cooling_id = ctx.dwelling.cooling.as_ref().map(|c| c.id.clone());
    match kind {
        MeasureKind::DuctSealing => ctx
            .dwelling
            .ducts
            .as_ref()
            .map(|d| vec![d.id.clone()])
            .unwrap_or_default(),
        MeasureKind::HeatPumpReplacement => {
            let mut ids = vec![heating_id];
            ids.extend(cooling_id);
            ids
        }
        MeasureKind::CentralAcReplacement
        | MeasureKind::RoomAcReplacement
        | MeasureKind::AcTuneUp
        | MeasureKind::EvaporativeCooler
        | MeasureKind::WholeHouseFan => cooling_id.map(|id| vec![id]).unwrap_or_default(),
        _ => vec![heating_id],
    }
}

pub fn evaluate(
    kind: MeasureKind,
    ctx: &EvalContext,
    out: &mut Vec<Candidate>,
) -> Result<(), AuditError> {
    let Some(savings) = savings_for(kind, ctx) else {
        return Ok(());
    };
    let components = components_for(kind, ctx);
    let detail = components.first().cloned().unwrap_or_default();
    out.push(build_candidate(
        kind,
        detail,
        components,
        savings,
        cost_for(kind, ctx),
        0.0,
        ctx,
    )?);
    Ok(())
}

pub fn rederive_savings(cand: &Candidate, ctx: &EvalContext) -> SavingsResult {
    savings_for(cand.kind, ctx).unwrap_or_default()
}

pub fn apply(cand: &Candidate, dwelling: &mut DwellingState) -> Result<(), AuditError> {
    match cand.kind {
        MeasureKind::DuctSealing => {
            if let Some(ducts) = dwelling.ducts.as_mut() {
                ducts.sealed = true;
                ducts.supply_leakage_cfm *= 0.4;
            }
        }
        MeasureKind::SetbackThermostat => dwelling.heating.has_setback_thermostat = true,
        MeasureKind::FurnaceTuneUp => {
            dwelling.heating.efficiency = (dwelling.heating.efficiency + 0.05).min(0.78);
            dwelling.heating.tuned_recently = true;
        }
        MeasureKind::FurnaceReplacement => {
            dwelling.heating.efficiency = 0.80;
            dwelling.heating.has_standing_pilot = false;
            dwelling.heating.tuned_recently = true;
        }
        MeasureKind::HighEfficiencyFurnace => {
            dwelling.heating.efficiency = 0.93;
            dwelling.heating.has_standing_pilot = false;
            dwelling.heating.tuned_recently = true;
        }
        MeasureKind::BoilerTuneUp => {
            dwelling.heating.efficiency = (dwelling.heating.efficiency + 0.04).min(0.78);
            dwelling.heating.tuned_recently = true;
        }
        MeasureKind::HighEfficiencyBoiler => {
            dwelling.heating.efficiency = 0.87;
            dwelling.heating.has_standing_pilot = false;
            dwelling.heating.tuned_recently = true;
        }
        MeasureKind::VentDamper => dwelling.heating.has_vent_damper = true,
        MeasureKind::IntermittentIgnition => dwelling.heating.has_standing_pilot = false,
        MeasureKind::FlueDamper => dwelling.heating.has_flue_damper = true,
        MeasureKind::SpaceHeaterReplacement => {
            dwelling.heating.efficiency = 0.78;
            dwelling.heating.tuned_recently = true;
        }
        MeasureKind::HeatPumpReplacement => {
            dwelling.heating.equipment = HeatingEquipment::HeatPump;
            dwelling.heating.efficiency = 2.4;
            dwelling.heating.fuel = FuelKind::Electricity;
            if let Some(cooling) = dwelling.cooling.as_mut() {
                cooling.equipment = CoolingEquipment::HeatPump;
                cooling.seer = cooling.seer.max(14.0);
                cooling.tuned_recently = true;
            }
        }
        MeasureKind::CentralAcReplacement => {
            if let Some(cooling) = dwelling.cooling.as_mut() {
                cooling.seer = 14.0;
                cooling.tuned_recently = true;
            }
        }
        MeasureKind::RoomAcReplacement => {
            if let Some(cooling) = dwelling.cooling.as_mut() {
                cooling.seer = 10.8;
                cooling.tuned_recently = true;
            }
        }
        MeasureKind::AcTuneUp => {
            if let Some(cooling) = dwelling.cooling.as_mut() {
                cooling.seer *= 1.1;
                cooling.tuned_recently = true;
            }
        }
        MeasureKind::EvaporativeCooler => {
            if let Some(cooling) = dwelling.cooling.as_mut() {
                cooling.equipment = CoolingEquipment::Evaporative;
                cooling.seer = cooling.seer.max(28.0);
            }
        }
        MeasureKind::WholeHouseFan => {
            if let Some(cooling) = dwelling.cooling.as_mut() {
                cooling.has_whole_house_fan = true;
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MeasureParams;
    use crate::dwelling::DwellingState;
    use crate::economics::Economics;
    use crate::measures::CalibrationFactors;
    use crate::simulation::simulate;
    use crate::weather::Climate;

    fn fixture() -> (DwellingState, Climate, Economics, MeasureParams) {
        (
            DwellingState::sample(),
            Climate::default_normals(),
            Economics::default(),
            MeasureParams::default(),
        )
    }

    #[test]
    fn duct_sealing_saves_both_end_uses() {
        let (dwelling, climate, econ, params) = fixture();
        let snapshot = simulate(&dwelling, &climate).expect("simulate");
        let ctx = EvalContext {
            dwelling: &dwelling,
            climate: &climate,
            econ: &econ,
            snapshot: &snapshot,
            factors: CalibrationFactors::default(),
            params: &params,
        };
        let savings = savings_for(MeasureKind::DuctSealing, &ctx).expect("applicable");
        assert!(savings.heat_mmbtu > 0.0);
        assert!(savings.cool_mmbtu > 0.0);
    }

    #[test]
    fn furnace_replacement_beats_tune_up_on_savings() {
        let (dwelling, climate, econ, params) = fixture();
        let snapshot = simulate(&dwelling, &climate).expect("simulate");
        let ctx = EvalContext {
            dwelling: &dwelling,
            climate: &climate,
            econ: &econ,
            snapshot: &snapshot,
            factors: CalibrationFactors::default(),
            params: &params,
        };
        let tune = savings_for(MeasureKind::FurnaceTuneUp, &ctx).expect("tune-up applies");
        let replace =
            savings_for(MeasureKind::HighEfficiencyFurnace, &ctx).expect("replacement applies");
        assert!(replace.heat_mmbtu > tune.heat_mmbtu);
    }

    #[test]
    fn tune_up_stops_applying_after_replacement() {
        let (mut dwelling, climate, econ, params) = fixture();
        dwelling.heating.efficiency = 0.93;
        dwelling.heating.tuned_recently = true;
        let snapshot = simulate(&dwelling, &climate).expect("simulate");
        let ctx = EvalContext {
            dwelling: &dwelling,
            climate: &climate,
            econ: &econ,
            snapshot: &snapshot,
            factors: CalibrationFactors::default(),
            params: &params,
        };
        assert!(savings_for(MeasureKind::FurnaceTuneUp, &ctx).is_none());
        assert!(savings_for(MeasureKind::HighEfficiencyFurnace, &ctx).is_none());
    }

    #[test]
    fn heat_pump_requires_electric_heat() {
        let (dwelling, climate, econ, params) = fixture();
        let snapshot = simulate(&dwelling, &climate).expect("simulate");
        let ctx = EvalContext {
            dwelling: &dwelling,
            climate: &climate,
            econ: &econ,
            snapshot: &snapshot,
            factors: CalibrationFactors::default(),
            params: &params,
        };
        // Sample dwelling heats with gas; no fuel-switching measures.
        assert!(savings_for(MeasureKind::HeatPumpReplacement, &ctx).is_none());
    }
}
