//! Water-heating measures. Savings are computed once against the demand
//! model and carried through interaction unchanged; hot-water use does
//! not interact with the thermal envelope.

use crate::catalog::MeasureKind;
use crate::dwelling::{DwellingState, WaterHeater};
use crate::economics::FuelKind;
use crate::error::AuditError;
use crate::measures::{build_candidate, Candidate, EvalContext, SavingsResult};

/// 8.34 lb/gal, 75 °F rise, 365 days, per million Btu.
const DEMAND_MMBTU_PER_GPD: f64 = 8.34 * 75.0 * 365.0 / 1e6;
const TANK_SURFACE_SQFT: f64 = 22.0;
const TANK_AMBIENT_DELTA_F: f64 = 55.0;
const WRAP_ADDED_R: f64 = 8.0;

/// Annual energy into the tank for the hot-water draw, MMBtu.
fn demand_energy(wh: &WaterHeater) -> f64 {
    wh.gallons_per_day * DEMAND_MMBTU_PER_GPD / wh.energy_factor
}

/// Annual standby loss through the tank shell, MMBtu.
fn standby_loss(tank_r: f64) -> f64 {
    TANK_SURFACE_SQFT * TANK_AMBIENT_DELTA_F * 8760.0 / tank_r.max(1.0) / 1e6
}

fn base(wh: &WaterHeater, mmbtu: f64) -> SavingsResult {
    SavingsResult {
        base_mmbtu: mmbtu.max(0.0),
        base_fuel: Some(wh.fuel),
        ..SavingsResult::default()
    }
}

fn savings_for(kind: MeasureKind, wh: &WaterHeater) -> Option<(SavingsResult, f64)> {
    match kind {
        MeasureKind::WaterHeaterTankWrap => {
            if wh.wrap_installed || wh.tank_r >= 8.0 {
                return None;
            }
            let saved = standby_loss(wh.tank_r) - standby_loss(wh.tank_r + WRAP_ADDED_R);
            Some((base(wh, saved), 85.0))
        }
        MeasureKind::WaterHeaterPipeInsulation => {
            if wh.pipes_insulated {
                return None;
            }
            Some((base(wh, 0.35), 45.0))
        }
        MeasureKind::LowFlowShowerheads => {
            if wh.low_flow_installed || wh.gallons_per_day <= 40.0 {
                return None;
            }
            // Showers are roughly half the draw; low-flow heads cut that
            // portion by a fifth.
            let saved = 0.11 * demand_energy(wh);
            Some((base(wh, saved), 35.0))
        }
        MeasureKind::WaterHeaterReplacement => {
            let new_ef = match wh.fuel {
                FuelKind::Electricity => 0.93,
                _ => 0.67,
            };
            if wh.energy_factor >= new_ef - 0.10 {
                return None;
            }
            let saved = demand_energy(wh) * (1.0 - wh.energy_factor / new_ef);
            Some((base(wh, saved), 980.0))
        }
        _ => None,
    }
}

pub fn evaluate(
    kind: MeasureKind,
    ctx: &EvalContext,
    out: &mut Vec<Candidate>,
) -> Result<(), AuditError> {
    let Some(wh) = ctx.dwelling.water_heater.as_ref() else {
        return Ok(());
    };
    let Some((savings, cost)) = savings_for(kind, wh) else {
        return Ok(());
    };
    out.push(build_candidate(
        kind,
        wh.id.clone(),
        vec![wh.id.clone()],
        savings,
        cost,
        0.0,
        ctx,
    )?);
    Ok(())
}

pub fn apply(cand: &Candidate, dwelling: &mut DwellingState) -> Result<(), AuditError> {
    let Some(wh) = dwelling.water_heater.as_mut() else {
        return Ok(());
    };
    match cand.kind {
        MeasureKind::WaterHeaterTankWrap => {
            wh.wrap_installed = true;
            wh.tank_r += WRAP_ADDED_R;
        }
        MeasureKind::WaterHeaterPipeInsulation => wh.pipes_insulated = true,
        MeasureKind::LowFlowShowerheads => {
            wh.low_flow_installed = true;
            wh.gallons_per_day *= 0.89;
        }
        MeasureKind::WaterHeaterReplacement => {
            wh.energy_factor = match wh.fuel {
                FuelKind::Electricity => 0.93,
                _ => 0.67,
            };
            wh.tank_r = wh.tank_r.max(12.0);
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dwelling::DwellingState;

    #[test]
    fn wrap_savings_shrink_with_better_tanks() {
        let dwelling = DwellingState::sample();
        let wh = dwelling.water_heater.as_ref().expect("sample has a tank");
        let (loose, _) = savings_for(MeasureKind::WaterHeaterTankWrap, wh).expect("applies");

        let mut tight = wh.clone();
        tight.tank_r = 7.0;
        let (snug, _) = savings_for(MeasureKind::WaterHeaterTankWrap, &tight).expect("applies");
        assert!(loose.base_mmbtu > snug.base_mmbtu);
    }

    #[test]
    fn replacement_skips_efficient_heaters() {
        let dwelling = DwellingState::sample();
        let mut wh = dwelling.water_heater.clone().expect("sample has a tank");
        wh.energy_factor = 0.65;
        assert!(savings_for(MeasureKind::WaterHeaterReplacement, &wh).is_none());
        wh.energy_factor = 0.50;
        assert!(savings_for(MeasureKind::WaterHeaterReplacement, &wh).is_some());
    }
}
