//! Window and door measures. Economically these are envelope measures
//! (UA and solar-gain deltas), evaluated one candidate per window or door
//! record.

use crate::catalog::MeasureKind;
use crate::dwelling::{Door, DoorCondition, DwellingState, Glazing, Leakiness, Window};
use crate::error::AuditError;
use crate::measures::envelope::{thermal_savings, uniform};
use crate::measures::{build_candidate, Candidate, EvalContext, SavingsResult};
use crate::simulation;

/// Leakage attributed to one loose window unit, CFM50.
const LOOSE_WINDOW_CFM50: f64 = 15.0;
const SEAL_RECOVERY: f64 = 0.6;

pub fn evaluate(
    kind: MeasureKind,
    ctx: &EvalContext,
    out: &mut Vec<Candidate>,
) -> Result<(), AuditError> {
    match kind {
        MeasureKind::StormWindows
        | MeasureKind::WindowReplacement
        | MeasureKind::LowEWindowFilm
        | MeasureKind::WindowShading
        | MeasureKind::WindowSealing => {
            for window in &ctx.dwelling.windows {
                if let Some((savings, cost, magnitude)) = window_savings(kind, window, ctx) {
                    out.push(build_candidate(
                        kind,
                        window.id.clone(),
                        vec![window.id.clone()],
                        savings,
                        cost,
                        magnitude,
                        ctx,
                    )?);
                }
            }
            Ok(())
        }
        MeasureKind::StormDoors | MeasureKind::DoorReplacement => {
            for door in &ctx.dwelling.doors {
                if let Some((savings, cost)) = door_savings(kind, door, ctx) {
                    out.push(build_candidate(
                        kind,
                        door.id.clone(),
                        vec![door.id.clone()],
                        savings,
                        cost,
                        0.0,
                        ctx,
                    )?);
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn window_savings(
    kind: MeasureKind,
    window: &Window,
    ctx: &EvalContext,
) -> Option<(SavingsResult, f64, f64)> {
    match kind {
        MeasureKind::StormWindows => {
            if window.glazing != Glazing::Single || window.has_storm {
                return None;
            }
            let mut improved = window.clone();
            improved.has_storm = true;
            let ua = window.total_area() * (window.u_value() - improved.u_value());
            let savings = thermal_savings(ctx, &uniform(ua), &[0.0; 12]);
            let cost = 72.0 * f64::from(window.count);
            Some((savings, cost, 0.0))
        }
        MeasureKind::WindowReplacement => {
            if window.glazing != Glazing::Single {
                return None;
            }
            let mut improved = window.clone();
            improved.glazing = Glazing::Double;
            improved.has_storm = false;
            improved.low_e = true;
            let ua = window.total_area() * (window.u_value() - improved.u_value());
            let free = free_heat_reduction(window, &improved, ctx);
            let savings = thermal_savings(ctx, &uniform(ua), &free);
            let cost = 470.0 * f64::from(window.count);
            Some((savings, cost, 0.0))
        }
        MeasureKind::LowEWindowFilm => {
            if window.low_e || ctx.climate.annual_cdd() < 1200.0 {
                return None;
            }
            let mut improved = window.clone();
            improved.low_e = true;
            let ua = window.total_area() * (window.u_value() - improved.u_value());
            let free = free_heat_reduction(window, &improved, ctx);
            let savings = thermal_savings(ctx, &uniform(ua), &free);
            let cost = 3.5 * window.total_area();
            Some((savings, cost, 0.0))
        }
        MeasureKind::WindowShading => {
            if window.shaded || window.solar_fraction < 0.5 || ctx.climate.annual_cdd() < 1200.0 {
                return None;
            }
            let mut improved = window.clone();
            improved.shaded = true;
            // Awnings are a cooling-season treatment; no heating penalty
            // is charged for the shoulder months.
            let mut free = free_heat_reduction(window, &improved, ctx);
            for month in 0..12 {
                if ctx.climate.cdd65[month] <= 0.0 {
                    free[month] = 0.0;
                }
            }
            let savings = thermal_savings(ctx, &[0.0; 12], &free);
            let cost = 9.0 * window.total_area();
            Some((savings, cost, 0.0))
        }
        MeasureKind::WindowSealing => {
            if window.leakiness != Leakiness::Loose {
                return None;
            }
            let reduction = LOOSE_WINDOW_CFM50 * f64::from(window.count) * SEAL_RECOVERY;
            let ua = simulation::infiltration_ua(reduction);
            let savings = thermal_savings(ctx, &uniform(ua), &[0.0; 12]);
            let cost = 14.0 * f64::from(window.count);
            Some((savings, cost, reduction))
        }
        _ => None,
    }
}

/// Monthly free-heat lost by moving from `before` to `after` glazing,
/// MMBtu (positive = less solar gain).
fn free_heat_reduction(before: &Window, after: &Window, ctx: &EvalContext) -> [f64; 12] {
    let mut out = [0.0; 12];
    let area = before.total_area() * before.solar_fraction;
    let delta_t = before.solar_transmittance() - after.solar_transmittance();
    for month in 0..12 {
        out[month] = area * delta_t * ctx.climate.solar_kbtu_per_sqft[month] / 1000.0;
    }
    out
}

fn door_savings(kind: MeasureKind, door: &Door, ctx: &EvalContext) -> Option<(SavingsResult, f64)> {
    match kind {
        MeasureKind::StormDoors => {
            if door.has_storm || door.condition == DoorCondition::Poor {
                return None;
            }
            let mut improved = door.clone();
            improved.has_storm = true;
            let ua = door.total_area() * (door.u_value() - improved.u_value());
            let savings = thermal_savings(ctx, &uniform(ua), &[0.0; 12]);
            Some((savings, 190.0 * f64::from(door.count)))
        }
        MeasureKind::DoorReplacement => {
            if door.condition != DoorCondition::Poor {
                return None;
            }
            let mut improved = door.clone();
            improved.condition = DoorCondition::Good;
            let conduction = door.total_area() * (door.u_value() - improved.u_value());
            // A poor door leaks as well as conducts.
            let leakage = simulation::infiltration_ua(10.0 * f64::from(door.count));
            let savings = thermal_savings(ctx, &uniform(conduction + leakage), &[0.0; 12]);
            Some((savings, 360.0 * f64::from(door.count)))
        }
        _ => None,
    }
}

pub fn rederive_savings(cand: &Candidate, ctx: &EvalContext) -> SavingsResult {
    match cand.kind {
        MeasureKind::StormWindows
        | MeasureKind::WindowReplacement
        | MeasureKind::LowEWindowFilm
        | MeasureKind::WindowShading
        | MeasureKind::WindowSealing => cand
            .components
            .first()
            .and_then(|id| ctx.dwelling.window(id))
            .and_then(|window| window_savings(cand.kind, window, ctx))
            .map(|(savings, _, _)| savings)
            .unwrap_or_default(),
        MeasureKind::StormDoors | MeasureKind::DoorReplacement => cand
            .components
            .first()
            .and_then(|id| ctx.dwelling.doors.iter().find(|d| &d.id == id))
            .and_then(|door| door_savings(cand.kind, door, ctx))
            .map(|(savings, _)| savings)
            .unwrap_or_default(),
        _ => SavingsResult::default(),
    }
}

pub fn apply(cand: &Candidate, dwelling: &mut DwellingState) -> Result<(), AuditError> {
    for id in &cand.components {
        match cand.kind {
            MeasureKind::StormWindows => {
                if let Some(window) = dwelling.window_mut(id) {
                    window.has_storm = true;
                }
            }
            MeasureKind::WindowReplacement => {
                if let Some(window) = dwelling.window_mut(id) {
                    window.glazing = Glazing::Double;
                    window.has_storm = false;
                    window.low_e = true;
                    window.leakiness = Leakiness::Tight;
                }
            }
            MeasureKind::LowEWindowFilm => {
                if let Some(window) = dwelling.window_mut(id) {
                    window.low_e = true;
                }
            }
            MeasureKind::WindowShading => {
                if let Some(window) = dwelling.window_mut(id) {
                    window.shaded = true;
                }
            }
            MeasureKind::WindowSealing => {
                if let Some(window) = dwelling.window_mut(id) {
                    window.leakiness = Leakiness::Average;
                }
                dwelling.infiltration_cfm50 =
                    (dwelling.infiltration_cfm50 - cand.magnitude).max(0.0);
            }
            MeasureKind::StormDoors => {
                if let Some(door) = dwelling.door_mut(id) {
                    door.has_storm = true;
                }
            }
            MeasureKind::DoorReplacement => {
                if let Some(door) = dwelling.door_mut(id) {
                    door.condition = DoorCondition::Good;
                }
            }
            _ => {}
        }
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

    #[test]
    fn storm_windows_and_replacement_target_the_same_components() {
        let dwelling = DwellingState::sample();
        let climate = Climate::default_normals();
        let econ = Economics::default();
        let params = MeasureParams::default();
        let snapshot = simulate(&dwelling, &climate).expect("simulate");
        let ctx = EvalContext {
            dwelling: &dwelling,
            climate: &climate,
            econ: &econ,
            snapshot: &snapshot,
            factors: CalibrationFactors::default(),
            params: &params,
        };

        let mut storms = Vec::new();
        let mut replacements = Vec::new();
        evaluate(MeasureKind::StormWindows, &ctx, &mut storms).expect("evaluate");
        evaluate(MeasureKind::WindowReplacement, &ctx, &mut replacements).expect("evaluate");

        assert_eq!(storms.len(), 2);
        assert_eq!(replacements.len(), 2);
        assert!(storms[0].shares_component(&replacements[0]));
        // Storms cost far less for a comparable UA improvement, so their
        // SIR should dominate.
        assert!(storms[0].sir > replacements[0].sir);
    }

    #[test]
    fn sealing_applies_to_loose_windows_only() {
        let dwelling = DwellingState::sample();
        let climate = Climate::default_normals();
        let econ = Economics::default();
        let params = MeasureParams::default();
        let snapshot = simulate(&dwelling, &climate).expect("simulate");
        let ctx = EvalContext {
            dwelling: &dwelling,
            climate: &climate,
            econ: &econ,
            snapshot: &snapshot,
            factors: CalibrationFactors::default(),
            params: &params,
        };

        let mut out = Vec::new();
        evaluate(MeasureKind::WindowSealing, &ctx, &mut out).expect("evaluate");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].components, vec!["win-south".to_string()]);
    }
}
