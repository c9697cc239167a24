//! Envelope measures: attic, wall, foundation and floor insulation,
//! infiltration reduction, and roof coating. All of them reduce to a
//! monthly UA (and occasionally free-heat) delta priced through the
//! incremental load form.

use tracing::warn;

use crate::catalog::MeasureKind;
use crate::dwelling::{AtticKind, DwellingState, FoundationKind, Wall};
use crate::error::AuditError;
use crate::measures::{build_candidate, Candidate, EvalContext, SavingsResult};
use crate::simulation::{self, GROUND_COUPLING, ROOF_COATING_FACTOR};

const UNINSULATED_SILL_R: f64 = 2.5;
const INSULATED_SILL_R: f64 = 19.0;
const WALL_FILL_CAVITY_R: f64 = 13.0;

/// Convert a UA / free-heat delta into end-use energy savings against the
/// current equipment, with billing-calibration factors folded in.
pub(crate) fn thermal_savings(
    ctx: &EvalContext,
    ua_delta: &[f64; 12],
    free_heat_delta: &[f64; 12],
) -> SavingsResult {
    let delta = simulation::load_delta(ctx.climate, ua_delta, free_heat_delta);
    let heat_mmbtu = delta.heat_mmbtu / ctx.dwelling.heating.efficiency * ctx.factors.heating;
    let cool_mmbtu = match &ctx.dwelling.cooling {
        Some(cooling) => {
            delta.cool_mmbtu * cooling.floor_fraction_served / (cooling.seer / 3.412)
                * ctx.factors.cooling
        }
        None => 0.0,
    };
    SavingsResult {
        heat_mmbtu,
        cool_mmbtu,
        ..SavingsResult::default()
    }
}

pub(crate) fn uniform(ua: f64) -> [f64; 12] {
    [ua; 12]
}

pub fn evaluate(
    kind: MeasureKind,
    ctx: &EvalContext,
    out: &mut Vec<Candidate>,
    notes: &mut Vec<String>,
) -> Result<(), AuditError> {
    match kind {
        MeasureKind::InfiltrationReduction => infiltration(ctx, out, notes),
        MeasureKind::AtticInsulationR11
        | MeasureKind::AtticInsulationR19
        | MeasureKind::AtticInsulationR30
        | MeasureKind::AtticInsulationR38 => attic_blown(kind, ctx, out),
        MeasureKind::FillAtticCavity => attic_cavity_fill(ctx, out),
        MeasureKind::WallInsulation => wall_insulation(ctx, out),
        MeasureKind::FoundationWallInsulation => foundation_wall(ctx, out),
        MeasureKind::SillBoxInsulation => sill_box(ctx, out),
        MeasureKind::FloorInsulation => floor_insulation(ctx, out),
        MeasureKind::WhiteRoofCoating => white_roof(ctx, out),
        _ => Ok(()),
    }
}

fn added_r_for(kind: MeasureKind) -> f64 {
    match kind {
        MeasureKind::AtticInsulationR11 => 11.0,
        MeasureKind::AtticInsulationR19 => 19.0,
        MeasureKind::AtticInsulationR30 => 30.0,
        MeasureKind::AtticInsulationR38 => 38.0,
        _ => 0.0,
    }
}

fn attic_cost_rate(kind: MeasureKind) -> f64 {
    match kind {
        MeasureKind::AtticInsulationR11 => 0.55,
        MeasureKind::AtticInsulationR19 => 0.80,
        MeasureKind::AtticInsulationR30 => 1.10,
        MeasureKind::AtticInsulationR38 => 1.30,
        _ => 0.0,
    }
}

fn attic_ua_delta(area: f64, existing_r: f64, added_r: f64) -> f64 {
    area / (existing_r + 2.0) - area / (existing_r + added_r + 2.0)
}

fn attic_blown(
    kind: MeasureKind,
    ctx: &EvalContext,
    out: &mut Vec<Candidate>,
) -> Result<(), AuditError> {
    let added = added_r_for(kind);
    for attic in &ctx.dwelling.attics {
        if !matches!(attic.kind, AtticKind::Unfloored | AtticKind::Kneewall) {
            continue;
        }
        if attic.existing_r >= 30.0 {
            continue;
        }
        let ua = attic_ua_delta(attic.area_sqft, attic.existing_r, added);
        let savings = thermal_savings(ctx, &uniform(ua), &[0.0; 12]);
        let cost = 100.0 + attic_cost_rate(kind) * attic.area_sqft;
        out.push(build_candidate(
            kind,
            attic.id.clone(),
            vec![attic.id.clone()],
            savings,
            cost,
            added,
            ctx,
        )?);
    }
    Ok(())
}

fn attic_cavity_fill(ctx: &EvalContext, out: &mut Vec<Candidate>) -> Result<(), AuditError> {
    for attic in &ctx.dwelling.attics {
        if attic.kind != AtticKind::Floored || attic.existing_r >= 6.0 {
            continue;
        }
        let added = 11.0 - attic.existing_r;
        let ua = attic_ua_delta(attic.area_sqft, attic.existing_r, added);
        let savings = thermal_savings(ctx, &uniform(ua), &[0.0; 12]);
        let cost = 100.0 + 0.60 * attic.area_sqft;
        out.push(build_candidate(
            MeasureKind::FillAtticCavity,
            attic.id.clone(),
            vec![attic.id.clone()],
            savings,
            cost,
            added,
            ctx,
        )?);
    }
    Ok(())
}

/// Walls sharing a measure-group number are evaluated as one measure
/// instance; ungrouped walls stand alone.
fn wall_groups(dwelling: &DwellingState) -> Vec<Vec<&Wall>> {
    let mut grouped: Vec<(Option<u32>, Vec<&Wall>)> = Vec::new();
    for wall in dwelling.walls.iter().filter(|w| w.cavity_r < 4.0) {
        match wall.measure_group {
            Some(group) => {
                if let Some(entry) = grouped
                    .iter_mut()
                    .find(|(key, _)| *key == Some(group))
                {
                    entry.1.push(wall);
                } else {
                    grouped.push((Some(group), vec![wall]));
                }
            }
            None => grouped.push((None, vec![wall])),
        }
    }
    grouped.into_iter().map(|(_, walls)| walls).collect()
}

fn wall_group_savings(ctx: &EvalContext, walls: &[&Wall]) -> SavingsResult {
    let ua: f64 = walls
        .iter()
        .map(|w| w.area_sqft / w.effective_r() - w.area_sqft / (4.0 + WALL_FILL_CAVITY_R))
        .sum();
    thermal_savings(ctx, &uniform(ua), &[0.0; 12])
}

fn wall_insulation(ctx: &EvalContext, out: &mut Vec<Candidate>) -> Result<(), AuditError> {
    for walls in wall_groups(ctx.dwelling) {
        let area: f64 = walls.iter().map(|w| w.area_sqft).sum();
        let savings = wall_group_savings(ctx, &walls);
        let cost = 90.0 + 1.25 * area;
        let ids: Vec<String> = walls.iter().map(|w| w.id.clone()).collect();
        let detail = if ids.len() == 1 {
            ids[0].clone()
        } else {
            format!("{} wall segments", ids.len())
        };
        out.push(build_candidate(
            MeasureKind::WallInsulation,
            detail,
            ids,
            savings,
            cost,
            WALL_FILL_CAVITY_R,
            ctx,
        )?);
    }
    Ok(())
}

fn foundation_wall(ctx: &EvalContext, out: &mut Vec<Candidate>) -> Result<(), AuditError> {
    for foundation in &ctx.dwelling.foundations {
        if !matches!(
            foundation.kind,
            FoundationKind::Conditioned | FoundationKind::Unconditioned
        ) || foundation.wall_r >= 5.0
        {
            continue;
        }
        let ua = GROUND_COUPLING
            * (foundation.wall_area_sqft / (foundation.wall_r + 2.0)
                - foundation.wall_area_sqft / (foundation.wall_r + 11.0 + 2.0));
        let savings = thermal_savings(ctx, &uniform(ua), &[0.0; 12]);
        let cost = 1.10 * foundation.wall_area_sqft;
        out.push(build_candidate(
            MeasureKind::FoundationWallInsulation,
            foundation.id.clone(),
            vec![foundation.id.clone()],
            savings,
            cost,
            11.0,
            ctx,
        )?);
    }
    Ok(())
}

fn sill_box(ctx: &EvalContext, out: &mut Vec<Candidate>) -> Result<(), AuditError> {
    for foundation in &ctx.dwelling.foundations {
        if foundation.sill_insulated
            || !matches!(
                foundation.kind,
                FoundationKind::Conditioned | FoundationKind::Unconditioned
            )
        {
            continue;
        }
        let area = foundation.sill_perimeter_ft * 1.0;
        let ua = area / UNINSULATED_SILL_R - area / INSULATED_SILL_R;
        let savings = thermal_savings(ctx, &uniform(ua), &[0.0; 12]);
        let cost = 2.2 * foundation.sill_perimeter_ft;
        out.push(build_candidate(
            MeasureKind::SillBoxInsulation,
            foundation.id.clone(),
            vec![foundation.id.clone()],
            savings,
            cost,
            INSULATED_SILL_R,
            ctx,
        )?);
    }
    Ok(())
}

fn floor_insulation(ctx: &EvalContext, out: &mut Vec<Candidate>) -> Result<(), AuditError> {
    for foundation in &ctx.dwelling.foundations {
        if foundation.kind != FoundationKind::Vented || foundation.floor_r >= 5.0 {
            continue;
        }
        let ua = foundation.floor_area_sqft / (foundation.floor_r + 3.0)
            - foundation.floor_area_sqft / (foundation.floor_r + 19.0 + 3.0);
        let savings = thermal_savings(ctx, &uniform(ua), &[0.0; 12]);
        let cost = 1.0 * foundation.floor_area_sqft;
        out.push(build_candidate(
            MeasureKind::FloorInsulation,
            foundation.id.clone(),
            vec![foundation.id.clone()],
            savings,
            cost,
            19.0,
            ctx,
        )?);
    }
    Ok(())
}

fn white_roof(ctx: &EvalContext, out: &mut Vec<Candidate>) -> Result<(), AuditError> {
    if ctx.climate.annual_cdd() < 1500.0 {
        return Ok(());
    }
    for attic in &ctx.dwelling.attics {
        if attic.reflective_coating {
            continue;
        }
        // Cooling-dominated months only; the coating has no useful effect
        // on the heating balance at this level of model.
        let ua = ROOF_COATING_FACTOR * attic.area_sqft / (attic.existing_r + 2.0);
        let mut ua_delta = [0.0; 12];
        for month in 0..12 {
            if ctx.climate.cdd65[month] > ctx.climate.hdd65[month] {
                ua_delta[month] = ua;
            }
        }
        let savings = thermal_savings(ctx, &ua_delta, &[0.0; 12]);
        let cost = 0.75 * attic.area_sqft;
        out.push(build_candidate(
            MeasureKind::WhiteRoofCoating,
            attic.id.clone(),
            vec![attic.id.clone()],
            savings,
            cost,
            0.0,
            ctx,
        )?);
    }
    Ok(())
}

fn infiltration(
    ctx: &EvalContext,
    out: &mut Vec<Candidate>,
    notes: &mut Vec<String>,
) -> Result<(), AuditError> {
    let cfm50 = ctx.dwelling.infiltration_cfm50;
    let floor = ctx.params.infiltration_floor_cfm50;
    if cfm50 <= floor {
        return Ok(());
    }
    let desired = 0.5 * (cfm50 - floor);
    let cap = ctx.params.infiltration_cap_fraction * cfm50;
    let reduction = desired.min(cap);
    if desired > cap {
        let note = format!(
            "infiltration reduction constrained to {:.0}% of whole-house leakage",
            ctx.params.infiltration_cap_fraction * 100.0
        );
        warn!("{note}");
        notes.push(note);
    }
    let ua = simulation::infiltration_ua(reduction);
    let savings = thermal_savings(ctx, &uniform(ua), &[0.0; 12]);
    let cost = 200.0 + 0.25 * reduction;
    out.push(build_candidate(
        MeasureKind::InfiltrationReduction,
        "whole house",
        vec!["infiltration".to_string()],
        savings,
        cost,
        reduction,
        ctx,
    )?);
    Ok(())
}

/// Re-derivation against the current working state. A component that no
/// longer qualifies (already treated by an earlier accepted measure)
/// yields zero savings and falls out at the SIR threshold.
pub fn rederive_savings(cand: &Candidate, ctx: &EvalContext) -> SavingsResult {
    match cand.kind {
        MeasureKind::AtticInsulationR11
        | MeasureKind::AtticInsulationR19
        | MeasureKind::AtticInsulationR30
        | MeasureKind::AtticInsulationR38
        | MeasureKind::FillAtticCavity => {
            let Some(attic) = cand
                .components
                .first()
                .and_then(|id| ctx.dwelling.attic(id))
            else {
                return SavingsResult::default();
            };
            let ua = attic_ua_delta(attic.area_sqft, attic.existing_r, cand.magnitude);
            thermal_savings(ctx, &uniform(ua), &[0.0; 12])
        }
        MeasureKind::WallInsulation => {
            let walls: Vec<&Wall> = cand
                .components
                .iter()
                .filter_map(|id| ctx.dwelling.wall(id))
                .filter(|w| w.cavity_r < 4.0)
                .collect();
            if walls.is_empty() {
                return SavingsResult::default();
            }
            wall_group_savings(ctx, &walls)
        }
        MeasureKind::FoundationWallInsulation => {
            let Some(foundation) = cand
                .components
                .first()
                .and_then(|id| ctx.dwelling.foundation(id))
            else {
                return SavingsResult::default();
            };
            if foundation.wall_r >= 5.0 {
                return SavingsResult::default();
            }
            let ua = GROUND_COUPLING
                * (foundation.wall_area_sqft / (foundation.wall_r + 2.0)
                    - foundation.wall_area_sqft / (foundation.wall_r + 13.0));
            thermal_savings(ctx, &uniform(ua), &[0.0; 12])
        }
        MeasureKind::SillBoxInsulation => {
            let Some(foundation) = cand
                .components
                .first()
                .and_then(|id| ctx.dwelling.foundation(id))
            else {
                return SavingsResult::default();
            };
            if foundation.sill_insulated {
                return SavingsResult::default();
            }
            let area = foundation.sill_perimeter_ft * 1.0;
            let ua = area / UNINSULATED_SILL_R - area / INSULATED_SILL_R;
            thermal_savings(ctx, &uniform(ua), &[0.0; 12])
        }
        MeasureKind::FloorInsulation => {
            let Some(foundation) = cand
                .components
                .first()
                .and_then(|id| ctx.dwelling.foundation(id))
            else {
                return SavingsResult::default();
            };
            if foundation.floor_r >= 5.0 {
                return SavingsResult::default();
            }
            let ua = foundation.floor_area_sqft / (foundation.floor_r + 3.0)
                - foundation.floor_area_sqft / (foundation.floor_r + 22.0);
            thermal_savings(ctx, &uniform(ua), &[0.0; 12])
        }
        MeasureKind::WhiteRoofCoating => {
            let Some(attic) = cand
                .components
                .first()
                .and_then(|id| ctx.dwelling.attic(id))
            else {
                return SavingsResult::default();
            };
            if attic.reflective_coating {
                return SavingsResult::default();
            }
            let ua = ROOF_COATING_FACTOR * attic.area_sqft / (attic.existing_r + 2.0);
            let mut ua_delta = [0.0; 12];
            for month in 0..12 {
                if ctx.climate.cdd65[month] > ctx.climate.hdd65[month] {
                    ua_delta[month] = ua;
                }
            }
            thermal_savings(ctx, &ua_delta, &[0.0; 12])
        }
        MeasureKind::InfiltrationReduction => {
            let reduction = cand.magnitude.min(ctx.dwelling.infiltration_cfm50);
            let ua = simulation::infiltration_ua(reduction);
            thermal_savings(ctx, &uniform(ua), &[0.0; 12])
        }
        _ => SavingsResult::default(),
    }
}

/// Install the physical effect of an accepted envelope candidate.
pub fn apply(cand: &Candidate, dwelling: &mut DwellingState) -> Result<(), AuditError> {
    match cand.kind {
        MeasureKind::AtticInsulationR11
        | MeasureKind::AtticInsulationR19
        | MeasureKind::AtticInsulationR30
        | MeasureKind::AtticInsulationR38
        | MeasureKind::FillAtticCavity => {
            for id in &cand.components {
                if let Some(attic) = dwelling.attic_mut(id) {
                    attic.existing_r += cand.magnitude;
                }
            }
        }
        MeasureKind::WallInsulation => {
            for id in &cand.components {
                if let Some(wall) = dwelling.wall_mut(id) {
                    wall.cavity_r = WALL_FILL_CAVITY_R;
                }
            }
        }
        MeasureKind::FoundationWallInsulation => {
            for id in &cand.components {
                if let Some(foundation) = dwelling.foundation_mut(id) {
                    foundation.wall_r += 11.0;
                }
            }
        }
        MeasureKind::SillBoxInsulation => {
            for id in &cand.components {
                if let Some(foundation) = dwelling.foundation_mut(id) {
                    foundation.sill_insulated = true;
                }
            }
        }
        MeasureKind::FloorInsulation => {
            for id in &cand.components {
                if let Some(foundation) = dwelling.foundation_mut(id) {
                    foundation.floor_r += 19.0;
                }
            }
        }
        MeasureKind::WhiteRoofCoating => {
            for id in &cand.components {
                if let Some(attic) = dwelling.attic_mut(id) {
                    attic.reflective_coating = true;
                }
            }
        }
        MeasureKind::InfiltrationReduction => {
            dwelling.infiltration_cfm50 =
                (dwelling.infiltration_cfm50 - cand.magnitude).max(0.0);
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

    fn context<'a>(
        dwelling: &'a DwellingState,
        climate: &'a Climate,
        econ: &'a Economics,
        snapshot: &'a crate::simulation::BaselineSnapshot,
        params: &'a MeasureParams,
    ) -> EvalContext<'a> {
        EvalContext {
            dwelling,
            climate,
            econ,
            snapshot,
            factors: CalibrationFactors::default(),
            params,
        }
    }

    #[test]
    fn attic_candidates_cover_all_levels() {
        let dwelling = DwellingState::sample();
        let climate = Climate::default_normals();
        let econ = Economics::default();
        let params = MeasureParams::default();
        let snapshot = simulate(&dwelling, &climate).expect("simulate");
        let ctx = context(&dwelling, &climate, &econ, &snapshot, &params);

        let mut out = Vec::new();
        let mut notes = Vec::new();
        for kind in [
            MeasureKind::AtticInsulationR11,
            MeasureKind::AtticInsulationR19,
            MeasureKind::AtticInsulationR30,
            MeasureKind::AtticInsulationR38,
        ] {
            evaluate(kind, &ctx, &mut out, &mut notes).expect("evaluate");
        }
        assert_eq!(out.len(), 4);
        // Deeper fills save more but cost more.
        assert!(out[3].heat_savings_mmbtu > out[0].heat_savings_mmbtu);
        assert!(out[3].cost > out[0].cost);
    }

    #[test]
    fn grouped_walls_become_one_candidate() {
        let dwelling = DwellingState::sample();
        let climate = Climate::default_normals();
        let econ = Economics::default();
        let params = MeasureParams::default();
        let snapshot = simulate(&dwelling, &climate).expect("simulate");
        let ctx = context(&dwelling, &climate, &econ, &snapshot, &params);

        let mut out = Vec::new();
        let mut notes = Vec::new();
        evaluate(MeasureKind::WallInsulation, &ctx, &mut out, &mut notes).expect("evaluate");
        // Three grouped walls -> one candidate; the R-11 wall is skipped.
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].components.len(), 3);
    }

    #[test]
    fn infiltration_note_emitted_when_cap_binds() {
        let mut dwelling = DwellingState::sample();
        dwelling.infiltration_cfm50 = 6000.0;
        let climate = Climate::default_normals();
        let econ = Economics::default();
        let params = MeasureParams::default();
        let snapshot = simulate(&dwelling, &climate).expect("simulate");
        let ctx = context(&dwelling, &climate, &econ, &snapshot, &params);

        let mut out = Vec::new();
        let mut notes = Vec::new();
        evaluate(
            MeasureKind::InfiltrationReduction,
            &ctx,
            &mut out,
            &mut notes,
        )
        .expect("evaluate");
        assert_eq!(out.len(), 1);
        assert_eq!(notes.len(), 1);
        assert!(notes[0].contains("constrained"));
        assert!(out[0].magnitude <= params.infiltration_cap_fraction * 6000.0 + 1e-9);
    }

    #[test]
    fn rederive_after_apply_drops_to_zero() {
        let mut dwelling = DwellingState::sample();
        let climate = Climate::default_normals();
        let econ = Economics::default();
        let params = MeasureParams::default();
        let snapshot = simulate(&dwelling, &climate).expect("simulate");

        let cand = {
            let ctx = context(&dwelling, &climate, &econ, &snapshot, &params);
            let mut out = Vec::new();
            let mut notes = Vec::new();
            evaluate(MeasureKind::WallInsulation, &ctx, &mut out, &mut notes).expect("evaluate");
            out.remove(0)
        };
        assert!(cand.heat_savings_mmbtu > 0.0);

        apply(&cand, &mut dwelling).expect("apply");
        let snapshot = simulate(&dwelling, &climate).expect("simulate");
        let ctx = context(&dwelling, &climate, &econ, &snapshot, &params);
        let savings = rederive_savings(&cand, &ctx);
        assert!(savings.heat_mmbtu.abs() < 1e-9);
    }
}
