//! Baseload measures: lighting retrofits and refrigerator replacement.
//! Pure electricity savings, precomputed once and never re-derived.

use crate::catalog::MeasureKind;
use crate::economics::{FuelKind, KWH_PER_MMBTU};
use crate::error::AuditError;
use crate::measures::{build_candidate, Candidate, EvalContext, SavingsResult};

const LAMP_COST_EACH: f64 = 9.0;
const REFRIGERATOR_MIN_SAVINGS_KWH: f64 = 150.0;

fn electric(kwh: f64) -> SavingsResult {
    SavingsResult {
        base_mmbtu: (kwh / KWH_PER_MMBTU).max(0.0),
        base_fuel: Some(FuelKind::Electricity),
        ..SavingsResult::default()
    }
}

pub fn evaluate(
    kind: MeasureKind,
    ctx: &EvalContext,
    out: &mut Vec<Candidate>,
) -> Result<(), AuditError> {
    match kind {
        MeasureKind::LightingRetrofit => {
            for fixture in &ctx.dwelling.lighting {
                let watts_saved = fixture.watts_each - fixture.replacement_watts_each;
                if watts_saved <= 0.0 {
                    continue;
                }
                let kwh =
                    f64::from(fixture.count) * watts_saved * fixture.hours_per_day * 365.0 / 1000.0;
                let cost = LAMP_COST_EACH * f64::from(fixture.count);
                out.push(build_candidate(
                    kind,
                    fixture.id.clone(),
                    vec![fixture.id.clone()],
                    electric(kwh),
                    cost,
                    0.0,
                    ctx,
                )?);
            }
            Ok(())
        }
        MeasureKind::RefrigeratorReplacement => {
            let Some(fridge) = ctx.dwelling.refrigerator.as_ref() else {
                return Ok(());
            };
            let kwh = fridge.annual_kwh - fridge.replacement_kwh;
            if kwh < REFRIGERATOR_MIN_SAVINGS_KWH {
                return Ok(());
            }
            out.push(build_candidate(
                kind,
                fridge.id.clone(),
                vec![fridge.id.clone()],
                electric(kwh),
                fridge.replacement_cost,
                0.0,
                ctx,
            )?);
            Ok(())
        }
        _ => Ok(()),
    }
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
    fn lighting_retrofit_scores_high_sir() {
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
        evaluate(MeasureKind::LightingRetrofit, &ctx, &mut out).expect("evaluate");
        assert_eq!(out.len(), 1);
        assert!(out[0].sir > 1.0, "lighting SIR {} should clear 1.0", out[0].sir);

        out.clear();
        evaluate(MeasureKind::RefrigeratorReplacement, &ctx, &mut out).expect("evaluate");
        assert_eq!(out.len(), 1);
        assert!(out[0].base_savings_mmbtu > 0.0);
    }
}
