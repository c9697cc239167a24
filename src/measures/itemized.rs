//! Auditor-entered itemized repairs and health-and-safety items.
//! Required entries join the package regardless of economics; optional
//! entries compete on SIR like any other measure.

use crate::catalog::{EconCategory, MeasureKind, PriorityClass};
use crate::dwelling::ItemizedItem;
use crate::error::AuditError;
use crate::measures::{price, Candidate, CandidateState, EvalContext, SavingsResult};

pub fn evaluate(ctx: &EvalContext, out: &mut Vec<Candidate>) -> Result<(), AuditError> {
    for item in &ctx.dwelling.itemized {
        if !item.required && item.annual_savings_dollars <= 0.0 {
            // Nothing to rank on and nothing mandating it.
            continue;
        }
        out.push(candidate_for(ctx, item)?);
    }
    Ok(())
}

fn candidate_for(ctx: &EvalContext, item: &ItemizedItem) -> Result<Candidate, AuditError> {
    let savings = SavingsResult {
        direct_dollars: item.annual_savings_dollars,
        base_fuel: item.fuel,
        ..SavingsResult::default()
    };
    let priority = if item.required {
        PriorityClass::Required
    } else {
        PriorityClass::SirRanked
    };
    let priced = price(savings, item.cost, item.life_years, priority, ctx)?;
    Ok(Candidate {
        kind: MeasureKind::ItemizedRepair,
        category: EconCategory::Itemized,
        detail: item.name.clone(),
        components: vec![item.id.clone()],
        heat_savings_mmbtu: 0.0,
        cool_savings_mmbtu: 0.0,
        base_savings_mmbtu: 0.0,
        base_fuel: item.fuel,
        heat_dollars: 0.0,
        cool_dollars: 0.0,
        base_dollars: priced.base_dollars,
        annual_dollars: priced.annual_dollars,
        cost: item.cost,
        life_years: item.life_years,
        sir: priced.sir,
        npv: priced.npv,
        priority,
        required: item.required,
        magnitude: 0.0,
        state: CandidateState::Scored,
        associated_winner: None,
    })
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
    fn required_items_get_required_priority() {
        let mut dwelling = DwellingState::sample();
        dwelling.itemized = vec![
            ItemizedItem {
                id: "co-detector".to_string(),
                name: "CO detector".to_string(),
                cost: 45.0,
                annual_savings_dollars: 0.0,
                fuel: None,
                life_years: 10.0,
                required: true,
            },
            ItemizedItem {
                id: "aerators".to_string(),
                name: "Faucet aerators".to_string(),
                cost: 12.0,
                annual_savings_dollars: 6.0,
                fuel: None,
                life_years: 10.0,
                required: false,
            },
        ];
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
        evaluate(&ctx, &mut out).expect("evaluate");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].priority, PriorityClass::Required);
        assert!(out[0].required);
        assert_eq!(out[1].priority, PriorityClass::SirRanked);
        assert!(out[1].sir > 1.0);
    }
}
