//! First pass: score every measure kind in the fixed catalog order
//! against the unmodified baseline state, then fold program mandates into
//! the scored list.

use tracing::{debug, info, warn};

use crate::catalog::{MeasureKind, PriorityClass};
use crate::dwelling::HeatingEquipment;
use crate::engine::EngineContext;
use crate::error::AuditError;
use crate::measures;

pub fn run(ctx: &mut EngineContext) -> Result<(), AuditError> {
    let mut candidates = Vec::new();
    let mut notes = Vec::new();
    {
        let eval = ctx.eval_view();
        for kind in MeasureKind::ALL {
            let before = candidates.len();
            measures::evaluate_kind(kind, &eval, &mut candidates, &mut notes)?;
            debug!(
                kind = kind.as_slug(),
                emitted = candidates.len() - before,
                "first-pass evaluation"
            );
        }
    }
    apply_mandates(ctx, &mut candidates, &mut notes);
    info!(candidates = candidates.len(), "first pass complete");
    ctx.candidates = candidates;
    ctx.notes.append(&mut notes);
    Ok(())
}

/// Raise mandated measures to required priority; when a mandate does not
/// match the installed equipment, fall back to the tune-up for the
/// equipment actually present rather than failing the run.
fn apply_mandates(
    ctx: &EngineContext,
    candidates: &mut [measures::Candidate],
    notes: &mut Vec<String>,
) {
    for mandate in &ctx.original.mandates {
        let mut matched = false;
        for cand in candidates.iter_mut().filter(|c| c.kind == mandate.kind) {
            cand.required = true;
            if cand.priority < PriorityClass::Required {
                cand.priority = PriorityClass::Required;
            }
            matched = true;
        }
        if matched {
            continue;
        }

        let fallback = mandate_fallback(ctx, mandate.kind);
        let mut fallback_applied = false;
        if let Some(fallback_kind) = fallback {
            for cand in candidates.iter_mut().filter(|c| c.kind == fallback_kind) {
                cand.required = true;
                if cand.priority < PriorityClass::Required {
                    cand.priority = PriorityClass::Required;
                }
                fallback_applied = true;
            }
            if fallback_applied {
                let note = format!(
                    "mandated {} is not applicable to this dwelling; substituting {}",
                    mandate.kind,
                    fallback_kind
                );
                warn!("{note}");
                notes.push(note);
                continue;
            }
        }

        let note = format!(
            "mandated {} is not applicable to this dwelling and no substitute was found",
            mandate.kind
        );
        warn!("{note}");
        notes.push(note);
    }
}

/// A mandated equipment replacement that mismatches the installed
/// equipment maps to the maintenance measure for what is actually there.
fn mandate_fallback(ctx: &EngineContext, kind: MeasureKind) -> Option<MeasureKind> {
    let heating_measure = matches!(
        kind,
        MeasureKind::FurnaceTuneUp
            | MeasureKind::FurnaceReplacement
            | MeasureKind::HighEfficiencyFurnace
            | MeasureKind::BoilerTuneUp
            | MeasureKind::HighEfficiencyBoiler
            | MeasureKind::SpaceHeaterReplacement
            | MeasureKind::HeatPumpReplacement
    );
    if !heating_measure {
        return None;
    }
    match ctx.original.heating.equipment {
        HeatingEquipment::Furnace => Some(MeasureKind::FurnaceTuneUp),
        HeatingEquipment::Boiler => Some(MeasureKind::BoilerTuneUp),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dwelling::{DwellingState, Mandate};
    use crate::measures::CalibrationFactors;

    fn context_for(dwelling: DwellingState) -> EngineContext {
        let config = Config::default();
        EngineContext::new(
            dwelling,
            config.economics(),
            config.measures.clone(),
            CalibrationFactors::default(),
        )
        .expect("context")
    }

    #[test]
    fn first_pass_is_idempotent() {
        let mut ctx = context_for(DwellingState::sample());
        run(&mut ctx).expect("first pass");
        let first = ctx.candidates.clone();

        ctx.candidates.clear();
        ctx.notes.clear();
        run(&mut ctx).expect("first pass again");
        assert_eq!(first, ctx.candidates);
    }

    #[test]
    fn first_pass_emits_duct_and_infiltration_candidates() {
        let mut ctx = context_for(DwellingState::sample());
        run(&mut ctx).expect("first pass");
        assert!(ctx
            .candidates
            .iter()
            .any(|c| c.kind == MeasureKind::DuctSealing
                && c.priority == PriorityClass::DuctSeal));
        assert!(ctx
            .candidates
            .iter()
            .any(|c| c.kind == MeasureKind::InfiltrationReduction
                && c.priority == PriorityClass::Infiltration));
    }

    #[test]
    fn mismatched_mandate_falls_back_to_tune_up() {
        let mut dwelling = DwellingState::sample();
        // A high-efficiency boiler is mandated, but the dwelling heats
        // with a furnace.
        dwelling.mandates = vec![Mandate {
            kind: MeasureKind::HighEfficiencyBoiler,
            reason: Some("program directive".to_string()),
        }];
        let mut ctx = context_for(dwelling);
        run(&mut ctx).expect("first pass");

        let tune_up = ctx
            .candidates
            .iter()
            .find(|c| c.kind == MeasureKind::FurnaceTuneUp)
            .expect("fallback candidate");
        assert!(tune_up.required);
        assert_eq!(tune_up.priority, PriorityClass::Required);
        assert!(ctx.notes.iter().any(|n| n.contains("substituting")));
    }
}
