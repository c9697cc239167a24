//! Cumulative interaction engine.
//!
//! Walks the sorted candidate list in decreasing (priority, SIR) order,
//! re-deriving each measure against the working dwelling state (which
//! reflects every previously installed measure), resolving mutual
//! exclusion on shared components by NPV comparison with lookahead and
//! backtracking, and installing survivors one at a time. Records are
//! never removed from the candidate array: every transition is a state
//! change over stable indices, so `associated_winner` stays valid across
//! backward and forward scans.

use tracing::{debug, info};

use crate::catalog::{mutually_exclusive, MeasureKind, PriorityClass};
use crate::engine::{sort, EngineContext};
use crate::error::AuditError;
use crate::measures::{self, CandidateState};

pub fn run(ctx: &mut EngineContext) -> Result<(), AuditError> {
    if ctx.candidates.len() > crate::engine::MAX_CANDIDATES {
        return Err(AuditError::MeasureLimit(format!(
            "{} candidates exceeds the engine limit of {}",
            ctx.candidates.len(),
            crate::engine::MAX_CANDIDATES
        )));
    }

    accept_always_first(ctx)?;

    let order = sort::rank(&ctx.candidates);
    for j in 0..order.len() {
        let i = order[j];
        if ctx.candidates[i].state != CandidateState::Scored {
            continue;
        }
        // Terminal priorities are never (re)installed in this pass: duct
        // sealing was applied up-front, NPV-only records stay out.
        if ctx.candidates[i].priority.is_terminal() {
            continue;
        }

        rederive_record(ctx, i)?;

        let record = &ctx.candidates[i];
        if record.sir < ctx.econ.min_sir && !record.priority.bypasses_sir_threshold() {
            debug!(
                kind = record.kind.as_slug(),
                sir = record.sir,
                "below minimum SIR after interaction; demoting"
            );
            demote(ctx, i, CandidateState::Demoted);
            reconsider_deferred(ctx, &order, j, i)?;
            continue;
        }

        if let Some(winner) = exclusion_scan(ctx, &order, j, i) {
            debug!(
                kind = ctx.candidates[i].kind.as_slug(),
                winner = ctx.candidates[winner].kind.as_slug(),
                "deferred in favor of higher-value conflicting measure"
            );
            let record = &mut ctx.candidates[i];
            record.state = CandidateState::Superseded;
            record.priority = PriorityClass::NpvOnly;
            record.associated_winner = Some(winner);
            continue;
        }

        install(ctx, i)?;
    }

    readmit_sill_insulation(ctx)?;

    let accepted = ctx.candidates.iter().filter(|c| c.is_accepted()).count();
    info!(accepted, "cumulative interaction complete");
    Ok(())
}

/// Duct-seal-priority records are accepted before the ranked walk; their
/// physical effect is part of the baseline every other measure sees.
fn accept_always_first(ctx: &mut EngineContext) -> Result<(), AuditError> {
    let duct_indices: Vec<usize> = ctx
        .candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| {
            c.priority == PriorityClass::DuctSeal && c.state == CandidateState::Scored
        })
        .map(|(i, _)| i)
        .collect();
    for i in duct_indices {
        install(ctx, i)?;
    }
    Ok(())
}

/// Step 1: refresh a record's economics against the current working
/// state.
fn rederive_record(ctx: &mut EngineContext, i: usize) -> Result<(), AuditError> {
    let cand = ctx.candidates[i].clone();
    let priced = {
        let eval = ctx.eval_view();
        measures::rederive(&cand, &eval)?
    };
    let record = &mut ctx.candidates[i];
    record.heat_savings_mmbtu = priced.savings.heat_mmbtu;
    record.cool_savings_mmbtu = priced.savings.cool_mmbtu;
    record.base_savings_mmbtu = priced.savings.base_mmbtu;
    record.heat_dollars = priced.heat_dollars;
    record.cool_dollars = priced.cool_dollars;
    record.base_dollars = priced.base_dollars;
    record.annual_dollars = priced.annual_dollars;
    record.sir = priced.sir;
    record.npv = priced.npv;
    Ok(())
}

fn demote(ctx: &mut EngineContext, i: usize, state: CandidateState) {
    let record = &mut ctx.candidates[i];
    record.state = state;
    record.priority = PriorityClass::NpvOnly;
}

/// Step 3 fallback: when the candidate at `order[j]` just failed the SIR
/// threshold, the slot goes back to the already-passed-over alternative
/// that was deferred in favor of it, if one exists and still clears the
/// threshold on re-derivation.
fn reconsider_deferred(
    ctx: &mut EngineContext,
    order: &[usize],
    j: usize,
    failed: usize,
) -> Result<(), AuditError> {
    for k in (0..j).rev() {
        let a = order[k];
        if ctx.candidates[a].state != CandidateState::Superseded
            || ctx.candidates[a].associated_winner != Some(failed)
        {
            continue;
        }
        // Restore ordinary ranking before re-running step 1 for it.
        ctx.candidates[a].priority = PriorityClass::SirRanked;
        ctx.candidates[a].state = CandidateState::Scored;
        rederive_record(ctx, a)?;

        let clears = ctx.candidates[a].sir >= ctx.econ.min_sir
            || ctx.candidates[a].priority.bypasses_sir_threshold();
        if !clears {
            demote(ctx, a, CandidateState::Demoted);
            return Ok(());
        }
        // The revived record never ran its own lookahead (it was deferred
        // before reaching step 4), so run it now to keep the exclusion
        // invariant.
        if let Some(winner) = exclusion_scan(ctx, order, j, a) {
            let record = &mut ctx.candidates[a];
            record.state = CandidateState::Superseded;
            record.priority = PriorityClass::NpvOnly;
            record.associated_winner = Some(winner);
            return Ok(());
        }
        install(ctx, a)?;
        return Ok(());
    }
    Ok(())
}

/// Step 4: scan not-yet-processed candidates for mutual-exclusion
/// conflicts sharing a component with `i`. Conflicts the current record
/// beats on (priority, NPV) are demoted; the first conflict that beats it
/// is returned as the winner to defer to.
fn exclusion_scan(
    ctx: &mut EngineContext,
    order: &[usize],
    j: usize,
    i: usize,
) -> Option<usize> {
    for k in (j + 1)..order.len() {
        let f = order[k];
        if f == i
            || ctx.candidates[f].state != CandidateState::Scored
            || ctx.candidates[f].priority.is_terminal()
        {
            continue;
        }
        if !mutually_exclusive(ctx.candidates[i].kind, ctx.candidates[f].kind) {
            continue;
        }
        if !ctx.candidates[i].shares_component(&ctx.candidates[f]) {
            continue;
        }

        let current = (ctx.candidates[i].priority, ctx.candidates[i].npv);
        let forward = (ctx.candidates[f].priority, ctx.candidates[f].npv);
        if current.0 > forward.0 || (current.0 == forward.0 && current.1 >= forward.1) {
            debug!(
                kind = ctx.candidates[f].kind.as_slug(),
                "demoted by conflicting measure already being installed"
            );
            let record = &mut ctx.candidates[f];
            record.state = CandidateState::Superseded;
            record.priority = PriorityClass::NpvOnly;
            record.associated_winner = Some(i);
        } else {
            return Some(f);
        }
    }
    None
}

/// Step 5: accept the record, mutate the working dwelling state, and
/// refresh the running baseline before the next candidate is processed.
fn install(ctx: &mut EngineContext, i: usize) -> Result<(), AuditError> {
    let cand = ctx.candidates[i].clone();
    measures::apply(&cand, &mut ctx.working)?;
    ctx.candidates[i].state = CandidateState::Accepted;
    ctx.refresh_snapshot()?;
    debug!(kind = cand.kind.as_slug(), "installed");
    Ok(())
}

/// Post-pass: a sill-box record that lost its component to a
/// foundation-wall record which itself ended up outside the package is
/// re-admitted at ordinary SIR priority when it independently clears the
/// minimum.
fn readmit_sill_insulation(ctx: &mut EngineContext) -> Result<(), AuditError> {
    for i in 0..ctx.candidates.len() {
        let record = &ctx.candidates[i];
        if record.kind != MeasureKind::SillBoxInsulation
            || record.state != CandidateState::Superseded
        {
            continue;
        }
        let Some(winner) = record.associated_winner else {
            continue;
        };
        // The sill box only ever conflicts with the foundation-wall
        // measure on its component, so acceptance here cannot violate the
        // exclusion invariant once that winner is known to be out.
        if ctx.candidates[winner].kind != MeasureKind::FoundationWallInsulation
            || ctx.candidates[winner].is_accepted()
        {
            continue;
        }

        ctx.candidates[i].priority = PriorityClass::SirRanked;
        ctx.candidates[i].state = CandidateState::Scored;
        ctx.candidates[i].associated_winner = None;
        rederive_record(ctx, i)?;
        if ctx.candidates[i].sir >= ctx.econ.min_sir {
            install(ctx, i)?;
        } else {
            demote(ctx, i, CandidateState::Demoted);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dwelling::DwellingState;
    use crate::engine::first_pass;
    use crate::measures::CalibrationFactors;

    fn scored_context(dwelling: DwellingState, min_sir: f64) -> EngineContext {
        let config = Config::default();
        let mut econ = config.economics();
        econ.min_sir = min_sir;
        let mut ctx = EngineContext::new(
            dwelling,
            econ,
            config.measures.clone(),
            CalibrationFactors::default(),
        )
        .expect("context");
        first_pass::run(&mut ctx).expect("first pass");
        ctx
    }

    fn find(ctx: &EngineContext, kind: MeasureKind) -> usize {
        ctx.candidates
            .iter()
            .position(|c| c.kind == kind)
            .unwrap_or_else(|| panic!("no candidate for {kind}"))
    }

    #[test]
    fn storm_windows_win_and_replacement_defers_to_them() {
        let mut ctx = scored_context(DwellingState::sample(), 1.0);
        run(&mut ctx).expect("interact");

        let storm = &ctx.candidates[find(&ctx, MeasureKind::StormWindows)];
        assert_eq!(storm.state, CandidateState::Accepted);

        for replacement in ctx
            .candidates
            .iter()
            .filter(|c| c.kind == MeasureKind::WindowReplacement)
        {
            assert_eq!(replacement.state, CandidateState::Superseded);
            assert_eq!(replacement.priority, PriorityClass::NpvOnly);
            let winner = replacement.associated_winner.expect("winner recorded");
            assert_eq!(ctx.candidates[winner].kind, MeasureKind::StormWindows);
            assert!(replacement.shares_component(&ctx.candidates[winner]));
        }
    }

    #[test]
    fn duct_sealing_with_no_cost_is_accepted_up_front() {
        let dwelling = DwellingState::sample();
        assert_eq!(
            dwelling.ducts.as_ref().map(|d| d.seal_cost),
            Some(0.0),
            "sample enters no sealing cost"
        );
        let mut ctx = scored_context(dwelling, 1.0);
        run(&mut ctx).expect("interact");

        let duct = &ctx.candidates[find(&ctx, MeasureKind::DuctSealing)];
        assert_eq!(duct.state, CandidateState::Accepted);
        assert_eq!(duct.priority, PriorityClass::DuctSeal);
        assert!((duct.cost - 0.0).abs() < 1e-9);
        assert!(ctx.working.ducts.as_ref().expect("ducts").sealed);
    }

    #[test]
    fn accepted_exclusive_measures_never_share_components() {
        let mut ctx = scored_context(DwellingState::sample(), 1.0);
        run(&mut ctx).expect("interact");

        let accepted: Vec<_> = ctx.candidates.iter().filter(|c| c.is_accepted()).collect();
        assert!(!accepted.is_empty());
        for (a_pos, a) in accepted.iter().enumerate() {
            for b in accepted.iter().skip(a_pos + 1) {
                assert!(
                    !(mutually_exclusive(a.kind, b.kind) && a.shares_component(b)),
                    "{} and {} are both accepted on a shared component",
                    a.kind,
                    b.kind
                );
            }
        }
    }

    #[test]
    fn acceptance_is_monotonic_in_sir_or_priority() {
        let mut ctx = scored_context(DwellingState::sample(), 1.0);
        run(&mut ctx).expect("interact");
        for cand in ctx.candidates.iter().filter(|c| c.is_accepted()) {
            assert!(
                cand.sir >= ctx.econ.min_sir || cand.priority.bypasses_sir_threshold(),
                "{} accepted with SIR {} below minimum",
                cand.kind,
                cand.sir
            );
        }
    }

    #[test]
    fn failed_winner_yields_slot_back_to_deferred_alternative() {
        // Pick a minimum SIR between the two conflicting records: the
        // foundation wall wins the sill-box conflict on NPV, then fails
        // the threshold at its own turn; the sill box must be the record
        // reconsidered and accepted.
        let probe = scored_context(DwellingState::sample(), 1.0);
        let foundation_sir =
            probe.candidates[find(&probe, MeasureKind::FoundationWallInsulation)].sir;
        let sill_sir = probe.candidates[find(&probe, MeasureKind::SillBoxInsulation)].sir;
        let foundation_npv =
            probe.candidates[find(&probe, MeasureKind::FoundationWallInsulation)].npv;
        let sill_npv = probe.candidates[find(&probe, MeasureKind::SillBoxInsulation)].npv;
        assert!(
            sill_sir > foundation_sir && foundation_npv > sill_npv,
            "sample dwelling should rank sill by SIR but foundation by NPV"
        );
        let min_sir = (foundation_sir + sill_sir) / 2.0;

        let mut ctx = scored_context(DwellingState::sample(), min_sir);
        run(&mut ctx).expect("interact");

        let foundation = &ctx.candidates[find(&ctx, MeasureKind::FoundationWallInsulation)];
        let sill = &ctx.candidates[find(&ctx, MeasureKind::SillBoxInsulation)];
        assert_eq!(foundation.state, CandidateState::Demoted);
        assert_eq!(foundation.priority, PriorityClass::NpvOnly);
        assert_eq!(sill.state, CandidateState::Accepted);
        assert!(sill.sir >= min_sir);
        assert!(ctx.working.foundations[0].sill_insulated);
    }

    #[test]
    fn sill_box_is_readmitted_when_its_winner_fell_out() {
        let mut ctx = scored_context(DwellingState::sample(), 1.0);
        let sill = find(&ctx, MeasureKind::SillBoxInsulation);
        let foundation = find(&ctx, MeasureKind::FoundationWallInsulation);

        // Freeze every record out of the ranked walk, leaving only the
        // post-pass to act: the sill lost to the foundation wall, which
        // itself ended up outside the package.
        for cand in &mut ctx.candidates {
            cand.state = CandidateState::Demoted;
            cand.priority = PriorityClass::NpvOnly;
        }
        ctx.candidates[sill].state = CandidateState::Superseded;
        ctx.candidates[sill].associated_winner = Some(foundation);

        run(&mut ctx).expect("interact");

        let sill = &ctx.candidates[sill];
        assert_eq!(sill.state, CandidateState::Accepted);
        assert_eq!(sill.priority, PriorityClass::SirRanked);
    }
}
