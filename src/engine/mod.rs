//! Pipeline orchestration: an [`EngineContext`] owns the dwelling working
//! copy, baseline snapshots and candidate array; `run_audit` drives first
//! pass → sort → cumulative interaction, re-running the whole pipeline on
//! a fresh context when billing calibration produces usable factors.

pub mod billing;
pub mod first_pass;
pub mod interact;
pub mod sort;

use chrono::Utc;
use tracing::info;

use crate::config::{Config, MeasureParams};
use crate::dwelling::{validate, DwellingState};
use crate::economics::Economics;
use crate::error::AuditError;
use crate::measures::{self, CalibrationFactors, Candidate, CandidateState, EvalContext};
use crate::simulation::{self, BaselineSnapshot};
use crate::types::{AuditReport, BaselineSummary, PackageMeasure, PackageSummary};
use crate::weather::Climate;

/// Hard backstop on candidate-list growth; a real dwelling produces a few
/// dozen records.
pub const MAX_CANDIDATES: usize = 512;

/// All state for one pipeline run. The billing-calibration re-run builds
/// a fresh context rather than resetting this one in place, so mutated
/// dwelling state from the first run can never leak into the second.
pub struct EngineContext {
    pub original: DwellingState,
    pub working: DwellingState,
    pub climate: Climate,
    pub econ: Economics,
    pub params: MeasureParams,
    pub factors: CalibrationFactors,
    /// Loads before any measure is applied (calibration-scaled).
    pub baseline: BaselineSnapshot,
    /// Running loads reflecting every accepted measure so far.
    pub current: BaselineSnapshot,
    pub candidates: Vec<Candidate>,
    pub notes: Vec<String>,
}

impl EngineContext {
    pub fn new(
        dwelling: DwellingState,
        econ: Economics,
        params: MeasureParams,
        factors: CalibrationFactors,
    ) -> Result<Self, AuditError> {
        let climate = dwelling.climate.clone().unwrap_or_default();
        let baseline =
            simulation::simulate(&dwelling, &climate)?.scaled(factors.heating, factors.cooling);
        Ok(Self {
            original: dwelling.clone(),
            working: dwelling,
            climate,
            econ,
            params,
            factors,
            current: baseline.clone(),
            baseline,
            candidates: Vec::new(),
            notes: Vec::new(),
        })
    }

    /// Evaluator view over the current working state.
    pub fn eval_view(&self) -> EvalContext<'_> {
        EvalContext {
            dwelling: &self.working,
            climate: &self.climate,
            econ: &self.econ,
            snapshot: &self.current,
            factors: self.factors,
            params: &self.params,
        }
    }

    /// Re-simulate the working state into the running snapshot, keeping
    /// calibration scaling.
    pub fn refresh_snapshot(&mut self) -> Result<(), AuditError> {
        self.current = simulation::simulate(&self.working, &self.climate)?
            .scaled(self.factors.heating, self.factors.cooling);
        Ok(())
    }
}

fn pipeline(ctx: &mut EngineContext) -> Result<(), AuditError> {
    first_pass::run(ctx)?;
    interact::run(ctx)
}

/// Run the full audit for one dwelling.
pub fn run_audit(dwelling: &DwellingState, config: &Config) -> Result<AuditReport, AuditError> {
    validate::validate(dwelling)?;

    let econ = config.economics();
    let params = config.measures.clone();

    let mut ctx = EngineContext::new(
        dwelling.clone(),
        econ.clone(),
        params.clone(),
        CalibrationFactors::default(),
    )?;
    pipeline(&mut ctx)?;

    let mut calibration = None;
    let mut billing_notes = Vec::new();
    if config.billing.enabled && !dwelling.billing.is_empty() {
        let (outcome, notes) =
            billing::calibrate(dwelling, &ctx.baseline, config.billing.min_periods);
        billing_notes = notes;
        if let Some(outcome) = outcome {
            info!(
                heating = outcome.factors.heating,
                cooling = outcome.factors.cooling,
                "re-running pipeline with calibrated baseline"
            );
            // The whole first run is discarded; only the recalibrated
            // results are reported.
            let mut recal = EngineContext::new(dwelling.clone(), econ, params, outcome.factors)?;
            pipeline(&mut recal)?;
            ctx = recal;
            calibration = Some(outcome);
        }
    }
    ctx.notes.extend(billing_notes);

    Ok(build_report(&ctx, calibration))
}

fn build_report(
    ctx: &EngineContext,
    calibration: Option<billing::CalibrationOutcome>,
) -> AuditReport {
    let mut package: Vec<PackageMeasure> = ctx
        .candidates
        .iter()
        .filter(|c| c.is_accepted())
        .map(PackageMeasure::from_candidate)
        .collect();
    package.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.sir.total_cmp(&a.sir))
    });
    let mut package = merge_window_records(package);
    for (index, measure) in package.iter_mut().enumerate() {
        measure.rank = index + 1;
    }

    let mut npv_only: Vec<PackageMeasure> = ctx
        .candidates
        .iter()
        .filter(|c| {
            matches!(
                c.state,
                CandidateState::Demoted | CandidateState::Superseded
            )
        })
        .map(PackageMeasure::from_candidate)
        .collect();
    npv_only.sort_by(|a, b| b.npv.total_cmp(&a.npv));

    let summary = PackageSummary::from_measures(&package);
    AuditReport {
        dwelling: ctx.original.label.clone(),
        generated_at: Utc::now(),
        baseline: BaselineSummary::from(&ctx.baseline),
        calibration,
        package,
        npv_only,
        summary,
        notes: ctx.notes.clone(),
    }
}

/// Reporting aggregation: several accepted window records of the same
/// measure kind collapse into one line with merged economics. Eligibility
/// was already settled per window; this only changes presentation.
fn merge_window_records(package: Vec<PackageMeasure>) -> Vec<PackageMeasure> {
    let mut merged: Vec<PackageMeasure> = Vec::with_capacity(package.len());
    for measure in package {
        if measures::is_window_measure(measure.kind) {
            if let Some(existing) = merged.iter_mut().find(|m| m.kind == measure.kind) {
                existing.merge(&measure);
                continue;
            }
        }
        merged.push(measure);
    }
    merged
}
