//! Per-measure evaluators and the candidate measure record.
//!
//! Evaluators are grouped by economic domain (`envelope`, `openings`,
//! `hvac`, `water_heater`, `baseload`, `itemized`) and dispatched through
//! a registry keyed by [`MeasureKind`]. Each evaluator emits zero, one, or
//! many candidates (one per applicable component or component group),
//! exposes re-derivation against the current working state, and an
//! `apply` mutation installed on acceptance.

pub mod baseload;
pub mod envelope;
pub mod hvac;
pub mod itemized;
pub mod openings;
pub mod water_heater;

use serde::{Deserialize, Serialize};

use crate::catalog::{EconCategory, MeasureKind, PriorityClass};
use crate::config::MeasureParams;
use crate::dwelling::DwellingState;
use crate::economics::{self, Economics, FuelKind};
use crate::error::AuditError;
use crate::simulation::BaselineSnapshot;
use crate::weather::Climate;

/// Lifecycle of a candidate through the cumulative interaction engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CandidateState {
    /// First-pass scored, not yet reached in the cumulative pass.
    Scored,
    /// Installed into the package.
    Accepted,
    /// Fell below the minimum SIR after interaction.
    Demoted,
    /// Lost a mutual-exclusion conflict to another candidate.
    Superseded,
}

/// Billing-calibration scale factors applied to heating- and
/// cooling-derived savings. Unity when no calibration ran.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CalibrationFactors {
    pub heating: f64,
    pub cooling: f64,
}

impl Default for CalibrationFactors {
    fn default() -> Self {
        Self {
            heating: 1.0,
            cooling: 1.0,
        }
    }
}

/// Annual energy savings split by end use, before pricing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SavingsResult {
    pub heat_mmbtu: f64,
    pub cool_mmbtu: f64,
    /// Non-thermal savings (water heating, baseload electricity).
    pub base_mmbtu: f64,
    pub base_fuel: Option<FuelKind>,
    /// Direct dollar savings with no energy component (itemized entries).
    pub direct_dollars: f64,
}

/// One candidate measure record: a (measure kind, affected components)
/// pair with its standalone economics and interaction state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub kind: MeasureKind,
    pub category: EconCategory,
    /// Human-readable qualifier (itemized name, component summary).
    pub detail: String,
    pub components: Vec<String>,
    pub heat_savings_mmbtu: f64,
    pub cool_savings_mmbtu: f64,
    pub base_savings_mmbtu: f64,
    pub base_fuel: Option<FuelKind>,
    pub heat_dollars: f64,
    pub cool_dollars: f64,
    pub base_dollars: f64,
    pub annual_dollars: f64,
    pub cost: f64,
    pub life_years: f64,
    pub sir: f64,
    pub npv: f64,
    pub priority: PriorityClass,
    pub required: bool,
    /// Kind-specific physical delta (CFM50 reduction for infiltration,
    /// added R for insulation); zero when the kind fully determines the
    /// mutation.
    pub magnitude: f64,
    pub state: CandidateState,
    /// Index of the conflicting candidate this record was deferred in
    /// favor of; set when this record is superseded.
    pub associated_winner: Option<usize>,
}

impl Candidate {
    pub fn shares_component(&self, other: &Candidate) -> bool {
        self.components
            .iter()
            .any(|id| other.components.contains(id))
    }

    pub fn is_accepted(&self) -> bool {
        self.state == CandidateState::Accepted
    }
}

/// Everything an evaluator may read: the current working dwelling state,
/// climate, economics, the running baseline snapshot, calibration
/// factors, and measure tuning parameters.
pub struct EvalContext<'a> {
    pub dwelling: &'a DwellingState,
    pub climate: &'a Climate,
    pub econ: &'a Economics,
    pub snapshot: &'a BaselineSnapshot,
    pub factors: CalibrationFactors,
    pub params: &'a MeasureParams,
}

impl<'a> EvalContext<'a> {
    pub fn heating_fuel(&self) -> FuelKind {
        self.dwelling.heating.fuel
    }
}

/// Priced economics for one candidate, shared between first-pass scoring
/// and re-derivation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricedSavings {
    pub savings: SavingsResult,
    pub heat_dollars: f64,
    pub cool_dollars: f64,
    pub base_dollars: f64,
    pub annual_dollars: f64,
    pub sir: f64,
    pub npv: f64,
}

/// Convert energy savings to dollars, present worth, SIR and NPV.
///
/// Calibration factors have already been folded into `savings` by the
/// caller (envelope deltas scale explicitly; snapshot-derived figures are
/// scaled through the snapshot itself).
pub fn price(
    savings: SavingsResult,
    cost: f64,
    life_years: f64,
    priority: PriorityClass,
    ctx: &EvalContext,
) -> Result<PricedSavings, AuditError> {
    let heat_fuel = ctx.heating_fuel();
    let heat_dollars = savings.heat_mmbtu * ctx.econ.price_per_mmbtu(heat_fuel);
    let cool_dollars = savings.cool_mmbtu * ctx.econ.price_per_mmbtu(FuelKind::Electricity);
    let base_fuel = savings.base_fuel.unwrap_or(FuelKind::Electricity);
    let base_dollars =
        savings.base_mmbtu * ctx.econ.price_per_mmbtu(base_fuel) + savings.direct_dollars;

    let pw = ctx.econ.present_worth(heat_fuel, heat_dollars, life_years)
        + ctx
            .econ
            .present_worth(FuelKind::Electricity, cool_dollars, life_years)
        + ctx.econ.present_worth(base_fuel, base_dollars, life_years);

    // Required and always-first measures may carry no entered cost; the
    // SIR arithmetic uses a one-dollar floor so the ratio stays finite
    // while the reported cost stays as entered.
    let sir = if cost > 0.0 {
        economics::sir(pw, cost)?
    } else if priority.bypasses_sir_threshold() {
        pw / 1.0
    } else {
        return Err(AuditError::invariant(
            "measure cost",
            "non-required measure evaluated with zero installed cost",
        ));
    };

    Ok(PricedSavings {
        savings,
        heat_dollars,
        cool_dollars,
        base_dollars,
        annual_dollars: heat_dollars + cool_dollars + base_dollars,
        sir,
        npv: economics::npv(pw, cost),
    })
}

/// Assemble a candidate record from an evaluator's raw output.
pub fn build_candidate(
    kind: MeasureKind,
    detail: impl Into<String>,
    components: Vec<String>,
    savings: SavingsResult,
    cost: f64,
    magnitude: f64,
    ctx: &EvalContext,
) -> Result<Candidate, AuditError> {
    let priority = kind.default_priority();
    let life_years = kind.default_life_years();
    let priced = price(savings, cost, life_years, priority, ctx)?;
    Ok(Candidate {
        kind,
        category: kind.econ_category(),
        detail: detail.into(),
        components,
        heat_savings_mmbtu: priced.savings.heat_mmbtu,
        cool_savings_mmbtu: priced.savings.cool_mmbtu,
        base_savings_mmbtu: priced.savings.base_mmbtu,
        base_fuel: priced.savings.base_fuel,
        heat_dollars: priced.heat_dollars,
        cool_dollars: priced.cool_dollars,
        base_dollars: priced.base_dollars,
        annual_dollars: priced.annual_dollars,
        cost,
        life_years,
        sir: priced.sir,
        npv: priced.npv,
        priority,
        required: false,
        magnitude,
        state: CandidateState::Scored,
        associated_winner: None,
    })
}

/// Registry dispatch: run the evaluator for one measure kind against the
/// given context, appending candidates and advisory notes.
pub fn evaluate_kind(
    kind: MeasureKind,
    ctx: &EvalContext,
    out: &mut Vec<Candidate>,
    notes: &mut Vec<String>,
) -> Result<(), AuditError> {
    match kind {
        MeasureKind::DuctSealing
        | MeasureKind::SetbackThermostat
        | MeasureKind::FurnaceTuneUp
        | MeasureKind::FurnaceReplacement
        | MeasureKind::HighEfficiencyFurnace
        | MeasureKind::BoilerTuneUp
        | MeasureKind::HighEfficiencyBoiler
        | MeasureKind::VentDamper
        | MeasureKind::IntermittentIgnition
        | MeasureKind::FlueDamper
        | MeasureKind::SpaceHeaterReplacement
        | MeasureKind::HeatPumpReplacement
        | MeasureKind::CentralAcReplacement
        | MeasureKind::RoomAcReplacement
        | MeasureKind::AcTuneUp
        | MeasureKind::EvaporativeCooler
        | MeasureKind::WholeHouseFan => hvac::evaluate(kind, ctx, out),
        MeasureKind::InfiltrationReduction
        | MeasureKind::AtticInsulationR11
        | MeasureKind::AtticInsulationR19
        | MeasureKind::AtticInsulationR30
        | MeasureKind::AtticInsulationR38
        | MeasureKind::FillAtticCavity
        | MeasureKind::WallInsulation
        | MeasureKind::FoundationWallInsulation
        | MeasureKind::SillBoxInsulation
        | MeasureKind::FloorInsulation
        | MeasureKind::WhiteRoofCoating => envelope::evaluate(kind, ctx, out, notes),
        MeasureKind::StormWindows
        | MeasureKind::WindowReplacement
        | MeasureKind::LowEWindowFilm
        | MeasureKind::WindowShading
        | MeasureKind::WindowSealing
        | MeasureKind::StormDoors
        | MeasureKind::DoorReplacement => openings::evaluate(kind, ctx, out),
        MeasureKind::WaterHeaterTankWrap
        | MeasureKind::WaterHeaterPipeInsulation
        | MeasureKind::LowFlowShowerheads
        | MeasureKind::WaterHeaterReplacement => water_heater::evaluate(kind, ctx, out),
        MeasureKind::LightingRetrofit | MeasureKind::RefrigeratorReplacement => {
            baseload::evaluate(kind, ctx, out)
        }
        MeasureKind::ItemizedRepair => itemized::evaluate(ctx, out),
    }
}

/// Re-derive a candidate's economics against the current working state.
///
/// Envelope measures recompute their load delta; heating/cooling-system
/// measures substitute the new equipment efficiency against the current
/// loads; water-heating, baseload and itemized measures keep their
/// precomputed figures.
pub fn rederive(cand: &Candidate, ctx: &EvalContext) -> Result<PricedSavings, AuditError> {
    let savings = if is_opening_measure(cand.kind) {
        openings::rederive_savings(cand, ctx)
    } else {
        match cand.category {
            EconCategory::Envelope => envelope::rederive_savings(cand, ctx),
            EconCategory::HeatingSystem | EconCategory::CoolingSystem => {
                hvac::rederive_savings(cand, ctx)
            }
            EconCategory::WaterHeating | EconCategory::Baseload => SavingsResult {
                heat_mmbtu: cand.heat_savings_mmbtu,
                cool_mmbtu: cand.cool_savings_mmbtu,
                base_mmbtu: cand.base_savings_mmbtu,
                base_fuel: cand.base_fuel,
                direct_dollars: 0.0,
            },
            // Itemized entries carry their dollars directly.
            EconCategory::Itemized => SavingsResult {
                direct_dollars: cand.base_dollars,
                ..SavingsResult::default()
            },
        }
    };
    price(savings, cand.cost, cand.life_years, cand.priority, ctx)
}

/// Mutate the working dwelling state to reflect an accepted candidate.
pub fn apply(cand: &Candidate, dwelling: &mut DwellingState) -> Result<(), AuditError> {
    if is_opening_measure(cand.kind) {
        return openings::apply(cand, dwelling);
    }
    match cand.category {
        EconCategory::Envelope => envelope::apply(cand, dwelling),
        EconCategory::HeatingSystem | EconCategory::CoolingSystem => hvac::apply(cand, dwelling),
        EconCategory::WaterHeating => water_heater::apply(cand, dwelling),
        // No thermal-model effect; savings are purely baseload or direct.
        EconCategory::Baseload | EconCategory::Itemized => Ok(()),
    }
}

/// Window and door measures: envelope economics, but evaluated and
/// applied by the openings module.
pub fn is_opening_measure(kind: MeasureKind) -> bool {
    matches!(
        kind,
        MeasureKind::StormWindows
            | MeasureKind::WindowReplacement
            | MeasureKind::LowEWindowFilm
            | MeasureKind::WindowShading
            | MeasureKind::WindowSealing
            | MeasureKind::StormDoors
            | MeasureKind::DoorReplacement
    )
}

/// Measures the openings evaluators treat as window-kind records for the
/// reporting merge.
pub fn is_window_measure(kind: MeasureKind) -> bool {
    matches!(
        kind,
        MeasureKind::StormWindows
            | MeasureKind::WindowReplacement
            | MeasureKind::LowEWindowFilm
            | MeasureKind::WindowShading
            | MeasureKind::WindowSealing
    )
}
