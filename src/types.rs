use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{MeasureKind, PriorityClass};
use crate::engine::billing::CalibrationOutcome;
use crate::measures::Candidate;
use crate::simulation::BaselineSnapshot;

/// Final audit output: the accepted retrofit package in rank order, the
/// NPV-only remainder, baseline figures, and advisory notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub dwelling: String,
    pub generated_at: DateTime<Utc>,
    pub baseline: BaselineSummary,
    pub calibration: Option<CalibrationOutcome>,
    pub package: Vec<PackageMeasure>,
    pub npv_only: Vec<PackageMeasure>,
    pub summary: PackageSummary,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineSummary {
    pub heat_load_mmbtu: f64,
    pub cool_load_mmbtu: f64,
    pub heat_energy_mmbtu: f64,
    pub cool_energy_mmbtu: f64,
}

impl From<&BaselineSnapshot> for BaselineSummary {
    fn from(snapshot: &BaselineSnapshot) -> Self {
        Self {
            heat_load_mmbtu: snapshot.heat_load_mmbtu,
            cool_load_mmbtu: snapshot.cool_load_mmbtu,
            heat_energy_mmbtu: snapshot.heat_energy_mmbtu,
            cool_energy_mmbtu: snapshot.cool_energy_mmbtu,
        }
    }
}

/// One reported measure, after window-record recombination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMeasure {
    pub rank: usize,
    pub kind: MeasureKind,
    pub measure: String,
    pub detail: String,
    pub components: Vec<String>,
    pub annual_savings_mmbtu: f64,
    pub annual_savings_dollars: f64,
    pub heat_savings_dollars: f64,
    pub cool_savings_dollars: f64,
    pub cost: f64,
    pub sir: f64,
    pub npv: f64,
    pub life_years: f64,
    pub priority: PriorityClass,
    pub required: bool,
}

impl PackageMeasure {
    pub fn from_candidate(cand: &Candidate) -> Self {
        Self {
            rank: 0,
            kind: cand.kind,
            measure: cand.kind.label().to_string(),
            detail: cand.detail.clone(),
            components: cand.components.clone(),
            annual_savings_mmbtu: cand.heat_savings_mmbtu
                + cand.cool_savings_mmbtu
                + cand.base_savings_mmbtu,
            annual_savings_dollars: cand.annual_dollars,
            heat_savings_dollars: cand.heat_dollars,
            cool_savings_dollars: cand.cool_dollars,
            cost: cand.cost,
            sir: cand.sir,
            npv: cand.npv,
            life_years: cand.life_years,
            priority: cand.priority,
            required: cand.required,
        }
    }

    /// Fold another record of the same measure kind into this one:
    /// costs, savings and NPV add, and the SIR is recomputed from the
    /// merged present worth.
    pub fn merge(&mut self, other: &PackageMeasure) {
        self.components.extend(other.components.iter().cloned());
        self.annual_savings_mmbtu += other.annual_savings_mmbtu;
        self.annual_savings_dollars += other.annual_savings_dollars;
        self.heat_savings_dollars += other.heat_savings_dollars;
        self.cool_savings_dollars += other.cool_savings_dollars;
        self.npv += other.npv;
        self.cost += other.cost;
        if self.cost > 0.0 {
            self.sir = (self.npv + self.cost) / self.cost;
        }
        self.detail = format!("{} window groups", self.components.len());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSummary {
    pub measure_count: usize,
    pub total_cost: f64,
    pub total_annual_savings_dollars: f64,
    pub total_annual_savings_mmbtu: f64,
    /// Present worth of the whole package over its cost.
    pub package_sir: f64,
}

impl PackageSummary {
    pub fn from_measures(package: &[PackageMeasure]) -> Self {
        let total_cost: f64 = package.iter().map(|m| m.cost).sum();
        let total_pw: f64 = package.iter().map(|m| m.npv + m.cost).sum();
        Self {
            measure_count: package.len(),
            total_cost,
            total_annual_savings_dollars: package
                .iter()
                .map(|m| m.annual_savings_dollars)
                .sum(),
            total_annual_savings_mmbtu: package.iter().map(|m| m.annual_savings_mmbtu).sum(),
            package_sir: if total_cost > 0.0 {
                total_pw / total_cost
            } else {
                0.0
            },
        }
    }
}
