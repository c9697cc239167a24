//! Utility-bill calibration: regress actual monthly consumption against
//! the simulated baseline to produce per-end-use adjustment factors, then
//! let the pipeline re-run once on the rescaled baseline.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dwelling::{DwellingState, EndUse};
use crate::measures::CalibrationFactors;
use crate::simulation::BaselineSnapshot;

/// Factors outside this band indicate a degenerate regression (vacant
/// house, wrong meter, fuel mix-up) and are not applied.
const FACTOR_MIN: f64 = 0.3;
const FACTOR_MAX: f64 = 3.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CalibrationOutcome {
    pub factors: CalibrationFactors,
    pub heating_periods: usize,
    pub cooling_periods: usize,
}

/// Least-squares-through-origin factor per end use over matched months.
/// Returns `None` (calibration skipped, soft condition) when neither end
/// use has enough usable periods or a factor is degenerate.
pub fn calibrate(
    dwelling: &DwellingState,
    baseline: &BaselineSnapshot,
    min_periods: usize,
) -> (Option<CalibrationOutcome>, Vec<String>) {
    let mut notes = Vec::new();
    if dwelling.billing.is_empty() {
        return (None, notes);
    }

    let heating = end_use_factor(dwelling, baseline, EndUse::Heating, min_periods);
    let cooling = end_use_factor(dwelling, baseline, EndUse::Cooling, min_periods);

    let (heating_factor, heating_periods) = match heating {
        Regression::Fit { factor, periods } => (Some(factor), periods),
        Regression::Insufficient { periods } => {
            if periods > 0 {
                notes.push(format!(
                    "heating billing history has {periods} usable periods (need {min_periods}); \
                     heating calibration skipped"
                ));
            }
            (None, periods)
        }
    };
    let (cooling_factor, cooling_periods) = match cooling {
        Regression::Fit { factor, periods } => (Some(factor), periods),
        Regression::Insufficient { periods } => {
            if periods > 0 {
                notes.push(format!(
                    "cooling billing history has {periods} usable periods (need {min_periods}); \
                     cooling calibration skipped"
                ));
            }
            (None, periods)
        }
    };

    if heating_factor.is_none() && cooling_factor.is_none() {
        info!("insufficient billing history; baseline calibration skipped");
        notes.push("insufficient billing history; baseline calibration skipped".to_string());
        return (None, notes);
    }

    for (label, factor) in [("heating", heating_factor), ("cooling", cooling_factor)] {
        if let Some(f) = factor {
            if !(FACTOR_MIN..=FACTOR_MAX).contains(&f) {
                let note = format!(
                    "billing regression produced a degenerate {label} factor ({f:.2}); \
                     calibration skipped"
                );
                warn!("{note}");
                notes.push(note);
                return (None, notes);
            }
        }
    }

    let factors = CalibrationFactors {
        heating: heating_factor.unwrap_or(1.0),
        cooling: cooling_factor.unwrap_or(1.0),
    };
    info!(
        heating = factors.heating,
        cooling = factors.cooling,
        "billing calibration factors"
    );
    (
        Some(CalibrationOutcome {
            factors,
            heating_periods,
            cooling_periods,
        }),
        notes,
    )
}

enum Regression {
    Fit { factor: f64, periods: usize },
    Insufficient { periods: usize },
}

fn end_use_factor(
    dwelling: &DwellingState,
    baseline: &BaselineSnapshot,
    end_use: EndUse,
    min_periods: usize,
) -> Regression {
    let simulated = match end_use {
        EndUse::Heating => &baseline.monthly_heat_energy,
        EndUse::Cooling => &baseline.monthly_cool_energy,
    };

    let mut cross = 0.0;
    let mut square = 0.0;
    let mut periods = 0usize;
    for record in dwelling.billing.iter().filter(|r| r.end_use == end_use) {
        if !(1..=12).contains(&record.month) {
            continue;
        }
        let sim = simulated[(record.month - 1) as usize];
        if sim <= 0.0 || record.consumption_mmbtu < 0.0 {
            continue;
        }
        cross += record.consumption_mmbtu * sim;
        square += sim * sim;
        periods += 1;
    }

    if periods < min_periods || square <= 0.0 {
        return Regression::Insufficient { periods };
    }
    Regression::Fit {
        factor: cross / square,
        periods,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dwelling::BillingRecord;
    use crate::simulation::simulate;
    use crate::weather::Climate;

    fn with_heating_bills(scale: f64, months: &[u32]) -> (DwellingState, BaselineSnapshot) {
        let mut dwelling = DwellingState::sample();
        let climate = Climate::default_normals();
        let baseline = simulate(&dwelling, &climate).expect("simulate");
        dwelling.billing = months
            .iter()
            .map(|&month| BillingRecord {
                year: 2025,
                month,
                end_use: EndUse::Heating,
                consumption_mmbtu: baseline.monthly_heat_energy[(month - 1) as usize] * scale,
            })
            .collect();
        (dwelling, baseline)
    }

    #[test]
    fn recovers_exact_scale_factor() {
        let (dwelling, baseline) = with_heating_bills(1.10, &[1, 2, 3, 4, 10, 11, 12]);
        let (outcome, _) = calibrate(&dwelling, &baseline, 6);
        let outcome = outcome.expect("calibration fits");
        assert!((outcome.factors.heating - 1.10).abs() < 1e-9);
        assert!((outcome.factors.cooling - 1.0).abs() < 1e-9);
        assert_eq!(outcome.heating_periods, 7);
    }

    #[test]
    fn too_few_periods_skip_calibration() {
        let (dwelling, baseline) = with_heating_bills(1.10, &[1, 2]);
        let (outcome, notes) = calibrate(&dwelling, &baseline, 6);
        assert!(outcome.is_none());
        assert!(!notes.is_empty());
    }

    #[test]
    fn degenerate_factor_skips_calibration() {
        let (dwelling, baseline) = with_heating_bills(8.0, &[1, 2, 3, 4, 10, 11, 12]);
        let (outcome, notes) = calibrate(&dwelling, &baseline, 6);
        assert!(outcome.is_none());
        assert!(notes.iter().any(|n| n.contains("degenerate")));
    }

    #[test]
    fn no_billing_records_is_silent() {
        let dwelling = DwellingState::sample();
        let climate = Climate::default_normals();
        let baseline = simulate(&dwelling, &climate).expect("simulate");
        let (outcome, notes) = calibrate(&dwelling, &baseline, 6);
        assert!(outcome.is_none());
        assert!(notes.is_empty());
    }
}
