//! Data-consistency checks, run once before the evaluation engine. Every
//! failure here is fatal and names the offending component or quantity.

use std::collections::{BTreeMap, BTreeSet};

use crate::dwelling::DwellingState;
use crate::error::AuditError;

pub fn validate(dwelling: &DwellingState) -> Result<(), AuditError> {
    if dwelling.floor_area_sqft <= 0.0 {
        return Err(AuditError::invariant(
            "floor_area_sqft",
            "conditioned floor area must be positive",
        ));
    }
    if dwelling.infiltration_cfm50 < 0.0 {
        return Err(AuditError::invariant(
            "infiltration_cfm50",
            "whole-house leakage cannot be negative",
        ));
    }
    if dwelling.heating.efficiency <= 0.0 {
        return Err(AuditError::invariant(
            format!("heating system {}", dwelling.heating.id),
            "efficiency must be positive",
        ));
    }
    if let Some(cooling) = &dwelling.cooling {
        if cooling.seer <= 0.0 {
            return Err(AuditError::invariant(
                format!("cooling system {}", cooling.id),
                "SEER must be positive",
            ));
        }
    }
    if let Some(wh) = &dwelling.water_heater {
        if wh.energy_factor <= 0.0 {
            return Err(AuditError::invariant(
                format!("water heater {}", wh.id),
                "energy factor must be positive",
            ));
        }
    }

    check_unique_ids(dwelling)?;
    check_positive_areas(dwelling)?;
    check_measure_groups(dwelling)?;
    Ok(())
}

fn check_unique_ids(dwelling: &DwellingState) -> Result<(), AuditError> {
    let mut seen = BTreeSet::new();
    let mut ids: Vec<&str> = Vec::new();
    ids.extend(dwelling.walls.iter().map(|c| c.id.as_str()));
    ids.extend(dwelling.windows.iter().map(|c| c.id.as_str()));
    ids.extend(dwelling.doors.iter().map(|c| c.id.as_str()));
    ids.extend(dwelling.attics.iter().map(|c| c.id.as_str()));
    ids.extend(dwelling.foundations.iter().map(|c| c.id.as_str()));
    ids.extend(dwelling.lighting.iter().map(|c| c.id.as_str()));
    ids.extend(dwelling.itemized.iter().map(|c| c.id.as_str()));
    for id in ids {
        if !seen.insert(id) {
            return Err(AuditError::Inconsistent(format!(
                "duplicate component id: {id}"
            )));
        }
    }
    Ok(())
}

fn check_positive_areas(dwelling: &DwellingState) -> Result<(), AuditError> {
    for wall in &dwelling.walls {
        if wall.area_sqft <= 0.0 {
            return Err(AuditError::invariant(
                format!("wall {}", wall.id),
                "area must be positive",
            ));
        }
    }
    for window in &dwelling.windows {
        if window.area_sqft <= 0.0 || window.count == 0 {
            return Err(AuditError::invariant(
                format!("window {}", window.id),
                "area and count must be positive",
            ));
        }
    }
    for attic in &dwelling.attics {
        if attic.area_sqft <= 0.0 {
            return Err(AuditError::invariant(
                format!("attic {}", attic.id),
                "area must be positive",
            ));
        }
    }
    Ok(())
}

/// Walls sharing a measure-group number are insulated as one measure
/// instance; a group whose members disagree on insulation type is
/// unresolvable.
fn check_measure_groups(dwelling: &DwellingState) -> Result<(), AuditError> {
    let mut group_types = BTreeMap::new();
    for wall in &dwelling.walls {
        let Some(group) = wall.measure_group else {
            continue;
        };
        match group_types.insert(group, wall.insulation_type) {
            Some(previous) if previous != wall.insulation_type => {
                return Err(AuditError::Inconsistent(format!(
                    "walls in measure group {group} specify different insulation types \
                     ({previous:?} vs {:?} on wall {})",
                    wall.insulation_type, wall.id
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dwelling::components::WallInsulationType;

    #[test]
    fn sample_dwelling_validates() {
        assert!(validate(&DwellingState::sample()).is_ok());
    }

    #[test]
    fn mixed_insulation_types_in_group_are_rejected() {
        let mut dwelling = DwellingState::sample();
        dwelling.walls[1].insulation_type = WallInsulationType::Foam;
        let err = validate(&dwelling).expect_err("group mismatch should fail");
        assert!(matches!(err, AuditError::Inconsistent(_)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut dwelling = DwellingState::sample();
        dwelling.walls[1].id = dwelling.walls[0].id.clone();
        assert!(validate(&dwelling).is_err());
    }

    #[test]
    fn zero_efficiency_heating_is_fatal() {
        let mut dwelling = DwellingState::sample();
        dwelling.heating.efficiency = 0.0;
        let err = validate(&dwelling).expect_err("zero efficiency should fail");
        assert!(matches!(err, AuditError::Invariant { .. }));
    }
}
