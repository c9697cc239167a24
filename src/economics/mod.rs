//! Fuel pricing and present-worth arithmetic: the conversion from annual
//! energy savings to dollar savings, SIR, and NPV.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AuditError;

pub const KWH_PER_MMBTU: f64 = 293.07;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FuelKind {
    NaturalGas,
    Electricity,
    Oil,
    Propane,
    Kerosene,
    Wood,
}

impl FuelKind {
    pub const ALL: [FuelKind; 6] = [
        FuelKind::NaturalGas,
        FuelKind::Electricity,
        FuelKind::Oil,
        FuelKind::Propane,
        FuelKind::Kerosene,
        FuelKind::Wood,
    ];

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::NaturalGas => "natural_gas",
            Self::Electricity => "electricity",
            Self::Oil => "oil",
            Self::Propane => "propane",
            Self::Kerosene => "kerosene",
            Self::Wood => "wood",
        }
    }
}

impl Display for FuelKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::NaturalGas => "natural gas",
            Self::Electricity => "electricity",
            Self::Oil => "fuel oil",
            Self::Propane => "propane",
            Self::Kerosene => "kerosene",
            Self::Wood => "wood",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Error)]
#[error("unknown fuel kind: {0}")]
pub struct FuelParseError(pub String);

impl FromStr for FuelKind {
    type Err = FuelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "natural_gas" | "gas" => Ok(Self::NaturalGas),
            "electricity" | "electric" => Ok(Self::Electricity),
            "oil" | "fuel_oil" => Ok(Self::Oil),
            "propane" | "lpg" => Ok(Self::Propane),
            "kerosene" => Ok(Self::Kerosene),
            "wood" => Ok(Self::Wood),
            _ => Err(FuelParseError(s.to_string())),
        }
    }
}

/// Per-fuel retail price ($/MMBtu delivered) and real escalation rate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FuelRates {
    pub price_per_mmbtu: f64,
    #[serde(default)]
    pub escalation: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FuelTable {
    pub natural_gas: FuelRates,
    pub electricity: FuelRates,
    pub oil: FuelRates,
    pub propane: FuelRates,
    pub kerosene: FuelRates,
    pub wood: FuelRates,
}

impl FuelTable {
    pub fn rates(&self, fuel: FuelKind) -> &FuelRates {
        match fuel {
            FuelKind::NaturalGas => &self.natural_gas,
            FuelKind::Electricity => &self.electricity,
            FuelKind::Oil => &self.oil,
            FuelKind::Propane => &self.propane,
            FuelKind::Kerosene => &self.kerosene,
            FuelKind::Wood => &self.wood,
        }
    }
}

impl Default for FuelTable {
    fn default() -> Self {
        Self {
            natural_gas: FuelRates {
                price_per_mmbtu: 12.0,
                escalation: 0.012,
            },
            electricity: FuelRates {
                price_per_mmbtu: 38.0,
                escalation: 0.008,
            },
            oil: FuelRates {
                price_per_mmbtu: 22.0,
                escalation: 0.015,
            },
            propane: FuelRates {
                price_per_mmbtu: 26.0,
                escalation: 0.013,
            },
            kerosene: FuelRates {
                price_per_mmbtu: 24.0,
                escalation: 0.015,
            },
            wood: FuelRates {
                price_per_mmbtu: 10.0,
                escalation: 0.005,
            },
        }
    }
}

/// Economic view handed to evaluators: fuel prices plus the program's
/// discount rate and minimum acceptable SIR.
#[derive(Debug, Clone, PartialEq)]
pub struct Economics {
    pub real_discount_rate: f64,
    pub min_sir: f64,
    pub fuels: FuelTable,
}

impl Economics {
    pub fn price_per_mmbtu(&self, fuel: FuelKind) -> f64 {
        self.fuels.rates(fuel).price_per_mmbtu
    }

    /// Uniform present-worth factor for a level annual cash flow escalating
    /// at the fuel's real rate, discounted over `life_years`.
    pub fn upw(&self, fuel: FuelKind, life_years: f64) -> f64 {
        let n = life_years.max(1.0).round() as u32;
        let escalation = self.fuels.rates(fuel).escalation;
        let ratio = (1.0 + escalation) / (1.0 + self.real_discount_rate);
        if (ratio - 1.0).abs() < 1e-9 {
            return n as f64;
        }
        ratio * (1.0 - ratio.powi(n as i32)) / (1.0 - ratio)
    }

    /// Present worth of `annual_dollars` saved each year over the life.
    pub fn present_worth(&self, fuel: FuelKind, annual_dollars: f64, life_years: f64) -> f64 {
        annual_dollars * self.upw(fuel, life_years)
    }
}

impl Default for Economics {
    fn default() -> Self {
        Self {
            real_discount_rate: 0.03,
            min_sir: 1.0,
            fuels: FuelTable::default(),
        }
    }
}

/// SIR = present worth of lifetime savings / installed cost. A zero or
/// negative cost is a divide-by-zero-prone input and therefore fatal.
pub fn sir(present_worth: f64, cost: f64) -> Result<f64, AuditError> {
    if cost <= 0.0 {
        return Err(AuditError::invariant(
            "measure cost",
            format!("cost must be positive to form an SIR, got {cost}"),
        ));
    }
    Ok(present_worth / cost)
}

pub fn npv(present_worth: f64, cost: f64) -> f64 {
    present_worth - cost
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upw_reduces_to_life_when_rates_cancel() {
        let mut econ = Economics::default();
        econ.real_discount_rate = 0.01;
        econ.fuels.natural_gas.escalation = 0.01;
        let upw = econ.upw(FuelKind::NaturalGas, 15.0);
        assert!((upw - 15.0).abs() < 1e-9);
    }

    #[test]
    fn upw_discounts_below_life_for_flat_prices() {
        let mut econ = Economics::default();
        econ.fuels.electricity.escalation = 0.0;
        let upw = econ.upw(FuelKind::Electricity, 20.0);
        assert!(upw < 20.0);
        assert!(upw > 10.0);
    }

    #[test]
    fn sir_rejects_zero_cost() {
        assert!(sir(1000.0, 0.0).is_err());
        let value = sir(1800.0, 900.0).expect("positive cost");
        assert!((value - 2.0).abs() < 1e-9);
        assert!((npv(1800.0, 900.0) - 900.0).abs() < 1e-9);
    }
}
