//! Monthly climate normals used by the baseline simulation.

use serde::{Deserialize, Serialize};

/// Degree-day climate normals, base 65 °F.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Climate {
    pub name: String,
    /// Heating degree-days per month.
    pub hdd65: [f64; 12],
    /// Cooling degree-days per month.
    pub cdd65: [f64; 12],
    /// Usable solar gain through a reference square foot of south glazing,
    /// kBtu/sqft-month.
    pub solar_kbtu_per_sqft: [f64; 12],
}

impl Climate {
    /// Mixed mid-latitude climate, roughly a zone-4 heating/cooling split.
    /// Used when the dwelling description carries no climate override.
    pub fn default_normals() -> Self {
        Self {
            name: "mixed".to_string(),
            hdd65: [
                1070.0, 880.0, 700.0, 380.0, 150.0, 20.0, 0.0, 0.0, 60.0, 340.0, 670.0, 980.0,
            ],
            cdd65: [
                0.0, 0.0, 10.0, 40.0, 130.0, 290.0, 400.0, 370.0, 200.0, 50.0, 0.0, 0.0,
            ],
            solar_kbtu_per_sqft: [
                18.0, 22.0, 28.0, 30.0, 32.0, 33.0, 34.0, 32.0, 28.0, 24.0, 17.0, 15.0,
            ],
        }
    }

    pub fn annual_hdd(&self) -> f64 {
        self.hdd65.iter().sum()
    }

    pub fn annual_cdd(&self) -> f64 {
        self.cdd65.iter().sum()
    }

    /// Months where cooling dominates heating, used by cooling-only
    /// measures to decide applicability.
    pub fn cooling_months(&self) -> usize {
        self.hdd65
            .iter()
            .zip(self.cdd65.iter())
            .filter(|(h, c)| c > h)
            .count()
    }
}

impl Default for Climate {
    fn default() -> Self {
        Self::default_normals()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_normals_are_plausible() {
        let climate = Climate::default_normals();
        assert!(climate.annual_hdd() > 3000.0);
        assert!(climate.annual_cdd() > 1000.0);
        assert!(climate.cooling_months() >= 3);
    }
}
