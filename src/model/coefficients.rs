use crate::model::{constants::RATING_COEFFICIENTS, structures::grade::Grade};
use std::str::FromStr;
use tracing::warn;

/// Vote multipliers keyed by (evaluator grade, rated grade).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoefficientTable {
    matrix: [[f64; 4]; 4]
}

impl Default for CoefficientTable {
    fn default() -> Self {
        Self::new(RATING_COEFFICIENTS)
    }
}

impl CoefficientTable {
    pub fn new(matrix: [[f64; 4]; 4]) -> Self {
        CoefficientTable { matrix }
    }

    pub fn coefficient(&self, evaluator: Grade, rated: Grade) -> f64 {
        self.matrix[evaluator.ordinal()][rated.ordinal()]
    }

    /// Lookup by stored grade names. An unknown name resolves to 0 so a bad row
    /// cannot stop a batch; the miss is logged as a data problem.
    pub fn coefficient_by_name(&self, evaluator: &str, rated: &str) -> f64 {
        match (Grade::from_str(evaluator), Grade::from_str(rated)) {
            (Ok(e), Ok(r)) => self.coefficient(e, r),
            _ => {
                warn!(evaluator, rated, "Unknown grade combination, using coefficient 0");
                0.0
            }
        }
    }
}
