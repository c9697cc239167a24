use thiserror::Error;

/// Fatal error taxonomy for an audit run.
///
/// Soft conditions (an inapplicable measure, insufficient billing history,
/// a candidate below the minimum SIR) are never errors; they show up as a
/// measure simply missing from or demoted within the final package.
#[derive(Debug, Error)]
pub enum AuditError {
    /// A quantity that must be nonzero or in-bounds is not. Indicates
    /// malformed input data; there is no recovery path.
    #[error("invariant violation in {quantity}: {detail}")]
    Invariant { quantity: String, detail: String },

    /// Two parts of the dwelling description contradict each other.
    /// Detected during validation, before the evaluation engine runs.
    #[error("inconsistent dwelling description: {0}")]
    Inconsistent(String),

    /// A hard engine limit was exceeded.
    #[error("measure limit exceeded: {0}")]
    MeasureLimit(String),
}

impl AuditError {
    pub fn invariant(quantity: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Invariant {
            quantity: quantity.into(),
            detail: detail.into(),
        }
    }
}
