//! Error taxonomy. `PlanError` is the only error type that
//! crosses the [`crate::planner::plan`] boundary; internal subroutines use
//! their own typed results and get mapped here.

use thiserror::Error;

use crate::geometry::GeomError;

/// Errors returned by [`crate::planner::plan`]. Stable enum kind plus a
/// human-readable `reason`, suitable for direct display; no partial
/// `PlanOutput` is ever returned alongside an error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlanError {
    #[error("bad input in field `{field}`: {reason}")]
    BadInput { field: String, reason: String },

    #[error("offset engine failed on pass {pass}: {reason}")]
    OffsetFailure { pass: usize, reason: String },

    #[error("infeasible configuration: {reason}")]
    Infeasible { reason: String },

    #[error("machine profile mismatch: {reason}")]
    ProfileMismatch { reason: String },
}

impl PlanError {
    pub fn bad_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PlanError::BadInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn infeasible(reason: impl Into<String>) -> Self {
        PlanError::Infeasible {
            reason: reason.into(),
        }
    }

    pub fn profile_mismatch(reason: impl Into<String>) -> Self {
        PlanError::ProfileMismatch {
            reason: reason.into(),
        }
    }

    /// Map a loop-validation failure onto `BadInput { field: "loops[i]", .. }`.
    pub fn from_geom(field: impl Into<String>, err: GeomError) -> Self {
        PlanError::BadInput {
            field: field.into(),
            reason: err.to_string(),
        }
    }
}

/// Internal result type used by the offset engine; distinct from
/// `OffsetCollapsed`, which is not an error and is instead
/// represented by an empty `Vec<Ring>` return.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OffsetError {
    #[error("bad loop at index {index}: {reason}")]
    BadLoop { index: usize, reason: String },
    #[error("offset backend failure: {0}")]
    Backend(String),
}

impl From<OffsetError> for PlanError {
    fn from(err: OffsetError) -> Self {
        match err {
            OffsetError::BadLoop { index, reason } => PlanError::BadInput {
                field: format!("loops[{index}]"),
                reason,
            },
            OffsetError::Backend(reason) => PlanError::OffsetFailure { pass: 0, reason },
        }
    }
}
