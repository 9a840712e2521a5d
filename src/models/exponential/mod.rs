//! Exponential smoothing in the ETS state-space framework.

mod auto_ets;
mod ets;

pub use auto_ets::{AutoETS, AutoETSConfig, EtsSelection, SelectionCriterion};
pub use ets::{ETSSpec, ErrorType, EtsParams, SeasonalType, TrendType, ETS};
