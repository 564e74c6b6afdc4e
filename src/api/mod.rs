//! HTTP API module for the attendance engine.
//!
//! This module provides the REST endpoints for tag taps, payroll
//! calculation, reports and roster administration.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    AssignTagRequest, BanQuery, CalculateRangeQuery, LabelQuery, MonthQuery, PeriodQuery,
    RangeQuery, TapRequest, parse_instant,
};
pub use response::{ApiError, ApiErrorResponse, CalculationLine, CalculationResponse, TapResponse};
pub use state::AppState;
