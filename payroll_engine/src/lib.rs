//! Payroll Engine library crate.
//!
//! This crate exposes the attendance and payroll calculators, the
//! rule sets they are parameterised by, and a thin HTTP API as
//! reusable modules.  External applications may call
//! `engine::PayrollCalculator` and
//! `attendance::AttendanceDurationCalculator` directly or embed the API
//! via `api::build_router`.

pub mod api;
pub mod attendance;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod models;
pub mod payslip;
pub mod rules;

pub use attendance::AttendanceDurationCalculator;
pub use engine::{run_payroll, PayrollCalculator};
pub use error::CalcError;
