//! Error taxonomy for the calculators and the attendance ledger.
//!
//! Every failure here is a caller-input problem: nothing is transient
//! and nothing is retried.  Startup code (configuration, rule loading,
//! binding the listener) reports through `anyhow` instead.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("clock-out {clock_out} is earlier than clock-in {clock_in}")]
    InvalidTimeRange {
        clock_in: NaiveTime,
        clock_out: NaiveTime,
    },

    #[error("invalid value {value} for `{field}`: must be a finite, non-negative number")]
    InvalidInput { field: &'static str, value: f64 },

    #[error("`{field}` is too large to represent")]
    Overflow { field: &'static str },

    #[error("pay period start {start} is after end {end}")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },

    #[error("already clocked in today")]
    AlreadyClockedIn,

    #[error("already clocked out today")]
    AlreadyClockedOut,

    #[error("no clock-in record found for today")]
    NotClockedIn,

    #[error("unknown rule set `{0}`")]
    UnknownRuleSet(String),

    #[error("invalid rule set: {0}")]
    InvalidRules(String),

    #[error("employee {employee_id}: {source}")]
    Employee {
        employee_id: String,
        #[source]
        source: Box<CalcError>,
    },
}

impl CalcError {
    /// True for the clock-in/clock-out state conflicts.
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            CalcError::AlreadyClockedIn | CalcError::AlreadyClockedOut | CalcError::NotClockedIn
        )
    }

    /// Strips `Employee` wrappers down to the underlying cause.
    pub fn root(&self) -> &CalcError {
        match self {
            CalcError::Employee { source, .. } => source.root(),
            other => other,
        }
    }
}
