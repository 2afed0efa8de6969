//! Attendance duration and the clock-in/clock-out workflow.
//!
//! [`AttendanceDurationCalculator`] turns one day's clock-in and
//! clock-out into worked hours and overtime.  [`AttendanceRecord`]
//! holds one employee's day and enforces the
//! `NoRecord -> ClockedIn -> ClockedOut` transitions, running the
//! calculator when the employee clocks out.

use crate::error::CalcError;
use crate::models::AttendanceResult;
use crate::rules::WorkRules;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Computes worked hours net of the unpaid break, and overtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttendanceDurationCalculator {
    rules: WorkRules,
}

impl AttendanceDurationCalculator {
    pub fn new(rules: WorkRules) -> Self {
        AttendanceDurationCalculator { rules }
    }

    /// Both thresholds are strict: a shift of exactly
    /// `break_threshold_hours` keeps its break, and exactly
    /// `standard_day_hours` worked is not overtime.
    pub fn compute(
        &self,
        clock_in: NaiveTime,
        clock_out: NaiveTime,
    ) -> Result<AttendanceResult, CalcError> {
        if clock_out < clock_in {
            return Err(CalcError::InvalidTimeRange {
                clock_in,
                clock_out,
            });
        }
        let raw_hours = (clock_out - clock_in).num_milliseconds() as f64 / 3_600_000.0;

        let mut total_hours = raw_hours;
        if raw_hours > self.rules.break_threshold_hours {
            // Unvalidated rules may pair a long break with a short
            // threshold; worked hours still never drop below zero.
            total_hours -= self.rules.break_hours.min(raw_hours);
        }

        let overtime_hours = if total_hours > self.rules.standard_day_hours {
            total_hours - self.rules.standard_day_hours
        } else {
            0.0
        };

        Ok(AttendanceResult {
            total_hours,
            overtime_hours,
        })
    }
}

/// Where an employee's day stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockState {
    NoRecord,
    ClockedIn,
    ClockedOut,
}

/// One employee's attendance for one work date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub employee_id: String,
    pub work_date: NaiveDate,
    pub clock_in: Option<NaiveTime>,
    pub clock_out: Option<NaiveTime>,
    /// Filled in on clock-out.
    pub total_hours: Option<f64>,
    pub overtime_hours: Option<f64>,
}

impl AttendanceRecord {
    pub fn new(employee_id: impl Into<String>, work_date: NaiveDate) -> Self {
        AttendanceRecord {
            employee_id: employee_id.into(),
            work_date,
            clock_in: None,
            clock_out: None,
            total_hours: None,
            overtime_hours: None,
        }
    }

    pub fn state(&self) -> ClockState {
        match (self.clock_in, self.clock_out) {
            (None, _) => ClockState::NoRecord,
            (Some(_), None) => ClockState::ClockedIn,
            (Some(_), Some(_)) => ClockState::ClockedOut,
        }
    }

    /// Valid only from `NoRecord`.
    pub fn clock_in(&mut self, at: NaiveTime) -> Result<(), CalcError> {
        match self.state() {
            ClockState::NoRecord => {
                self.clock_in = Some(at);
                Ok(())
            }
            ClockState::ClockedIn | ClockState::ClockedOut => Err(CalcError::AlreadyClockedIn),
        }
    }

    /// Valid only from `ClockedIn`.  The record is left untouched when
    /// the duration calculation fails.
    pub fn clock_out(
        &mut self,
        at: NaiveTime,
        calculator: &AttendanceDurationCalculator,
    ) -> Result<AttendanceResult, CalcError> {
        let clock_in = match (self.state(), self.clock_in) {
            (ClockState::ClockedIn, Some(clock_in)) => clock_in,
            (ClockState::ClockedOut, _) => return Err(CalcError::AlreadyClockedOut),
            _ => return Err(CalcError::NotClockedIn),
        };
        let result = calculator.compute(clock_in, at)?;
        self.clock_out = Some(at);
        self.total_hours = Some(result.total_hours);
        self.overtime_hours = Some(result.overtime_hours);
        Ok(result)
    }
}
