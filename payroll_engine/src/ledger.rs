//! In-memory attendance ledger.
//!
//! The ledger keeps one [`AttendanceRecord`] per employee per work
//! date and is the only mutable state in the service.  The API owns a
//! single ledger behind a write lock, which serialises clock-in and
//! clock-out for the same employee and day.

use crate::attendance::{AttendanceDurationCalculator, AttendanceRecord};
use crate::error::CalcError;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Completed days and hours for one employee over a date range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub days_worked: u32,
    pub total_hours: f64,
    /// Suitable as [`PayrollInput::overtime_hours`](crate::models::PayrollInput).
    pub overtime_hours: f64,
}

#[derive(Debug, Default)]
pub struct AttendanceLedger {
    records: BTreeMap<(String, NaiveDate), AttendanceRecord>,
}

impl AttendanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, employee_id: &str, work_date: NaiveDate) -> Option<&AttendanceRecord> {
        self.records.get(&(employee_id.to_string(), work_date))
    }

    pub fn clock_in(
        &mut self,
        employee_id: &str,
        work_date: NaiveDate,
        at: NaiveTime,
    ) -> Result<AttendanceRecord, CalcError> {
        let record = self
            .records
            .entry((employee_id.to_string(), work_date))
            .or_insert_with(|| AttendanceRecord::new(employee_id, work_date));
        record.clock_in(at)?;
        info!(employee_id, %work_date, clock_in = %at, "clocked in");
        Ok(record.clone())
    }

    pub fn clock_out(
        &mut self,
        employee_id: &str,
        work_date: NaiveDate,
        at: NaiveTime,
        calculator: &AttendanceDurationCalculator,
    ) -> Result<AttendanceRecord, CalcError> {
        let record = self
            .records
            .get_mut(&(employee_id.to_string(), work_date))
            .ok_or(CalcError::NotClockedIn)?;
        let result = record.clock_out(at, calculator)?;
        info!(
            employee_id,
            %work_date,
            clock_out = %at,
            total_hours = result.total_hours,
            overtime_hours = result.overtime_hours,
            "clocked out"
        );
        Ok(record.clone())
    }

    /// Records for one employee within the inclusive range, newest
    /// first.  Either bound may be left open.
    pub fn records_for(
        &self,
        employee_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Vec<&AttendanceRecord> {
        let mut records: Vec<&AttendanceRecord> = self
            .records
            .values()
            .filter(|r| r.employee_id == employee_id)
            .filter(|r| start.map_or(true, |s| r.work_date >= s))
            .filter(|r| end.map_or(true, |e| r.work_date <= e))
            .collect();
        records.reverse();
        records
    }

    /// Sums the completed (clocked-out) days in the inclusive range.
    pub fn summarize(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<AttendanceSummary, CalcError> {
        if start > end {
            return Err(CalcError::InvalidPeriod { start, end });
        }
        let summary = self
            .records_for(employee_id, Some(start), Some(end))
            .into_iter()
            .filter_map(|r| Some((r.total_hours?, r.overtime_hours?)))
            .fold(AttendanceSummary::default(), |acc, (total, overtime)| {
                AttendanceSummary {
                    days_worked: acc.days_worked + 1,
                    total_hours: acc.total_hours + total,
                    overtime_hours: acc.overtime_hours + overtime,
                }
            });
        Ok(summary)
    }
}
