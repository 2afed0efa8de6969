//! Data models for the Payroll Engine.
//!
//! The `models` module defines the serialisable value objects that
//! flow in and out of the calculators: attendance inputs and results,
//! payroll inputs and breakdowns, and the pay-run envelope used to
//! process many employees for one pay period.  None of these types
//! carry identity beyond the call that produces them; callers persist
//! the fields verbatim and render them without re-deriving anything.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A single work day's clock-in and clock-out, both on the same
/// calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttendanceInput {
    /// Time of day the employee clocked in (`HH:MM:SS`).
    pub clock_in: NaiveTime,
    /// Time of day the employee clocked out.  Must not precede
    /// `clock_in`; overnight shifts are not supported.
    pub clock_out: NaiveTime,
}

/// Worked hours for one day, net of the unpaid break.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AttendanceResult {
    /// Hours worked after the break deduction.
    pub total_hours: f64,
    /// Hours beyond the standard day length.  Never exceeds
    /// `total_hours`.
    pub overtime_hours: f64,
}

/// Period-specific inputs for one employee's payroll.
///
/// Every field except `base_salary` defaults to zero when omitted from
/// a JSON payload, mirroring how the payroll form submits only the
/// figures that apply.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PayrollInput {
    /// Monthly base salary.
    pub base_salary: f64,
    /// Overtime hours worked during the pay period.
    #[serde(default)]
    pub overtime_hours: f64,
    /// Hours worked on holidays during the pay period.
    #[serde(default)]
    pub holiday_hours: f64,
    #[serde(default)]
    pub allowances: f64,
    #[serde(default)]
    pub bonus: f64,
    /// Non-statutory deductions (loans, advances, ...).
    #[serde(default)]
    pub other_deductions: f64,
}

impl PayrollInput {
    /// Iterates the named numeric fields, in declaration order.
    pub(crate) fn fields(&self) -> [(&'static str, f64); 6] {
        [
            ("base_salary", self.base_salary),
            ("overtime_hours", self.overtime_hours),
            ("holiday_hours", self.holiday_hours),
            ("allowances", self.allowances),
            ("bonus", self.bonus),
            ("other_deductions", self.other_deductions),
        ]
    }
}

/// The full payroll breakdown produced by
/// [`PayrollCalculator`](crate::engine::PayrollCalculator).
///
/// No field is rounded.  `net_pay` equals `gross_pay - total_deductions`
/// exactly and may be negative when deductions exceed gross pay.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PayrollResult {
    /// Hourly wage used for the premiums, after the minimum wage floor.
    pub hourly_wage: f64,
    pub overtime_pay: f64,
    pub holiday_pay: f64,
    /// Base salary plus premiums, allowances and bonus.
    pub gross_pay: f64,
    pub income_tax: f64,
    /// Derived from `income_tax`, not from gross pay.
    pub local_tax: f64,
    pub national_pension: f64,
    pub health_insurance: f64,
    /// Derived from `health_insurance`, not from gross pay.
    pub long_term_care: f64,
    pub employment_insurance: f64,
    /// Echo of the input's non-statutory deductions.
    pub other_deductions: f64,
    /// Sum of every statutory deduction plus `other_deductions`.
    pub total_deductions: f64,
    pub net_pay: f64,
}

impl PayrollResult {
    /// Iterates the named amounts, in declaration order.
    pub(crate) fn fields(&self) -> [(&'static str, f64); 13] {
        [
            ("hourly_wage", self.hourly_wage),
            ("overtime_pay", self.overtime_pay),
            ("holiday_pay", self.holiday_pay),
            ("gross_pay", self.gross_pay),
            ("income_tax", self.income_tax),
            ("local_tax", self.local_tax),
            ("national_pension", self.national_pension),
            ("health_insurance", self.health_insurance),
            ("long_term_care", self.long_term_care),
            ("employment_insurance", self.employment_insurance),
            ("other_deductions", self.other_deductions),
            ("total_deductions", self.total_deductions),
            ("net_pay", self.net_pay),
        ]
    }
}

/// Defines the start and end dates of a pay period (both inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One employee's line in a pay run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollEntry {
    /// Identifier used by the record-keeping layer (employee number).
    pub employee_id: String,
    #[serde(default)]
    pub employee_name: String,
    pub input: PayrollInput,
}

/// Input to a pay run.
///
/// A `PayRunInput` names the pay period, optionally the rule set to
/// apply (the default rule set otherwise), and one entry per employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayRunInput {
    pub pay_period: PayPeriod,
    #[serde(default)]
    pub rule_set: Option<String>,
    pub entries: Vec<PayrollEntry>,
}

/// The payroll breakdown for a single employee within a pay run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeePayResult {
    pub employee_id: String,
    pub employee_name: String,
    pub input: PayrollInput,
    pub breakdown: PayrollResult,
}

/// Column sums over every employee in a pay run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PayRunTotals {
    pub gross_pay: f64,
    pub total_deductions: f64,
    pub net_pay: f64,
}

/// The aggregate result of a pay run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayRunResult {
    /// The pay period that was processed.
    pub period: PayPeriod,
    /// Key of the rule set that was applied, e.g. `"KR-2024"`.
    pub rule_set: String,
    /// Individual results, in the same order as the input entries.
    pub results: Vec<EmployeePayResult>,
    pub totals: PayRunTotals,
}
