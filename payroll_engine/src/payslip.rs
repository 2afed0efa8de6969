//! Payslip presentation.
//!
//! Formats a computed breakdown for display.  Nothing here re-derives
//! an amount: every figure comes straight from the [`PayrollInput`] or
//! the [`PayrollResult`] it was computed into.

use crate::models::{PayPeriod, PayrollInput, PayrollResult};
use serde::Serialize;
use std::fmt;

/// Formats an amount as whole won with thousands separators,
/// e.g. `5426136.36` becomes `"5,426,136원"`.
pub fn format_won(amount: f64) -> String {
    let rounded = amount.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if negative {
        format!("-{grouped}원")
    } else {
        format!("{grouped}원")
    }
}

/// A labelled amount on a payslip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayslipLine {
    pub label: &'static str,
    pub amount: f64,
    pub formatted: String,
}

impl PayslipLine {
    fn new(label: &'static str, amount: f64) -> Self {
        PayslipLine {
            label,
            amount,
            formatted: format_won(amount),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payslip {
    pub employee_name: String,
    pub period: PayPeriod,
    pub earnings: Vec<PayslipLine>,
    pub deductions: Vec<PayslipLine>,
    pub net_pay: PayslipLine,
}

impl Payslip {
    pub fn new(
        employee_name: impl Into<String>,
        period: PayPeriod,
        input: &PayrollInput,
        result: &PayrollResult,
    ) -> Self {
        let earnings = vec![
            PayslipLine::new("Base salary", input.base_salary),
            PayslipLine::new("Allowances", input.allowances),
            PayslipLine::new("Bonus", input.bonus),
            PayslipLine::new("Overtime pay", result.overtime_pay),
            PayslipLine::new("Holiday pay", result.holiday_pay),
            PayslipLine::new("Gross pay", result.gross_pay),
        ];
        let deductions = vec![
            PayslipLine::new("Income tax", result.income_tax),
            PayslipLine::new("Local income tax", result.local_tax),
            PayslipLine::new("National pension", result.national_pension),
            PayslipLine::new("Health insurance", result.health_insurance),
            PayslipLine::new("Employment insurance", result.employment_insurance),
            PayslipLine::new("Long-term care insurance", result.long_term_care),
            PayslipLine::new("Other deductions", result.other_deductions),
            PayslipLine::new("Total deductions", result.total_deductions),
        ];
        Payslip {
            employee_name: employee_name.into(),
            period,
            earnings,
            deductions,
            net_pay: PayslipLine::new("Net pay", result.net_pay),
        }
    }

    /// Every line as `"Label: amount"`, earnings first.
    pub fn lines(&self) -> Vec<String> {
        self.earnings
            .iter()
            .chain(self.deductions.iter())
            .chain(std::iter::once(&self.net_pay))
            .map(|line| format!("{}: {}", line.label, line.formatted))
            .collect()
    }
}

impl fmt::Display for Payslip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Payslip: {}", self.employee_name)?;
        writeln!(f, "Pay period: {} ~ {}", self.period.start, self.period.end)?;
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
