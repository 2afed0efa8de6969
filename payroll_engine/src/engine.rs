//! Payroll computation engine.
//!
//! The `engine` module turns a [`PayrollInput`] into a
//! [`PayrollResult`] and a [`PayRunInput`] into a [`PayRunResult`].
//! Single computations are pure arithmetic over the input and a set of
//! [`PayrollRates`]; pay runs use the [`rayon`] crate to spread the
//! per-employee calculations across CPU cores.

use crate::error::CalcError;
use crate::models::{
    EmployeePayResult, PayRunInput, PayRunResult, PayRunTotals, PayrollInput, PayrollResult,
};
use crate::rules::{PayrollRates, RuleBook};
use rayon::prelude::*;
use tracing::debug;

/// Computes gross pay, statutory deductions and net pay.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayrollCalculator {
    rates: PayrollRates,
}

impl PayrollCalculator {
    pub fn new(rates: PayrollRates) -> Self {
        PayrollCalculator { rates }
    }

    pub fn rates(&self) -> &PayrollRates {
        &self.rates
    }

    /// Monthly salary spread over the standard monthly hours, never
    /// below the minimum hourly wage.
    pub fn hourly_wage(&self, base_salary: f64) -> f64 {
        let derived = base_salary / self.rates.standard_monthly_hours;
        if derived < self.rates.minimum_hourly_wage {
            self.rates.minimum_hourly_wage
        } else {
            derived
        }
    }

    /// Nothing is rounded between steps; `long_term_care` is taken from
    /// `health_insurance` and `local_tax` from `income_tax`.
    pub fn compute(&self, input: &PayrollInput) -> Result<PayrollResult, CalcError> {
        validate(input)?;
        let r = &self.rates;

        let hourly_wage = self.hourly_wage(input.base_salary);
        let overtime_pay = input.overtime_hours * hourly_wage * r.overtime_rate;
        let holiday_pay = input.holiday_hours * hourly_wage * r.holiday_rate;

        let gross_pay =
            input.base_salary + overtime_pay + holiday_pay + input.allowances + input.bonus;

        let national_pension = gross_pay * r.national_pension_rate;
        let health_insurance = gross_pay * r.health_insurance_rate;
        let long_term_care = health_insurance * r.long_term_care_rate;
        let employment_insurance = gross_pay * r.employment_insurance_rate;

        let income_tax = gross_pay * r.income_tax_rate;
        let local_tax = income_tax * r.local_tax_rate;

        let total_deductions = national_pension
            + health_insurance
            + long_term_care
            + employment_insurance
            + income_tax
            + local_tax
            + input.other_deductions;

        let net_pay = gross_pay - total_deductions;

        let result = PayrollResult {
            hourly_wage,
            overtime_pay,
            holiday_pay,
            gross_pay,
            income_tax,
            local_tax,
            national_pension,
            health_insurance,
            long_term_care,
            employment_insurance,
            other_deductions: input.other_deductions,
            total_deductions,
            net_pay,
        };
        // Finite inputs can still overflow once summed and multiplied.
        for (field, value) in result.fields() {
            if !value.is_finite() {
                return Err(CalcError::Overflow { field });
            }
        }
        Ok(result)
    }
}

fn validate(input: &PayrollInput) -> Result<(), CalcError> {
    for (field, value) in input.fields() {
        if !value.is_finite() || value < 0.0 {
            return Err(CalcError::InvalidInput { field, value });
        }
    }
    Ok(())
}

/// Runs payroll for every entry of `input` under one rule set.
///
/// The rule set is looked up in `rules` (the default one when the
/// input names none).  Results keep the order of the entries; the
/// first entry that fails validation fails the whole run.
pub fn run_payroll(input: PayRunInput, rules: &RuleBook) -> Result<PayRunResult, CalcError> {
    let period = input.pay_period;
    if period.start > period.end {
        return Err(CalcError::InvalidPeriod {
            start: period.start,
            end: period.end,
        });
    }
    let rule_set = rules.resolve(input.rule_set.as_deref())?;
    let calculator = PayrollCalculator::new(rule_set.payroll);

    // Collected per entry first so the reported failure is the lowest
    // index, not whichever worker failed first.
    let outcomes: Vec<Result<EmployeePayResult, CalcError>> = input
        .entries
        .into_par_iter()
        .map(|entry| -> Result<EmployeePayResult, CalcError> {
            let breakdown = calculator
                .compute(&entry.input)
                .map_err(|err| CalcError::Employee {
                    employee_id: entry.employee_id.clone(),
                    source: Box::new(err),
                })?;
            Ok(EmployeePayResult {
                employee_id: entry.employee_id,
                employee_name: entry.employee_name,
                input: entry.input,
                breakdown,
            })
        })
        .collect();
    let results = outcomes.into_iter().collect::<Result<Vec<_>, CalcError>>()?;

    let totals = results.iter().fold(PayRunTotals::default(), |acc, r| PayRunTotals {
        gross_pay: acc.gross_pay + r.breakdown.gross_pay,
        total_deductions: acc.total_deductions + r.breakdown.total_deductions,
        net_pay: acc.net_pay + r.breakdown.net_pay,
    });

    debug!(
        rule_set = %rule_set.key(),
        employees = results.len(),
        net_pay = totals.net_pay,
        "pay run computed"
    );

    Ok(PayRunResult {
        period,
        rule_set: rule_set.key(),
        results,
        totals,
    })
}
