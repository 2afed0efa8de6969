//! Statutory rates and working-time rules.
//!
//! The `rules` module gathers every constant the calculators depend on
//! into a [`RuleSet`]: payroll rates (premium multipliers, tax and
//! insurance rates, the monthly hour divisor and the minimum wage) and
//! attendance rules (break threshold, break length, standard day).
//! Rule sets are keyed by jurisdiction and version and may be loaded
//! from JSON files, so a new tax year is a data change rather than a
//! code change.  The built-in default reproduces the Korean 2024 rules.

use crate::error::CalcError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Key of the built-in rule set.
pub const DEFAULT_RULE_SET: &str = "KR-2024";

/// Rates applied by the payroll calculator.
///
/// Missing fields in a JSON rule file fall back to the default value,
/// so a file only needs to list the rates that changed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayrollRates {
    /// Multiplier on the hourly wage for overtime hours.
    pub overtime_rate: f64,
    /// Multiplier on the hourly wage for holiday hours.
    pub holiday_rate: f64,
    /// Flat rate on gross pay.
    pub income_tax_rate: f64,
    /// Rate applied to the income tax amount.
    pub local_tax_rate: f64,
    pub national_pension_rate: f64,
    pub health_insurance_rate: f64,
    /// Rate applied to the health insurance amount.
    pub long_term_care_rate: f64,
    pub employment_insurance_rate: f64,
    /// Divisor turning a monthly salary into an hourly wage
    /// (22 working days of 8 hours).
    pub standard_monthly_hours: f64,
    /// Floor applied to the derived hourly wage.
    pub minimum_hourly_wage: f64,
}

impl Default for PayrollRates {
    fn default() -> Self {
        PayrollRates {
            overtime_rate: 1.5,
            holiday_rate: 2.0,
            income_tax_rate: 0.05,
            local_tax_rate: 0.1,
            national_pension_rate: 0.045,
            health_insurance_rate: 0.0354,
            long_term_care_rate: 0.004564,
            employment_insurance_rate: 0.009,
            standard_monthly_hours: 22.0 * 8.0,
            minimum_hourly_wage: 9860.0,
        }
    }
}

/// Working-time rules applied by the attendance calculator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkRules {
    /// A shift strictly longer than this many hours has the unpaid
    /// break deducted.
    pub break_threshold_hours: f64,
    /// Length of the unpaid break.
    pub break_hours: f64,
    /// Hours strictly beyond this count as overtime.
    pub standard_day_hours: f64,
}

impl Default for WorkRules {
    fn default() -> Self {
        WorkRules {
            break_threshold_hours: 6.0,
            break_hours: 1.0,
            standard_day_hours: 8.0,
        }
    }
}

/// One jurisdiction's rules at a specific version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// A jurisdiction code such as `"KR"`.
    pub jurisdiction: String,
    /// Version string, usually the tax year, e.g. `"2024"`.
    pub version: String,
    #[serde(default)]
    pub payroll: PayrollRates,
    #[serde(default)]
    pub attendance: WorkRules,
}

impl Default for RuleSet {
    fn default() -> Self {
        RuleSet {
            jurisdiction: "KR".to_string(),
            version: "2024".to_string(),
            payroll: PayrollRates::default(),
            attendance: WorkRules::default(),
        }
    }
}

impl RuleSet {
    /// Lookup key, `"{jurisdiction}-{version}"`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.jurisdiction, self.version)
    }

    /// Rejects rates that would make the calculators produce nonsense:
    /// negative or non-finite values, and zero-length divisors.
    pub fn validate(&self) -> Result<(), CalcError> {
        let p = &self.payroll;
        let a = &self.attendance;
        let values = [
            ("overtime_rate", p.overtime_rate),
            ("holiday_rate", p.holiday_rate),
            ("income_tax_rate", p.income_tax_rate),
            ("local_tax_rate", p.local_tax_rate),
            ("national_pension_rate", p.national_pension_rate),
            ("health_insurance_rate", p.health_insurance_rate),
            ("long_term_care_rate", p.long_term_care_rate),
            ("employment_insurance_rate", p.employment_insurance_rate),
            ("standard_monthly_hours", p.standard_monthly_hours),
            ("minimum_hourly_wage", p.minimum_hourly_wage),
            ("break_threshold_hours", a.break_threshold_hours),
            ("break_hours", a.break_hours),
            ("standard_day_hours", a.standard_day_hours),
        ];
        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(CalcError::InvalidRules(format!(
                    "{}: `{}` must be a finite, non-negative number, got {}",
                    self.key(),
                    name,
                    value
                )));
            }
        }
        if p.standard_monthly_hours == 0.0 || a.standard_day_hours == 0.0 {
            return Err(CalcError::InvalidRules(format!(
                "{}: standard hours must be greater than zero",
                self.key()
            )));
        }
        // A break longer than the shift that earns it would drive
        // worked hours below zero.
        if a.break_hours > a.break_threshold_hours {
            return Err(CalcError::InvalidRules(format!(
                "{}: `break_hours` ({}) exceeds `break_threshold_hours` ({})",
                self.key(),
                a.break_hours,
                a.break_threshold_hours
            )));
        }
        Ok(())
    }
}

/// Load all rule set definitions from a directory.
///
/// Every `.json` file in `path` is parsed as a [`RuleSet`].  Files
/// that fail to parse are logged and skipped; a missing directory
/// yields an empty list.
pub fn load_rule_sets_from_dir(path: &Path) -> Result<Vec<RuleSet>> {
    let mut sets = Vec::new();
    if !path.is_dir() {
        warn!(dir = %path.display(), "rule directory not found, using built-in rules only");
        return Ok(sets);
    }
    for entry in std::fs::read_dir(path)
        .with_context(|| format!("reading rule directory {}", path.display()))?
    {
        let entry = entry?;
        let file = entry.path();
        if !entry.file_type()?.is_file() || file.extension().map_or(true, |ext| ext != "json") {
            continue;
        }
        let data = std::fs::read_to_string(&file)
            .with_context(|| format!("reading rule file {}", file.display()))?;
        match serde_json::from_str::<RuleSet>(&data) {
            Ok(set) => sets.push(set),
            Err(err) => warn!(file = %file.display(), error = %err, "failed to parse rule set"),
        }
    }
    Ok(sets)
}

/// The rule sets known to the service, keyed by [`RuleSet::key`].
///
/// A `RuleBook` always contains the built-in default, and resolves a
/// missing key to the configured default rule set.
#[derive(Debug, Clone)]
pub struct RuleBook {
    sets: BTreeMap<String, RuleSet>,
    default_key: String,
}

impl Default for RuleBook {
    fn default() -> Self {
        let builtin = RuleSet::default();
        let mut sets = BTreeMap::new();
        sets.insert(builtin.key(), builtin);
        RuleBook {
            sets,
            default_key: DEFAULT_RULE_SET.to_string(),
        }
    }
}

impl RuleBook {
    /// Builds a rule book from loaded rule sets on top of the built-in
    /// default.  A loaded set with the same key replaces the built-in
    /// one.  `default_key` must name a known set.
    pub fn new(loaded: Vec<RuleSet>, default_key: &str) -> Result<Self, CalcError> {
        let mut book = RuleBook::default();
        for set in loaded {
            set.validate()?;
            info!(rule_set = %set.key(), "registered rule set");
            book.sets.insert(set.key(), set);
        }
        if !book.sets.contains_key(default_key) {
            return Err(CalcError::UnknownRuleSet(default_key.to_string()));
        }
        book.default_key = default_key.to_string();
        Ok(book)
    }

    /// Returns the named rule set, or the default one for `None`.
    pub fn resolve(&self, key: Option<&str>) -> Result<&RuleSet, CalcError> {
        let key = key.unwrap_or(&self.default_key);
        self.sets
            .get(key)
            .ok_or_else(|| CalcError::UnknownRuleSet(key.to_string()))
    }

    pub fn default_key(&self) -> &str {
        &self.default_key
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleSet> {
        self.sets.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_rates_match_2024_rules() {
        let rates = PayrollRates::default();
        assert_eq!(rates.standard_monthly_hours, 176.0);
        assert_eq!(rates.minimum_hourly_wage, 9860.0);
        assert_eq!(rates.long_term_care_rate, 0.004564);
        assert_eq!(RuleSet::default().key(), DEFAULT_RULE_SET);
    }

    #[test]
    fn partial_rule_file_keeps_defaults() {
        let set: RuleSet = serde_json::from_value(json!({
            "jurisdiction": "KR",
            "version": "2025",
            "payroll": {"minimum_hourly_wage": 10030.0}
        }))
        .unwrap();
        assert_eq!(set.payroll.minimum_hourly_wage, 10030.0);
        assert_eq!(set.payroll.overtime_rate, 1.5);
        assert_eq!(set.attendance, WorkRules::default());
    }

    #[test]
    fn validate_rejects_negative_and_zero_divisors() {
        let mut set = RuleSet::default();
        set.payroll.income_tax_rate = -0.01;
        assert!(matches!(set.validate(), Err(CalcError::InvalidRules(_))));

        let mut set = RuleSet::default();
        set.payroll.standard_monthly_hours = 0.0;
        assert!(matches!(set.validate(), Err(CalcError::InvalidRules(_))));

        assert!(RuleSet::default().validate().is_ok());
    }

    #[test]
    fn break_longer_than_threshold_is_rejected() {
        let set: RuleSet = serde_json::from_value(json!({
            "jurisdiction": "KR",
            "version": "2030",
            "attendance": {"break_threshold_hours": 0.5, "break_hours": 1.0}
        }))
        .unwrap();
        assert!(matches!(set.validate(), Err(CalcError::InvalidRules(_))));
        assert!(matches!(
            RuleBook::new(vec![set], DEFAULT_RULE_SET),
            Err(CalcError::InvalidRules(_))
        ));

        let mut equal = RuleSet::default();
        equal.attendance.break_threshold_hours = 1.0;
        equal.attendance.break_hours = 1.0;
        assert!(equal.validate().is_ok());
    }

    #[test]
    fn rule_book_resolves_default_and_named_sets() {
        let mut next_year = RuleSet::default();
        next_year.version = "2025".into();
        next_year.payroll.minimum_hourly_wage = 10030.0;
        let book = RuleBook::new(vec![next_year], "KR-2025").unwrap();

        assert_eq!(book.resolve(None).unwrap().version, "2025");
        assert_eq!(book.resolve(Some("KR-2024")).unwrap().version, "2024");
        assert_eq!(
            book.resolve(Some("JP-2024")),
            Err(CalcError::UnknownRuleSet("JP-2024".into()))
        );
        assert_eq!(book.iter().count(), 2);
    }

    #[test]
    fn rule_book_rejects_unknown_default() {
        assert!(matches!(
            RuleBook::new(Vec::new(), "US-2024"),
            Err(CalcError::UnknownRuleSet(_))
        ));
    }

    #[test]
    fn load_skips_unparsable_and_non_json_files() {
        let dir = std::env::temp_dir().join(format!("payroll_rules_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("kr_2025.json"),
            r#"{"jurisdiction": "KR", "version": "2025"}"#,
        )
        .unwrap();
        std::fs::write(dir.join("broken.json"), "{ not json").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let sets = load_rule_sets_from_dir(&dir).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].key(), "KR-2025");
    }

    #[test]
    fn load_from_missing_dir_is_empty() {
        let sets = load_rule_sets_from_dir(Path::new("/nonexistent/payroll/rules")).unwrap();
        assert!(sets.is_empty());
    }
}
