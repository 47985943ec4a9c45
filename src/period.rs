// 📅 Period Aggregator - monthly series for charts
//
// A record belongs to a month when its date carries that month's YYYY-MM prefix.
// Windows are ordered oldest to newest and always zero-filled.

use crate::records::{Expense, Income, Ledger};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const FULL_MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// Length of the trailing window shown on the dashboard and in reports
pub const DEFAULT_WINDOW: usize = 6;

// ============================================================================
// YEAR-MONTH
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    /// 1-based
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(YearMonth { year, month })
        } else {
            None
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The calendar month `now` falls in (UTC)
    pub fn containing(now: DateTime<Utc>) -> Self {
        Self::of(now.date_naive())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            YearMonth { year: self.year - 1, month: 12 }
        } else {
            YearMonth { year: self.year, month: self.month - 1 }
        }
    }

    pub fn short_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ============================================================================
// MONTH LABEL
// ============================================================================

/// Chart label ("Jan") together with the year-month it stands for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthLabel {
    pub label: String,
    pub month: YearMonth,
}

impl MonthLabel {
    pub fn new(month: YearMonth) -> Self {
        MonthLabel {
            label: month.short_name().to_string(),
            month,
        }
    }

    /// Resolve a bare month name against the year of `now`
    ///
    /// Accepts exactly a short or long English name, case-insensitive ("jan", "January").
    pub fn in_year_of(name: &str, now: DateTime<Utc>) -> Option<Self> {
        let key = name.trim();
        let index = MONTH_NAMES
            .iter()
            .zip(FULL_MONTH_NAMES.iter())
            .position(|(short, full)| key.eq_ignore_ascii_case(short) || key.eq_ignore_ascii_case(full))?;
        let month = YearMonth::new(now.year(), index as u32 + 1)?;
        Some(MonthLabel {
            label: name.trim().to_string(),
            month,
        })
    }
}

/// The `count` calendar months ending at the month of `now`, oldest first
pub fn trailing_months(now: DateTime<Utc>, count: usize) -> Vec<MonthLabel> {
    let mut months = Vec::with_capacity(count);
    let mut current = YearMonth::containing(now);
    for _ in 0..count {
        months.push(MonthLabel::new(current));
        current = current.previous();
    }
    months.reverse();
    months
}

// ============================================================================
// AGGREGATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub label: String,
    pub total: f64,
}

/// Income and expenses side by side for one month of the chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub month: String,
    pub income: f64,
    pub expenses: f64,
}

impl MonthlyPoint {
    pub fn net(&self) -> f64 {
        self.income - self.expenses
    }
}

/// Sum of amounts dated inside `month`
pub fn total_in_month<R: Ledger>(records: &[R], month: YearMonth) -> f64 {
    records
        .iter()
        .filter(|r| month.contains(r.date()))
        .map(|r| r.amount())
        .sum()
}

/// One total per label, in label order, zero-filled
///
/// Records with the same date are all counted; amounts are summed as-is.
pub fn aggregate_by_month<R: Ledger>(records: &[R], labels: &[MonthLabel]) -> Vec<MonthlyTotal> {
    labels
        .iter()
        .map(|label| MonthlyTotal {
            label: label.label.clone(),
            total: total_in_month(records, label.month),
        })
        .collect()
}

/// Income vs expenses per label, the dashboard's monthly chart
pub fn monthly_series(
    income: &[Income],
    expenses: &[Expense],
    labels: &[MonthLabel],
) -> Vec<MonthlyPoint> {
    labels
        .iter()
        .map(|label| MonthlyPoint {
            month: label.label.clone(),
            income: total_in_month(income, label.month),
            expenses: total_in_month(expenses, label.month),
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Expense;
    use chrono::TimeZone;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn expense(d: &str, amount: f64, category: &str) -> Expense {
        Expense::new("u1", amount, date(d), "Vendor", category)
    }

    #[test]
    fn test_year_month_display_and_previous() {
        let ym = YearMonth::new(2025, 1).unwrap();
        assert_eq!(ym.to_string(), "2025-01");
        assert_eq!(ym.previous().to_string(), "2024-12");
        assert_eq!(ym.short_name(), "Jan");
        assert!(YearMonth::new(2025, 13).is_none());
    }

    #[test]
    fn test_trailing_months_crosses_year_boundary() {
        let labels = trailing_months(at(2025, 1, 15), 6);
        let names: Vec<&str> = labels.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(names, vec!["Aug", "Sep", "Oct", "Nov", "Dec", "Jan"]);
        assert_eq!(labels[0].month.to_string(), "2024-08");
        assert_eq!(labels[5].month.to_string(), "2025-01");
    }

    #[test]
    fn test_label_resolved_against_current_year() {
        let label = MonthLabel::in_year_of("Jan", at(2025, 3, 1)).unwrap();
        assert_eq!(label.month.to_string(), "2025-01");

        let label = MonthLabel::in_year_of("december", at(2025, 3, 1)).unwrap();
        assert_eq!(label.month.to_string(), "2025-12");

        assert!(MonthLabel::in_year_of("Ja", at(2025, 3, 1)).is_none());
        assert!(MonthLabel::in_year_of("Smarch", at(2025, 3, 1)).is_none());
    }

    #[test]
    fn test_only_whole_month_names_resolve() {
        let now = at(2025, 3, 1);
        assert_eq!(MonthLabel::in_year_of("January", now).unwrap().month.to_string(), "2025-01");
        assert_eq!(MonthLabel::in_year_of(" SEP ", now).unwrap().month.to_string(), "2025-09");
        assert_eq!(MonthLabel::in_year_of("september", now).unwrap().label, "september");

        assert!(MonthLabel::in_year_of("Janitor", now).is_none());
        assert!(MonthLabel::in_year_of("junk", now).is_none());
        assert!(MonthLabel::in_year_of("Sept", now).is_none());
        assert!(MonthLabel::in_year_of("Mayday", now).is_none());
        assert!(MonthLabel::in_year_of("", now).is_none());
    }

    #[test]
    fn test_single_month_scenario() {
        let records = vec![expense("2025-01-05", 100.0, "A"), expense("2025-01-20", 50.0, "B")];
        let labels = vec![MonthLabel::in_year_of("Jan", at(2025, 1, 31)).unwrap()];

        let totals = aggregate_by_month(&records, &labels);
        assert_eq!(
            totals,
            vec![MonthlyTotal { label: "Jan".to_string(), total: 150.0 }]
        );
    }

    #[test]
    fn test_zero_fill_and_order() {
        let records = vec![expense("2024-11-03", 20.0, "A"), expense("2025-01-02", 5.0, "A")];
        let totals = aggregate_by_month(&records, &trailing_months(at(2025, 1, 10), 3));

        let values: Vec<f64> = totals.iter().map(|t| t.total).collect();
        assert_eq!(values, vec![20.0, 0.0, 5.0]);
    }

    #[test]
    fn test_same_date_records_are_both_counted() {
        let records = vec![expense("2025-01-05", 10.0, "A"), expense("2025-01-05", 10.0, "A")];
        let totals = aggregate_by_month(&records, &trailing_months(at(2025, 1, 5), 1));
        assert_eq!(totals[0].total, 20.0);
    }

    #[test]
    fn test_same_month_other_year_is_excluded() {
        let records = vec![expense("2024-01-05", 99.0, "A")];
        let totals = aggregate_by_month(&records, &trailing_months(at(2025, 1, 5), 1));
        assert_eq!(totals[0].total, 0.0);
    }

    #[test]
    fn test_total_is_conserved_within_window() {
        let records = vec![
            expense("2024-07-31", 1000.0, "outside"),
            expense("2024-08-01", 12.5, "A"),
            expense("2024-10-15", 7.25, "B"),
            expense("2024-10-16", 3.0, "B"),
            expense("2025-01-31", 40.0, "C"),
            expense("2025-02-01", 500.0, "outside"),
        ];
        let labels = trailing_months(at(2025, 1, 20), 6);

        let series_total: f64 = aggregate_by_month(&records, &labels).iter().map(|t| t.total).sum();
        let in_window: f64 = records
            .iter()
            .filter(|r| labels.iter().any(|l| l.month.contains(r.date)))
            .map(|r| r.amount)
            .sum();

        assert_eq!(series_total, in_window);
        assert_eq!(series_total, 62.75);
    }

    #[test]
    fn test_monthly_series() {
        let income = vec![Income::new("u1", 4000.0, date("2025-01-01"), "Salary")];
        let expenses = vec![expense("2025-01-03", 1500.0, "Rent"), expense("2024-12-03", 1500.0, "Rent")];

        let series = monthly_series(&income, &expenses, &trailing_months(at(2025, 1, 10), 2));
        assert_eq!(series.len(), 2);
        assert_eq!(series[0], MonthlyPoint { month: "Dec".to_string(), income: 0.0, expenses: 1500.0 });
        assert_eq!(series[1].net(), 2500.0);
    }
}
