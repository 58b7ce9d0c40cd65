use chrono::{Months, NaiveDate};
use log::info;
use std::fmt;

use crate::debt::{Debt, LoanTerms};
use crate::error::{DebtError, DebtResult};
use crate::format::to_fixed;
use crate::table::Table;

pub const HEADERS: [&str; 7] = [
    "Month",
    "Principal Paid",
    "Interest Paid",
    "Balance",
    "Extraordinary",
    "Total Interest",
    "Total Paid",
];

/// Periods allowed per scheduled period before the drive loop gives up.
pub const RUNAWAY_FACTOR: u32 = 4;

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PayoffSummary {
    pub terms: LoanTerms,
    pub periods_taken: u32,
    pub periods_saved: u32,
    pub total_interest_paid: f64,
    pub total_paid: f64,
    pub extraordinary_applied: f64,
    pub extraordinary_unused: f64,
}

impl PayoffSummary {
    fn from_debt(debt: &Debt) -> Self {
        let terms = debt.initial_terms();
        let totals = debt.running_totals();
        let periods_taken = debt.periods_elapsed();
        Self {
            terms,
            periods_taken,
            periods_saved: terms.term_periods.saturating_sub(periods_taken),
            total_interest_paid: totals.cumulative_interest_paid,
            total_paid: totals.cumulative_total_paid,
            extraordinary_applied: terms.total_extraordinary_scheduled
                - totals.remaining_extraordinary_budget,
            extraordinary_unused: totals.remaining_extraordinary_budget,
        }
    }
}

impl fmt::Display for PayoffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Loan of ${:.2} at {:.2}% per period over {} periods, fixed payment ${:.2}.",
            self.terms.principal,
            self.terms.periodic_rate * 100.,
            self.terms.term_periods,
            self.terms.fixed_payment
        )?;
        write!(
            f,
            "Paid off in {} of {} periods ({} saved): interest ${:.2}, total paid ${:.2}, extraordinary applied ${:.2}, unused ${:.2}.",
            self.periods_taken,
            self.terms.term_periods,
            self.periods_saved,
            self.total_interest_paid,
            self.total_paid,
            self.extraordinary_applied,
            self.extraordinary_unused
        )
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Schedule {
    pub table: Table,
    pub summary: PayoffSummary,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ScheduleReporter {
    decimals: usize,
    first_pmt_date: Option<NaiveDate>,
}

impl Default for ScheduleReporter {
    fn default() -> Self {
        Self::new(2)
    }
}

impl ScheduleReporter {
    pub fn new(decimals: usize) -> Self {
        Self {
            decimals,
            first_pmt_date: None,
        }
    }

    /// Adds a date column; period `n` falls `n - 1` months after `first_pmt_date`.
    pub fn with_first_payment_date(mut self, first_pmt_date: NaiveDate) -> Self {
        self.first_pmt_date = Some(first_pmt_date);
        self
    }

    pub fn headers(&self) -> Vec<&'static str> {
        let mut headers = HEADERS.to_vec();
        if self.first_pmt_date.is_some() {
            headers.insert(1, "Date");
        }
        headers
    }

    /// Pays `debt` off, one row per period.
    pub fn run(&self, debt: &mut Debt) -> DebtResult<Schedule> {
        let limit = debt
            .initial_terms()
            .term_periods
            .saturating_mul(RUNAWAY_FACTOR);
        self.run_with_limit(debt, limit)
    }

    pub fn run_with_limit(&self, debt: &mut Debt, max_periods: u32) -> DebtResult<Schedule> {
        let headers = self.headers();
        let mut table = Table::with_columns(headers.len())?;
        table.add_row(headers)?;

        while debt.has_outstanding_balance() {
            if debt.periods_elapsed() >= max_periods {
                return Err(DebtError::RunawaySchedule {
                    periods: debt.periods_elapsed(),
                });
            }
            debt.advance();
            table.add_row(self.format_row(debt)?)?;
        }

        let summary = PayoffSummary::from_debt(debt);
        info!(
            "paid off in {} of {} periods",
            summary.periods_taken, summary.terms.term_periods
        );
        Ok(Schedule { table, summary })
    }

    fn format_row(&self, debt: &Debt) -> DebtResult<Vec<String>> {
        let snap = debt.period_snapshot();
        let totals = debt.running_totals();
        let dec = self.decimals;

        let mut row = vec![
            format!("Month {}", snap.period_index),
            to_fixed(snap.principal_paid, dec),
            to_fixed(snap.interest_paid, dec),
            to_fixed(snap.balance_after, dec),
            to_fixed(snap.extraordinary_applied, dec),
            to_fixed(totals.cumulative_interest_paid, dec),
            to_fixed(totals.cumulative_total_paid, dec),
        ];
        if let Some(first) = self.first_pmt_date {
            let date = get_pmt_date(first, snap.period_index)?;
            row.insert(1, date.to_string());
        }
        Ok(row)
    }
}

fn get_pmt_date(first_pmt_date: NaiveDate, period_index: u32) -> DebtResult<NaiveDate> {
    first_pmt_date
        .checked_add_months(Months::new(period_index.saturating_sub(1)))
        .ok_or_else(|| {
            DebtError::invalid(
                "first_payment_date",
                format!("period {} falls outside the calendar", period_index),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::{get_pmt_date, ScheduleReporter, HEADERS};
    use crate::debt::Debt;
    use crate::error::DebtError;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use test_log::test;

    #[test]
    fn test_schedule_rows() {
        let mut debt = Debt::new(20000., 3., 24, BTreeMap::from([(12, 3000.)])).unwrap();
        let schedule = ScheduleReporter::default().run(&mut debt).unwrap();

        let rows = schedule.table.rows();
        assert_eq!(rows.len(), 22);
        assert_eq!(rows[0], HEADERS.to_vec());
        assert_eq!(
            rows[1],
            vec!["Month 1", "580.95", "600.00", "19419.05", "0.00", "600.00", "1180.95"]
        );
        assert_eq!(rows[12][0], "Month 12");
        assert_eq!(rows[12][4], "3000.00");
        assert_eq!(rows[21][0], "Month 21");
        assert_eq!(rows[21][3], "0.00");
        assert_eq!(rows[21][6], "27226.04");
    }

    #[test]
    fn test_summary() {
        let mut debt = Debt::new(20000., 3., 24, BTreeMap::from([(12, 3000.)])).unwrap();
        let summary = ScheduleReporter::default().run(&mut debt).unwrap().summary;

        assert_eq!(summary.periods_taken, 21);
        assert_eq!(summary.periods_saved, 3);
        assert_eq!(summary.extraordinary_applied, 3000.);
        assert_eq!(summary.extraordinary_unused, 0.);
        assert_abs_diff_eq!(summary.total_interest_paid, 7226.04, epsilon = 0.01);
        assert_eq!(
            summary.to_string(),
            "Loan of $20000.00 at 3.00% per period over 24 periods, fixed payment $1180.95.\n\
             Paid off in 21 of 24 periods (3 saved): interest $7226.04, total paid $27226.04, extraordinary applied $3000.00, unused $0.00."
        );
    }

    #[test]
    fn test_summary_without_extraordinary_payments() {
        let mut debt = Debt::new(1000., 0., 10, BTreeMap::new()).unwrap();
        let summary = ScheduleReporter::default().run(&mut debt).unwrap().summary;
        assert_eq!(
            summary.to_string(),
            "Loan of $1000.00 at 0.00% per period over 10 periods, fixed payment $100.00.\n\
             Paid off in 10 of 10 periods (0 saved): interest $0.00, total paid $1000.00, extraordinary applied $0.00, unused $0.00."
        );
    }

    #[test]
    fn test_rendered_columns_line_up() {
        let mut debt = Debt::new(1000., 0., 10, BTreeMap::new()).unwrap();
        let schedule = ScheduleReporter::new(0).run(&mut debt).unwrap();
        let rendered = schedule.table.render();

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 11);
        assert!(lines.iter().all(|l| l.len() == lines[0].len()));
        assert!(lines[10].starts_with("  Month 10|"));
        assert!(lines[10].ends_with("  1000|"));
    }

    #[test]
    fn test_date_column() {
        let mut debt = Debt::new(1000., 0., 3, BTreeMap::new()).unwrap();
        let reporter = ScheduleReporter::default()
            .with_first_payment_date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        let schedule = reporter.run(&mut debt).unwrap();

        let rows = schedule.table.rows();
        assert_eq!(rows[0][1], "Date");
        assert_eq!(rows[1][1], "2024-01-31");
        assert_eq!(rows[2][1], "2024-02-29");
        assert_eq!(rows[3][1], "2024-03-31");
        assert_eq!(schedule.table.column_count(), 8);
    }

    #[test]
    fn test_get_pmt_date() {
        let first = NaiveDate::from_ymd_opt(2023, 11, 15).unwrap();
        assert_eq!(get_pmt_date(first, 1).unwrap(), first);
        assert_eq!(
            get_pmt_date(first, 3).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_runaway_limit() {
        let mut debt = Debt::new(1000., 0., 10, BTreeMap::new()).unwrap();
        let result = ScheduleReporter::default().run_with_limit(&mut debt, 5);
        assert_eq!(result, Err(DebtError::RunawaySchedule { periods: 5 }));
        assert!(debt.has_outstanding_balance());
    }
}
