use log::{debug, trace, warn};
use std::{collections::BTreeMap, fmt};

use crate::error::{DebtError, DebtResult};

/// A payment component within this distance of the outstanding balance is
/// treated as settling it exactly.
pub const CLAMP_TOLERANCE: f64 = 1e-6;

/// Rounding drift allowed per unit of fixed payment when the tolerance is
/// widened for large payments.
pub const PAYMENT_DRIFT: f64 = 1e-9;

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoanStatus {
    Active,
    PaidOff,
}

/// Terms fixed when the debt is created, including the derived payment.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoanTerms {
    pub principal: f64,
    pub periodic_rate: f64,
    pub term_periods: u32,
    pub fixed_payment: f64,
    pub total_extraordinary_scheduled: f64,
}

/// What happened in the most recently completed period.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeriodResult {
    pub period_index: u32,
    pub interest_paid: f64,
    pub principal_paid: f64,
    pub extraordinary_applied: f64,
    pub balance_after: f64,
}

impl fmt::Display for PeriodResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "period {}, principal paid ${:.4}, interest paid ${:.4}, extraordinary ${:.4}, ending balance ${:.4}",
            self.period_index,
            self.principal_paid,
            self.interest_paid,
            self.extraordinary_applied,
            self.balance_after
        )
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunningTotals {
    pub cumulative_interest_paid: f64,
    pub cumulative_total_paid: f64,
    pub remaining_extraordinary_budget: f64,
}

#[derive(PartialEq, Debug)]
pub struct Debt {
    terms: LoanTerms,
    extraordinary_pmts: BTreeMap<u32, f64>,
    balance: f64,
    last_period: PeriodResult,
    totals: RunningTotals,
}

impl Debt {
    /// Creates a debt of `principal` at `interest_percent` per period (3.0 means 3%)
    /// repaid over `term_periods` fixed payments, plus the sparse
    /// `extraordinary_pmts` schedule keyed by 1-based period.
    pub fn new(
        principal: f64,
        interest_percent: f64,
        term_periods: u32,
        extraordinary_pmts: BTreeMap<u32, f64>,
    ) -> DebtResult<Self> {
        if !principal.is_finite() || principal <= 0. {
            return Err(DebtError::invalid(
                "principal",
                format!("must be a positive amount, got {}", principal),
            ));
        }
        if !interest_percent.is_finite() || interest_percent < 0. {
            return Err(DebtError::invalid(
                "interest",
                format!("must be a non-negative percentage, got {}", interest_percent),
            ));
        }
        if term_periods == 0 {
            return Err(DebtError::invalid("term", "must be at least one period"));
        }
        for (&period, &amount) in &extraordinary_pmts {
            if period == 0 {
                return Err(DebtError::invalid(
                    "extraordinary_payments",
                    "periods are numbered from 1",
                ));
            }
            if !amount.is_finite() || amount <= 0. {
                return Err(DebtError::invalid(
                    "extraordinary_payments",
                    format!("amount for period {} must be positive, got {}", period, amount),
                ));
            }
            if period > term_periods {
                warn!(
                    "extraordinary payment for period {} is past the {} period term",
                    period, term_periods
                );
            }
        }

        let periodic_rate = interest_percent / 100.;
        let fixed_payment = get_pmt_amount(principal, periodic_rate, term_periods);

        let first_interest = principal * periodic_rate;
        if !fixed_payment.is_finite() || fixed_payment <= first_interest {
            return Err(DebtError::NonAmortizing {
                payment: fixed_payment,
                interest: first_interest,
            });
        }

        // folded from 0.0 so an empty schedule totals positive zero
        let total_extraordinary_scheduled = extraordinary_pmts
            .values()
            .fold(0., |acc, amount| acc + amount);
        debug!(
            "new debt: principal {}, rate {}, term {}, payment {}, extraordinary {}",
            principal, periodic_rate, term_periods, fixed_payment, total_extraordinary_scheduled
        );

        Ok(Self {
            terms: LoanTerms {
                principal,
                periodic_rate,
                term_periods,
                fixed_payment,
                total_extraordinary_scheduled,
            },
            extraordinary_pmts,
            balance: principal,
            last_period: PeriodResult {
                balance_after: principal,
                ..PeriodResult::default()
            },
            totals: RunningTotals {
                remaining_extraordinary_budget: total_extraordinary_scheduled,
                ..RunningTotals::default()
            },
        })
    }

    /// Pays one period. Does nothing once the debt is paid off.
    pub fn advance(&mut self) {
        if self.balance <= 0. {
            return;
        }

        let period_index = self.last_period.period_index + 1;
        let interest = self.balance * self.terms.periodic_rate;
        let tolerance = CLAMP_TOLERANCE.max(self.terms.fixed_payment * PAYMENT_DRIFT);

        let mut principal = clamp_to_balance(
            self.terms.fixed_payment - interest,
            self.balance,
            tolerance,
        );
        self.balance -= principal;

        let scheduled = self
            .extraordinary_pmts
            .get(&period_index)
            .copied()
            .unwrap_or(0.);
        // never more than scheduled; a residue left within tolerance is
        // settled as principal
        let extraordinary = scheduled.min(self.balance);
        self.balance -= extraordinary;
        if self.balance > 0. && self.balance < tolerance {
            principal += self.balance;
            self.balance = 0.;
        }

        if scheduled > extraordinary {
            debug!(
                "period {}: extraordinary payment of {} capped at {}",
                period_index, scheduled, extraordinary
            );
        }

        self.totals.remaining_extraordinary_budget =
            (self.totals.remaining_extraordinary_budget - extraordinary).max(0.);
        self.totals.cumulative_interest_paid += interest;
        self.totals.cumulative_total_paid += principal + extraordinary + interest;

        self.last_period = PeriodResult {
            period_index,
            interest_paid: interest,
            principal_paid: principal,
            extraordinary_applied: extraordinary,
            balance_after: self.balance,
        };
        trace!("{}", self.last_period);
    }

    pub fn has_outstanding_balance(&self) -> bool {
        self.balance > 0.
    }

    pub fn status(&self) -> LoanStatus {
        if self.has_outstanding_balance() {
            LoanStatus::Active
        } else {
            LoanStatus::PaidOff
        }
    }

    pub fn initial_terms(&self) -> LoanTerms {
        self.terms
    }

    pub fn period_snapshot(&self) -> PeriodResult {
        self.last_period
    }

    pub fn running_totals(&self) -> RunningTotals {
        self.totals
    }

    pub fn extraordinary_payments(&self) -> &BTreeMap<u32, f64> {
        &self.extraordinary_pmts
    }

    pub fn periods_elapsed(&self) -> u32 {
        self.last_period.period_index
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }
}

// fixed payment of an annuity; straight-line when the rate is zero
fn get_pmt_amount(principal: f64, periodic_rate: f64, term_periods: u32) -> f64 {
    if periodic_rate == 0. {
        return principal / term_periods as f64;
    }
    // 1 - (1+r)^-n without cancellation for small r
    let denominator = -(-(term_periods as f64) * periodic_rate.ln_1p()).exp_m1();
    if denominator == 0. {
        return principal / term_periods as f64;
    }
    principal * periodic_rate / denominator
}

fn clamp_to_balance(pay: f64, balance: f64, tolerance: f64) -> f64 {
    if pay >= balance || (balance - pay).abs() < tolerance {
        balance
    } else {
        pay
    }
}
