pub mod debt;
pub mod error;
pub mod format;
pub mod report;
pub mod table;

pub use debt::{Debt, LoanStatus, LoanTerms, PeriodResult, RunningTotals};
pub use error::{DebtError, DebtResult};
pub use report::{PayoffSummary, Schedule, ScheduleReporter};
pub use table::Table;
