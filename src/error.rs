use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DebtError {
    #[error("invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("non-amortizing schedule: payment {payment:.4} does not cover interest {interest:.4}")]
    NonAmortizing { payment: f64, interest: f64 },

    #[error("schedule still owes money after {periods} periods")]
    RunawaySchedule { periods: u32 },

    #[error("invalid table: {0}")]
    InvalidTable(String),

    #[error("row has {found} columns, table expects {expected}")]
    RowWidth { expected: usize, found: usize },
}

impl DebtError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        DebtError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type DebtResult<T> = Result<T, DebtError>;
