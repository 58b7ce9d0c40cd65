use std::fmt;
use tabled::{
    builder::Builder,
    settings::{Alignment, Padding, Style},
};

use crate::error::{DebtError, DebtResult};

pub const DEFAULT_SEPARATION: usize = 2;
pub const DEFAULT_SEPARATOR: char = '|';

/// Rows of pre-formatted cells, printed right-aligned in columns as wide as
/// their widest cell plus `separation`.
#[derive(Clone, PartialEq, Debug)]
pub struct Table {
    columns: usize,
    separation: usize,
    separator: char,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: usize, separation: usize, separator: char) -> DebtResult<Self> {
        if columns == 0 {
            return Err(DebtError::InvalidTable(
                "column count must be greater than 0".to_string(),
            ));
        }
        if separation == 0 {
            return Err(DebtError::InvalidTable(
                "column separation must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            columns,
            separation,
            separator,
            rows: Vec::new(),
        })
    }

    pub fn with_columns(columns: usize) -> DebtResult<Self> {
        Self::new(columns, DEFAULT_SEPARATION, DEFAULT_SEPARATOR)
    }

    pub fn add_row<S: Into<String>>(&mut self, row: Vec<S>) -> DebtResult<()> {
        if row.len() != self.columns {
            return Err(DebtError::RowWidth {
                expected: self.columns,
                found: row.len(),
            });
        }
        self.rows.push(row.into_iter().map(Into::into).collect());
        Ok(())
    }

    pub fn column_count(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn column_widths(&self) -> Vec<usize> {
        (0..self.columns)
            .map(|col| {
                self.rows
                    .iter()
                    .map(|row| row[col].chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return Ok(());
        }
        let mut builder = Builder::default();
        for row in &self.rows {
            builder.push_record(row.iter().map(String::as_str));
        }
        let mut table = builder.build();
        table
            .with(Style::empty().vertical(self.separator).right(self.separator))
            .with(Padding::new(self.separation, 0, 0, 0))
            .with(Alignment::right());
        writeln!(f, "{}", table)
    }
}

#[cfg(test)]
mod tests {
    use super::Table;
    use crate::error::DebtError;
    use test_log::test;

    #[test]
    fn test_render_aligns_right() {
        let mut table = Table::new(3, 2, '|').unwrap();
        table.add_row(vec!["a", "bb", "ccc"]).unwrap();
        table.add_row(vec!["1000", "2", "30"]).unwrap();

        assert_eq!(table.column_widths(), vec![4, 2, 3]);
        assert_eq!(
            table.render(),
            "     a|  bb|  ccc|\n  1000|   2|   30|\n"
        );
    }

    #[test]
    fn test_default_separator() {
        let mut table = Table::with_columns(2).unwrap();
        table.add_row(vec!["x".to_string(), "yz".to_string()]).unwrap();
        assert_eq!(table.to_string(), "  x|  yz|\n");
    }

    #[test]
    fn test_row_width_mismatch_is_rejected() {
        let mut table = Table::with_columns(2).unwrap();
        assert_eq!(
            table.add_row(vec!["only one"]),
            Err(DebtError::RowWidth {
                expected: 2,
                found: 1
            })
        );
        assert!(table.rows().is_empty());
    }

    #[test]
    fn test_invalid_shape() {
        assert!(matches!(Table::new(0, 3, '|'), Err(DebtError::InvalidTable(_))));
        assert!(matches!(Table::new(3, 0, '|'), Err(DebtError::InvalidTable(_))));
    }

    #[test]
    fn test_empty_table_renders_nothing() {
        let table = Table::with_columns(4).unwrap();
        assert_eq!(table.column_widths(), vec![0, 0, 0, 0]);
        assert_eq!(table.render(), "");
    }
}
