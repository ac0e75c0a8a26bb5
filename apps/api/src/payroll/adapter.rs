//! Table → `EmployeeRecord` sequence.
//!
//! The header row sits below a fixed number of metadata rows. Header names are
//! whitespace-trimmed before lookup. Rows with a blank NAME are separators and are
//! skipped silently. A missing required column fails before any record is produced;
//! per-row coercion failures are yielded in-line so the caller picks the batch policy.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::warn;

use crate::errors::AppError;
use crate::payroll::models::{EmployeeRecord, NetPolicy};
use crate::payroll::table::{Cell, Table};

pub const COL_NAME: &str = "NAME";
pub const COL_PHONE: &str = "mobile no";
pub const COL_SALARY: &str = "SALARY";
pub const COL_ADVANCE: &str = "ADVANCE";
pub const COL_DEDUCTION: &str = "DEDUCTION";
pub const COL_NET: &str = "NET";

const REQUIRED_COLUMNS: [&str; 5] = [COL_NAME, COL_SALARY, COL_ADVANCE, COL_DEDUCTION, COL_NET];

/// Metadata rows above the header in the reference payroll sheet.
pub const DEFAULT_HEADER_ROWS: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct AdapterOptions {
    /// Rows skipped before the header row.
    pub header_rows: usize,
    pub net_policy: NetPolicy,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            header_rows: DEFAULT_HEADER_ROWS,
            net_policy: NetPolicy::Trust,
        }
    }
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    name: usize,
    phone: Option<usize>,
    salary: usize,
    advance: usize,
    deduction: usize,
    net: usize,
}

/// Lazy, single-pass reader over the data rows of a payroll table.
pub struct RecordReader {
    rows: std::iter::Enumerate<std::vec::IntoIter<Vec<Cell>>>,
    columns: Columns,
    first_data_row: usize,
    net_policy: NetPolicy,
}

impl RecordReader {
    /// Resolves the header. Fails with `MalformedInput` if any required column is missing.
    pub fn new(table: Table, options: AdapterOptions) -> Result<Self, AppError> {
        let mut rows = table.rows;
        if rows.len() <= options.header_rows {
            return Err(AppError::MalformedInput(format!(
                "Expected a header row after {} metadata rows, found only {} rows",
                options.header_rows,
                rows.len()
            )));
        }

        let data = rows.split_off(options.header_rows + 1);
        let header = rows.pop().unwrap_or_default();
        let columns = resolve_columns(&header)?;

        Ok(Self {
            rows: data.into_iter().enumerate(),
            columns,
            first_data_row: options.header_rows + 2,
            net_policy: options.net_policy,
        })
    }

    fn read_row(&self, row: usize, cells: &[Cell]) -> Result<EmployeeRecord, AppError> {
        let cols = self.columns;
        let name = collapse_whitespace(&cell_at(cells, cols.name).display());
        let phone = cols
            .phone
            .map(|i| cell_at(cells, i))
            .filter(|c| !c.is_blank())
            .map(Cell::display);

        let basic_salary = non_negative(row, COL_SALARY, cell_at(cells, cols.salary), false)?;
        let advance = non_negative(row, COL_ADVANCE, cell_at(cells, cols.advance), true)?;
        let deduction = non_negative(row, COL_DEDUCTION, cell_at(cells, cols.deduction), true)?;
        let net_cell = cell_at(cells, cols.net);
        let net = parse_amount(net_cell).ok_or_else(|| invalid(row, COL_NET, net_cell))?;

        let record = EmployeeRecord {
            row,
            name,
            phone,
            basic_salary,
            advance,
            deduction,
            net,
        };

        if !record.net_matches() {
            match self.net_policy {
                NetPolicy::Trust => warn!(
                    row,
                    employee = %record.name,
                    supplied = %record.net,
                    computed = %record.computed_net(),
                    "NET differs from SALARY - ADVANCE - DEDUCTION; rendering supplied NET"
                ),
                NetPolicy::Verify => {
                    return Err(AppError::InvalidValue {
                        row,
                        column: COL_NET.to_string(),
                        value: format!(
                            "{} (expected {})",
                            record.net,
                            record.computed_net()
                        ),
                    })
                }
            }
        }

        Ok(record)
    }
}

impl Iterator for RecordReader {
    type Item = Result<EmployeeRecord, AppError>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((offset, cells)) = self.rows.next() {
            if cell_at(&cells, self.columns.name).is_blank() {
                continue;
            }
            let row = self.first_data_row + offset;
            return Some(self.read_row(row, &cells));
        }
        None
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn resolve_columns(header: &[Cell]) -> Result<Columns, AppError> {
    let positions: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.is_blank())
        .map(|(i, c)| (c.display(), i))
        .collect();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !positions.contains_key(*c))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::MalformedInput(format!(
            "Missing required column(s): {}",
            missing.join(", ")
        )));
    }

    Ok(Columns {
        name: positions[COL_NAME],
        phone: positions.get(COL_PHONE).copied(),
        salary: positions[COL_SALARY],
        advance: positions[COL_ADVANCE],
        deduction: positions[COL_DEDUCTION],
        net: positions[COL_NET],
    })
}

static EMPTY: Cell = Cell::Empty;

fn cell_at(cells: &[Cell], idx: usize) -> &Cell {
    cells.get(idx).unwrap_or(&EMPTY)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn invalid(row: usize, column: &str, cell: &Cell) -> AppError {
    AppError::InvalidValue {
        row,
        column: column.to_string(),
        value: if cell.is_blank() {
            "<blank>".to_string()
        } else {
            cell.display()
        },
    }
}

/// Parses a component amount. Blank reads as zero only when `blank_is_zero`.
fn non_negative(
    row: usize,
    column: &str,
    cell: &Cell,
    blank_is_zero: bool,
) -> Result<Decimal, AppError> {
    if blank_is_zero && cell.is_blank() {
        return Ok(Decimal::ZERO);
    }
    match parse_amount(cell) {
        Some(v) if v >= Decimal::ZERO => Ok(v),
        _ => Err(invalid(row, column, cell)),
    }
}

/// Numeric cells convert through their shortest decimal repr; text may carry
/// thousands separators and an `Rs.` prefix.
pub(crate) fn parse_amount(cell: &Cell) -> Option<Decimal> {
    match cell {
        Cell::Empty => None,
        Cell::Number(n) if n.is_finite() => Decimal::from_str(&n.to_string()).ok(),
        Cell::Number(_) => None,
        Cell::Text(s) => {
            let trimmed = s.trim();
            let (negative, rest) = match trimmed.strip_prefix('-') {
                Some(rest) => (true, rest.trim_start()),
                None => (false, trimmed),
            };
            let rest = rest.strip_prefix("Rs.").unwrap_or(rest);
            let cleaned: String = rest
                .chars()
                .filter(|c| *c != ',' && !c.is_whitespace())
                .collect();
            // One leading minus at most; the remainder must start with a digit.
            if !cleaned.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
                return None;
            }
            let value = Decimal::from_str(&cleaned).ok()?;
            Some(if negative { -value } else { value })
        }
    }
}
