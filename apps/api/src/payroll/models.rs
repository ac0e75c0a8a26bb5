use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One validated payroll row. Built by the adapter, consumed once by the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    /// 1-based worksheet row the record was read from.
    pub row: usize,
    pub name: String,
    pub phone: Option<String>,
    pub basic_salary: Decimal,
    pub advance: Decimal,
    pub deduction: Decimal,
    /// Authoritative net pay. See `NetPolicy` for how mismatches are treated.
    pub net: Decimal,
}

impl EmployeeRecord {
    /// `basic_salary - advance - deduction`, for comparison against the supplied `net`.
    pub fn computed_net(&self) -> Decimal {
        self.basic_salary - self.advance - self.deduction
    }

    pub fn net_matches(&self) -> bool {
        self.computed_net() == self.net
    }

    /// Short identifier used in failure reports.
    pub fn identifier(&self) -> String {
        format!("row {} ({})", self.row, self.name)
    }
}

/// Month / year / pay-date strings shared by every record in one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriod {
    pub month: String,
    pub year: String,
    pub pay_date: Option<String>,
}

impl PayPeriod {
    pub fn new(month: impl Into<String>, year: impl Into<String>, pay_date: Option<String>) -> Self {
        Self {
            month: month.into().trim().to_string(),
            year: year.into().trim().to_string(),
            pay_date: pay_date
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        }
    }

    /// `"December 2024"`.
    pub fn label(&self) -> String {
        format!("{} {}", self.month, self.year)
    }
}

/// How the adapter treats a supplied NET that disagrees with the components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetPolicy {
    /// Render the supplied NET; log the mismatch.
    #[default]
    Trust,
    /// Reject the row with an invalid-value error on the NET column.
    Verify,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(salary: i64, advance: i64, deduction: i64, net: i64) -> EmployeeRecord {
        EmployeeRecord {
            row: 6,
            name: "Amit Kumar".to_string(),
            phone: None,
            basic_salary: Decimal::from(salary),
            advance: Decimal::from(advance),
            deduction: Decimal::from(deduction),
            net: Decimal::from(net),
        }
    }

    #[test]
    fn test_net_matches() {
        assert!(record(20000, 3000, 2000, 15000).net_matches());
        assert!(!record(20000, 3000, 2000, 16000).net_matches());
    }

    #[test]
    fn test_pay_period_trims_and_drops_blank_pay_date() {
        let period = PayPeriod::new(" December ", "2024", Some("  ".to_string()));
        assert_eq!(period.month, "December");
        assert_eq!(period.pay_date, None);
        assert_eq!(period.label(), "December 2024");
    }
}
