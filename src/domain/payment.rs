use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::period::DateRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMode {
    Cash,
    Online,
    Cheque,
    CashOnline,
    CashCheque,
    ChequeOnline,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Online => "online",
            PaymentMode::Cheque => "cheque",
            PaymentMode::CashOnline => "cash+online",
            PaymentMode::CashCheque => "cash+cheque",
            PaymentMode::ChequeOnline => "cheque+online",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMode::Cash),
            "online" => Ok(PaymentMode::Online),
            "cheque" => Ok(PaymentMode::Cheque),
            "cash+online" => Ok(PaymentMode::CashOnline),
            "cash+cheque" => Ok(PaymentMode::CashCheque),
            "cheque+online" => Ok(PaymentMode::ChequeOnline),
            "" => Err(DomainError::invalid("mode of payment is required")),
            other => Err(DomainError::invalid(format!(
                "unknown mode of payment '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub customer_id: Uuid,
    pub date: DateTime<Utc>,
    pub amount: BigDecimal,
    pub mode_of_payment: PaymentMode,
    pub paid_to: Option<String>,
    pub notes: Option<String>,
}

impl NewPayment {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.amount <= BigDecimal::zero() {
            return Err(DomainError::invalid("payment amount must be greater than zero"));
        }
        Ok(())
    }

    pub fn balance_effect(&self) -> BigDecimal {
        -self.amount.clone()
    }
}

#[derive(Debug, Clone)]
pub struct PaymentView {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub date: DateTime<Utc>,
    pub amount: BigDecimal,
    pub mode_of_payment: PaymentMode,
    pub paid_to: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PaymentView {
    pub fn balance_effect(&self) -> BigDecimal {
        -self.amount.clone()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub customer_id: Option<Uuid>,
    pub mode_of_payment: Option<PaymentMode>,
    pub paid_to: Option<String>,
    pub period: Option<DateRange>,
}
