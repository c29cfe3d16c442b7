use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Litre,
    Kg,
    Pcs,
    Other,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Litre => "litre",
            Unit::Kg => "kg",
            Unit::Pcs => "pcs",
            Unit::Other => "other",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "litre" => Ok(Unit::Litre),
            "kg" => Ok(Unit::Kg),
            "pcs" => Ok(Unit::Pcs),
            "other" => Ok(Unit::Other),
            other => Err(DomainError::invalid(format!("unknown unit '{other}'"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub unit: Unit,
    pub default_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub unit: Unit,
    pub default_price: BigDecimal,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::invalid("product name is required"));
        }
        ensure_price(&self.default_price)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub unit: Option<Unit>,
    pub default_price: Option<BigDecimal>,
}

impl ProductPatch {
    pub fn validate(&self) -> Result<(), DomainError> {
        if matches!(&self.name, Some(n) if n.trim().is_empty()) {
            return Err(DomainError::invalid("product name cannot be blank"));
        }
        match &self.default_price {
            Some(p) => ensure_price(p),
            None => Ok(()),
        }
    }
}

fn ensure_price(price: &BigDecimal) -> Result<(), DomainError> {
    if *price < BigDecimal::zero() {
        return Err(DomainError::invalid("default price must not be negative"));
    }
    Ok(())
}
