use bigdecimal::{BigDecimal, RoundingMode};

/// Rounds to paise. Only applied when a value is stored as a bill or shown
/// to a person; sums are carried unrounded.
pub fn round2(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(2, RoundingMode::HalfUp)
}

/// Drops trailing zeros so quantities read as `2` and `1.5`, not `2.000`.
pub fn display_quantity(value: &BigDecimal) -> String {
    if value.is_integer() {
        value.with_scale(0).to_string()
    } else {
        value.normalized().to_string()
    }
}
