//! Money formatting and gateway amount conversion.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::foundation::ValidationError;

/// Formats an amount as `<CODE> 1,234.50`.
pub fn format_money(amount: Decimal, currency: &str) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!(
        "{} {}{}.{}",
        currency,
        if negative { "-" } else { "" },
        grouped,
        fraction
    )
}

/// Converts an amount to the whole-unit integer the gateway accepts.
/// Fractional amounts are rounded up so the customer never underpays.
pub fn to_gateway_amount(amount: Decimal) -> Result<i64, ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::too_small("amount", 1, amount));
    }
    amount
        .ceil()
        .to_i64()
        .ok_or_else(|| ValidationError::invalid_format("amount", "amount out of range"))
}
