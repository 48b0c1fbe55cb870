//! Money calculation utilities using rust_decimal for precision
//!
//! Amounts are stored as `f64`; every sum and product goes through `Decimal`
//! and is rounded half-up to 2 places before it is converted back.

use rust_decimal::prelude::*;

use crate::utils::{AppError, AppResult, ErrorCode};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed menu price
pub const MAX_PRICE: f64 = 10_000.0;
/// Maximum allowed quantity per line
pub const MAX_QUANTITY: i32 = 99;
/// Maximum allowed payment amount
pub const MAX_PAYMENT_AMOUNT: f64 = 100_000.0;

/// Convert f64 to Decimal for calculations
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
fn require_finite(value: f64, field_name: &str) -> AppResult<()> {
    if !value.is_finite() {
        return Err(AppError::with_message(
            ErrorCode::InvalidFormat,
            format!("{field_name} must be a finite number, got {value}"),
        ));
    }
    Ok(())
}

/// `price × quantity` as Decimal
pub fn line_total(price: f64, quantity: i32) -> Decimal {
    to_decimal(price) * Decimal::from(quantity)
}

/// Σ price × quantity, rounded
pub fn sum_lines<I>(lines: I) -> f64
where
    I: IntoIterator<Item = (f64, i32)>,
{
    let total: Decimal = lines
        .into_iter()
        .map(|(price, qty)| line_total(price, qty))
        .sum();
    to_f64(total)
}

/// Dollars → integer cents for the payment gateway
pub fn to_cents(amount: f64) -> i64 {
    (to_decimal(amount) * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or_default()
}

/// Integer cents → dollars
pub fn from_cents(cents: i64) -> f64 {
    to_f64(Decimal::new(cents, 2))
}

/// Two amounts equal within one cent
pub fn amounts_match(a: f64, b: f64) -> bool {
    (to_decimal(a) - to_decimal(b)).abs() < MONEY_TOLERANCE
}

pub fn validate_price(price: f64) -> AppResult<()> {
    require_finite(price, "price")?;
    if !(0.0..=MAX_PRICE).contains(&price) {
        return Err(AppError::with_message(
            ErrorCode::MenuItemInvalidPrice,
            format!("price must be between 0 and {MAX_PRICE}, got {price}"),
        ));
    }
    Ok(())
}

pub fn validate_quantity(quantity: i32) -> AppResult<()> {
    if !(1..=MAX_QUANTITY).contains(&quantity) {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("quantity must be between 1 and {MAX_QUANTITY}, got {quantity}"),
        )
        .with_detail("field", "quantity"));
    }
    Ok(())
}

pub fn validate_payment_amount(amount: f64) -> AppResult<()> {
    require_finite(amount, "amount")?;
    if amount <= 0.0 || amount > MAX_PAYMENT_AMOUNT {
        return Err(AppError::with_message(
            ErrorCode::PaymentAmountInvalid,
            format!("amount must be greater than 0 and at most {MAX_PAYMENT_AMOUNT}, got {amount}"),
        ));
    }
    Ok(())
}
