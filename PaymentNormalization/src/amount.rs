use rust_decimal::Decimal;
use thiserror::Error;

/// Decimal places of the ledger's minor unit representation.
pub const LEDGER_DECIMALS: u32 = 18;

pub type AmountResult<T> = Result<T, AmountError>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AmountError {
    #[error("Unparseable amount: {0}")]
    Unparseable(String),
    #[error("Negative amount: {0}")]
    Negative(String),
    #[error("Amount has more than {LEDGER_DECIMALS} fractional digits: {0}")]
    TooPrecise(String),
    #[error("Amount overflows the ledger range: {0}")]
    Overflow(String),
}

/// Converts a decimal string into ledger minor units.
///
/// Exact arithmetic only: the string is parsed without rounding and the
/// mantissa is rescaled with checked integer math. `"10.000001"` becomes
/// `10_000_001_000_000_000_000`.
pub fn decimal_to_minor_units(amount: &str) -> AmountResult<u128> {
    let trimmed = amount.trim();
    let decimal = Decimal::from_str_exact(trimmed)
        .map_err(|_| AmountError::Unparseable(trimmed.to_string()))?
        .normalize();
    if decimal.is_sign_negative() && !decimal.is_zero() {
        return Err(AmountError::Negative(trimmed.to_string()));
    }
    let scale = decimal.scale();
    if scale > LEDGER_DECIMALS {
        return Err(AmountError::TooPrecise(trimmed.to_string()));
    }
    let mantissa = decimal.mantissa().unsigned_abs();
    let factor = 10u128.pow(LEDGER_DECIMALS - scale);
    mantissa
        .checked_mul(factor)
        .ok_or_else(|| AmountError::Overflow(trimmed.to_string()))
}

/// Scales an integer amount expressed in a chain's native minor units (for
/// example XRP drops at 6 decimals) up to ledger minor units.
pub fn native_units_to_minor_units(value: u128, chain_decimals: u32) -> AmountResult<u128> {
    if chain_decimals > LEDGER_DECIMALS {
        return Err(AmountError::TooPrecise(format!(
            "{value} at {chain_decimals} decimals"
        )));
    }
    let factor = 10u128.pow(LEDGER_DECIMALS - chain_decimals);
    value
        .checked_mul(factor)
        .ok_or_else(|| AmountError::Overflow(value.to_string()))
}

/// Renders minor units as a human decimal string for logs, e.g. `"5.25"`.
pub fn format_minor_units(amount: u128) -> String {
    let scale = 10u128.pow(LEDGER_DECIMALS);
    let whole = amount / scale;
    let frac = amount % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:018}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}
