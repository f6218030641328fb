use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;

/// Every record amount is an integer string in units of 10^-6.
pub const AMOUNT_SCALE: u32 = 6;

/// Which parsing path produced an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum AmountTier {
    /// Contains a decimal point and is read as human units.
    Decimal,
    /// Integer string scaled by 10^6.
    ScaledInteger,
    /// Leading digits of an otherwise unparseable string, scaled by 10^6.
    LeadingDigits,
}

fn scale() -> Decimal {
    Decimal::from(10_u64.pow(AMOUNT_SCALE))
}

/// `magnitude * 10^6` rounded half away from zero. Saturates instead of
/// overflowing for magnitudes beyond `Decimal`'s range.
pub fn to_scaled_string(magnitude: Decimal) -> String {
    magnitude
        .checked_mul(scale())
        .unwrap_or(if magnitude.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        })
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
        .to_string()
}

/// Reads a record amount back into human units.
///
/// Strings containing `.` are taken as already human-scaled and read up to the
/// end of their longest decimal prefix, so `"2.5 USDC"` is 2.5; other strings
/// are parsed as 10^6-scaled integers; anything else falls back to its leading
/// integer digits. The last tier can disagree with the first two for inputs
/// such as `"1e6"` and is logged when it applies.
pub fn parse_amount(raw: &str) -> Option<(Decimal, AmountTier)> {
    let trimmed = raw.trim();

    if trimmed.contains('.') {
        let (value, consumed) = decimal_prefix(trimmed)?;
        if consumed < trimmed.len() {
            warn!(amount = raw, parsed = %value, "trailing characters ignored in decimal amount");
        }
        return Some((value, AmountTier::Decimal));
    }
    if let Some(value) = scaled_integer(trimmed) {
        return Some((value, AmountTier::ScaledInteger));
    }

    let value = leading_digits(trimmed)?;
    warn!(
        amount = raw,
        parsed = %value,
        "amount parsed from leading digits only"
    );
    Some((value, AmountTier::LeadingDigits))
}

/// Longest `[+-]digits[.digits]` prefix and the number of bytes it spans.
fn decimal_prefix(s: &str) -> Option<(Decimal, usize)> {
    let bytes = s.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'-' | b'+')));

    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let int_part = &s[int_start..end];

    let mut frac_part = "";
    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        if frac_end > frac_start || !int_part.is_empty() {
            frac_part = &s[frac_start..frac_end];
            end = frac_end;
        }
    }
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let sign = if s.starts_with('-') { "-" } else { "" };
    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let literal = if frac_part.is_empty() {
        format!("{sign}{int_part}")
    } else {
        format!("{sign}{int_part}.{frac_part}")
    };
    Decimal::from_str(&literal).ok().map(|value| (value, end))
}

fn scaled_integer(s: &str) -> Option<Decimal> {
    let units: i128 = s.parse().ok()?;
    Decimal::try_from_i128_with_scale(units, AMOUNT_SCALE).ok()
}

fn leading_digits(s: &str) -> Option<Decimal> {
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'-') => ("-", &s[1..]),
        Some(b'+') => ("", &s[1..]),
        _ => ("", s),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    scaled_integer(&format!("{sign}{}", &rest[..end]))
}
