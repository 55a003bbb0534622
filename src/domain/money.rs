use std::fmt;

use serde_json::Value;

/// Money is held as integer paise (1 rupee = 100 paise) so sums never pick up
/// floating-point drift. `₹150.50` is `15050`.
pub type Cents = i64;

pub const RUPEE_SYMBOL: &str = "₹";

/// Plain decimal rendering, used for CLI tables and CSV.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Render an amount with the rupee symbol and Indian digit grouping:
/// the last three digits form one group, everything before it is grouped
/// in pairs. Example: 1234567 paise -> "₹12,345.67", 1_00_00_000_00 -> "₹1,00,00,000.00"
pub fn format_inr(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!(
        "{}{}{}.{:02}",
        sign,
        RUPEE_SYMBOL,
        group_indian(abs / 100),
        abs % 100
    )
}

fn group_indian(rupees: u64) -> String {
    let digits = rupees.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// Parse a decimal string into paise.
/// Accepts an optional rupee symbol and grouping commas.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "₹1,50,000" -> 15000000
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let cleaned: String = input
        .trim()
        .trim_start_matches(RUPEE_SYMBOL)
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    let negative = cleaned.starts_with('-');
    let unsigned = cleaned.trim_start_matches('-');
    if unsigned.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }

    let (units_str, fraction_str) = match unsigned.split_once('.') {
        Some((units, fraction)) => (units, fraction),
        None => (unsigned, ""),
    };
    if fraction_str.contains('.') {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str
            .parse()
            .map_err(|_| ParseCentsError::InvalidFormat)?
    };

    // Only two fractional digits are significant; anything beyond is truncated.
    let fraction: String = fraction_str.chars().take(2).collect();
    let paise: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| ParseCentsError::InvalidFormat)? * 10,
        _ => fraction.parse().map_err(|_| ParseCentsError::InvalidFormat)?,
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(paise))
        .ok_or(ParseCentsError::OutOfRange)?;
    Ok(if negative { -cents } else { cents })
}

/// Round a floating-point rupee amount to the nearest paisa.
pub fn round_to_cents(rupees: f64) -> Cents {
    if !rupees.is_finite() {
        return 0;
    }
    (rupees * 100.0).round() as Cents
}

/// Coerce a loosely-typed persisted amount (number, numeric string, null) to paise.
/// Anything that is not a number contributes zero; this never fails.
pub fn coerce_cents(value: &Value) -> Cents {
    match value {
        Value::Number(n) => n.as_f64().map(round_to_cents).unwrap_or(0),
        Value::String(s) => coerce_cents_str(s),
        _ => 0,
    }
}

/// String form of [`coerce_cents`].
pub fn coerce_cents_str(raw: &str) -> Cents {
    match raw.trim().parse::<f64>() {
        Ok(rupees) => round_to_cents(rupees),
        Err(_) => parse_cents(raw).unwrap_or(0),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
    OutOfRange,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
            ParseCentsError::OutOfRange => write!(f, "amount out of range"),
        }
    }
}

impl std::error::Error for ParseCentsError {}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(5000), "50.00");
        assert_eq!(format_cents(1), "0.01");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(-5000), "-50.00");
    }

    #[test]
    fn test_format_inr_grouping() {
        assert_eq!(format_inr(0), "₹0.00");
        assert_eq!(format_inr(99_900), "₹999.00");
        assert_eq!(format_inr(100_000), "₹1,000.00");
        assert_eq!(format_inr(1_234_567), "₹12,345.67");
        assert_eq!(format_inr(10_000_000), "₹1,00,000.00");
        assert_eq!(format_inr(1_000_000_000), "₹1,00,00,000.00");
        assert_eq!(format_inr(99_999_999_999), "₹99,99,99,999.99");
        assert_eq!(format_inr(999_999_999_999), "₹9,99,99,99,999.99");
        assert_eq!(format_inr(-150_050), "-₹1,500.50");
    }

    #[test]
    fn test_parse_cents() {
        assert_eq!(parse_cents("50.00"), Ok(5000));
        assert_eq!(parse_cents("50"), Ok(5000));
        assert_eq!(parse_cents("12.5"), Ok(1250));
        assert_eq!(parse_cents(".50"), Ok(50));
        assert_eq!(parse_cents("-50.00"), Ok(-5000));
        assert_eq!(parse_cents("100.999"), Ok(10099));
        assert_eq!(parse_cents("₹1,50,000.50"), Ok(15_000_050));
    }

    #[test]
    fn test_parse_cents_invalid() {
        assert!(parse_cents("abc").is_err());
        assert!(parse_cents("12.34.56").is_err());
        assert!(parse_cents("").is_err());
        assert!(parse_cents("-").is_err());
    }

    #[test]
    fn test_round_to_cents_absorbs_float_artifacts() {
        assert_eq!(round_to_cents(0.1 + 0.2), 30);
        assert_eq!(round_to_cents(150.5), 15050);
        assert_eq!(round_to_cents(-2.346), -235);
        assert_eq!(round_to_cents(f64::NAN), 0);
    }

    #[test]
    fn test_coerce_cents() {
        assert_eq!(coerce_cents(&json!(120)), 12000);
        assert_eq!(coerce_cents(&json!(12.346)), 1235);
        assert_eq!(coerce_cents(&json!("99.5")), 9950);
        assert_eq!(coerce_cents(&json!("1,200.00")), 120000);
        assert_eq!(coerce_cents(&json!("n/a")), 0);
        assert_eq!(coerce_cents(&json!(null)), 0);
        assert_eq!(coerce_cents(&json!({"amount": 5})), 0);
    }
}
