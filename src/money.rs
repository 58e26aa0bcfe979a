//! Money formatting for display.
//!
//! Amounts are stored in minor units. Whole amounts print without a fractional
//! part (`₹50`), anything else prints two decimals (`₹50.25`). Thousands are
//! separated with commas.

pub fn format_money(cents: i64, symbol: &str) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    format!("{}{}{}", sign, symbol, format_amount(cents.unsigned_abs()))
}

/// Percentage with one decimal, e.g. `37.5%`.
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

fn format_amount(cents: u64) -> String {
    let whole = with_thousands(cents / 100);
    match cents % 100 {
        0 => whole,
        fraction => format!("{}.{:02}", whole, fraction),
    }
}

fn with_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_amount_has_no_decimals() {
        assert_eq!(format_money(5000, "₹"), "₹50");
    }

    #[test]
    fn test_fractional_amount() {
        assert_eq!(format_money(5025, "₹"), "₹50.25");
        assert_eq!(format_money(5, "$"), "$0.05");
    }

    #[test]
    fn test_zero() {
        assert_eq!(format_money(0, "₹"), "₹0");
    }

    #[test]
    fn test_thousands_separator() {
        assert_eq!(format_money(123_456_789, "₹"), "₹1,234,567.89");
        assert_eq!(format_money(100_000, "₹"), "₹1,000");
        assert_eq!(format_money(99_900, "₹"), "₹999");
    }

    #[test]
    fn test_negative_amount() {
        assert_eq!(format_money(-1250, "€"), "-€12.50");
    }

    #[test]
    fn test_percent() {
        assert_eq!(format_percent(37.5), "37.5%");
        assert_eq!(format_percent(100.0), "100.0%");
    }
}
