//! Money formatting shared by text reports and charts

use crate::games::types::Chips;

/// `1234567` -> `"1,234,567"`
pub fn group_thousands(amount: Chips) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    if amount < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `₹1,000`, or `-₹50` for a negative amount
pub fn chips(symbol: &str, amount: Chips) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    format!("{}{}{}", sign, symbol, group_thousands(amount).trim_start_matches('-'))
}

/// `+₹1,000`, `-₹50`, or `₹0`
pub fn signed_chips(symbol: &str, amount: Chips) -> String {
    if amount > 0 {
        format!("+{}", chips(symbol, amount))
    } else {
        chips(symbol, amount)
    }
}

/// Parse an operator-typed amount such as `₹1,000` or `$250`
pub fn parse_chips(input: &str) -> Option<Chips> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| !matches!(c, '₹' | '$' | ',' | '_'))
        .collect();
    cleaned.parse().ok()
}
