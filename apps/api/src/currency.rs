//! Currency formatting for payslips: grouped two-decimal amounts and Indian-English words.
//!
//! Words follow the en_IN grammar (crore / lakh / thousand / hundred, "and" before a
//! trailing sub-hundred part, comma between scale groups) and are title-cased the way
//! the rest of the document is, including after hyphens ("Twenty-Three").

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Prefix and spoken name of a currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Currency {
    pub prefix: &'static str,
    pub name: &'static str,
}

pub const INR: Currency = Currency {
    prefix: "Rs.",
    name: "Indian Rupee",
};

const ONES: [&str; 20] = [
    "zero",
    "one",
    "two",
    "three",
    "four",
    "five",
    "six",
    "seven",
    "eight",
    "nine",
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
    "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

/// Scale groups, largest first. Crore counts above 99 recurse ("one hundred crore").
const SCALES: [(u128, &str); 4] = [
    (10_000_000, "crore"),
    (100_000, "lakh"),
    (1_000, "thousand"),
    (100, "hundred"),
];

// ────────────────────────────────────────────────────────────────────────────
// Amounts
// ────────────────────────────────────────────────────────────────────────────

/// `1234.5` → `Rs.1,234.50`; `-1234.5` → `-Rs.1,234.50`.
///
/// The minus always leads the prefix. Values are rounded half away from zero.
pub fn format_amount(value: Decimal) -> String {
    format_amount_in(value, INR)
}

pub fn format_amount_in(value: Decimal, currency: Currency) -> String {
    let magnitude = value
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let fixed = format!("{magnitude:.2}");
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let sign = if value < Decimal::ZERO { "-" } else { "" };
    format!(
        "{sign}{}{}.{frac_part}",
        currency.prefix,
        group_thousands(int_part)
    )
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Words
// ────────────────────────────────────────────────────────────────────────────

/// Spells the integer part of `value`, title-cased. Fractional paise are truncated.
///
/// `15000.99` → `Fifteen Thousand`; `-5` → `Minus Five`.
pub fn format_words(value: Decimal) -> String {
    let whole = value.trunc();
    let magnitude = whole.abs().to_u128().unwrap_or(0);
    let mut words = spell(magnitude);
    if whole < Decimal::ZERO {
        words = format!("minus {words}");
    }
    title_case(&words)
}

/// The callout phrase: `Amount in Words: Indian Rupee Fifteen Thousand Only`.
pub fn amount_in_words(value: Decimal, currency: Currency) -> String {
    format!(
        "Amount in Words: {} {} Only",
        currency.name,
        format_words(value)
    )
}

fn spell(n: u128) -> String {
    if n < 100 {
        return spell_below_hundred(n);
    }

    let mut groups: Vec<String> = Vec::new();
    let mut rest = n;
    for (scale, label) in SCALES {
        if rest >= scale {
            groups.push(format!("{} {label}", spell(rest / scale)));
            rest %= scale;
        }
    }

    let mut out = groups.join(", ");
    if rest > 0 {
        out.push_str(" and ");
        out.push_str(&spell_below_hundred(rest));
    }
    out
}

fn spell_below_hundred(n: u128) -> String {
    let n = n as usize;
    if n < 20 {
        ONES[n].to_string()
    } else if n % 10 == 0 {
        TENS[n / 10].to_string()
    } else {
        format!("{}-{}", TENS[n / 10], ONES[n % 10])
    }
}

/// Uppercases every letter that follows a non-letter and lowercases the rest.
///
/// `"o'neil"` → `"O'Neil"`, `"twenty-three"` → `"Twenty-Three"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_alpha = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_is_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_alpha = true;
        } else {
            out.push(ch);
            prev_is_alpha = false;
        }
    }
    out
}
