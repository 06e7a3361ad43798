//! Indian-system number words for the final amount.

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};

const ONES: [&str; 20] = [
    "Zero",
    "One",
    "Two",
    "Three",
    "Four",
    "Five",
    "Six",
    "Seven",
    "Eight",
    "Nine",
    "Ten",
    "Eleven",
    "Twelve",
    "Thirteen",
    "Fourteen",
    "Fifteen",
    "Sixteen",
    "Seventeen",
    "Eighteen",
    "Nineteen",
];

const TENS: [&str; 10] =
    ["", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety"];

const CRORE: u128 = 10_000_000;
const LAKH: u128 = 100_000;
const THOUSAND: u128 = 1_000;

/// Whole-rupee amount in words, e.g. `One Lakh Rupees Only`. Paise are
/// rounded half-up into the rupee and never spelled out.
pub fn rupees_in_words(amount: Decimal) -> String {
    let whole = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let magnitude = whole.abs().to_u128().unwrap_or_default();

    let words = if magnitude == 0 { ONES[0].to_string() } else { indian_words(magnitude) };
    if whole.is_sign_negative() && magnitude > 0 {
        format!("Minus {words} Rupees Only")
    } else {
        format!("{words} Rupees Only")
    }
}

/// 1 and above. A crore count of 100 or more is itself rendered in the
/// Indian system, so `1_000_000_000` reads "One Hundred Crore".
fn indian_words(value: u128) -> String {
    let crores = value / CRORE;
    let lakhs = (value % CRORE) / LAKH;
    let thousands = (value % LAKH) / THOUSAND;
    let rest = value % THOUSAND;

    let mut parts = Vec::new();
    if crores > 0 {
        parts.push(format!("{} Crore", indian_words(crores)));
    }
    if lakhs > 0 {
        parts.push(format!("{} Lakh", below_hundred(lakhs)));
    }
    if thousands > 0 {
        parts.push(format!("{} Thousand", below_hundred(thousands)));
    }
    if rest > 0 {
        parts.push(below_thousand(rest));
    }
    parts.join(" ")
}

fn below_hundred(value: u128) -> String {
    match value {
        0..=19 => ONES[value as usize].to_string(),
        _ => {
            let tens = TENS[(value / 10) as usize];
            match value % 10 {
                0 => tens.to_string(),
                ones => format!("{tens} {}", ONES[ones as usize]),
            }
        }
    }
}

fn below_thousand(value: u128) -> String {
    let hundreds = value / 100;
    let rest = value % 100;
    match (hundreds, rest) {
        (0, rest) => below_hundred(rest),
        (hundreds, 0) => format!("{} Hundred", ONES[hundreds as usize]),
        (hundreds, rest) => format!("{} Hundred and {}", ONES[hundreds as usize], below_hundred(rest)),
    }
}
