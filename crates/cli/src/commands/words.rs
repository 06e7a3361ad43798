use propkit_core::rupees_in_words;
use rust_decimal::Decimal;

use crate::commands::{CommandResult, EXIT_BUILD_FAILURE};

/// Accepts `629766`, `6,29,766.40` or `₹629,766`.
pub fn run(amount: &str) -> CommandResult {
    let cleaned: String =
        amount.trim().trim_start_matches('₹').chars().filter(|ch| *ch != ',').collect();

    match cleaned.parse::<Decimal>() {
        Ok(value) => CommandResult::success("words", rupees_in_words(value)),
        Err(_) => CommandResult::failure(
            "words",
            "input",
            format!("`{amount}` is not a decimal amount"),
            EXIT_BUILD_FAILURE,
        ),
    }
}
