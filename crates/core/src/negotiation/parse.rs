//! Small parsers over caller utterances.
//!
//! Grammars:
//! - digits: every ASCII digit in the utterance, concatenated in order
//!   (`"MC 12-34"` -> `"1234"`, `"$1,500"` -> `"1500"`).
//! - route: `... from <origin> to <destination>`, markers matched
//!   case-insensitively, `" to "` must follow `"from "`. Both parts are
//!   trimmed of whitespace and trailing sentence punctuation.
//! - acceptance: some word of the utterance is `accept`, `accepted` or
//!   `accepts` in any case. Words split on anything not alphanumeric or `'`.

use std::str::FromStr;

use rust_decimal::Decimal;

const FROM_MARKER: &str = "from ";
const TO_MARKER: &str = " to ";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub origin: String,
    pub destination: String,
}

pub fn extract_digits(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

pub fn parse_route(text: &str) -> Option<Route> {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lowered = text.to_ascii_lowercase();
    let from_at = lowered.find(FROM_MARKER)?;
    let origin_start = from_at + FROM_MARKER.len();
    let to_at = origin_start + lowered[origin_start..].find(TO_MARKER)?;
    let destination_start = to_at + TO_MARKER.len();

    Some(Route {
        origin: clean_place(&text[origin_start..to_at]),
        destination: clean_place(&text[destination_start..]),
    })
}

const ACCEPT_WORDS: &[&str] = &["accept", "accepted", "accepts"];

pub fn is_acceptance(text: &str) -> bool {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .any(|word| ACCEPT_WORDS.iter().any(|accept| word.eq_ignore_ascii_case(accept)))
}

/// Numeric offer from the digits in the utterance, if any.
pub fn parse_offer(text: &str) -> Option<Decimal> {
    let digits = extract_digits(text);
    if digits.is_empty() {
        return None;
    }
    Decimal::from_str(&digits).ok()
}

fn clean_place(raw: &str) -> String {
    raw.trim().trim_end_matches(['.', '?', '!']).trim().to_owned()
}
