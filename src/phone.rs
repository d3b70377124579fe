//! Normalization of user supplied phone numbers into E.164.
//!
//! Formatting characters (spaces, dashes, brackets, dots, letters) are dropped. What remains must
//! start with `+` followed by 8 to 15 digits, which is the length range of an international
//! number once the country code is included.

const MIN_DIGITS: usize = 8;
const MAX_DIGITS: usize = 15;

/// Returns the canonical `+<digits>` form of `raw`, or `None` if it can't be a valid international
/// number.
pub fn normalize_e164(raw: &str) -> Option<String> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    let rest = kept.strip_prefix('+')?;
    let digits: String = rest.chars().filter(|c| c.is_ascii_digit()).collect();
    if (MIN_DIGITS..=MAX_DIGITS).contains(&digits.len()) {
        Some(format!("+{digits}"))
    } else {
        None
    }
}

/// Same as [normalize_e164] but with the persisted convention of an empty string meaning "no
/// valid phone".
pub fn normalize_or_empty(raw: &str) -> String {
    normalize_e164(raw).unwrap_or_default()
}
