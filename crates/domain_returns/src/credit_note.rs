//! Credit-note numbering

/// Prefix of every credit-note number
pub const CREDIT_NOTE_PREFIX: &str = "NC-";

/// Width of the zero-padded numeric suffix
pub const CREDIT_NOTE_DIGITS: usize = 8;

/// Computes the next credit-note number from the most recently issued one
///
/// `NC-00000007` becomes `NC-00000008`; with no prior number (or an
/// unparseable one) the sequence starts over at `NC-00000001`. Uniqueness
/// under concurrent creators is enforced by the store's unique constraint;
/// callers retry with a fresh number on conflict.
pub fn next_credit_note_number(last: Option<&str>) -> String {
    let next = last
        .and_then(|s| s.strip_prefix(CREDIT_NOTE_PREFIX))
        .and_then(|digits| digits.parse::<u64>().ok())
        .map(|n| n + 1)
        .unwrap_or(1);
    format!("{CREDIT_NOTE_PREFIX}{next:0width$}", width = CREDIT_NOTE_DIGITS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_number() {
        assert_eq!(next_credit_note_number(None), "NC-00000001");
    }

    #[test]
    fn test_increments_and_keeps_padding() {
        assert_eq!(
            next_credit_note_number(Some("NC-00000001")),
            "NC-00000002"
        );
        assert_eq!(
            next_credit_note_number(Some("NC-00000099")),
            "NC-00000100"
        );
    }

    #[test]
    fn test_grows_past_the_padding() {
        assert_eq!(
            next_credit_note_number(Some("NC-99999999")),
            "NC-100000000"
        );
    }

    #[test]
    fn test_malformed_input_restarts_the_sequence() {
        assert_eq!(next_credit_note_number(Some("NC-")), "NC-00000001");
        assert_eq!(next_credit_note_number(Some("FAC-000123")), "NC-00000001");
        assert_eq!(next_credit_note_number(Some("")), "NC-00000001");
    }
}
