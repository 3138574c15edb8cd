//! Recipient list helpers.
//!
//! Recipients travel as raw strings. Blank entries are kept on purpose:
//! the dispatcher reports them as `skipped` so the outcome list lines up
//! one-to-one with what the operator pasted.

use crate::error::CoreError;

/// Split pasted recipient text on newlines and commas.
///
/// Order is preserved and entries are not trimmed. Trailing separators
/// (e.g. `",\n"` or blank lines at the end of a file) do not produce
/// extra entries.
pub fn split_recipients(raw: &str) -> Vec<String> {
    let body = raw.trim_end_matches(['\n', '\r', ',']);

    if body.is_empty() {
        return Vec::new();
    }

    body.split(['\n', ','])
        .map(|entry| entry.strip_suffix('\r').unwrap_or(entry).to_string())
        .collect()
}

/// Check that a recipient list is non-empty and within `max`.
pub fn validate_recipients(recipients: &[String], max: usize) -> Result<(), CoreError> {
    if recipients.is_empty() {
        return Err(CoreError::Validation(
            "recipient list must not be empty".to_string(),
        ));
    }
    if recipients.len() > max {
        return Err(CoreError::Validation(format!(
            "recipient list has {} entries, maximum is {max}",
            recipients.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::limits::MAX_RECIPIENTS;

    #[test]
    fn splits_lines_and_commas_in_order() {
        let list = split_recipients("595981000001\n595981000002,595981000003");
        assert_eq!(list, vec!["595981000001", "595981000002", "595981000003"]);
    }

    #[test]
    fn keeps_blank_entries() {
        let list = split_recipients("a\n\n  \nb\n");
        assert_eq!(list, vec!["a", "", "  ", "b"]);
    }

    #[test]
    fn ignores_trailing_separators() {
        assert_eq!(split_recipients("a,\n"), vec!["a"]);
        assert_eq!(split_recipients("a\n\n\n"), vec!["a"]);
        assert_eq!(split_recipients("a,b,\r\n"), vec!["a", "b"]);
    }

    #[test]
    fn handles_crlf() {
        let list = split_recipients("a\r\nb\r\n");
        assert_eq!(list, vec!["a", "b"]);
    }

    #[test]
    fn empty_input_yields_no_entries() {
        assert!(split_recipients("").is_empty());
        assert!(split_recipients("\n").is_empty());
        assert!(split_recipients(",\n,").is_empty());
    }

    #[test]
    fn rejects_empty_list() {
        assert_matches!(
            validate_recipients(&[], MAX_RECIPIENTS),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn rejects_oversized_list() {
        let list = vec!["1".to_string(); MAX_RECIPIENTS + 1];
        assert_matches!(
            validate_recipients(&list, MAX_RECIPIENTS),
            Err(CoreError::Validation(msg)) if msg.contains("501")
        );
    }

    #[test]
    fn accepts_list_at_cap() {
        let list = vec!["1".to_string(); MAX_RECIPIENTS];
        assert!(validate_recipients(&list, MAX_RECIPIENTS).is_ok());
    }
}
