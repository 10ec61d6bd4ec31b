//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Parse an optional UUID column.
pub(crate) fn parse_opt_uuid(value: Option<&str>, label: &str) -> ResultEngine<Option<Uuid>> {
    value.map(|v| parse_uuid(v, label)).transpose()
}

/// Uniqueness key for payee names: NFKC, whitespace collapsed, lowercase.
pub(crate) fn normalize_payee_key(name: &str) -> String {
    let folded: String = name.nfkc().collect();
    folded
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payee_key_folds_case_width_and_spaces() {
        assert_eq!(normalize_payee_key("  Corner   Store "), "corner store");
        assert_eq!(normalize_payee_key("ＡＣＭＥ"), "acme");
        assert_eq!(
            normalize_payee_key("Cafe\u{301}"),
            normalize_payee_key("Caf\u{e9}")
        );
    }

    #[test]
    fn parse_uuid_labels_errors() {
        let err = parse_uuid("nope", "account").unwrap_err();
        assert_eq!(err, EngineError::InvalidId("invalid account id".to_string()));
    }
}
