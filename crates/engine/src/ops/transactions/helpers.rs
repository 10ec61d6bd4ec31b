use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, SplitLine, Transaction};

use super::super::normalize_optional_text;

/// Whether a transfer may, must, or must not carry a category, by the
/// on-budget flags of the account money leaves and the account it enters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum TransferCategoryRule {
    Forbidden,
    Required,
    Optional,
}

pub(super) fn transfer_category_rule(from_on_budget: bool, to_on_budget: bool) -> TransferCategoryRule {
    match (from_on_budget, to_on_budget) {
        (true, true) | (false, false) => TransferCategoryRule::Forbidden,
        (true, false) => TransferCategoryRule::Required,
        (false, true) => TransferCategoryRule::Optional,
    }
}

pub(super) fn check_transfer_category(
    rule: TransferCategoryRule,
    category_id: Option<Uuid>,
) -> ResultEngine<()> {
    match (rule, category_id) {
        (TransferCategoryRule::Forbidden, Some(_)) => Err(EngineError::InvalidCategory(
            "this transfer cannot carry a category".to_string(),
        )),
        (TransferCategoryRule::Required, None) => Err(EngineError::InvalidCategory(
            "a transfer from a budget account to a tracking account requires a category"
                .to_string(),
        )),
        _ => Ok(()),
    }
}

/// A split needs at least two lines whose amounts add up to the header.
pub(super) fn validate_split_lines(total: MoneyCents, lines: &[SplitLine]) -> ResultEngine<()> {
    if lines.len() < 2 {
        return Err(EngineError::InvalidSplit(
            "a split needs at least two lines".to_string(),
        ));
    }
    let sum = MoneyCents::try_sum(lines.iter().map(|line| line.amount))?;
    if sum != total {
        return Err(EngineError::InvalidSplit(format!(
            "split lines sum to {sum}, transaction amount is {total}"
        )));
    }
    Ok(())
}

pub(super) fn ensure_unlocked(tx: &Transaction) -> ResultEngine<()> {
    if tx.is_reconciled() {
        return Err(EngineError::Locked(format!(
            "transaction {} is reconciled",
            tx.id
        )));
    }
    Ok(())
}

pub(super) fn apply_optional_text_patch(
    existing: Option<String>,
    patch: Option<&str>,
) -> Option<String> {
    match patch {
        None => existing,
        Some(value) => normalize_optional_text(Some(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_rules_by_direction() {
        assert_eq!(
            transfer_category_rule(true, true),
            TransferCategoryRule::Forbidden
        );
        assert_eq!(
            transfer_category_rule(true, false),
            TransferCategoryRule::Required
        );
        assert_eq!(
            transfer_category_rule(false, true),
            TransferCategoryRule::Optional
        );
        assert_eq!(
            transfer_category_rule(false, false),
            TransferCategoryRule::Forbidden
        );
    }

    #[test]
    fn check_transfer_category_enforces_rule() {
        let category = Some(Uuid::new_v4());
        assert!(check_transfer_category(TransferCategoryRule::Forbidden, category).is_err());
        assert!(check_transfer_category(TransferCategoryRule::Forbidden, None).is_ok());
        assert!(check_transfer_category(TransferCategoryRule::Required, None).is_err());
        assert!(check_transfer_category(TransferCategoryRule::Required, category).is_ok());
        assert!(check_transfer_category(TransferCategoryRule::Optional, None).is_ok());
    }

    #[test]
    fn split_lines_must_sum_to_total() {
        let lines = vec![
            SplitLine::new(None, MoneyCents::new(-30_00)),
            SplitLine::new(None, MoneyCents::new(-20_00)),
        ];
        assert!(validate_split_lines(MoneyCents::new(-50_00), &lines).is_ok());
        assert!(matches!(
            validate_split_lines(MoneyCents::new(-49_99), &lines),
            Err(EngineError::InvalidSplit(_))
        ));
        assert!(validate_split_lines(MoneyCents::new(-30_00), &lines[..1]).is_err());
    }

    #[test]
    fn text_patch_clears_on_blank() {
        assert_eq!(
            apply_optional_text_patch(Some("old".to_string()), None),
            Some("old".to_string())
        );
        assert_eq!(apply_optional_text_patch(Some("old".to_string()), Some(" ")), None);
        assert_eq!(
            apply_optional_text_patch(None, Some("new")),
            Some("new".to_string())
        );
    }
}
