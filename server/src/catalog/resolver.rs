use crate::config::LabelMatch;
use crate::models::{Label, LabelKind};
use crate::store::{Repository, StoreError};

/// Find the owner's tag or ingredient matching `text`, creating it if none matches.
///
/// An existing row is returned untouched (its stored casing wins). A new row
/// keeps the exact casing of `text`. Blank text is not an error.
///
/// The lookup and the insert are not atomic with respect to other
/// transactions: two concurrent writers can both miss and both insert.
pub fn resolve_label(
    repo: &mut dyn Repository,
    kind: LabelKind,
    owner: i64,
    text: &str,
    mode: LabelMatch,
) -> Result<Label, StoreError> {
    if let Some(existing) = repo.find_label_by_text(kind, owner, text, mode)? {
        return Ok(existing);
    }

    repo.insert_label(kind, owner, text)
}

/// Resolve every entry, in order. Entries that resolve to the same row
/// produce that row once per entry.
pub fn resolve_labels(
    repo: &mut dyn Repository,
    kind: LabelKind,
    owner: i64,
    texts: &[String],
    mode: LabelMatch,
) -> Result<Vec<Label>, StoreError> {
    let mut labels = Vec::with_capacity(texts.len());
    for text in texts {
        labels.push(resolve_label(repo, kind, owner, text, mode)?);
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRepository;

    #[test]
    fn test_same_label_twice_returns_same_row() {
        let mut repo = MemoryRepository::default();

        let first = resolve_label(&mut repo, LabelKind::Tag, 1, "Vegan", LabelMatch::Exact).unwrap();
        let second =
            resolve_label(&mut repo, LabelKind::Tag, 1, "Vegan", LabelMatch::Exact).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(repo.list_labels(LabelKind::Tag, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_other_owner_gets_distinct_row() {
        let mut repo = MemoryRepository::default();

        let mine = resolve_label(&mut repo, LabelKind::Tag, 1, "Vegan", LabelMatch::Exact).unwrap();
        let theirs =
            resolve_label(&mut repo, LabelKind::Tag, 2, "Vegan", LabelMatch::Exact).unwrap();

        assert_ne!(mine.id, theirs.id);
        assert_eq!(theirs.user_id, 2);
    }

    #[test]
    fn test_case_only_difference_reuses_existing_row() {
        let mut repo = MemoryRepository::default();
        let existing = repo.insert_label(LabelKind::Tag, 1, "Lunch").unwrap();

        let resolved =
            resolve_label(&mut repo, LabelKind::Tag, 1, "LUNCH", LabelMatch::Exact).unwrap();

        assert_eq!(resolved, existing);
        // Stored casing is not rewritten.
        assert_eq!(resolved.label, "Lunch");
    }

    #[test]
    fn test_new_row_keeps_supplied_casing() {
        let mut repo = MemoryRepository::default();

        let created = resolve_label(
            &mut repo,
            LabelKind::Ingredient,
            1,
            "Basmati Rice",
            LabelMatch::Exact,
        )
        .unwrap();

        assert_eq!(created.label, "Basmati Rice");
    }

    #[test]
    fn test_exact_mode_does_not_match_substrings() {
        let mut repo = MemoryRepository::default();
        let green_tea = repo.insert_label(LabelKind::Ingredient, 1, "Green Tea").unwrap();

        let tea =
            resolve_label(&mut repo, LabelKind::Ingredient, 1, "Tea", LabelMatch::Exact).unwrap();

        assert_ne!(tea.id, green_tea.id);
        assert_eq!(tea.label, "Tea");
    }

    #[test]
    fn test_contains_mode_matches_substrings() {
        let mut repo = MemoryRepository::default();
        let green_tea = repo.insert_label(LabelKind::Ingredient, 1, "Green Tea").unwrap();

        let tea = resolve_label(
            &mut repo,
            LabelKind::Ingredient,
            1,
            "tea",
            LabelMatch::Contains,
        )
        .unwrap();

        assert_eq!(tea, green_tea);
    }

    #[test]
    fn test_blank_label_creates_blank_row() {
        let mut repo = MemoryRepository::default();

        let blank = resolve_label(&mut repo, LabelKind::Tag, 1, "", LabelMatch::Exact).unwrap();
        let again = resolve_label(&mut repo, LabelKind::Tag, 1, "", LabelMatch::Exact).unwrap();

        assert_eq!(blank.label, "");
        assert_eq!(blank.id, again.id);
    }

    #[test]
    fn test_resolve_labels_dedupes_within_one_request() {
        let mut repo = MemoryRepository::default();

        let labels = resolve_labels(
            &mut repo,
            LabelKind::Tag,
            1,
            &["Thai".to_string(), "thai".to_string(), "Dinner".to_string()],
            LabelMatch::Exact,
        )
        .unwrap();

        assert_eq!(labels.len(), 3);
        assert_eq!(labels[0].id, labels[1].id);
        assert_eq!(repo.list_labels(LabelKind::Tag, 1).unwrap().len(), 2);
    }
}
