use std::collections::HashMap;

use chrono::Utc;

use super::resolver::resolve_labels;
use super::validation::{RecipeDraft, RecipePatch};
use crate::config::LabelMatch;
use crate::error::AppError;
use crate::models::{Label, LabelKind, RecipeRow};
use crate::store::Repository;

/// A recipe together with its tags and ingredients.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub row: RecipeRow,
    pub tags: Vec<Label>,
    pub ingredients: Vec<Label>,
}

/// Resolve `texts` for the owner and attach every result to the recipe.
fn attach_labels(
    repo: &mut dyn Repository,
    kind: LabelKind,
    owner: i64,
    recipe_id: i64,
    texts: &[String],
    mode: LabelMatch,
) -> Result<(), AppError> {
    for label in resolve_labels(repo, kind, owner, texts, mode)? {
        repo.attach_label(kind, recipe_id, label.id)?;
    }
    Ok(())
}

/// Drop every association of `kind`, then attach `texts` afresh.
fn replace_labels(
    repo: &mut dyn Repository,
    kind: LabelKind,
    owner: i64,
    recipe_id: i64,
    texts: &[String],
    mode: LabelMatch,
) -> Result<(), AppError> {
    repo.clear_recipe_labels(kind, recipe_id)?;
    attach_labels(repo, kind, owner, recipe_id, texts, mode)
}

fn group_labels(pairs: Vec<(i64, Label)>) -> HashMap<i64, Vec<Label>> {
    let mut grouped: HashMap<i64, Vec<Label>> = HashMap::new();
    for (recipe_id, label) in pairs {
        grouped.entry(recipe_id).or_default().push(label);
    }
    grouped
}

fn with_labels(repo: &mut dyn Repository, rows: Vec<RecipeRow>) -> Result<Vec<Recipe>, AppError> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut tags = group_labels(repo.recipe_labels(LabelKind::Tag, &ids)?);
    let mut ingredients = group_labels(repo.recipe_labels(LabelKind::Ingredient, &ids)?);

    Ok(rows
        .into_iter()
        .map(|row| Recipe {
            tags: tags.remove(&row.id).unwrap_or_default(),
            ingredients: ingredients.remove(&row.id).unwrap_or_default(),
            row,
        })
        .collect())
}

fn find_owned(repo: &mut dyn Repository, owner: i64, id: i64) -> Result<RecipeRow, AppError> {
    repo.find_recipe(owner, id)?
        .ok_or(AppError::NotFound("Recipe"))
}

pub fn load_recipe(repo: &mut dyn Repository, owner: i64, id: i64) -> Result<Recipe, AppError> {
    let row = find_owned(repo, owner, id)?;
    with_labels(repo, vec![row])?
        .pop()
        .ok_or(AppError::NotFound("Recipe"))
}

/// The owner's recipes, newest first.
pub fn list_recipes(repo: &mut dyn Repository, owner: i64) -> Result<Vec<Recipe>, AppError> {
    let rows = repo.list_recipes(owner)?;
    with_labels(repo, rows)
}

/// Persist a new recipe and its tags and ingredients, creating any label the
/// owner does not have yet.
pub fn create_recipe(
    repo: &mut dyn Repository,
    owner: i64,
    draft: &RecipeDraft,
    mode: LabelMatch,
) -> Result<Recipe, AppError> {
    let row = repo.insert_recipe(owner, &draft.fields)?;
    attach_labels(repo, LabelKind::Tag, owner, row.id, &draft.tags, mode)?;
    attach_labels(repo, LabelKind::Ingredient, owner, row.id, &draft.ingredients, mode)?;

    load_recipe(repo, owner, row.id)
}

/// Apply a partial update.
///
/// A label list that is present (even empty) replaces the recipe's whole set
/// for that kind; an absent list leaves the set as it is. Detached labels stay
/// in storage.
pub fn update_recipe(
    repo: &mut dyn Repository,
    owner: i64,
    id: i64,
    patch: &RecipePatch,
    mode: LabelMatch,
) -> Result<Recipe, AppError> {
    let mut row = find_owned(repo, owner, id)?;
    patch.apply(&mut row);
    row.updated_at = Utc::now();
    let row = repo.save_recipe(&row)?;

    if let Some(tags) = &patch.tags {
        replace_labels(repo, LabelKind::Tag, owner, row.id, tags, mode)?;
    }
    if let Some(ingredients) = &patch.ingredients {
        replace_labels(repo, LabelKind::Ingredient, owner, row.id, ingredients, mode)?;
    }

    load_recipe(repo, owner, row.id)
}

/// Store `data` as the recipe's image. Any previous image is left orphaned.
pub fn attach_image(
    repo: &mut dyn Repository,
    owner: i64,
    id: i64,
    content_type: &str,
    data: &[u8],
) -> Result<Recipe, AppError> {
    let mut row = find_owned(repo, owner, id)?;
    row.image_id = Some(repo.insert_image(owner, content_type, data)?);
    row.updated_at = Utc::now();
    repo.save_recipe(&row)?;

    load_recipe(repo, owner, id)
}

pub fn delete_recipe(repo: &mut dyn Repository, owner: i64, id: i64) -> Result<(), AppError> {
    if repo.delete_recipe(owner, id)? {
        Ok(())
    } else {
        Err(AppError::NotFound("Recipe"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::validation::RecipeInput;
    use crate::models::RecipeFields;
    use crate::store::MemoryRepository;
    use rust_decimal::Decimal;

    const OWNER: i64 = 1;
    const OTHER: i64 = 2;

    fn draft(title: &str, tags: &[&str], ingredients: &[&str]) -> RecipeDraft {
        RecipeDraft {
            fields: RecipeFields {
                title: title.to_string(),
                description: Some("Sample recipe description".to_string()),
                time_minutes: 30,
                price: Decimal::new(825, 2),
                link: None,
            },
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ingredients: ingredients.iter().map(|i| i.to_string()).collect(),
        }
    }

    fn titles(labels: &[Label]) -> Vec<&str> {
        labels.iter().map(|l| l.label.as_str()).collect()
    }

    #[test]
    fn test_create_with_new_tags() {
        let mut repo = MemoryRepository::default();

        let recipe = create_recipe(
            &mut repo,
            OWNER,
            &draft("Thai prawn curry", &["Thai", "Dinner"], &[]),
            LabelMatch::Exact,
        )
        .unwrap();

        assert_eq!(titles(&recipe.tags), vec!["Thai", "Dinner"]);
        assert_eq!(repo.list_labels(LabelKind::Tag, OWNER).unwrap().len(), 2);
        assert_eq!(recipe.row.user_id, OWNER);
    }

    #[test]
    fn test_create_reuses_existing_tag() {
        let mut repo = MemoryRepository::default();
        let indian = repo.insert_label(LabelKind::Tag, OWNER, "Indian").unwrap();

        let recipe = create_recipe(
            &mut repo,
            OWNER,
            &draft("Pongal", &["Indian", "Breakfast"], &[]),
            LabelMatch::Exact,
        )
        .unwrap();

        assert_eq!(recipe.tags.len(), 2);
        assert!(recipe.tags.contains(&indian));
        assert_eq!(repo.list_labels(LabelKind::Tag, OWNER).unwrap().len(), 2);
    }

    #[test]
    fn test_create_with_ingredients() {
        let mut repo = MemoryRepository::default();
        repo.insert_label(LabelKind::Ingredient, OWNER, "Salt").unwrap();

        let recipe = create_recipe(
            &mut repo,
            OWNER,
            &draft("Cauliflower Tacos", &[], &["Cauliflower", "salt"]),
            LabelMatch::Exact,
        )
        .unwrap();

        assert_eq!(titles(&recipe.ingredients), vec!["Salt", "Cauliflower"]);
        assert!(recipe.tags.is_empty());
        assert_eq!(
            repo.list_labels(LabelKind::Ingredient, OWNER).unwrap().len(),
            2
        );
    }

    #[test]
    fn test_duplicate_entries_attach_once() {
        let mut repo = MemoryRepository::default();

        let recipe = create_recipe(
            &mut repo,
            OWNER,
            &draft("Soup", &["Warm", "warm", "WARM"], &[]),
            LabelMatch::Exact,
        )
        .unwrap();

        assert_eq!(titles(&recipe.tags), vec!["Warm"]);
    }

    #[test]
    fn test_update_replaces_tags_and_keeps_detached_rows() {
        let mut repo = MemoryRepository::default();
        let created = create_recipe(
            &mut repo,
            OWNER,
            &draft("Eggs", &["Breakfast"], &[]),
            LabelMatch::Exact,
        )
        .unwrap();
        let breakfast = created.tags[0].clone();

        let patch = RecipePatch {
            tags: Some(vec!["Lunch".to_string()]),
            ..Default::default()
        };
        let updated =
            update_recipe(&mut repo, OWNER, created.row.id, &patch, LabelMatch::Exact).unwrap();

        assert_eq!(titles(&updated.tags), vec!["Lunch"]);
        assert_eq!(
            repo.find_label(LabelKind::Tag, OWNER, breakfast.id).unwrap(),
            Some(breakfast)
        );
    }

    #[test]
    fn test_update_without_tags_leaves_them_alone() {
        let mut repo = MemoryRepository::default();
        let created = create_recipe(
            &mut repo,
            OWNER,
            &draft("Eggs", &["Breakfast"], &["Egg"]),
            LabelMatch::Exact,
        )
        .unwrap();

        let patch = RecipePatch {
            title: Some("Scrambled eggs".to_string()),
            ..Default::default()
        };
        let updated =
            update_recipe(&mut repo, OWNER, created.row.id, &patch, LabelMatch::Exact).unwrap();

        assert_eq!(updated.row.title, "Scrambled eggs");
        assert_eq!(updated.tags, created.tags);
        assert_eq!(updated.ingredients, created.ingredients);
        assert_eq!(updated.row.price, created.row.price);
        assert_eq!(updated.row.description, created.row.description);
    }

    #[test]
    fn test_update_with_empty_list_clears_only_that_kind() {
        let mut repo = MemoryRepository::default();
        let created = create_recipe(
            &mut repo,
            OWNER,
            &draft("Eggs", &["Breakfast"], &["Egg"]),
            LabelMatch::Exact,
        )
        .unwrap();

        let patch = RecipePatch {
            ingredients: Some(vec![]),
            ..Default::default()
        };
        let updated =
            update_recipe(&mut repo, OWNER, created.row.id, &patch, LabelMatch::Exact).unwrap();

        assert!(updated.ingredients.is_empty());
        assert_eq!(updated.tags, created.tags);
        assert_eq!(
            repo.list_labels(LabelKind::Ingredient, OWNER).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_update_clears_nullable_fields_on_explicit_null() {
        let mut repo = MemoryRepository::default();
        let created = create_recipe(&mut repo, OWNER, &draft("Eggs", &[], &[]), LabelMatch::Exact)
            .unwrap();

        let patch = RecipeInput {
            description: Some(None),
            ..Default::default()
        }
        .validate_update(false)
        .unwrap();
        let updated =
            update_recipe(&mut repo, OWNER, created.row.id, &patch, LabelMatch::Exact).unwrap();

        assert_eq!(updated.row.description, None);
    }

    #[test]
    fn test_other_owner_cannot_update_or_load() {
        let mut repo = MemoryRepository::default();
        let created = create_recipe(&mut repo, OWNER, &draft("Eggs", &[], &[]), LabelMatch::Exact)
            .unwrap();

        let patch = RecipePatch {
            tags: Some(vec!["Stolen".to_string()]),
            ..Default::default()
        };
        assert!(matches!(
            update_recipe(&mut repo, OTHER, created.row.id, &patch, LabelMatch::Exact),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            load_recipe(&mut repo, OTHER, created.row.id),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            delete_recipe(&mut repo, OTHER, created.row.id),
            Err(AppError::NotFound(_))
        ));
        assert!(repo.list_labels(LabelKind::Tag, OTHER).unwrap().is_empty());
    }

    #[test]
    fn test_tags_resolve_within_owner_only() {
        let mut repo = MemoryRepository::default();
        let theirs = repo.insert_label(LabelKind::Tag, OTHER, "Vegan").unwrap();

        let mine = create_recipe(&mut repo, OWNER, &draft("Salad", &["Vegan"], &[]), LabelMatch::Exact)
            .unwrap();

        assert_ne!(mine.tags[0].id, theirs.id);
        assert_eq!(mine.tags[0].user_id, OWNER);
    }

    #[test]
    fn test_list_is_newest_first_with_labels() {
        let mut repo = MemoryRepository::default();
        let first = create_recipe(&mut repo, OWNER, &draft("First", &["A"], &[]), LabelMatch::Exact)
            .unwrap();
        let second =
            create_recipe(&mut repo, OWNER, &draft("Second", &["B"], &["Egg"]), LabelMatch::Exact)
                .unwrap();
        create_recipe(&mut repo, OTHER, &draft("Theirs", &[], &[]), LabelMatch::Exact).unwrap();

        let recipes = list_recipes(&mut repo, OWNER).unwrap();

        assert_eq!(recipes, vec![second, first]);
    }

    #[test]
    fn test_attach_image_replaces_reference() {
        let mut repo = MemoryRepository::default();
        let created = create_recipe(&mut repo, OWNER, &draft("Eggs", &[], &[]), LabelMatch::Exact)
            .unwrap();

        let first = attach_image(&mut repo, OWNER, created.row.id, "image/png", b"one").unwrap();
        let second = attach_image(&mut repo, OWNER, created.row.id, "image/png", b"two").unwrap();

        let old_id = first.row.image_id.unwrap();
        let new_id = second.row.image_id.unwrap();
        assert_ne!(old_id, new_id);
        // The previous blob is orphaned, not deleted.
        assert!(repo.find_image(OWNER, old_id).unwrap().is_some());
        assert_eq!(repo.find_image(OWNER, new_id).unwrap().unwrap().data, b"two");
    }

    #[test]
    fn test_attach_image_requires_ownership() {
        let mut repo = MemoryRepository::default();
        let created = create_recipe(&mut repo, OWNER, &draft("Eggs", &[], &[]), LabelMatch::Exact)
            .unwrap();

        assert!(matches!(
            attach_image(&mut repo, OTHER, created.row.id, "image/png", b"x"),
            Err(AppError::NotFound(_))
        ));
    }
}
