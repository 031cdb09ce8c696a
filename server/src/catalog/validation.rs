use rust_decimal::Decimal;

use crate::error::{AppError, FieldErrors};
use crate::models::{LabelKind, RecipeFields, RecipeRow};

pub const TITLE_MAX_LEN: usize = 220;
pub const LINK_MAX_LEN: usize = 255;
pub const LABEL_MAX_LEN: usize = 255;

const PRICE_MAX_DIGITS: u32 = 5;
const PRICE_DECIMAL_PLACES: u32 = 2;

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";

/// Recipe input as submitted. `None` means the field was left out of the request.
///
/// For the nullable columns, `Some(None)` is an explicit `null`. Other fields
/// sent as `null` are listed in `nulls` and rejected.
#[derive(Debug, Clone, Default)]
pub struct RecipeInput {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub time_minutes: Option<i64>,
    pub price: Option<Decimal>,
    pub link: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub ingredients: Option<Vec<String>>,
    pub nulls: Vec<&'static str>,
}

/// Everything needed to create a recipe, checked.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub fields: RecipeFields,
    pub tags: Vec<String>,
    pub ingredients: Vec<String>,
}

/// A checked partial update. Omitted fields stay `None` and are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub ingredients: Option<Vec<String>>,
}

impl RecipePatch {
    pub fn apply(&self, row: &mut RecipeRow) {
        if let Some(title) = &self.title {
            row.title = title.clone();
        }
        if let Some(description) = &self.description {
            row.description = description.clone();
        }
        if let Some(time_minutes) = self.time_minutes {
            row.time_minutes = time_minutes;
        }
        if let Some(price) = self.price {
            row.price = price;
        }
        if let Some(link) = &self.link {
            row.link = link.clone();
        }
    }
}

pub fn validate_title(title: &str) -> Result<String, String> {
    let title = title.trim();
    if title.is_empty() {
        return Err("This field may not be blank.".to_string());
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(format!(
            "Ensure this field has no more than {} characters.",
            TITLE_MAX_LEN
        ));
    }
    Ok(title.to_string())
}

pub fn validate_time_minutes(minutes: i64) -> Result<i32, String> {
    if minutes < 0 {
        return Err("Ensure this value is greater than or equal to 0.".to_string());
    }
    i32::try_from(minutes)
        .map_err(|_| format!("Ensure this value is less than or equal to {}.", i32::MAX))
}

/// Prices are stored with exactly two decimal places and at most five digits.
pub fn validate_price(price: Decimal) -> Result<Decimal, String> {
    let mut price = price.normalize();
    if price.scale() > PRICE_DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {} decimal places.",
            PRICE_DECIMAL_PLACES
        ));
    }
    price.rescale(PRICE_DECIMAL_PLACES);
    if price.mantissa().unsigned_abs() >= 10u128.pow(PRICE_MAX_DIGITS) {
        return Err(format!(
            "Ensure that there are no more than {} digits in total.",
            PRICE_MAX_DIGITS
        ));
    }
    Ok(price)
}

/// Blank links are stored as absent.
pub fn validate_link(link: Option<String>) -> Result<Option<String>, String> {
    let Some(link) = link else {
        return Ok(None);
    };
    let link = link.trim();
    if link.is_empty() {
        return Ok(None);
    }
    if link.chars().count() > LINK_MAX_LEN {
        return Err(format!(
            "Ensure this field has no more than {} characters.",
            LINK_MAX_LEN
        ));
    }
    if link.chars().any(char::is_whitespace) {
        return Err("Enter a valid link.".to_string());
    }
    Ok(Some(link.to_string()))
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|d| !d.trim().is_empty())
}

/// Text of a label submitted directly (renaming a tag or ingredient).
pub fn validate_label_text(text: &str) -> Result<String, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("This field may not be blank.".to_string());
    }
    if text.chars().count() > LABEL_MAX_LEN {
        return Err(format!(
            "Ensure this field has no more than {} characters.",
            LABEL_MAX_LEN
        ));
    }
    Ok(text.to_string())
}

/// Labels nested in a recipe write. Blank labels are accepted as-is; only
/// the column width is enforced.
fn check_nested_labels(errors: &mut FieldErrors, kind: LabelKind, labels: &[String]) {
    let field = match kind {
        LabelKind::Tag => "tags",
        LabelKind::Ingredient => "ingredients",
    };
    for label in labels {
        if label.chars().count() > LABEL_MAX_LEN {
            errors.add(
                field,
                format!(
                    "Ensure {} has no more than {} characters: {:?}",
                    kind.text_field(),
                    LABEL_MAX_LEN,
                    label
                ),
            );
        }
    }
}

fn check<T>(errors: &mut FieldErrors, field: &str, result: Result<T, String>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(message) => {
            errors.add(field, message);
            None
        }
    }
}

/// A field already rejected as `null` is not also reported as missing.
fn require<T>(errors: &mut FieldErrors, field: &str, value: Option<T>) -> Option<T> {
    if value.is_none() && !errors.contains(field) {
        errors.add(field, REQUIRED);
    }
    value
}

impl RecipeInput {
    fn null_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for field in &self.nulls {
            errors.add(field, NOT_NULL);
        }
        errors
    }

    /// Check a create request: `title`, `time_minutes` and `price` are required.
    pub fn validate_new(self) -> Result<RecipeDraft, AppError> {
        let mut errors = self.null_errors();

        let title = require(&mut errors, "title", self.title)
            .and_then(|t| check(&mut errors, "title", validate_title(&t)));
        let time_minutes = require(&mut errors, "time_minutes", self.time_minutes)
            .and_then(|m| check(&mut errors, "time_minutes", validate_time_minutes(m)));
        let price = require(&mut errors, "price", self.price)
            .and_then(|p| check(&mut errors, "price", validate_price(p)));
        let link = check(&mut errors, "link", validate_link(self.link.flatten()));

        let tags = self.tags.unwrap_or_default();
        let ingredients = self.ingredients.unwrap_or_default();
        check_nested_labels(&mut errors, LabelKind::Tag, &tags);
        check_nested_labels(&mut errors, LabelKind::Ingredient, &ingredients);

        match (title, time_minutes, price, link) {
            (Some(title), Some(time_minutes), Some(price), Some(link)) if errors.is_empty() => {
                Ok(RecipeDraft {
                    fields: RecipeFields {
                        title,
                        description: normalize_description(self.description.flatten()),
                        time_minutes,
                        price,
                        link,
                    },
                    tags,
                    ingredients,
                })
            }
            _ => Err(AppError::Validation(errors)),
        }
    }

    /// Check an update. With `full` (PUT) the create-time required fields must
    /// be present; otherwise (PATCH) every field is optional.
    pub fn validate_update(self, full: bool) -> Result<RecipePatch, AppError> {
        let mut errors = self.null_errors();

        if full {
            require(&mut errors, "title", self.title.as_ref());
            require(&mut errors, "time_minutes", self.time_minutes);
            require(&mut errors, "price", self.price);
        }

        let title = self
            .title
            .and_then(|t| check(&mut errors, "title", validate_title(&t)));
        let time_minutes = self
            .time_minutes
            .and_then(|m| check(&mut errors, "time_minutes", validate_time_minutes(m)));
        let price = self
            .price
            .and_then(|p| check(&mut errors, "price", validate_price(p)));
        let link = self
            .link
            .and_then(|l| check(&mut errors, "link", validate_link(l)));

        if let Some(tags) = &self.tags {
            check_nested_labels(&mut errors, LabelKind::Tag, tags);
        }
        if let Some(ingredients) = &self.ingredients {
            check_nested_labels(&mut errors, LabelKind::Ingredient, ingredients);
        }

        errors.into_result()?;

        Ok(RecipePatch {
            title,
            description: self.description.map(normalize_description),
            time_minutes,
            price,
            link,
            tags: self.tags,
            ingredients: self.ingredients,
        })
    }
}
