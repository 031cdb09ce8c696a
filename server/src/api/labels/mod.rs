//! Tags and ingredients share one set of handlers.
//!
//! [`router`] mounts them for a [`LabelKind`] with only the operations named
//! in a [`Capabilities`] set. The kind reaches each handler as an
//! `Extension<LabelKind>`.

pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use axum::routing::MethodRouter;
use axum::{Extension, Router};
use serde::{Deserialize, Serialize};
use utoipa::openapi::path::PathItem;
use utoipa::{OpenApi, ToSchema};

use crate::models::{Label, LabelKind};
use crate::AppState;

/// Which operations a label router exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub list: bool,
    pub retrieve: bool,
    pub update: bool,
    pub delete: bool,
    pub create: bool,
}

impl Capabilities {
    /// Everything except create: labels only come into existence through recipe writes.
    pub const READ_WRITE: Self = Self {
        list: true,
        retrieve: true,
        update: true,
        delete: true,
        create: false,
    };

    pub const ALL: Self = Self {
        create: true,
        ..Self::READ_WRITE
    };
}

pub fn router(kind: LabelKind, caps: Capabilities) -> Router<AppState> {
    let mut collection: MethodRouter<AppState> = MethodRouter::new();
    if caps.list {
        collection = collection.get(list::list_labels);
    }
    if caps.create {
        collection = collection.post(create::create_label);
    }

    let mut member: MethodRouter<AppState> = MethodRouter::new();
    if caps.retrieve {
        member = member.get(get::get_label);
    }
    if caps.update {
        member = member
            .put(update::update_label)
            .patch(update::partial_update_label);
    }
    if caps.delete {
        member = member.delete(delete::delete_label);
    }

    Router::new()
        .route("/", collection)
        .route("/{id}", member)
        .layer(Extension(kind))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TagResponse {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IngredientResponse {
    pub id: i64,
    pub name: String,
}

impl From<Label> for TagResponse {
    fn from(label: Label) -> Self {
        Self {
            id: label.id,
            title: label.label,
        }
    }
}

impl From<Label> for IngredientResponse {
    fn from(label: Label) -> Self {
        Self {
            id: label.id,
            name: label.label,
        }
    }
}

/// A tag (`{id, title}`) or an ingredient (`{id, name}`).
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum LabelResponse {
    Tag(TagResponse),
    Ingredient(IngredientResponse),
}

impl LabelResponse {
    pub fn new(kind: LabelKind, label: Label) -> Self {
        match kind {
            LabelKind::Tag => LabelResponse::Tag(label.into()),
            LabelKind::Ingredient => LabelResponse::Ingredient(label.into()),
        }
    }
}

/// Tags are written with `title`, ingredients with `name`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LabelRequest {
    pub title: Option<String>,
    pub name: Option<String>,
}

impl LabelRequest {
    pub fn text(self, kind: LabelKind) -> Option<String> {
        match kind {
            LabelKind::Tag => self.title,
            LabelKind::Ingredient => self.name,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_labels,
        get::get_label,
        update::update_label,
        update::partial_update_label,
        delete::delete_label,
    ),
    components(schemas(TagResponse, IngredientResponse, LabelResponse, LabelRequest))
)]
struct ApiDoc;

/// The handlers are documented against `/api/tags`. The ingredient routes are
/// the same operations, so their entries are copied from the tag ones. Create
/// is mounted for neither kind and is left out.
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut spec = ApiDoc::openapi();

    let ingredient_paths: Vec<(String, PathItem)> = spec
        .paths
        .paths
        .iter()
        .map(|(path, item)| {
            let mut item = item.clone();
            for operation in [
                &mut item.get,
                &mut item.put,
                &mut item.patch,
                &mut item.delete,
            ]
            .into_iter()
            .flatten()
            {
                operation.tags = Some(vec!["ingredients".to_string()]);
                operation.operation_id = operation
                    .operation_id
                    .as_ref()
                    .map(|id| id.replace("tag", "ingredient"));
            }
            (path.replacen("/api/tags", "/api/ingredients", 1), item)
        })
        .collect();

    spec.paths.paths.extend(ingredient_paths);
    spec
}
