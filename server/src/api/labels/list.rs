use crate::api::labels::LabelResponse;
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::LabelKind;
use crate::store::Store;
use axum::{extract::State, Extension, Json};

#[utoipa::path(
    get,
    path = "/api/tags",
    tag = "tags",
    operation_id = "list_tags",
    responses(
        (status = 200, description = "The caller's labels, text descending", body = Vec<LabelResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_labels(
    AuthUser { user, .. }: AuthUser,
    Extension(kind): Extension<LabelKind>,
    State(store): State<Store>,
) -> Result<Json<Vec<LabelResponse>>, AppError> {
    let owner = user.id;
    let labels = store
        .transaction(move |repo| Ok(repo.list_labels(kind, owner)?))
        .await?;

    Ok(Json(
        labels
            .into_iter()
            .map(|label| LabelResponse::new(kind, label))
            .collect(),
    ))
}
