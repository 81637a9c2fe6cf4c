use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter,
};
use serde::Serialize;

use crate::auth::middleware::AdminUser;
use crate::entities::{category, course};
use crate::error::{AppError, stale_update};
use crate::routes::courses;
use crate::routes::forms::MultipartForm;
use crate::state::AppState;
use crate::storage::IMAGE_UPLOAD;

/// Category management router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
        .route("/{id}/courses", get(courses::list_by_category))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CategoryResponse {
    id: i32,
    name: String,
    cover_image_url: String,
}

fn to_response(c: category::Model) -> CategoryResponse {
    CategoryResponse {
        id: c.id,
        name: c.name,
        cover_image_url: c.cover_image_url,
    }
}

pub(crate) async fn find_category(
    db: &DatabaseConnection,
    id: i32,
) -> Result<category::Model, AppError> {
    category::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
}

/// `GET /categories` — List all categories. No auth.
async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let categories = category::Entity::find().all(&state.db).await?;
    Ok(Json(
        categories.into_iter().map(to_response).collect::<Vec<_>>(),
    ))
}

/// `GET /categories/:id` — Category detail. No auth.
async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let cat = find_category(&state.db, id).await?;
    Ok(Json(to_response(cat)))
}

/// `POST /categories` — Create a category with a required cover image. Admin only.
async fn create_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = MultipartForm::read(multipart).await?;
    let name = form.require_text("name")?.to_string();

    let image = IMAGE_UPLOAD.require(form.take_file("imageFile"))?;
    let cover_image_url = state.media.store(image, &IMAGE_UPLOAD).await?;

    let cat = category::ActiveModel {
        name: Set(name),
        cover_image_url: Set(cover_image_url),
        ..Default::default()
    };
    let cat = cat.insert(&state.db).await?;

    Ok((StatusCode::CREATED, Json(to_response(cat))))
}

/// `PUT /categories/:id` — Update a category. Admin only.
///
/// With no new image the existing cover URL and stored file are left alone;
/// a new image is validated first, then the old file is deleted and replaced.
async fn update_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_category(&state.db, id).await?;

    let mut form = MultipartForm::read(multipart).await?;

    let mut active: category::ActiveModel = existing.clone().into();
    if let Some(name) = form.text("name") {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name",
                message: "name is required.".to_string(),
            });
        }
        active.name = Set(name.to_string());
    }

    if let Some(image) = form.take_file("imageFile") {
        IMAGE_UPLOAD.check(&image)?;

        if !existing.cover_image_url.is_empty() {
            state.media.delete(&existing.cover_image_url).await?;
        }
        active.cover_image_url = Set(state.media.store(image, &IMAGE_UPLOAD).await?);
    }

    let cat = active
        .update(&state.db)
        .await
        .map_err(|e| stale_update(e, "Category"))?;

    Ok(Json(to_response(cat)))
}

/// `DELETE /categories/:id` — Delete a category. Admin only.
///
/// A category that still has courses is protected by the RESTRICT foreign
/// key; the same condition is reported here as a 409 before hitting it.
async fn delete_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let cat = find_category(&state.db, id).await?;

    let dependent = course::Entity::find()
        .filter(course::Column::CategoryId.eq(id))
        .count(&state.db)
        .await?;
    if dependent > 0 {
        return Err(AppError::Conflict(
            "Category still has courses and cannot be deleted.".to_string(),
        ));
    }

    cat.delete(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}
