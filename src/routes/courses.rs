use std::collections::HashMap;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::auth::policy;
use crate::entities::{category, course, enrollment, user};
use crate::error::{AppError, stale_update};
use crate::routes::forms::MultipartForm;
use crate::routes::{categories, lessons};
use crate::state::AppState;
use crate::storage::IMAGE_UPLOAD;

/// Course management router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route(
            "/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/{id}/enroll", axum::routing::post(enroll))
        .route("/{id}/lessons", get(lessons::list_by_course))
}

// ─────────────────────────────────────────────────────────────────────────────
// Response Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CourseResponse {
    id: i32,
    title: String,
    description: String,
    cover_image_url: String,
    price: i32,
    total_rating: f64,
    total_votes: i32,
    number_of_learners: i32,
    is_approved: bool,
    category_id: i32,
    owner_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    category_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructor_name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnrollmentResponse {
    id: i32,
    enrolled_at: String,
    rating: Option<i32>,
    user_id: Uuid,
    course_id: i32,
}

fn to_response(
    c: course::Model,
    category_name: Option<String>,
    instructor_name: Option<String>,
) -> CourseResponse {
    CourseResponse {
        id: c.id,
        title: c.title,
        description: c.description,
        cover_image_url: c.cover_image_url,
        price: c.price,
        total_rating: c.total_rating,
        total_votes: c.total_votes,
        number_of_learners: c.number_of_learners,
        is_approved: c.is_approved,
        category_id: c.category_id,
        owner_id: c.owner_id,
        category_name,
        instructor_name,
    }
}

pub(crate) async fn find_course(
    db: &DatabaseConnection,
    id: i32,
) -> Result<course::Model, AppError> {
    course::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))
}

/// Resolve instructor full names for a batch of courses in one query.
async fn instructor_names(
    db: &DatabaseConnection,
    courses: &[course::Model],
) -> Result<HashMap<Uuid, String>, AppError> {
    let owner_ids: Vec<Uuid> = courses.iter().map(|c| c.owner_id).collect();
    let owners = user::Entity::find()
        .filter(user::Column::Id.is_in(owner_ids))
        .all(db)
        .await?;
    Ok(owners.into_iter().map(|u| (u.id, u.full_name)).collect())
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /courses` — List all courses with category and instructor names. No auth.
async fn list_courses(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let rows = course::Entity::find()
        .find_also_related(category::Entity)
        .all(&state.db)
        .await?;

    let courses: Vec<course::Model> = rows.iter().map(|(c, _)| c.clone()).collect();
    let names = instructor_names(&state.db, &courses).await?;

    let data: Vec<CourseResponse> = rows
        .into_iter()
        .map(|(c, cat)| {
            let instructor = names.get(&c.owner_id).cloned();
            to_response(c, cat.map(|x| x.name), instructor)
        })
        .collect();

    Ok(Json(data))
}

/// `GET /courses/:id` — Course detail. No auth, 404 if absent.
async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let course = find_course(&state.db, id).await?;

    let cat = category::Entity::find_by_id(course.category_id)
        .one(&state.db)
        .await?;
    let owner = user::Entity::find_by_id(course.owner_id)
        .one(&state.db)
        .await?;

    Ok(Json(to_response(
        course,
        cat.map(|c| c.name),
        owner.map(|u| u.full_name),
    )))
}

/// `GET /categories/:id/courses` — Courses filtered by category. No auth.
pub async fn list_by_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let cat = categories::find_category(&state.db, id).await?;

    let courses = course::Entity::find()
        .filter(course::Column::CategoryId.eq(id))
        .all(&state.db)
        .await?;

    let names = instructor_names(&state.db, &courses).await?;

    let data: Vec<CourseResponse> = courses
        .into_iter()
        .map(|c| {
            let instructor = names.get(&c.owner_id).cloned();
            to_response(c, Some(cat.name.clone()), instructor)
        })
        .collect();

    Ok(Json(data))
}

/// `POST /courses` — Create a course. Any authenticated user; the caller is
/// recorded as owner, counters start at zero, and approval starts false.
async fn create_course(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = MultipartForm::read(multipart).await?;

    let title = form.require_text("title")?.to_string();
    let description = form.require_text("description")?.to_string();
    let price = form.require_i32("price")?;
    let category_id = form.require_i32("categoryId")?;

    let category_exists = category::Entity::find_by_id(category_id)
        .one(&state.db)
        .await?
        .is_some();
    if !category_exists {
        return Err(AppError::Validation {
            field: "categoryId",
            message: "Invalid category selection.".to_string(),
        });
    }

    let image = IMAGE_UPLOAD.require(form.take_file("imageFile"))?;
    let cover_image_url = state.media.store(image, &IMAGE_UPLOAD).await?;

    let now = Utc::now().fixed_offset();
    let new_course = course::ActiveModel {
        title: Set(title),
        description: Set(description),
        cover_image_url: Set(cover_image_url),
        price: Set(price),
        total_rating: Set(0.0),
        total_votes: Set(0),
        number_of_learners: Set(0),
        is_approved: Set(false),
        category_id: Set(category_id),
        owner_id: Set(actor.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = new_course.insert(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        Json(to_response(created, None, Some(actor.full_name))),
    ))
}

/// `PUT /courses/:id` — Update a course. Owner only.
///
/// The approval flag and the rating/learner counters are not writable here.
async fn update_course(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_course(&state.db, id).await?;
    policy::require_course_owner(&actor, &existing)?;

    let mut form = MultipartForm::read(multipart).await?;

    let mut active: course::ActiveModel = existing.clone().into();

    if let Some(title) = form.text("title") {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::Validation {
                field: "title",
                message: "title is required.".to_string(),
            });
        }
        active.title = Set(title.to_string());
    }
    if let Some(description) = form.text("description") {
        active.description = Set(description.to_string());
    }
    if let Some(price) = form.optional_i32("price")? {
        active.price = Set(price);
    }
    if let Some(category_id) = form.optional_i32("categoryId")? {
        let exists = category::Entity::find_by_id(category_id)
            .one(&state.db)
            .await?
            .is_some();
        if !exists {
            return Err(AppError::Validation {
                field: "categoryId",
                message: "Invalid category selection.".to_string(),
            });
        }
        active.category_id = Set(category_id);
    }

    if let Some(image) = form.take_file("imageFile") {
        IMAGE_UPLOAD.check(&image)?;

        if !existing.cover_image_url.is_empty() {
            state.media.delete(&existing.cover_image_url).await?;
        }
        active.cover_image_url = Set(state.media.store(image, &IMAGE_UPLOAD).await?);
    }

    active.updated_at = Set(Utc::now().fixed_offset());

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| stale_update(e, "Course"))?;

    Ok(Json(to_response(updated, None, None)))
}

/// `DELETE /courses/:id` — Delete a course. Owner or admin.
///
/// Enrollments and lessons go with it via the CASCADE rules. Stored cover and
/// lesson video files stay on disk.
async fn delete_course(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_course(&state.db, id).await?;
    policy::require_course_owner_or_admin(&actor, &existing)?;

    existing.delete(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// `POST /courses/:id/enroll` — Enroll the caller in a course.
async fn enroll(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let course = find_course(&state.db, id).await?;

    let already = enrollment::Entity::find()
        .filter(enrollment::Column::UserId.eq(actor.id))
        .filter(enrollment::Column::CourseId.eq(course.id))
        .one(&state.db)
        .await?;
    if already.is_some() {
        return Err(AppError::Conflict("Already enrolled".to_string()));
    }

    let record = enrollment::ActiveModel {
        enrolled_at: Set(Utc::now().fixed_offset()),
        rating: Set(None),
        user_id: Set(actor.id),
        course_id: Set(course.id),
        ..Default::default()
    };
    let record = record.insert(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        Json(EnrollmentResponse {
            id: record.id,
            enrolled_at: record.enrolled_at.to_rfc3339(),
            rating: record.rating,
            user_id: record.user_id,
            course_id: record.course_id,
        }),
    ))
}
