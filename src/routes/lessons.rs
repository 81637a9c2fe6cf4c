use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder,
};
use serde::{Deserialize, Serialize};

use crate::auth::middleware::AuthUser;
use crate::auth::policy;
use crate::entities::{course, lesson};
use crate::error::{AppError, stale_update};
use crate::routes::courses;
use crate::routes::forms::MultipartForm;
use crate::state::AppState;
use crate::storage::VIDEO_UPLOAD;

/// Lesson management router. Every route requires authentication; lessons are
/// course material, not public catalog data.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_lessons).post(create_lesson))
        .route(
            "/{id}",
            get(get_lesson).put(update_lesson).delete(delete_lesson),
        )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListLessonsQuery {
    course_id: Option<i32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LessonResponse {
    id: i32,
    title: String,
    video_url: String,
    course_id: i32,
}

fn to_response(l: lesson::Model) -> LessonResponse {
    LessonResponse {
        id: l.id,
        title: l.title,
        video_url: l.video_url,
        course_id: l.course_id,
    }
}

async fn find_lesson(db: &DatabaseConnection, id: i32) -> Result<lesson::Model, AppError> {
    lesson::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Lesson not found".to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /lessons?courseId=N` — Lessons of one course, or with no filter the
/// lessons of every course the caller owns.
async fn list_lessons(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<ListLessonsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut select = lesson::Entity::find();

    match query.course_id {
        Some(course_id) => {
            select = select.filter(lesson::Column::CourseId.eq(course_id));
        }
        None => {
            let owned: Vec<i32> = course::Entity::find()
                .filter(course::Column::OwnerId.eq(actor.id))
                .all(&state.db)
                .await?
                .into_iter()
                .map(|c| c.id)
                .collect();
            select = select.filter(lesson::Column::CourseId.is_in(owned));
        }
    }

    let lessons = select
        .order_by_asc(lesson::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(lessons.into_iter().map(to_response).collect::<Vec<_>>()))
}

/// `GET /courses/:id/lessons` — Lessons of a course, 404 if the course is absent.
pub async fn list_by_course(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let course = courses::find_course(&state.db, id).await?;

    let lessons = lesson::Entity::find()
        .filter(lesson::Column::CourseId.eq(course.id))
        .order_by_asc(lesson::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(lessons.into_iter().map(to_response).collect::<Vec<_>>()))
}

/// `GET /lessons/:id` — Lesson detail.
async fn get_lesson(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let lesson = find_lesson(&state.db, id).await?;
    Ok(Json(to_response(lesson)))
}

/// `POST /lessons` — Add a lesson with its video to a course the caller owns.
async fn create_lesson(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = MultipartForm::read(multipart).await?;

    let title = form.require_text("title")?.to_string();
    let course_id = form.require_i32("courseId")?;

    let course = courses::find_course(&state.db, course_id).await?;
    policy::require_lesson_manager(&actor, &course)?;

    let video = VIDEO_UPLOAD.require(form.take_file("videoFile"))?;
    let video_url = state.media.store(video, &VIDEO_UPLOAD).await?;

    let new_lesson = lesson::ActiveModel {
        title: Set(title),
        video_url: Set(video_url),
        course_id: Set(course.id),
        ..Default::default()
    };
    let created = new_lesson.insert(&state.db).await?;

    Ok((StatusCode::CREATED, Json(to_response(created))))
}

/// `PUT /lessons/:id` — Update a lesson. The caller must own the lesson's
/// course, and may only move the lesson to another course they own.
async fn update_lesson(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_lesson(&state.db, id).await?;

    let current_course = courses::find_course(&state.db, existing.course_id).await?;
    policy::require_lesson_manager(&actor, &current_course)?;

    let mut form = MultipartForm::read(multipart).await?;

    let mut active: lesson::ActiveModel = existing.clone().into();

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

    if let Some(course_id) = form.optional_i32("courseId")? {
        let target = course::Entity::find_by_id(course_id).one(&state.db).await?;
        let owned = target.as_ref().is_some_and(|c| c.owner_id == actor.id);
        if !owned {
            return Err(AppError::Validation {
                field: "courseId",
                message: "Invalid course selection.".to_string(),
            });
        }
        active.course_id = Set(course_id);
    }

    if let Some(video) = form.take_file("videoFile") {
        VIDEO_UPLOAD.check(&video)?;

        if !existing.video_url.is_empty() {
            state.media.delete(&existing.video_url).await?;
        }
        active.video_url = Set(state.media.store(video, &VIDEO_UPLOAD).await?);
    }

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| stale_update(e, "Lesson"))?;

    Ok(Json(to_response(updated)))
}

/// `DELETE /lessons/:id` — Delete a lesson and its stored video file.
async fn delete_lesson(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_lesson(&state.db, id).await?;

    let course = courses::find_course(&state.db, existing.course_id).await?;
    policy::require_lesson_manager(&actor, &course)?;

    if !existing.video_url.is_empty() {
        state.media.delete(&existing.video_url).await?;
    }
    existing.delete(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}
