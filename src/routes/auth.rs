use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{jwt, password};
use crate::entities::user;
use crate::error::AppError;
use crate::state::AppState;

/// Build the auth route group: `/auth/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub full_name: String,
    pub password: String,
    #[serde(default)]
    pub is_instructor: bool,
    pub specialization: Option<String>,
}

#[derive(Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub photo: Option<String>,
    pub is_instructor: bool,
    pub specialization: Option<String>,
    pub role: String,
    pub created_at: String,
}

fn user_response(u: &user::Model) -> UserResponse {
    UserResponse {
        id: u.id,
        email: u.email.clone(),
        full_name: u.full_name.clone(),
        bio: u.bio.clone(),
        photo: u.photo.clone(),
        is_instructor: u.is_instructor,
        specialization: u.specialization.clone(),
        role: u.role.clone(),
        created_at: u.created_at.to_rfc3339(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /auth/signup` — Register a new account. Every account starts as a
/// `"learner"`; admin promotion happens out of band.
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    password::validate_email(&req.email).map_err(|message| AppError::Validation {
        field: "email",
        message,
    })?;
    password::validate_password(&req.password).map_err(|message| AppError::Validation {
        field: "password",
        message,
    })?;
    if req.full_name.trim().is_empty() {
        return Err(AppError::Validation {
            field: "fullName",
            message: "Full name is required.".to_string(),
        });
    }

    let email = req.email.trim().to_lowercase();

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Email is already registered.".to_string()));
    }

    let now = Utc::now().fixed_offset();
    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(password::hash_password(&req.password)?),
        full_name: Set(req.full_name.trim().to_string()),
        bio: Set(None),
        photo: Set(None),
        is_instructor: Set(req.is_instructor),
        specialization: Set(req.specialization),
        role: Set("learner".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let user_model = new_user.insert(&state.db).await?;

    let token = jwt::generate_access_token(user_model.id, &user_model.role, &state.config)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user_response(&user_model),
            token,
        }),
    ))
}

/// `POST /auth/signin` — Exchange credentials for an access token.
async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = req.email.trim().to_lowercase();

    let user_model = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password.".to_string()))?;

    if !password::verify_password(&req.password, &user_model.password_hash)? {
        return Err(AppError::Unauthorized(
            "Invalid email or password.".to_string(),
        ));
    }

    let token = jwt::generate_access_token(user_model.id, &user_model.role, &state.config)?;

    Ok(Json(AuthResponse {
        user: user_response(&user_model),
        token,
    }))
}
