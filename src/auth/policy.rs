//! Capability checks used by the entity route handlers.
//!
//! Each check takes the acting user plus the resource being touched and
//! answers allow/deny, so the handlers never carry inline role or ownership
//! conditionals of their own.

use crate::entities::{course, user};
use crate::error::AppError;

/// Category mutation requires the `"admin"` role.
///
/// # Errors
///
/// Returns [`AppError::Forbidden`] for any non-admin actor.
pub fn require_admin(actor: &user::Model) -> Result<(), AppError> {
    if actor.role == "admin" {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin role required.".to_string()))
    }
}

/// Course mutation is limited to the owning instructor.
///
/// # Errors
///
/// Returns [`AppError::Forbidden`] when the actor does not own the course.
pub fn require_course_owner(actor: &user::Model, resource: &course::Model) -> Result<(), AppError> {
    if resource.owner_id == actor.id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You are not the owner of this course.".to_string(),
        ))
    }
}

/// Course deletion is allowed to the owner or an admin.
///
/// # Errors
///
/// Returns [`AppError::Forbidden`] otherwise.
pub fn require_course_owner_or_admin(
    actor: &user::Model,
    resource: &course::Model,
) -> Result<(), AppError> {
    if resource.owner_id == actor.id || actor.role == "admin" {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You are not authorized to delete this course.".to_string(),
        ))
    }
}

/// Lessons may only be managed by the owner of their course.
///
/// # Errors
///
/// Returns [`AppError::Forbidden`] when the actor does not own the course.
pub fn require_lesson_manager(
    actor: &user::Model,
    parent: &course::Model,
) -> Result<(), AppError> {
    if parent.owner_id == actor.id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You can only add lessons to your own courses.".to_string(),
        ))
    }
}
