//! Multipart form collection shared by the upload-carrying handlers.

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::AppError;
use crate::storage::UploadedFile;

/// A fully-read multipart form: text fields by name, file fields by name.
pub struct MultipartForm {
    texts: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    /// Drain a multipart request into memory.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BadRequest`] if the multipart stream is malformed.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut texts = HashMap::new();
        let mut files = HashMap::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
        {
            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };

            if let Some(file_name) = field.file_name().map(ToString::to_string) {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Could not read file: {e}")))?
                    .to_vec();
                files.insert(
                    name,
                    UploadedFile {
                        file_name,
                        content_type,
                        data,
                    },
                );
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Could not read field: {e}")))?;
                texts.insert(name, value);
            }
        }

        Ok(Self { texts, files })
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(String::as_str)
    }

    /// A required, non-blank text field.
    ///
    /// # Errors
    ///
    /// Returns a field-level validation error when absent or blank.
    pub fn require_text(&self, name: &'static str) -> Result<&str, AppError> {
        self.text(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Validation {
                field: name,
                message: format!("{name} is required."),
            })
    }

    /// A required integer field.
    ///
    /// # Errors
    ///
    /// Returns a field-level validation error when absent or not an integer.
    pub fn require_i32(&self, name: &'static str) -> Result<i32, AppError> {
        self.require_text(name)?
            .parse::<i32>()
            .map_err(|_| AppError::Validation {
                field: name,
                message: format!("{name} must be a whole number."),
            })
    }

    /// An optional integer field.
    ///
    /// # Errors
    ///
    /// Returns a field-level validation error when present but not an integer.
    pub fn optional_i32(&self, name: &'static str) -> Result<Option<i32>, AppError> {
        match self.text(name) {
            None => Ok(None),
            Some(v) => v
                .trim()
                .parse::<i32>()
                .map(Some)
                .map_err(|_| AppError::Validation {
                    field: name,
                    message: format!("{name} must be a whole number."),
                }),
        }
    }

    /// Remove and return a file field, if the client sent one.
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}
