//! Media upload validation and the storage port.
//!
//! Handlers hand uploaded files to a [`MediaStore`] and get back a
//! root-relative URL; they never touch the filesystem directly, so the entity
//! logic stays testable against any store implementation.

pub mod fs;

pub use fs::FsMediaStore;

use async_trait::async_trait;

use crate::error::AppError;

/// An uploaded file as received from a multipart form field.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    /// Client-declared content type. Trusted as-is; no magic-byte sniffing.
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Allow-list rules for one category of upload, plus where stored files land.
#[derive(Debug, Clone, Copy)]
pub struct UploadRules {
    /// Form field name reported back in validation errors.
    pub field: &'static str,
    /// Subdirectory (and URL prefix) under the upload root.
    pub subdir: &'static str,
    pub allowed_extensions: &'static [&'static str],
    pub allowed_mime_types: &'static [&'static str],
    missing_message: &'static str,
    invalid_message: &'static str,
}

/// Cover images: JPG/JPEG/PNG stored under `uploads/`.
pub const IMAGE_UPLOAD: UploadRules = UploadRules {
    field: "imageFile",
    subdir: "uploads",
    allowed_extensions: &[".jpg", ".jpeg", ".png"],
    allowed_mime_types: &["image/jpeg", "image/jpg", "image/png"],
    missing_message: "Please upload an image.",
    invalid_message: "Only JPG, JPEG, PNG files are allowed.",
};

/// Lesson videos stored under `uploads/videos/`.
pub const VIDEO_UPLOAD: UploadRules = UploadRules {
    field: "videoFile",
    subdir: "uploads/videos",
    allowed_extensions: &[".mp4", ".avi", ".mov", ".mkv", ".webm"],
    allowed_mime_types: &[
        "video/mp4",
        "video/x-msvideo",
        "video/quicktime",
        "video/x-matroska",
        "video/webm",
    ],
    missing_message: "Please upload a video file.",
    invalid_message: "Only video files (MP4, AVI, MOV, MKV, WEBM) are allowed.",
};

impl UploadRules {
    /// Require a present, non-empty, allow-listed file.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] naming the form field when the file is
    /// missing, empty, or outside the extension/MIME allow-lists.
    pub fn require(&self, file: Option<UploadedFile>) -> Result<UploadedFile, AppError> {
        let file = file.ok_or_else(|| self.missing())?;
        self.check(&file)?;
        Ok(file)
    }

    /// Validate an already-present file against the allow-lists.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an empty file or one whose
    /// extension or declared content type is not allow-listed.
    pub fn check(&self, file: &UploadedFile) -> Result<(), AppError> {
        if file.data.is_empty() {
            return Err(self.missing());
        }

        let ext = extension_of(&file.file_name).ok_or_else(|| self.invalid())?;
        if !self.allowed_extensions.contains(&ext.as_str()) {
            return Err(self.invalid());
        }

        let declared = file.content_type.to_lowercase();
        if !self.allowed_mime_types.contains(&declared.as_str()) {
            return Err(self.invalid());
        }

        Ok(())
    }

    fn missing(&self) -> AppError {
        AppError::Validation {
            field: self.field,
            message: self.missing_message.to_string(),
        }
    }

    fn invalid(&self) -> AppError {
        AppError::Validation {
            field: self.field,
            message: self.invalid_message.to_string(),
        }
    }
}

/// Lowercased extension including the leading dot, if any.
fn extension_of(file_name: &str) -> Option<String> {
    file_name
        .rfind('.')
        .map(|idx| file_name[idx..].to_lowercase())
}

/// Storage port: persists validated uploads and removes stale ones by URL.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Validate `file` against `rules`, persist it under a collision-free
    /// generated name, and return its root-relative URL.
    async fn store(&self, file: UploadedFile, rules: &UploadRules) -> Result<String, AppError>;

    /// Delete the file behind a previously returned URL. A URL whose file is
    /// already gone is a no-op.
    async fn delete(&self, url: &str) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(name: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content_type: "image/png".to_string(),
            data: vec![1, 2, 3],
        }
    }

    #[test]
    fn accepts_allowed_image() {
        assert!(IMAGE_UPLOAD.check(&png("photo.png")).is_ok());
        assert!(IMAGE_UPLOAD.check(&png("photo.PNG")).is_ok());
    }

    #[test]
    fn rejects_missing_file() {
        let err = IMAGE_UPLOAD.require(None).err();
        assert!(matches!(
            err,
            Some(AppError::Validation { field: "imageFile", message }) if message == "Please upload an image."
        ));
    }

    #[test]
    fn rejects_empty_file() {
        let mut file = png("photo.png");
        file.data.clear();
        assert!(IMAGE_UPLOAD.check(&file).is_err());
    }

    #[test]
    fn rejects_disallowed_extension() {
        let file = UploadedFile {
            file_name: "script.exe".to_string(),
            content_type: "image/png".to_string(),
            data: vec![1],
        };
        assert!(IMAGE_UPLOAD.check(&file).is_err());
    }

    #[test]
    fn rejects_mismatched_content_type() {
        let file = UploadedFile {
            file_name: "photo.png".to_string(),
            content_type: "application/octet-stream".to_string(),
            data: vec![1],
        };
        assert!(IMAGE_UPLOAD.check(&file).is_err());
    }

    #[test]
    fn video_rules_cover_all_formats() {
        for (name, mime) in [
            ("clip.mp4", "video/mp4"),
            ("clip.avi", "video/x-msvideo"),
            ("clip.mov", "video/quicktime"),
            ("clip.mkv", "video/x-matroska"),
            ("clip.webm", "video/webm"),
        ] {
            let file = UploadedFile {
                file_name: name.to_string(),
                content_type: mime.to_string(),
                data: vec![1],
            };
            assert!(VIDEO_UPLOAD.check(&file).is_ok(), "{name} should pass");
        }
    }

    #[test]
    fn no_extension_is_invalid() {
        assert!(extension_of("noext").is_none());
        assert_eq!(extension_of("a.JPG").as_deref(), Some(".jpg"));
    }
}
