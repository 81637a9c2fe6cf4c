use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap_or_default();

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .unwrap_or_default();
    let body_str = String::from_utf8(body.to_vec()).unwrap_or_default();

    (status, body_str)
}

/// Test helper: send a GET request to the app and return (status, body).
pub async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap_or_default();
    send(app, request).await
}

pub async fn get_with_auth(app: &Router, uri: &str, token: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap_or_default();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: &serde_json::Value) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap_or_default();
    send(app, request).await
}

/// POST with an empty body, for action endpoints like enrollment.
pub async fn post_with_auth(app: &Router, uri: &str, token: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap_or_default();
    send(app, request).await
}

pub async fn delete_with_auth(app: &Router, uri: &str, token: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap_or_default();
    send(app, request).await
}

// ─────────────────────────────────────────────────────────────────────────────
// Multipart
// ─────────────────────────────────────────────────────────────────────────────

/// Hand-built `multipart/form-data` body for the upload-carrying endpoints.
pub struct FormData {
    boundary: String,
    body: Vec<u8>,
}

impl Default for FormData {
    fn default() -> Self {
        Self::new()
    }
}

impl FormData {
    pub fn new() -> Self {
        Self {
            boundary: "------------------------learnhubtestboundary".to_string(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    #[must_use]
    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> (String, Vec<u8>) {
        let header = format!("multipart/form-data; boundary={}", self.boundary);
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (header, self.body)
    }
}

pub async fn post_form_with_auth(
    app: &Router,
    uri: &str,
    form: FormData,
    token: &str,
) -> (StatusCode, String) {
    let (content_type, body) = form.finish();
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap_or_default();
    send(app, request).await
}

pub async fn put_form_with_auth(
    app: &Router,
    uri: &str,
    form: FormData,
    token: &str,
) -> (StatusCode, String) {
    let (content_type, body) = form.finish();
    let request = Request::builder()
        .method("PUT")
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap_or_default();
    send(app, request).await
}
