//! Multipart body builder for tests

use axum::body::Body;
use axum::extract::{FromRequest, Multipart};
use axum::http::{header, Request};

const BOUNDARY: &str = "----pdf-service-test-boundary";

#[derive(Default)]
pub struct MultipartForm {
    body: Vec<u8>,
    truncated: bool,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file part
    pub fn file(mut self, name: &str, file_name: &str, content: impl AsRef<[u8]>) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name, file_name
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(content.as_ref());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Add a plain form field without a file name
    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    /// Drop the trailing part of the body, as if the client went away
    pub fn truncated(mut self) -> Self {
        self.truncated = true;
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", BOUNDARY)
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        if self.truncated {
            let keep = self.body.len().saturating_sub(4);
            self.body.truncate(keep);
        } else {
            self.body
                .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        }
        self.body
    }
}

pub async fn multipart_of(form: MultipartForm) -> Multipart {
    let request = Request::builder()
        .header(header::CONTENT_TYPE, form.content_type())
        .body(Body::from(form.into_bytes()))
        .unwrap();
    Multipart::from_request(request, &()).await.unwrap()
}
