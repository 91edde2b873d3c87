//! Multipart form extraction.

use std::collections::HashMap;

use axum::extract::{FromRequest, Multipart, Request};
use vidtube_common::AppError;
use vidtube_core::MediaUpload;

/// A fully buffered multipart form: text fields and file parts by name.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, MediaUpload>,
}

impl MultipartForm {
    /// Take a text field, trimmed. Empty values count as absent.
    pub fn take_text(&mut self, name: &str) -> Option<String> {
        self.fields
            .remove(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Take a text field, or an empty string if absent.
    pub fn take_text_or_empty(&mut self, name: &str) -> String {
        self.take_text(name).unwrap_or_default()
    }

    /// Take a file part.
    pub fn take_file(&mut self, name: &str) -> Option<MediaUpload> {
        self.files.remove(name)
    }

    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };

            match field.file_name().map(ToString::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let data = field.bytes().await?;
                    // Browsers send an empty part for an untouched file input
                    if file_name.is_empty() && data.is_empty() {
                        continue;
                    }
                    form.files.insert(
                        name,
                        MediaUpload {
                            file_name,
                            content_type,
                            data: data.to_vec(),
                        },
                    );
                }
                None => {
                    let value = field.text().await?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }
}

impl<S> FromRequest<S> for MultipartForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state).await?;
        Self::read(multipart).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http;

    const BOUNDARY: &str = "XBOUNDARYX";

    fn request(body: String) -> Request {
        http::Request::builder()
            .method("POST")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_reads_fields_and_files() {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"title\"\r\n\r\n\
             Holiday \r\n\
             --{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"thumbnail\"; filename=\"t.png\"\r\n\
             Content-Type: image/png\r\n\r\n\
             PNGDATA\r\n\
             --{BOUNDARY}--\r\n"
        );

        let mut form = MultipartForm::from_request(request(body), &()).await.unwrap();

        assert_eq!(form.take_text("title").as_deref(), Some("Holiday"));
        assert_eq!(form.take_text("description"), None);
        let file = form.take_file("thumbnail").unwrap();
        assert_eq!(file.file_name, "t.png");
        assert_eq!(file.content_type, "image/png");
        assert_eq!(file.data, b"PNGDATA");
    }

    #[tokio::test]
    async fn test_non_multipart_body_is_bad_request() {
        let req = http::Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let err = MultipartForm::from_request(req, &()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
