//! Axum route handlers for applicant intake.

use axum::{
    body::Body,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, Request, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::errors::AppError;
use crate::intake::service::{locate_resume, submit_signup};
use crate::intake::validation::{FieldError, SignupForm, UploadedFile, MALFORMED_BODY};
use crate::state::AppState;

/// POST /resume
///
/// Multipart form with `name`, `phoneNo`, `email` and a `resume` file part.
pub async fn handle_submit(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<&'static str, AppError> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!("Rejected signup body: {rejection}");
        malformed_body()
    })?;
    let form = read_signup_form(&mut multipart).await?;

    submit_signup(
        state.store.as_ref(),
        &state.blobs,
        &state.config.upload_policy,
        form,
    )
    .await?;

    Ok("Signup successful!")
}

/// GET /resume/:id
///
/// Streams the stored résumé back. Range and conditional headers on the
/// incoming request are honored by `ServeFile`.
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Request,
) -> Result<Response, AppError> {
    let location = locate_resume(state.store.as_ref(), &id).await?;

    let response = ServeFile::new(&location.path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});

    match response.status() {
        StatusCode::NOT_FOUND => Err(AppError::Retrieval(format!(
            "resume file missing at {}",
            location.path.display()
        ))),
        status if status.is_server_error() => Err(AppError::Retrieval(format!(
            "reading {} failed with {status}",
            location.path.display()
        ))),
        _ => {
            let mut response = response.map(Body::new);
            let disposition = format!(
                "inline; filename=\"{}\"",
                location.file_name.replace('"', "_")
            );
            if let Ok(value) = HeaderValue::from_str(&disposition) {
                response
                    .headers_mut()
                    .insert(header::CONTENT_DISPOSITION, value);
            }
            Ok(response)
        }
    }
}

async fn read_signup_form(multipart: &mut Multipart) -> Result<SignupForm, AppError> {
    let mut form = SignupForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "name" => form.name = Some(field.text().await.map_err(multipart_error)?),
            "phoneNo" => form.phone_no = Some(field.text().await.map_err(multipart_error)?),
            "email" => form.email = Some(field.text().await.map_err(multipart_error)?),
            "resume" if form.resume.is_none() => {
                // A `resume` part without a filename is not a file upload.
                let Some(file_name) = field.file_name().map(str::to_string) else {
                    continue;
                };
                let contents = field.bytes().await.map_err(multipart_error)?;
                form.resume = Some(UploadedFile {
                    file_name,
                    contents,
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge;
    }
    tracing::debug!("Malformed multipart body: {err}");
    malformed_body()
}

fn malformed_body() -> AppError {
    AppError::Validation(vec![FieldError::new("multipart", "", MALFORMED_BODY)])
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::header::CONTENT_TYPE;
    use axum::Router;
    use serde_json::Value;
    use uuid::Uuid;

    use super::*;
    use crate::config::Config;
    use crate::intake::validation::UploadPolicy;
    use crate::routes::build_router;
    use crate::storage::blobs::BlobStore;
    use crate::storage::records::memory::MemoryApplicantStore;

    const BOUNDARY: &str = "resume-test-boundary";
    const CV_BYTES: &[u8] = b"%PDF-1.4\n\x00\x01\x02 binary resume body";

    struct Harness {
        router: Router,
        store: Arc<MemoryApplicantStore>,
        _dir: tempfile::TempDir,
    }

    fn harness_with(policy: UploadPolicy, max_upload_bytes: usize) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryApplicantStore::default());
        let state = AppState {
            store: store.clone(),
            blobs: BlobStore::new(dir.path()),
            config: Config {
                database_url: "postgres://unused".to_string(),
                port: 0,
                upload_dir: dir.path().display().to_string(),
                max_upload_bytes,
                upload_policy: policy,
                rust_log: "debug".to_string(),
            },
        };
        Harness {
            router: build_router(state),
            store,
            _dir: dir,
        }
    }

    fn harness() -> Harness {
        harness_with(UploadPolicy::accept_all(), 1024 * 1024)
    }

    fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, contents)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resume\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(contents);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn signup_request(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Request {
        axum::http::Request::post("/resume")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(fields, file)))
            .unwrap()
    }

    fn jane(email: &str) -> Request {
        signup_request(
            &[("name", "Jane Doe"), ("phoneNo", "555-1234"), ("email", email)],
            Some(("cv.pdf", CV_BYTES)),
        )
    }

    fn get(uri: &str) -> Request {
        axum::http::Request::get(uri).body(Body::empty()).unwrap()
    }

    async fn send(router: &Router, request: Request) -> (StatusCode, Vec<u8>) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn send_json(router: &Router, request: Request) -> (StatusCode, Value) {
        let (status, body) = send(router, request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_signup_then_download_returns_original_bytes() {
        let h = harness();

        let (status, body) = send(&h.router, jane("Jane.Doe@Example.com")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"Signup successful!");

        let rows = h.store.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Jane Doe");
        assert_eq!(rows[0].phone_no, "555-1234");
        assert_eq!(rows[0].email, "jane.doe@example.com");
        assert!(rows[0].resume_path.ends_with("-cv.pdf"));

        let response = h
            .router
            .clone()
            .oneshot(get(&format!("/resume/{}", rows[0].id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(disposition.starts_with("inline; filename=\""));
        assert!(disposition.ends_with("-cv.pdf\""));
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(bytes.as_ref(), CV_BYTES);
    }

    #[tokio::test]
    async fn test_markup_in_name_is_escaped() {
        let h = harness();
        let request = signup_request(
            &[
                ("name", "<script>x</script>"),
                ("phoneNo", " 555 "),
                ("email", "jane@example.com"),
            ],
            Some(("cv.pdf", CV_BYTES)),
        );

        let (status, _) = send(&h.router, request).await;

        assert_eq!(status, StatusCode::OK);
        let rows = h.store.rows();
        assert_eq!(rows[0].name, "&lt;script&gt;x&lt;&#x2F;script&gt;");
        assert_eq!(rows[0].phone_no, "555");
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected() {
        let h = harness();
        let request = signup_request(
            &[("name", ""), ("phoneNo", "555-1234"), ("email", "jane@example.com")],
            Some(("cv.pdf", CV_BYTES)),
        );

        let (status, body) = send_json(&h.router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let errors = body["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["path"], "name");
        assert_eq!(errors[0]["msg"], "Invalid value");
        assert_eq!(errors[0]["location"], "body");
        assert_eq!(errors[0]["type"], "field");
        assert!(h.store.rows().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_email_and_phone_are_reported_together() {
        let h = harness();
        let request = signup_request(
            &[("name", "Jane"), ("phoneNo", "   "), ("email", "jane.example.com")],
            Some(("cv.pdf", CV_BYTES)),
        );

        let (status, body) = send_json(&h.router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let paths: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["path"].as_str().unwrap())
            .collect();
        assert_eq!(paths, vec!["phoneNo", "email"]);
        assert!(h.store.rows().is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_rejected() {
        let h = harness();
        let request = signup_request(
            &[("name", "Jane"), ("phoneNo", "555"), ("email", "jane@example.com")],
            None,
        );

        let (status, body) = send_json(&h.router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["path"], "resume");
        assert_eq!(body["errors"][0]["msg"], "Resume file is required");
    }

    #[tokio::test]
    async fn test_disallowed_extension_is_rejected() {
        let h = harness_with(UploadPolicy::from_list("pdf,docx"), 1024 * 1024);
        let request = signup_request(
            &[("name", "Jane"), ("phoneNo", "555"), ("email", "jane@example.com")],
            Some(("cv.exe", &b"MZ"[..])),
        );

        let (status, body) = send_json(&h.router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["msg"], "File type not allowed");
        assert!(h.store.rows().is_empty());
    }

    #[tokio::test]
    async fn test_non_multipart_body_is_rejected() {
        let h = harness();
        let request = axum::http::Request::post("/resume")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"Jane"}"#))
            .unwrap();

        let (status, body) = send_json(&h.router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["msg"], "Malformed multipart body");
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let h = harness_with(UploadPolicy::accept_all(), 64);
        let big = vec![b'x'; 4096];
        let request = signup_request(
            &[("name", "Jane"), ("phoneNo", "555"), ("email", "jane@example.com")],
            Some(("cv.pdf", big.as_slice())),
        );

        let (status, _) = send(&h.router, request).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(h.store.rows().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_normalized_email_fails() {
        let h = harness();

        let (first, _) = send(&h.router, jane("jane.doe@example.com")).await;
        let (second, body) = send(&h.router, jane("  JANE.DOE@Example.com ")).await;

        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, b"Signup failed. Please try again.");
        assert_eq!(h.store.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let h = harness();

        let (status, body) = send(&h.router, get(&format!("/resume/{}", Uuid::new_v4()))).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"User not found");
    }

    #[tokio::test]
    async fn test_malformed_id_is_server_error() {
        let h = harness();

        let (status, body) = send(&h.router, get("/resume/not-an-id")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, b"Error retrieving resume");
    }

    #[tokio::test]
    async fn test_missing_blob_is_server_error() {
        let h = harness();
        send(&h.router, jane("jane@example.com")).await;
        let row = h.store.rows().remove(0);
        std::fs::remove_file(&row.resume_path).unwrap();

        let (status, body) = send(&h.router, get(&format!("/resume/{}", row.id))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, b"Error retrieving resume");
    }

    #[tokio::test]
    async fn test_concurrent_distinct_signups_are_both_retrievable() {
        let h = harness();
        let alice = signup_request(
            &[("name", "Alice"), ("phoneNo", "1"), ("email", "alice@example.com")],
            Some(("alice.pdf", &b"alice resume"[..])),
        );
        let bob = signup_request(
            &[("name", "Bob"), ("phoneNo", "2"), ("email", "bob@example.com")],
            Some(("bob.pdf", &b"bob resume"[..])),
        );

        let ((a, _), (b, _)) = tokio::join!(send(&h.router, alice), send(&h.router, bob));
        assert_eq!(a, StatusCode::OK);
        assert_eq!(b, StatusCode::OK);

        for row in h.store.rows() {
            let (status, body) = send(&h.router, get(&format!("/resume/{}", row.id))).await;
            assert_eq!(status, StatusCode::OK);
            let expected: &[u8] = if row.name == "Alice" {
                b"alice resume"
            } else {
                b"bob resume"
            };
            assert_eq!(body, expected);
        }
        assert_eq!(h.store.rows().len(), 2);
    }

    #[tokio::test]
    async fn test_upload_is_reachable_under_static_mount() {
        let h = harness();
        send(&h.router, jane("jane@example.com")).await;
        let row = h.store.rows().remove(0);
        let file_name = std::path::Path::new(&row.resume_path)
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();

        let (status, body) = send(&h.router, get(&format!("/uploads/{file_name}"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, CV_BYTES);
    }
}
