use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use std::sync::Arc;

use crate::{
    error::AppError,
    services::{generate_report, CsvLoader},
    views::page::{self, PageView},
    AppState,
};

const UPLOAD_FIELD: &str = "file";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(upload_page))
        .route("/report", post(create_report))
}

#[derive(Debug)]
struct Upload {
    file_name: String,
    data: Bytes,
}

async fn upload_page() -> Html<String> {
    Html(page::render(&PageView::NoFile { warning: None }))
}

async fn create_report(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Html<String>, AppError> {
    let start = std::time::Instant::now();
    let mut multipart = multipart.map_err(|e| AppError::UploadRejected(e.body_text()))?;

    let Some(upload) = read_upload(&mut multipart, state.config.max_upload_bytes).await? else {
        tracing::info!("Report requested without a file");
        return Ok(Html(page::render(&PageView::NoFile { warning: None })));
    };

    tracing::info!(
        "Received upload {}, size: {}KB",
        upload.file_name,
        upload.data.len() / 1024
    );

    let loader = CsvLoader::new(state.config.infer_schema_rows);
    let view = tokio::task::spawn_blocking(move || -> Result<PageView, AppError> {
        let table = loader.load(&upload.file_name, upload.data)?;
        let report = generate_report(&table)?;
        Ok(PageView::FileLoaded {
            file_name: upload.file_name,
            generated_at: chrono::Utc::now(),
            report,
        })
    })
    .await??;

    tracing::info!("Total processing completed in {:?}", start.elapsed());
    Ok(Html(page::render(&view)))
}

/// First file field of the form. `None` when the form was sent without a file.
async fn read_upload(multipart: &mut Multipart, limit: usize) -> Result<Option<Upload>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e, limit))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(|e| upload_error(e, limit))?;

        if file_name.is_empty() && data.is_empty() {
            return Ok(None);
        }
        return Ok(Some(Upload { file_name, data }));
    }

    Ok(None)
}

fn upload_error(err: MultipartError, limit: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge {
            limit_mb: (limit / (1024 * 1024)).max(1),
        }
    } else {
        AppError::UploadRejected(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::routes::build_router;
    use crate::views::page::{REPORT_COMPLETE, UPLOAD_PROMPT, UPLOAD_SUCCESS};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use tower::ServiceExt;

    const BOUNDARY: &str = "report-test-boundary";

    fn app() -> Router {
        build_router(Config {
            max_upload_bytes: 1024 * 1024,
            ..Config::default()
        })
    }

    fn upload_request(file_name: &str, content: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
             Content-Type: text/csv\r\n\r\n",
            b = BOUNDARY,
            f = file_name
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/report")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = tokio_test::assert_ok!(app.oneshot(request).await);
        let status = response.status();
        let bytes = tokio_test::assert_ok!(to_bytes(response.into_body(), usize::MAX).await);
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn index_shows_upload_prompt() {
        let request = Request::get("/").body(Body::empty()).unwrap();
        let (status, html) = send(app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains(UPLOAD_PROMPT));
        assert!(!html.contains("Summary Statistics"));
    }

    #[tokio::test]
    async fn csv_upload_renders_full_report() {
        let csv = b"age,city\n23,Lisbon\n35,Porto\n,Lisbon\n41,Faro\n29,Braga\n";
        let (status, html) = send(app(), upload_request("people.csv", csv)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains(UPLOAD_SUCCESS));
        assert!(html.contains("Summary Statistics"));
        assert!(html.contains("<tr><td>age</td><td>1</td></tr>"));
        assert!(html.contains("Distribution of age"));
        assert!(html.contains("Correlation not available"));
        assert!(html.contains(REPORT_COMPLETE));
        assert!(!html.contains(UPLOAD_PROMPT));
    }

    #[tokio::test]
    async fn correlated_columns_show_heatmap() {
        let csv = b"a,b\n1,2\n2,4\n3,6\n4,8\n5,10\n";
        let (status, html) = send(app(), upload_request("pairs.csv", csv)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Correlation Heatmap"));
        assert!(html.contains("1.00"));
    }

    #[tokio::test]
    async fn binary_upload_returns_to_prompt_with_warning() {
        let binary = [0x89u8, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0xFF];
        let (status, html) = send(app(), upload_request("image.csv", &binary)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(html.contains("Could not parse the uploaded file as CSV"));
        assert!(html.contains(UPLOAD_PROMPT));
        assert!(!html.contains("Summary Statistics"));
    }

    #[tokio::test]
    async fn non_csv_file_name_is_rejected() {
        let (status, html) = send(app(), upload_request("notes.txt", b"a,b\n1,2\n")).await;

        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(html.contains("is not a .csv file"));
        assert!(html.contains(UPLOAD_PROMPT));
    }

    #[tokio::test]
    async fn empty_file_field_shows_prompt() {
        let (status, html) = send(app(), upload_request("", b"")).await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains(UPLOAD_PROMPT));
        assert!(!html.contains(UPLOAD_SUCCESS));
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let small = build_router(Config {
            max_upload_bytes: 256,
            ..Config::default()
        });
        let csv = "x\n".repeat(1000);
        let (status, html) = send(small, upload_request("big.csv", csv.as_bytes())).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(html.contains(UPLOAD_PROMPT));
        assert!(!html.contains("Summary Statistics"));
    }

    #[tokio::test]
    async fn health_reports_upload_limit() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app(), request).await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["max_upload_mb"], 1);
    }
}
