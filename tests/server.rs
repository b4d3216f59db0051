//! HTTP tests for `POST /file-handler` and friends.
//!
//! Both collaborators are replaced by recording fakes, so these tests need
//! neither pdfium nor an API key.

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use pdf2brief::server::{self, AppState};
use pdf2brief::{
    AnalysisResult, BriefError, BriefOutput, Briefer, ConvertedDocument, CorsPolicy,
    DocumentAnalyzer, DocumentConverter, PdfiumConverter, ServerConfig,
};
use serde_json::Value;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\ntrailer << >>\n%%EOF\n";

// ── Fakes ────────────────────────────────────────────────────────────────

/// What the converter saw on one call.
#[derive(Debug, Clone)]
struct ConvertCall {
    path: PathBuf,
    existed: bool,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct RecordingConverter {
    calls: Mutex<Vec<ConvertCall>>,
    error: Option<String>,
}

impl RecordingConverter {
    fn failing(detail: &str) -> Self {
        Self {
            error: Some(detail.to_string()),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<ConvertCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentConverter for RecordingConverter {
    async fn convert(&self, pdf_path: &Path) -> Result<ConvertedDocument, BriefError> {
        self.calls.lock().unwrap().push(ConvertCall {
            path: pdf_path.to_path_buf(),
            existed: pdf_path.exists(),
            bytes: std::fs::read(pdf_path).unwrap_or_default(),
        });

        if let Some(ref detail) = self.error {
            return Err(BriefError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: detail.clone(),
            });
        }

        Ok(ConvertedDocument {
            markdown: "# Memo\n\nHello World\n".to_string(),
            ..Default::default()
        })
    }
}

#[derive(Default)]
struct RecordingAnalyzer {
    inputs: Mutex<Vec<String>>,
    error: Option<String>,
}

impl RecordingAnalyzer {
    fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Default::default()
        }
    }

    fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentAnalyzer for RecordingAnalyzer {
    async fn analyze(&self, markdown: &str) -> Result<AnalysisResult, BriefError> {
        self.inputs.lock().unwrap().push(markdown.to_string());

        if let Some(ref message) = self.error {
            return Err(BriefError::LlmApiError {
                message: message.clone(),
            });
        }

        Ok(AnalysisResult {
            summary: "A one-line memo greeting the world.".into(),
            key_points: vec!["It says Hello World".into()],
            quick_summary: "Hello World.".into(),
            extended_summary: "The memo consists of a single greeting.".into(),
            actionable_insights: vec!["None required".into()],
            source_document_list: vec![],
            potential_biases_and_limitations: "Too short to judge.".into(),
        })
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn test_config(cors: CorsPolicy) -> ServerConfig {
    ServerConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        cors,
        max_upload_bytes: 1024 * 1024,
    }
}

fn test_server_with(
    converter: Arc<RecordingConverter>,
    analyzer: Arc<RecordingAnalyzer>,
    cors: CorsPolicy,
) -> TestServer {
    let briefer = Briefer::new(converter, analyzer);
    let app = server::router(AppState::new(briefer), &test_config(cors)).expect("router builds");
    TestServer::new(app).expect("test server starts")
}

fn test_server(converter: Arc<RecordingConverter>, analyzer: Arc<RecordingAnalyzer>) -> TestServer {
    test_server_with(converter, analyzer, CorsPolicy::AnyOrigin)
}

fn pdf_form(bytes: &'static [u8], mime: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(bytes).file_name("memo.pdf").mime_type(mime),
    )
}

// ── POST /file-handler ───────────────────────────────────────────────────

#[tokio::test]
async fn pdf_upload_returns_markdown_and_briefing() {
    let converter = Arc::new(RecordingConverter::default());
    let analyzer = Arc::new(RecordingAnalyzer::default());
    let server = test_server(converter.clone(), analyzer.clone());

    let response = server
        .post("/file-handler")
        .multipart(pdf_form(PDF_BYTES, "application/pdf"))
        .await;

    response.assert_status(StatusCode::OK);
    let body: BriefOutput = response.json();
    assert_eq!(body.filename, "memo.pdf");
    assert!(body.markdown.contains("Hello World"));
    assert!(!body.result.summary.is_empty());
    assert!(!body.result.key_points.is_empty());

    // The analyser saw exactly the converter's Markdown.
    assert_eq!(analyzer.inputs(), vec!["# Memo\n\nHello World\n".to_string()]);

    // The converter saw the uploaded bytes in a .pdf file that is gone now.
    let calls = converter.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].existed);
    assert_eq!(calls[0].bytes, PDF_BYTES);
    assert_eq!(calls[0].path.extension().and_then(|e| e.to_str()), Some("pdf"));
    assert!(!calls[0].path.exists());
}

#[tokio::test]
async fn response_has_exactly_the_contract_fields() {
    let server = test_server(
        Arc::new(RecordingConverter::default()),
        Arc::new(RecordingAnalyzer::default()),
    );

    let response = server
        .post("/file-handler")
        .multipart(pdf_form(PDF_BYTES, "application/pdf"))
        .await;

    let body: Value = response.json();
    let mut top: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
    top.sort_unstable();
    assert_eq!(top, vec!["filename", "markdown", "result"]);

    let mut result: Vec<&str> = body["result"]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    result.sort_unstable();
    assert_eq!(
        result,
        vec![
            "actionable_insights",
            "extended_summary",
            "key_points",
            "potential_biases_and_limitations",
            "quick_summary",
            "source_document_list",
            "summary",
        ]
    );
}

#[tokio::test]
async fn png_upload_is_rejected_without_calling_collaborators() {
    let converter = Arc::new(RecordingConverter::default());
    let analyzer = Arc::new(RecordingAnalyzer::default());
    let server = test_server(converter.clone(), analyzer.clone());

    let response = server
        .post("/file-handler")
        .multipart(pdf_form(b"\x89PNG\r\n\x1a\n", "image/png"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("Invalid file type"), "got: {detail}");
    assert!(detail.contains("image/png"));

    assert!(converter.calls().is_empty());
    assert!(analyzer.inputs().is_empty());
}

#[tokio::test]
async fn content_type_check_ignores_case_and_parameters() {
    let converter = Arc::new(RecordingConverter::default());
    let server = test_server(converter.clone(), Arc::new(RecordingAnalyzer::default()));

    let response = server
        .post("/file-handler")
        .multipart(pdf_form(PDF_BYTES, "Application/PDF; name=memo.pdf"))
        .await;

    response.assert_status(StatusCode::OK);
    assert_eq!(converter.calls().len(), 1);
}

#[tokio::test]
async fn missing_file_field_is_bad_request() {
    let converter = Arc::new(RecordingConverter::default());
    let server = test_server(converter.clone(), Arc::new(RecordingAnalyzer::default()));

    let response = server
        .post("/file-handler")
        .multipart(MultipartForm::new().add_text("note", "forgot the file"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["detail"].as_str().unwrap().contains("No file uploaded"));
    assert!(converter.calls().is_empty());
}

#[tokio::test]
async fn non_multipart_body_is_bad_request() {
    let converter = Arc::new(RecordingConverter::default());
    let server = test_server(converter.clone(), Arc::new(RecordingAnalyzer::default()));

    let response = server
        .post("/file-handler")
        .json(&serde_json::json!({ "file": "not really" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["detail"].as_str().unwrap().starts_with("Malformed upload"));
    assert!(converter.calls().is_empty());
}

#[tokio::test]
async fn upload_over_the_body_limit_is_payload_too_large() {
    let converter = Arc::new(RecordingConverter::default());
    let server = test_server(converter.clone(), Arc::new(RecordingAnalyzer::default()));

    let mut oversized = PDF_BYTES.to_vec();
    oversized.resize(2 * 1024 * 1024, b' ');
    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(oversized)
            .file_name("huge.pdf")
            .mime_type("application/pdf"),
    );

    let response = server.post("/file-handler").multipart(form).await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = response.json();
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Upload too large"), "got: {detail}");
    assert!(detail.contains("size limit"), "got: {detail}");
    assert!(converter.calls().is_empty());
}

#[tokio::test]
async fn unreadable_extra_field_fails_the_request() {
    let converter = Arc::new(RecordingConverter::default());
    let server = test_server(converter.clone(), Arc::new(RecordingAnalyzer::default()));

    // The extra field alone blows the 1 MiB limit, before `file` is reached.
    let form = MultipartForm::new()
        .add_text("note", "x".repeat(2 * 1024 * 1024))
        .add_part(
            "file",
            Part::bytes(PDF_BYTES)
                .file_name("memo.pdf")
                .mime_type("application/pdf"),
        );

    let response = server.post("/file-handler").multipart(form).await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert!(converter.calls().is_empty());
}

#[tokio::test]
async fn analysis_failure_is_500_with_message_and_cleans_up() {
    let converter = Arc::new(RecordingConverter::default());
    let analyzer = Arc::new(RecordingAnalyzer::failing("Gemini quota exhausted"));
    let server = test_server(converter.clone(), analyzer.clone());

    let response = server
        .post("/file-handler")
        .multipart(pdf_form(PDF_BYTES, "application/pdf"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(body["detail"].as_str().unwrap().contains("Gemini quota exhausted"));

    let calls = converter.calls();
    assert_eq!(calls.len(), 1);
    assert!(!calls[0].path.exists());
}

#[tokio::test]
async fn conversion_failure_is_500_skips_analysis_and_cleans_up() {
    let converter = Arc::new(RecordingConverter::failing("trailer not found"));
    let analyzer = Arc::new(RecordingAnalyzer::default());
    let server = test_server(converter.clone(), analyzer.clone());

    let response = server
        .post("/file-handler")
        .multipart(pdf_form(PDF_BYTES, "application/pdf"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(body["detail"].as_str().unwrap().contains("trailer not found"));

    assert!(analyzer.inputs().is_empty());
    let calls = converter.calls();
    assert!(calls[0].existed);
    assert!(!calls[0].path.exists());
}

#[tokio::test]
async fn identical_uploads_are_processed_independently() {
    let converter = Arc::new(RecordingConverter::default());
    let analyzer = Arc::new(RecordingAnalyzer::default());
    let server = test_server(converter.clone(), analyzer.clone());

    for _ in 0..2 {
        server
            .post("/file-handler")
            .multipart(pdf_form(PDF_BYTES, "application/pdf"))
            .await
            .assert_status(StatusCode::OK);
    }

    let calls = converter.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(analyzer.inputs().len(), 2);
    assert_ne!(calls[0].path, calls[1].path);
    assert!(calls.iter().all(|c| !c.path.exists()));
}

#[tokio::test]
async fn mislabelled_bytes_fail_in_the_real_converter() {
    let analyzer = Arc::new(RecordingAnalyzer::default());
    let briefer = Briefer::new(Arc::new(PdfiumConverter::default()), analyzer.clone());
    let app = server::router(AppState::new(briefer), &test_config(CorsPolicy::AnyOrigin)).unwrap();
    let server = TestServer::new(app).unwrap();

    // Declared as a PDF, so validation passes; the magic-byte check does not.
    let response = server
        .post("/file-handler")
        .multipart(pdf_form(b"just some text, honestly", "application/pdf"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(body["detail"].as_str().unwrap().contains("not a valid PDF"));
    assert!(analyzer.inputs().is_empty());
}

// ── CORS and metadata ────────────────────────────────────────────────────

#[tokio::test]
async fn options_returns_empty_200_with_cors_headers() {
    let server = test_server(
        Arc::new(RecordingConverter::default()),
        Arc::new(RecordingAnalyzer::default()),
    );

    let response = server
        .method(Method::OPTIONS, "/file-handler")
        .add_header("origin", "http://localhost:3000")
        .add_header("access-control-request-method", "POST")
        .add_header("access-control-request-headers", "content-type")
        .await;

    response.assert_status(StatusCode::OK);
    assert!(response.text().is_empty());
    let headers = response.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(headers.get("access-control-allow-credentials").unwrap(), "true");
    assert!(headers.get("access-control-allow-methods").is_some());
}

#[tokio::test]
async fn any_origin_is_mirrored_on_simple_requests() {
    let server = test_server(
        Arc::new(RecordingConverter::default()),
        Arc::new(RecordingAnalyzer::default()),
    );

    let response = server
        .get("/")
        .add_header("origin", "https://somewhere.example")
        .await;

    response.assert_status(StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "https://somewhere.example"
    );
}

#[tokio::test]
async fn allow_list_only_admits_listed_origins() {
    let policy = CorsPolicy::from_origins(vec!["https://app.example.org".into()]);
    let server = test_server_with(
        Arc::new(RecordingConverter::default()),
        Arc::new(RecordingAnalyzer::default()),
        policy,
    );

    let allowed = server
        .get("/")
        .add_header("origin", "https://app.example.org")
        .await;
    assert_eq!(
        allowed.headers().get("access-control-allow-origin").unwrap(),
        "https://app.example.org"
    );

    let foreign = server
        .get("/")
        .add_header("origin", "https://evil.example")
        .await;
    assert!(foreign.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn root_describes_the_upload_endpoint() {
    let server = test_server(
        Arc::new(RecordingConverter::default()),
        Arc::new(RecordingAnalyzer::default()),
    );

    let response = server.get("/").await;

    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["name"], "pdf2brief");
    assert_eq!(body["endpoints"]["POST /file-handler"]["field"], "file");
}
