//! Request routing and handlers, independent of the HTTP transport.

use crate::multipart;
use pitch_core::{DocumentFormat, EnhancementOptions, Enhancer, PresentationStore};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

/// A request as seen by the handlers.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: String,
    /// Request target, possibly with a query string.
    pub path: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// A JSON response. `body` is `None` for 204.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body: Some(body),
        }
    }

    fn no_content() -> Self {
        Self {
            status: 204,
            body: None,
        }
    }
}

/// Errors reported to the client as `{"detail": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("File must be a PowerPoint or Word document")]
    UnsupportedFileType,

    #[error("Error processing file: {0}")]
    Processing(String),

    #[error("Presentation not found")]
    PresentationNotFound,

    #[error("No presentations available")]
    NoPresentations,

    #[error("Slide index out of range")]
    SlideIndexOutOfRange,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Not Found")]
    RouteNotFound,

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            Self::UnsupportedFileType | Self::SlideIndexOutOfRange => 400,
            Self::PresentationNotFound | Self::NoPresentations | Self::RouteNotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::PayloadTooLarge(_) => 413,
            Self::InvalidRequest(_) => 422,
            Self::Processing(_) | Self::Internal(_) => 500,
        }
    }
}

impl From<ApiError> for ApiResponse {
    fn from(err: ApiError) -> Self {
        Self {
            status: err.status(),
            body: Some(json!({ "detail": err.to_string() })),
        }
    }
}

enum Route<'a> {
    Health,
    Upload,
    Presentation(&'a str),
    Enhance,
}

fn route(path: &str) -> Option<Route<'_>> {
    match path {
        "/health" => Some(Route::Health),
        "/upload-ppt" => Some(Route::Upload),
        "/enhance-slide" => Some(Route::Enhance),
        _ => path
            .strip_prefix("/presentation/")
            .filter(|id| !id.is_empty() && !id.contains('/'))
            .map(Route::Presentation),
    }
}

#[derive(Debug, Serialize)]
struct UploadResponse<'a> {
    presentation_id: &'a str,
    filename: &'a str,
    slides: &'a [String],
    slide_count: usize,
}

#[derive(Debug, Deserialize)]
struct EnhanceSlideRequest {
    slide_index: i64,
    enhancement_type: String,
    #[serde(default)]
    options: EnhancementOptions,
    /// Target presentation; the earliest upload when absent.
    #[serde(default)]
    presentation_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct EnhanceSlideResponse<'a> {
    original_content: &'a str,
    enhanced_content: &'a str,
    enhancement_type: &'a str,
}

fn to_json<T: Serialize>(value: &T) -> Result<ApiResponse, ApiError> {
    serde_json::to_value(value)
        .map(ApiResponse::ok)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Shared application state and request handlers.
pub struct App {
    store: Arc<dyn PresentationStore>,
    enhancer: Enhancer,
}

impl App {
    pub fn new(store: Arc<dyn PresentationStore>, enhancer: Enhancer) -> Self {
        Self { store, enhancer }
    }

    /// Route and handle one request. Never fails; errors become responses.
    pub async fn handle(&self, request: ApiRequest) -> ApiResponse {
        let method = request.method.to_ascii_uppercase();
        let path = request.path.split('?').next().unwrap_or_default().to_string();

        let Some(route) = route(&path) else {
            return ApiError::RouteNotFound.into();
        };
        if method == "OPTIONS" {
            return ApiResponse::no_content();
        }

        let result = match (method.as_str(), route) {
            ("GET", Route::Health) => Ok(ApiResponse::ok(json!({ "status": "ok" }))),
            ("POST", Route::Upload) => self.upload(request).await,
            ("GET", Route::Presentation(id)) => self.presentation(id),
            ("POST", Route::Enhance) => self.enhance(request).await,
            _ => Err(ApiError::MethodNotAllowed),
        };

        result.unwrap_or_else(|err| {
            if err.status() >= 500 {
                log::error!("{} {} failed: {}", method, path, err);
            } else {
                log::debug!("{} {} rejected: {}", method, path, err);
            }
            err.into()
        })
    }

    async fn upload(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let content_type = request.content_type.as_deref().unwrap_or_default();
        let part = multipart::file_field(&request.body, content_type, "file")
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        let filename = part.filename.clone().unwrap_or_default();
        let format =
            DocumentFormat::from_filename(&filename).ok_or(ApiError::UnsupportedFileType)?;
        let data = part.data.to_vec();

        log::info!("Received '{}' ({:?}, {} bytes)", filename, format, data.len());

        let slides = tokio::task::spawn_blocking(move || pitch_ooxml::extract_slides(&data, format))
            .await
            .map_err(|e| ApiError::Processing(e.to_string()))?
            .map_err(|e| {
                log::warn!("Failed to extract '{}': {}", filename, e);
                ApiError::Processing(e.to_string())
            })?;

        let presentation = self.store.put(filename, slides);
        log::info!(
            "Stored '{}' as {} with {} slides",
            presentation.filename,
            presentation.id,
            presentation.slide_count()
        );

        to_json(&UploadResponse {
            presentation_id: &presentation.id,
            filename: &presentation.filename,
            slides: &presentation.slides,
            slide_count: presentation.slide_count(),
        })
    }

    fn presentation(&self, id: &str) -> Result<ApiResponse, ApiError> {
        let presentation = self
            .store
            .get(id)
            .map_err(|_| ApiError::PresentationNotFound)?;
        to_json(&*presentation)
    }

    async fn enhance(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let body: EnhanceSlideRequest = serde_json::from_slice(&request.body)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        let presentation = match body.presentation_id.as_deref() {
            Some(id) => self
                .store
                .get(id)
                .map_err(|_| ApiError::PresentationNotFound)?,
            None => self.store.first().ok_or(ApiError::NoPresentations)?,
        };

        let slide = usize::try_from(body.slide_index)
            .ok()
            .and_then(|index| presentation.slide(index))
            .ok_or(ApiError::SlideIndexOutOfRange)?;

        let enhancement = self
            .enhancer
            .enhance(slide, &body.enhancement_type, &body.options)
            .await;

        log::info!(
            "Enhanced slide {} of {} ('{}', {:?})",
            body.slide_index,
            presentation.id,
            body.enhancement_type,
            enhancement.source
        );

        to_json(&EnhanceSlideResponse {
            original_content: slide,
            enhanced_content: &enhancement.text,
            enhancement_type: &body.enhancement_type,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pitch_core::{MemoryStore, EMPTY_SLIDE_PLACEHOLDER};
    use pitch_openai::OpenAiClient;
    use std::io::{Cursor, Write};

    const BOUNDARY: &str = "pitch-test-boundary";

    /// App whose model provider is unreachable, so keyed requests fail over.
    pub(crate) fn test_app() -> App {
        let model = OpenAiClient::with_base_url("http://127.0.0.1:9/v1");
        App::new(Arc::new(MemoryStore::new()), Enhancer::new(Arc::new(model)))
    }

    pub(crate) fn pptx(slides: &[&[&str]]) -> Vec<u8> {
        let ns = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::FileOptions::default();

        let ids: String = (1..=slides.len())
            .map(|n| format!("<p:sldId id=\"{}\" r:id=\"rId{}\"/>", 255 + n, n))
            .collect();
        writer.start_file("ppt/presentation.xml", options).unwrap();
        write!(writer, "<p:presentation {}><p:sldIdLst>{}</p:sldIdLst></p:presentation>", ns, ids).unwrap();

        let rels: String = (1..=slides.len())
            .map(|n| format!("<Relationship Id=\"rId{}\" Type=\"slide\" Target=\"slides/slide{}.xml\"/>", n, n))
            .collect();
        writer.start_file("ppt/_rels/presentation.xml.rels", options).unwrap();
        write!(writer, "<Relationships>{}</Relationships>", rels).unwrap();

        for (i, shapes) in slides.iter().enumerate() {
            let sps: String = shapes
                .iter()
                .map(|text| format!("<p:sp><p:txBody><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>", text))
                .collect();
            writer.start_file(format!("ppt/slides/slide{}.xml", i + 1), options).unwrap();
            write!(writer, "<p:sld {}><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>", ns, sps).unwrap();
        }

        writer.finish().unwrap().into_inner()
    }

    fn upload_request(filename: &str, data: &[u8]) -> ApiRequest {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n", filename)
                .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        ApiRequest {
            method: "POST".to_string(),
            path: "/upload-ppt".to_string(),
            content_type: Some(format!("multipart/form-data; boundary={}", BOUNDARY)),
            body,
        }
    }

    fn get(path: &str) -> ApiRequest {
        ApiRequest {
            method: "GET".to_string(),
            path: path.to_string(),
            content_type: None,
            body: Vec::new(),
        }
    }

    fn enhance_request(body: Value) -> ApiRequest {
        ApiRequest {
            method: "POST".to_string(),
            path: "/enhance-slide".to_string(),
            content_type: Some("application/json".to_string()),
            body: body.to_string().into_bytes(),
        }
    }

    fn detail(response: &ApiResponse) -> &str {
        response.body.as_ref().unwrap()["detail"].as_str().unwrap()
    }

    async fn upload_deck(app: &App) -> String {
        let deck = pptx(&[&["Revenue grew 20%"], &["Costs", "fell"], &[]]);
        let response = app.handle(upload_request("Q3.pptx", &deck)).await;
        assert_eq!(response.status, 200);
        response.body.unwrap()["presentation_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app().handle(get("/health")).await;
        assert_eq!(response, ApiResponse::ok(json!({ "status": "ok" })));
    }

    #[tokio::test]
    async fn test_upload_returns_slides() {
        let app = test_app();
        let deck = pptx(&[&["Revenue grew 20%"], &["Costs", "fell"], &[]]);

        let response = app.handle(upload_request("Q3.PPTX", &deck)).await;
        assert_eq!(response.status, 200);

        let body = response.body.unwrap();
        assert_eq!(body["filename"], "Q3.PPTX");
        assert_eq!(body["slide_count"], 3);
        assert_eq!(
            body["slides"],
            json!(["Revenue grew 20%", "Costs\nfell", EMPTY_SLIDE_PLACEHOLDER])
        );
        assert!(!body["presentation_id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_upload_twice_gets_two_ids() {
        let app = test_app();
        let first = upload_deck(&app).await;
        let second = upload_deck(&app).await;
        assert_ne!(first, second);

        let a = app.handle(get(&format!("/presentation/{}", first))).await;
        let b = app.handle(get(&format!("/presentation/{}", second))).await;
        assert_eq!(a.status, 200);
        assert_eq!(b.status, 200);
        assert_eq!(a.body.as_ref().unwrap()["slides"], b.body.as_ref().unwrap()["slides"]);
        assert_eq!(a.body.unwrap()["id"], first.as_str());
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_extension() {
        let response = test_app().handle(upload_request("notes.txt", b"hello")).await;
        assert_eq!(response.status, 400);
        assert_eq!(detail(&response), "File must be a PowerPoint or Word document");
    }

    #[tokio::test]
    async fn test_upload_parse_failure_is_500_and_stores_nothing() {
        let app = test_app();
        let response = app.handle(upload_request("broken.pptx", b"not a zip")).await;
        assert_eq!(response.status, 500);
        assert!(detail(&response).starts_with("Error processing file: "));

        let enhance = app
            .handle(enhance_request(json!({ "slide_index": 0, "enhancement_type": "simplify", "options": {} })))
            .await;
        assert_eq!(enhance.status, 404);
    }

    #[tokio::test]
    async fn test_upload_without_file_field() {
        let mut request = upload_request("deck.pptx", b"x");
        request.content_type = Some("application/json".to_string());
        assert_eq!(test_app().handle(request).await.status, 422);
    }

    #[tokio::test]
    async fn test_unknown_presentation_is_404() {
        let app = test_app();
        upload_deck(&app).await;
        let response = app.handle(get("/presentation/00000000-0000-0000-0000-000000000000")).await;
        assert_eq!(response.status, 404);
        assert_eq!(detail(&response), "Presentation not found");
    }

    #[tokio::test]
    async fn test_enhance_with_empty_store() {
        let response = test_app()
            .handle(enhance_request(json!({ "slide_index": 0, "enhancement_type": "simplify", "options": {} })))
            .await;
        assert_eq!(response.status, 404);
        assert_eq!(detail(&response), "No presentations available");
    }

    #[tokio::test]
    async fn test_enhance_mock_simplify() {
        let app = test_app();
        upload_deck(&app).await;

        let response = app
            .handle(enhance_request(json!({ "slide_index": 0, "enhancement_type": "simplify", "options": {} })))
            .await;
        assert_eq!(response.status, 200);
        assert_eq!(
            response.body.unwrap(),
            json!({
                "original_content": "Revenue grew 20%",
                "enhanced_content": "Revenue grew 20%\n\n[SIMPLIFIED VERSION]\nThis slide now uses clearer language and simpler explanations.",
                "enhancement_type": "simplify"
            })
        );
    }

    #[tokio::test]
    async fn test_enhance_accepts_any_option_value_types() {
        let app = test_app();
        upload_deck(&app).await;

        let response = app
            .handle(enhance_request(json!({
                "slide_index": 0,
                "enhancement_type": "engaging",
                "options": { "targetAudience": 42, "customInstructions": null, "model": false, "apiKey": 7 }
            })))
            .await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body.unwrap()["original_content"], "Revenue grew 20%");
    }

    #[tokio::test]
    async fn test_enhance_index_out_of_range() {
        let app = test_app();
        upload_deck(&app).await;

        for index in [3, 4, 1000, -1] {
            let response = app
                .handle(enhance_request(json!({ "slide_index": index, "enhancement_type": "concise", "options": {} })))
                .await;
            assert_eq!(response.status, 400, "index {}", index);
            assert_eq!(detail(&response), "Slide index out of range");
        }
    }

    #[tokio::test]
    async fn test_enhance_failed_model_matches_mock() {
        let app = test_app();
        upload_deck(&app).await;

        for tag in ["storytelling", "academic", "something-new"] {
            let keyed = app
                .handle(enhance_request(json!({
                    "slide_index": 1,
                    "enhancement_type": tag,
                    "options": { "apiKey": "sk-invalid", "model": "gpt-4o", "toneLevel": 9 }
                })))
                .await;
            let offline = app
                .handle(enhance_request(json!({ "slide_index": 1, "enhancement_type": tag, "options": {} })))
                .await;

            assert_eq!(keyed.status, 200);
            assert_eq!(keyed, offline);
        }
    }

    #[tokio::test]
    async fn test_enhance_uses_first_upload_unless_id_given() {
        let app = test_app();
        upload_deck(&app).await;

        let other = pptx(&[&["Other deck"]]);
        let response = app.handle(upload_request("other.pptx", &other)).await;
        let other_id = response.body.unwrap()["presentation_id"].as_str().unwrap().to_string();

        let implicit = app
            .handle(enhance_request(json!({ "slide_index": 0, "enhancement_type": "creative", "options": {} })))
            .await;
        assert_eq!(implicit.body.unwrap()["original_content"], "Revenue grew 20%");

        let explicit = app
            .handle(enhance_request(json!({
                "slide_index": 0,
                "enhancement_type": "creative",
                "options": {},
                "presentation_id": other_id
            })))
            .await;
        assert_eq!(explicit.body.unwrap()["original_content"], "Other deck");

        let unknown = app
            .handle(enhance_request(json!({
                "slide_index": 0,
                "enhancement_type": "creative",
                "presentation_id": "missing"
            })))
            .await;
        assert_eq!(unknown.status, 404);
    }

    #[tokio::test]
    async fn test_enhance_malformed_body() {
        let app = test_app();
        upload_deck(&app).await;
        let response = app.handle(enhance_request(json!({ "slide_index": "zero" }))).await;
        assert_eq!(response.status, 422);
    }

    #[tokio::test]
    async fn test_routing_errors() {
        let app = test_app();
        assert_eq!(app.handle(get("/nope")).await.status, 404);
        assert_eq!(app.handle(get("/presentation/")).await.status, 404);
        assert_eq!(app.handle(get("/upload-ppt")).await.status, 405);
        assert_eq!(app.handle(get("/health?verbose=1")).await.status, 200);

        let mut preflight = get("/enhance-slide");
        preflight.method = "OPTIONS".to_string();
        assert_eq!(app.handle(preflight).await, ApiResponse::no_content());
    }
}
