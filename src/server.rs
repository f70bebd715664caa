//! HTTP surface.
//!
//! ```text
//! GET  /                 service info
//! GET  /health           liveness probe
//! POST /convert          directory → PDF file, JSON ConversionResult
//! POST /convert/upload   multipart images → PDF bytes
//! ```
//!
//! Handlers hold no state beyond a cloned [`Converter`]; conversions run on
//! tokio's blocking pool via [`Converter::convert_async`].

use crate::config::SortOrder;
use crate::convert::Converter;
use crate::error::Img2PdfError;
use crate::output::ConversionResult;
use crate::request::{ConversionRequest, UploadedImage};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Json, Multipart, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Header carrying the number of pages in an upload response.
pub const IMAGES_CONVERTED_HEADER: HeaderName = HeaderName::from_static("x-images-converted");

/// Listener settings for [`serve`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on a request body, multipart uploads included.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Body of `POST /convert`.
#[derive(Debug, Deserialize)]
pub struct ConvertBody {
    pub input_dir: String,
    pub output_pdf_path: String,
    #[serde(default)]
    pub image_formats: Option<Vec<String>>,
    /// `name` or `modified`; defaults to `name`.
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
}

/// Build the router. Shared by [`serve`] and the in-process tests.
pub fn router(converter: Converter, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/convert", post(convert_directory))
        .route("/convert/upload", post(convert_upload))
        .with_state(converter)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process is stopped.
pub async fn serve(converter: Converter, config: &ServerConfig) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        "Listening on http://{} (formats: {})",
        listener.local_addr()?,
        converter.config().allowed_formats_display()
    );
    axum::serve(listener, router(converter, config.max_upload_bytes)).await
}

/// Error wrapper turning an [`Img2PdfError`] into a `ConversionResult` body.
#[derive(Debug)]
pub struct ApiError(pub Img2PdfError);

impl From<Img2PdfError> for ApiError {
    fn from(e: Img2PdfError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(ConversionResult::from_error(&self.0))).into_response()
    }
}

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "GET /health": "Liveness probe",
            "POST /convert": "Convert a server-side directory of images into a PDF file",
            "POST /convert/upload": "Convert uploaded images into a PDF download",
        },
    }))
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn convert_directory(
    State(converter): State<Converter>,
    body: Result<Json<ConvertBody>, JsonRejection>,
) -> Result<Json<ConversionResult>, ApiError> {
    // Missing or mistyped fields are request errors like any other.
    let Json(body) = body.map_err(|e| Img2PdfError::InvalidInput(e.body_text()))?;
    let sort_order = body.sort_order.unwrap_or_default();
    let target = body.output_pdf_path.clone();

    let mut request = ConversionRequest::directory(&body.input_dir, &body.output_pdf_path)
        .sort_order(sort_order);
    if let Some(formats) = body.image_formats {
        request = request.formats(formats);
    }

    let pdf = converter.convert_async(request).await?;
    Ok(Json(ConversionResult::from_pdf(&pdf, &target)))
}

async fn convert_upload(
    State(converter): State<Converter>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut files = Vec::new();
    let mut sort_order = None;
    let mut formats: Option<Vec<String>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Img2PdfError::InvalidInput(format!("Failed to read multipart field: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();

        if let Some(filename) = field.file_name().map(str::to_string) {
            let bytes = field.bytes().await.map_err(|e| {
                Img2PdfError::InvalidInput(format!("Failed to read file '{filename}': {e}"))
            })?;
            files.push(UploadedImage::new(filename, bytes.to_vec()));
            continue;
        }

        let text = field.text().await.map_err(|e| {
            Img2PdfError::InvalidInput(format!("Failed to read field '{name}': {e}"))
        })?;
        match name.as_str() {
            "sort_order" if !text.trim().is_empty() => {
                sort_order = Some(text.trim().parse::<SortOrder>()?);
            }
            "image_formats" if !text.trim().is_empty() => {
                formats = Some(
                    text.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect(),
                );
            }
            "sort_order" | "image_formats" => {}
            other => warn!("Ignoring multipart field '{}'", other),
        }
    }

    let mut request = ConversionRequest::uploads(files);
    request.sort_order = sort_order;
    request.formats = formats;

    let pdf = converter.convert_async(request).await?;

    let count = HeaderValue::from(pdf.images_converted);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (
                header::CONTENT_DISPOSITION,
                HeaderValue::from_static("attachment; filename=\"converted.pdf\""),
            ),
            (IMAGES_CONVERTED_HEADER, count),
        ],
        pdf.bytes,
    )
        .into_response())
}
