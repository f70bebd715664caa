//! HTTP surface tests.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`; no
//! socket is bound.
//!
//! Run with:
//!   cargo test --test http

#![cfg(feature = "server")]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use edgequake_img2pdf::server::{router, IMAGES_CONVERTED_HEADER};
use edgequake_img2pdf::{ConversionResult, Converter};
use image::{DynamicImage, Rgb, RgbImage};
use lopdf::Document;
use std::io::Cursor;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "img2pdf-test-boundary";
const LIMIT: usize = 8 * 1024 * 1024;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn app() -> Router {
    router(Converter::default(), LIMIT)
}

fn png_bytes(width: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, 6, Rgb([255, 0, 0])))
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

enum Part<'a> {
    File(&'a str, Vec<u8>),
    Text(&'a str, &'a str),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File(filename, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"files\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/convert/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn json_request(uri: &str, json: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), LIMIT)
        .await
        .unwrap()
        .to_vec()
}

async fn result_body(resp: axum::response::Response) -> ConversionResult {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

fn page_widths(pdf: &[u8]) -> Vec<i64> {
    let doc = Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let page = doc.get_dictionary(page_id).unwrap();
            let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
            let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
            let (_, image_ref) = xobjects.iter().next().unwrap();
            let stream = doc
                .get_object(image_ref.as_reference().unwrap())
                .unwrap()
                .as_stream()
                .unwrap();
            stream.dict.get(b"Width").unwrap().as_i64().unwrap()
        })
        .collect()
}

// ── Info endpoints ───────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_healthy() {
    let resp = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(json, serde_json::json!({ "status": "healthy" }));
}

#[tokio::test]
async fn root_lists_endpoints() {
    let resp = app()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(json["service"], "edgequake-img2pdf");
    assert!(json["endpoints"].get("POST /convert/upload").is_some());
}

// ── POST /convert ────────────────────────────────────────────────────────────

#[tokio::test]
async fn convert_directory_succeeds() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("b.png"), png_bytes(2)).unwrap();
    std::fs::write(tmp.path().join("a.png"), png_bytes(1)).unwrap();
    let out = tmp.path().join("pdf/out.pdf");

    let resp = app()
        .oneshot(json_request(
            "/convert",
            serde_json::json!({
                "input_dir": tmp.path(),
                "output_pdf_path": out,
                "image_formats": ["png"],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let result = result_body(resp).await;
    assert!(result.success, "{}", result.message);
    assert_eq!(result.images_converted, Some(2));
    assert_eq!(page_widths(&std::fs::read(&out).unwrap()), vec![1, 2]);
}

#[tokio::test]
async fn convert_missing_directory_is_bad_request() {
    let tmp = TempDir::new().unwrap();
    let resp = app()
        .oneshot(json_request(
            "/convert",
            serde_json::json!({
                "input_dir": tmp.path().join("missing"),
                "output_pdf_path": tmp.path().join("out.pdf"),
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let result = result_body(resp).await;
    assert!(!result.success);
    assert!(result.message.contains("does not exist"), "{}", result.message);
}

#[tokio::test]
async fn convert_unknown_sort_order_is_bad_request() {
    let tmp = TempDir::new().unwrap();
    let resp = app()
        .oneshot(json_request(
            "/convert",
            serde_json::json!({
                "input_dir": tmp.path(),
                "output_pdf_path": tmp.path().join("out.pdf"),
                "sort_order": "size",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let result = result_body(resp).await;
    assert!(!result.success);
    assert!(result.message.contains("size"), "{}", result.message);
}

#[tokio::test]
async fn convert_missing_field_is_structured_bad_request() {
    let resp = app()
        .oneshot(json_request(
            "/convert",
            serde_json::json!({ "output_pdf_path": "/tmp/x.pdf" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let result = result_body(resp).await;
    assert!(!result.success);
    assert_eq!(result.images_converted, Some(0));
    assert!(result.message.contains("input_dir"), "{}", result.message);
}

#[tokio::test]
async fn convert_mistyped_field_is_structured_bad_request() {
    let tmp = TempDir::new().unwrap();
    let resp = app()
        .oneshot(json_request(
            "/convert",
            serde_json::json!({
                "input_dir": tmp.path(),
                "output_pdf_path": tmp.path().join("out.pdf"),
                "image_formats": "png",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(!result_body(resp).await.success);
}

#[tokio::test]
async fn convert_without_json_content_type_is_bad_request() {
    let req = Request::builder()
        .method("POST")
        .uri("/convert")
        .body(Body::from("input_dir=/tmp"))
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(!result_body(resp).await.success);
}

#[tokio::test]
async fn convert_corrupt_image_is_server_error() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("a.png"), b"garbage").unwrap();
    let resp = app()
        .oneshot(json_request(
            "/convert",
            serde_json::json!({
                "input_dir": tmp.path(),
                "output_pdf_path": tmp.path().join("out.pdf"),
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let result = result_body(resp).await;
    assert!(!result.success);
    assert!(result.message.contains("a.png"), "{}", result.message);
}

// ── POST /convert/upload ─────────────────────────────────────────────────────

#[tokio::test]
async fn upload_returns_pdf_in_upload_order() {
    let resp = app()
        .oneshot(upload_request(&[
            Part::File("b.png", png_bytes(2)),
            Part::File("a.png", png_bytes(1)),
            Part::File("c.png", png_bytes(3)),
        ]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        resp.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"converted.pdf\""
    );
    assert_eq!(resp.headers()[IMAGES_CONVERTED_HEADER], "3");

    let pdf = body_bytes(resp).await;
    assert_eq!(page_widths(&pdf), vec![2, 1, 3]);
}

#[tokio::test]
async fn upload_honours_sort_and_format_fields() {
    let resp = app()
        .oneshot(upload_request(&[
            Part::Text("sort_order", "name"),
            Part::Text("image_formats", "png, gif"),
            Part::File("b.png", png_bytes(2)),
            Part::File("a.png", png_bytes(1)),
        ]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(page_widths(&body_bytes(resp).await), vec![1, 2]);
}

#[tokio::test]
async fn upload_with_unsupported_extension_is_bad_request() {
    let resp = app()
        .oneshot(upload_request(&[
            Part::File("a.png", png_bytes(1)),
            Part::File("notes.txt", b"hello".to_vec()),
        ]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let result = result_body(resp).await;
    assert!(!result.success);
    assert!(result.message.contains(".txt"), "{}", result.message);
}

#[tokio::test]
async fn upload_without_files_is_bad_request() {
    let resp = app()
        .oneshot(upload_request(&[Part::Text("sort_order", "name")]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(!result_body(resp).await.success);
}
