// 该文件是 Eying （目见） 项目的一部分。
// tests/web.rs - HTTP 接口测试
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

#![cfg(feature = "web_ui")]

use std::{
  io::Cursor,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
};

use axum::{
  Router,
  body::{Body, to_bytes},
  http::{Request, StatusCode, header},
};
use eying::{
  detector::Detector,
  model::{BoundingBox, BuildModel, DetectResult, Detection, Model},
  output::Annotator,
  web::{AppState, Session, router},
};
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "eying-test-boundary";

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct FakeError(String);

struct FakeModel {
  fail: bool,
  items: Vec<Detection>,
}

impl Model for FakeModel {
  type Input = RgbImage;
  type Output = DetectResult;
  type Error = FakeError;

  fn infer(&mut self, _input: &RgbImage) -> Result<DetectResult, FakeError> {
    if self.fail {
      return Err(FakeError("model exploded".to_string()));
    }
    Ok(DetectResult::from(self.items.clone()))
  }
}

struct FakeBuilder {
  fail: bool,
  items: Vec<Detection>,
}

impl BuildModel for FakeBuilder {
  type Model = FakeModel;
  type Error = FakeError;

  fn build(&self) -> Result<FakeModel, FakeError> {
    Ok(FakeModel {
      fail: self.fail,
      items: self.items.clone(),
    })
  }
}

fn bird() -> Detection {
  Detection {
    label: "bird".to_string(),
    score: 0.83,
    bbox: BoundingBox::new(4.0, 30.0, 40.0, 60.0),
  }
}

fn app(dir: &tempfile::TempDir, builder: FakeBuilder) -> Router {
  let annotator = Annotator::with_paths(
    dir.path().join("missing.ttf"),
    dir.path().join("result/annotated_photo.jpg"),
  )
  .unwrap();
  let session = Session::new(
    Detector::new(builder),
    annotator,
    dir.path().join("photo.jpg"),
  );
  router(AppState::new(session))
}

fn encoded(format: ImageFormat) -> Vec<u8> {
  let image = RgbImage::from_pixel(64, 64, Rgb([30, 60, 90]));
  let mut bytes = Vec::new();
  image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
  bytes
}

fn upload(field: &str, file_name: &str, data: &[u8]) -> Request<Body> {
  let mut body = Vec::new();
  body.extend_from_slice(
    format!(
      "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .as_bytes(),
  );
  body.extend_from_slice(data);
  body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

  Request::builder()
    .method("POST")
    .uri("/api/analyze")
    .header(
      header::CONTENT_TYPE,
      format!("multipart/form-data; boundary={BOUNDARY}"),
    )
    .body(Body::from(body))
    .unwrap()
}

fn get(uri: &str) -> Request<Body> {
  Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
  let response = app.clone().oneshot(request).await.unwrap();
  let status = response.status();
  let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  (status, body.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
  let (status, body) = send(app, request).await;
  (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn index_page_has_controls() {
  let dir = tempfile::tempdir().unwrap();
  let app = app(&dir, FakeBuilder { fail: false, items: vec![] });

  let (status, body) = send(&app, get("/")).await;
  assert_eq!(status, StatusCode::OK);
  let html = String::from_utf8(body).unwrap();
  for text in [
    "Sample Image",
    "Analyse Photo",
    "Download Annotated Image",
    "Detecting Results...",
    "The code is open source and available in",
  ] {
    assert!(html.contains(text), "missing {}", text);
  }
}

#[tokio::test]
async fn analyze_reports_lines_and_offers_download() {
  let dir = tempfile::tempdir().unwrap();
  let app = app(
    &dir,
    FakeBuilder {
      fail: false,
      items: vec![bird(), bird()],
    },
  );

  let (status, body) = send_json(&app, upload("image", "photo.PNG", &encoded(ImageFormat::Png))).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body["error"].is_null());
  assert_eq!(body["show_results"], true);
  let lines = body["detections"].as_array().unwrap();
  assert_eq!(lines.len(), 2);
  assert_eq!(lines[0]["label"], "bird");
  assert_eq!(lines[0]["confidence"], "0.83");
  assert_eq!(lines[0]["color"], "green");

  let (status, jpeg) = send(&app, get("/api/download")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(image::guess_format(&jpeg).unwrap(), ImageFormat::Jpeg);
  let on_disk = std::fs::read(dir.path().join("result/annotated_photo.jpg")).unwrap();
  assert_eq!(jpeg, on_disk);

  let response = app.clone().oneshot(get("/api/download")).await.unwrap();
  assert_eq!(
    response.headers()[header::CONTENT_DISPOSITION],
    "attachment; filename=\"annotated_photo.jpg\""
  );
}

#[tokio::test]
async fn model_failure_is_a_message_not_a_crash() {
  let dir = tempfile::tempdir().unwrap();
  let app = app(&dir, FakeBuilder { fail: true, items: vec![bird()] });

  let (status, body) = send_json(&app, upload("image", "photo.jpg", &encoded(ImageFormat::Jpeg))).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body["error"].as_str().unwrap().contains("model exploded"));
  assert_eq!(body["detections"].as_array().unwrap().len(), 0);
  assert_eq!(body["show_results"], false);
}

#[tokio::test]
async fn no_detections_skip_results_for_uploads() {
  let dir = tempfile::tempdir().unwrap();
  let app = app(&dir, FakeBuilder { fail: false, items: vec![] });

  let (status, body) = send_json(&app, upload("image", "photo.jpg", &encoded(ImageFormat::Jpeg))).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body["error"].is_null());
  assert_eq!(body["show_results"], false);
}

#[tokio::test]
async fn bad_uploads_are_rejected() {
  let dir = tempfile::tempdir().unwrap();
  let app = app(&dir, FakeBuilder { fail: false, items: vec![] });

  let (status, _) = send_json(&app, upload("image", "anim.gif", b"GIF89a")).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = send_json(&app, upload("other", "photo.jpg", b"")).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "No image uploaded");

  let (status, _) = send_json(&app, upload("image", "photo.jpg", b"definitely not jpeg")).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn download_before_any_run_is_not_found() {
  let dir = tempfile::tempdir().unwrap();
  let app = app(&dir, FakeBuilder { fail: false, items: vec![] });

  let (status, _) = send(&app, get("/api/download")).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _) = send(&app, get("/api/annotated")).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sample_always_shows_results() {
  let dir = tempfile::tempdir().unwrap();
  let app = app(&dir, FakeBuilder { fail: false, items: vec![] });

  let (status, _) = send_json(&app, Request::post("/api/sample").body(Body::empty()).unwrap()).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

  std::fs::write(dir.path().join("photo.jpg"), encoded(ImageFormat::Jpeg)).unwrap();
  let (status, body) = send_json(&app, Request::post("/api/sample").body(Body::empty()).unwrap()).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["show_results"], true);

  let response = app.clone().oneshot(get("/api/sample/image")).await.unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
}

struct PanicOnceModel {
  panicked: Arc<AtomicBool>,
}

impl Model for PanicOnceModel {
  type Input = RgbImage;
  type Output = DetectResult;
  type Error = FakeError;

  fn infer(&mut self, _input: &RgbImage) -> Result<DetectResult, FakeError> {
    if !self.panicked.swap(true, Ordering::SeqCst) {
      panic!("first run blows up");
    }
    Ok(DetectResult::from(vec![bird()]))
  }
}

struct PanicOnceBuilder {
  panicked: Arc<AtomicBool>,
}

impl BuildModel for PanicOnceBuilder {
  type Model = PanicOnceModel;
  type Error = FakeError;

  fn build(&self) -> Result<PanicOnceModel, FakeError> {
    Ok(PanicOnceModel {
      panicked: self.panicked.clone(),
    })
  }
}

#[tokio::test]
async fn panicked_run_does_not_block_later_runs() {
  let dir = tempfile::tempdir().unwrap();
  let annotator = Annotator::with_paths(
    dir.path().join("missing.ttf"),
    dir.path().join("result/annotated_photo.jpg"),
  )
  .unwrap();
  let builder = PanicOnceBuilder {
    panicked: Arc::default(),
  };
  let session = Session::new(Detector::new(builder), annotator, dir.path().join("photo.jpg"));
  let app = router(AppState::new(session));

  let (status, _) = send(&app, upload("image", "photo.png", &encoded(ImageFormat::Png))).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

  let (status, body) = send_json(&app, upload("image", "photo.png", &encoded(ImageFormat::Png))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["show_results"], true);
  assert_eq!(body["detections"].as_array().unwrap().len(), 1);
}
