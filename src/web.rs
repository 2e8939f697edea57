// 该文件是 Eying （目见） 项目的一部分。
// src/web.rs - 浏览器界面与 HTTP 接口
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

use std::{
  path::PathBuf,
  sync::{Arc, Mutex, PoisonError},
};

use axum::{
  Json, Router,
  extract::{DefaultBodyLimit, Multipart, State},
  http::{StatusCode, header},
  response::{Html, IntoResponse, Response},
  routing::{get, post},
};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
  input::{InputError, UploadKind, decode_image},
  model::BuildModel,
  output::AnnotateError,
};

mod session;
pub use self::session::{Action, AnalysisResponse, Session};

static INDEX_HTML: &str = include_str!("../assets/index.html");
const UPLOAD_FIELD: &str = "image";
const DOWNLOAD_NAME: &str = "annotated_photo.jpg";
const BODY_LIMIT: usize = 20 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum WebError {
  #[error("{0}")]
  BadRequest(String),
  #[error("{0}")]
  Input(#[from] InputError),
  #[error("Sample image unavailable: {0}")]
  Sample(#[source] InputError),
  #[error("{0}")]
  Annotate(#[from] AnnotateError),
  #[error("No annotated image yet")]
  NotFound,
  #[error("{0}")]
  Internal(String),
}

impl WebError {
  fn status(&self) -> StatusCode {
    match self {
      WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
      WebError::Input(InputError::UnsupportedType(_)) => StatusCode::BAD_REQUEST,
      WebError::Input(_) => StatusCode::UNPROCESSABLE_ENTITY,
      WebError::NotFound => StatusCode::NOT_FOUND,
      WebError::Sample(_) | WebError::Annotate(_) | WebError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl IntoResponse for WebError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!("请求处理失败: {}", self);
    } else {
      debug!("请求被拒绝: {}", self);
    }
    (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
  }
}

pub struct AppState<B: BuildModel> {
  session: Arc<Mutex<Session<B>>>,
  sample_path: Arc<PathBuf>,
}

impl<B: BuildModel> Clone for AppState<B> {
  fn clone(&self) -> Self {
    Self {
      session: self.session.clone(),
      sample_path: self.sample_path.clone(),
    }
  }
}

impl<B: BuildModel + Send + 'static> AppState<B> {
  pub fn new(session: Session<B>) -> Self {
    let sample_path = Arc::new(session.sample_path().to_path_buf());
    Self {
      session: Arc::new(Mutex::new(session)),
      sample_path,
    }
  }

  /// 在阻塞线程池中独占会话运行，保证同一时间只有一个运行
  async fn with_session<T, F>(&self, f: F) -> Result<T, WebError>
  where
    T: Send + 'static,
    F: FnOnce(&mut Session<B>) -> Result<T, WebError> + Send + 'static,
  {
    let session = self.session.clone();
    tokio::task::spawn_blocking(move || {
      // 上一次运行 panic 不影响会话状态，继续使用
      let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
      f(&mut session)
    })
    .await
    .map_err(|e| WebError::Internal(e.to_string()))?
  }
}

pub fn router<B: BuildModel + Send + 'static>(state: AppState<B>) -> Router {
  Router::new()
    .route("/", get(index))
    .route("/api/analyze", post(analyze::<B>))
    .route("/api/sample", post(sample::<B>))
    .route("/api/sample/image", get(sample_image::<B>))
    .route("/api/annotated", get(annotated::<B>))
    .route("/api/download", get(download::<B>))
    .with_state(state)
    .layer(DefaultBodyLimit::max(BODY_LIMIT))
}

pub async fn serve<B: BuildModel + Send + 'static>(
  listen: &str,
  state: AppState<B>,
) -> std::io::Result<()> {
  let listener = tokio::net::TcpListener::bind(listen).await?;
  info!("服务启动: http://{}", listener.local_addr()?);
  info!("  GET  /                  - 页面");
  info!("  POST /api/analyze       - 分析上传的图像 (multipart/form-data, 字段 image)");
  info!("  POST /api/sample        - 分析示例图像");
  info!("  GET  /api/sample/image  - 示例图像");
  info!("  GET  /api/annotated     - 最近一次标注结果");
  info!("  GET  /api/download      - 下载最近一次标注结果");
  axum::serve(listener, router(state)).await
}

async fn index() -> Html<&'static str> {
  Html(INDEX_HTML)
}

async fn analyze<B: BuildModel + Send + 'static>(
  State(state): State<AppState<B>>,
  mut multipart: Multipart,
) -> Result<Json<AnalysisResponse>, WebError> {
  let mut upload = None;
  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| WebError::BadRequest(format!("Multipart error: {}", e)))?
  {
    if field.name() != Some(UPLOAD_FIELD) {
      continue;
    }
    let file_name = field.file_name().unwrap_or_default().to_string();
    UploadKind::from_file_name(&file_name)?;
    let data = field
      .bytes()
      .await
      .map_err(|e| WebError::BadRequest(format!("Read error: {}", e)))?;
    info!("收到上传: {} ({} 字节)", file_name, data.len());
    upload = Some(data);
  }

  let data = upload.ok_or_else(|| WebError::BadRequest("No image uploaded".to_string()))?;
  let response = state
    .with_session(move |session| {
      let image = decode_image(&data)?;
      Ok(session.analyze(image, Action::Upload)?)
    })
    .await?;
  Ok(Json(response))
}

async fn sample<B: BuildModel + Send + 'static>(
  State(state): State<AppState<B>>,
) -> Result<Json<AnalysisResponse>, WebError> {
  let response = state.with_session(|session| session.analyze_sample()).await?;
  Ok(Json(response))
}

async fn sample_image<B: BuildModel + Send + 'static>(
  State(state): State<AppState<B>>,
) -> Result<Response, WebError> {
  let path = state.sample_path.as_path();
  let bytes = tokio::fs::read(path)
    .await
    .map_err(|e| WebError::Sample(InputError::IoError(e)))?;
  let mime = path
    .to_str()
    .and_then(|p| UploadKind::from_file_name(p).ok())
    .map(|kind| kind.mime())
    .unwrap_or("application/octet-stream");
  Ok(([(header::CONTENT_TYPE, mime)], bytes).into_response())
}

async fn last_jpeg<B: BuildModel + Send + 'static>(
  state: &AppState<B>,
) -> Result<Vec<u8>, WebError> {
  state
    .with_session(|session| session.last_jpeg().map(<[u8]>::to_vec).ok_or(WebError::NotFound))
    .await
}

async fn annotated<B: BuildModel + Send + 'static>(
  State(state): State<AppState<B>>,
) -> Result<Response, WebError> {
  let bytes = last_jpeg(&state).await?;
  Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response())
}

async fn download<B: BuildModel + Send + 'static>(
  State(state): State<AppState<B>>,
) -> Result<Response, WebError> {
  let bytes = last_jpeg(&state).await?;
  let disposition = format!("attachment; filename=\"{}\"", DOWNLOAD_NAME);
  Ok(
    (
      [
        (header::CONTENT_TYPE, "image/jpeg".to_string()),
        (header::CONTENT_DISPOSITION, disposition),
      ],
      bytes,
    )
      .into_response(),
  )
}
