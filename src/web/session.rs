// 该文件是 Eying （目见） 项目的一部分。
// src/web/session.rs - 单用户会话
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

use std::path::{Path, PathBuf};

use image::RgbImage;
use serde::Serialize;
use tracing::info;

use crate::{
  detector::Detector,
  input::open_image,
  model::BuildModel,
  output::{AnnotateError, Annotator, ConfidenceLine},
  task::OneShotTask,
  web::WebError,
};

/// 触发运行的按钮
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  /// "Analyse Photo"：没有检测结果时不展示对比图和下载
  Upload,
  /// "Sample Image"：总是展示
  Sample,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResponse {
  pub error: Option<String>,
  pub detections: Vec<ConfidenceLine>,
  pub show_results: bool,
}

/// 进程内唯一的会话：检测器、标注器和最近一次结果
pub struct Session<B: BuildModel> {
  detector: Detector<B>,
  annotator: Annotator,
  sample_path: PathBuf,
  last_jpeg: Option<Vec<u8>>,
}

impl<B: BuildModel> Session<B> {
  pub fn new(detector: Detector<B>, annotator: Annotator, sample_path: impl Into<PathBuf>) -> Self {
    Self {
      detector,
      annotator,
      sample_path: sample_path.into(),
      last_jpeg: None,
    }
  }

  pub fn sample_path(&self) -> &Path {
    &self.sample_path
  }

  pub fn last_jpeg(&self) -> Option<&[u8]> {
    self.last_jpeg.as_deref()
  }

  pub fn analyze(
    &mut self,
    image: RgbImage,
    action: Action,
  ) -> Result<AnalysisResponse, AnnotateError> {
    let mut lines = Vec::new();
    let outcome = OneShotTask.run_task(image, &mut self.detector, &self.annotator, &mut lines)?;
    self.last_jpeg = Some(outcome.annotated.jpeg);

    let show_results = match action {
      Action::Upload => outcome.detections > 0,
      Action::Sample => true,
    };
    info!(
      "{:?}: {} 个检测结果, 展示结果: {}",
      action, outcome.detections, show_results
    );

    Ok(AnalysisResponse {
      error: outcome.error,
      detections: lines,
      show_results,
    })
  }

  pub fn analyze_sample(&mut self) -> Result<AnalysisResponse, WebError> {
    let image = open_image(&self.sample_path).map_err(WebError::Sample)?;
    Ok(self.analyze(image, Action::Sample)?)
  }
}
