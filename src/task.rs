// 该文件是 Eying （目见） 项目的一部分。
// src/task.rs - 单次检测任务
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

use image::RgbImage;
use tracing::{error, info};

use crate::{
  detector::Detector,
  model::{BuildModel, DetectResult},
  output::{AnnotatedImage, AnnotateError, Annotator, ConfidenceReport},
};

/// 一次完整运行的结果
#[derive(Debug)]
pub struct TaskOutcome {
  pub annotated: AnnotatedImage,
  pub detections: usize,
  /// 检测失败时给用户看的消息
  pub error: Option<String>,
}

/// 同步执行 检测 → 标注 的一次任务
#[derive(Debug, Default)]
pub struct OneShotTask;

impl OneShotTask {
  /// 检测失败不会越过这里：消息写入 `TaskOutcome::error`，
  /// 标注以空结果继续（原图直接写出）。
  pub fn run_task<B, R>(
    &self,
    mut image: RgbImage,
    detector: &mut Detector<B>,
    annotator: &Annotator,
    report: &mut R,
  ) -> Result<TaskOutcome, AnnotateError>
  where
    B: BuildModel,
    R: ConfidenceReport + ?Sized,
  {
    info!("开始任务...");
    let now = std::time::Instant::now();
    let (result, detect_error) = match detector.detect(&image) {
      Ok(result) => (result, None),
      Err(e) => {
        error!("目标检测出错: {}", e);
        (
          DetectResult::default(),
          Some(format!("Error during object detection: {}", e)),
        )
      }
    };
    info!(
      "推理完成，耗时: {:.2?}, 检测到 {} 个对象",
      now.elapsed(),
      result.len()
    );

    let output = annotator.annotate(&mut image, &result, report)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(TaskOutcome {
      annotated: output,
      detections: result.len(),
      error: detect_error,
    })
  }
}
