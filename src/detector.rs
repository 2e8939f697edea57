// 该文件是 Eying （目见） 项目的一部分。
// src/detector.rs - 目标检测器
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

use std::error::Error as StdError;

use image::RgbImage;
use thiserror::Error;
use tracing::info;

use crate::model::{BuildModel, DetectResult, Model};

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum DetectorError {
  #[error("模型加载失败: {0}")]
  Load(#[source] BoxError),
  #[error("模型推理失败: {0}")]
  Inference(#[source] BoxError),
}

/// 包装预训练模型。模型在第一次检测（或预热）时加载，之后复用。
pub struct Detector<B: BuildModel> {
  builder: B,
  model: Option<B::Model>,
}

impl<B: BuildModel> Detector<B> {
  pub fn new(builder: B) -> Self {
    Self {
      builder,
      model: None,
    }
  }

  pub fn is_loaded(&self) -> bool {
    self.model.is_some()
  }

  /// 加载模型；已经加载时什么也不做
  pub fn warm_up(&mut self) -> Result<(), DetectorError> {
    self.model_mut().map(|_| ())
  }

  fn model_mut(&mut self) -> Result<&mut B::Model, DetectorError> {
    if self.model.is_none() {
      info!("首次使用，加载模型...");
      let now = std::time::Instant::now();
      let model = self
        .builder
        .build()
        .map_err(|e| DetectorError::Load(Box::new(e)))?;
      info!("模型加载完成，耗时: {:.2?}", now.elapsed());
      self.model = Some(model);
    }
    self
      .model
      .as_mut()
      .ok_or_else(|| DetectorError::Load("模型未加载".into()))
  }

  /// 对一张图像运行检测。失败不会被重试，由调用方决定如何展示。
  pub fn detect(&mut self, image: &RgbImage) -> Result<DetectResult, DetectorError> {
    let model = self.model_mut()?;
    model
      .infer(image)
      .map_err(|e| DetectorError::Inference(Box::new(e)))
  }
}
