// 该文件是 Eying （目见） 项目的一部分。
// src/model.rs - 模型
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

/// 预训练模型的推理接口
pub trait Model {
  type Input;
  type Output;
  type Error: std::error::Error + Send + Sync + 'static;

  fn infer(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 模型构建器，模型只在第一次需要时加载一次
pub trait BuildModel {
  type Model: Model<Input = RgbImage, Output = DetectResult> + Send + 'static;
  type Error: std::error::Error + Send + Sync + 'static;

  fn build(&self) -> Result<Self::Model, Self::Error>;
}

/// 像素坐标下的边界框
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
  pub xmin: f32,
  pub ymin: f32,
  pub xmax: f32,
  pub ymax: f32,
}

impl BoundingBox {
  pub fn new(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
    Self {
      xmin,
      ymin,
      xmax,
      ymax,
    }
  }

  /// 由归一化坐标 [x_min, y_min, x_max, y_max] 映射回原图像素坐标
  pub fn from_normalized(bbox: [f32; 4], width: u32, height: u32) -> Self {
    let (w, h) = (width as f32, height as f32);
    Self {
      xmin: bbox[0] * w,
      ymin: bbox[1] * h,
      xmax: bbox[2] * w,
      ymax: bbox[3] * h,
    }
  }
}

/// 单个检测结果
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
  pub label: String,
  pub score: f32,
  pub bbox: BoundingBox,
}

#[derive(Debug, Clone, Default)]
pub struct DetectResult {
  pub items: Box<[Detection]>,
}

impl DetectResult {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
    self.items.iter()
  }
}

impl From<Vec<Detection>> for DetectResult {
  fn from(items: Vec<Detection>) -> Self {
    Self {
      items: items.into_boxed_slice(),
    }
  }
}

impl<'a> IntoIterator for &'a DetectResult {
  type Item = &'a Detection;
  type IntoIter = std::slice::Iter<'a, Detection>;

  fn into_iter(self) -> Self::IntoIter {
    self.items.iter()
  }
}

pub mod labels;
pub use self::labels::LabelSet;

#[cfg(feature = "model_yolo26")]
mod yolo26;
#[cfg(feature = "model_yolo26")]
pub use self::yolo26::{Yolo26, Yolo26Builder, Yolo26Error};
