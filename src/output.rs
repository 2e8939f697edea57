// 该文件是 Eying （目见） 项目的一部分。
// src/output.rs - 输出定义
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
use thiserror::Error;
use tracing::debug;

use crate::model::DetectResult;

pub trait Render<Frame, Output>: Sized {
  type Rendered;
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<Self::Rendered, Self::Error>;
}

pub mod confidence;
pub mod draw;
mod save_image_file;

pub use self::confidence::{ConfidenceLine, ConfidenceReport, ConfidenceTier, TerminalReport};
pub use self::draw::{Draw, FontSource, LabelFont, PREFERRED_FONT};
pub use self::save_image_file::{DEFAULT_OUTPUT_PATH, SaveImageFileError, SaveImageFileOutput};

#[derive(Error, Debug)]
pub enum AnnotateError {
  #[error("内置字体无效: {0}")]
  FontError(#[from] ab_glyph::InvalidFont),
  #[error("保存图像文件错误: {0}")]
  SaveImageFileError(#[from] SaveImageFileError),
}

/// 标注后的图像：已写入的路径和同样的 JPEG 字节（用于下载）
#[derive(Debug, Clone)]
pub struct AnnotatedImage {
  pub path: PathBuf,
  pub jpeg: Vec<u8>,
}

/// 把检测结果画到图像上并写出到固定路径
#[derive(Debug, Clone)]
pub struct Annotator {
  draw: Draw,
  output: SaveImageFileOutput,
}

impl Annotator {
  pub fn new(font: LabelFont, output: SaveImageFileOutput) -> Self {
    Self {
      draw: Draw::new(font),
      output,
    }
  }

  /// 使用首选字体（不可用时退回内置字体）和给定输出路径
  pub fn with_paths(
    preferred_font: impl AsRef<Path>,
    output_path: impl Into<PathBuf>,
  ) -> Result<Self, AnnotateError> {
    let font = LabelFont::load(preferred_font)?;
    Ok(Self::new(font, SaveImageFileOutput::new(output_path)))
  }

  pub fn output_path(&self) -> &Path {
    self.output.path()
  }

  pub fn font_source(&self) -> &FontSource {
    self.draw.font().source()
  }

  /// 按输入顺序逐个绘制，每个检测结果向 `report` 发出一行置信度，
  /// 然后写出 JPEG。没有检测结果时图像保持原样。
  pub fn annotate<R: ConfidenceReport + ?Sized>(
    &self,
    image: &mut RgbImage,
    result: &DetectResult,
    report: &mut R,
  ) -> Result<AnnotatedImage, AnnotateError> {
    for detection in result {
      report.report(ConfidenceLine::from(detection));
      self.draw.draw_detection(image, detection);
    }
    debug!("绘制 {} 个检测框", result.len());

    let jpeg = self.output.save_image(image)?;
    Ok(AnnotatedImage {
      path: self.output.path().to_path_buf(),
      jpeg,
    })
  }
}

impl Render<RgbImage, DetectResult> for Annotator {
  type Rendered = AnnotatedImage;
  type Error = AnnotateError;

  fn render_result(
    &self,
    frame: &RgbImage,
    result: &DetectResult,
  ) -> Result<Self::Rendered, Self::Error> {
    let mut image = frame.clone();
    self.annotate(&mut image, result, &mut ())
  }
}
