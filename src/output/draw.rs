// 该文件是 Eying （目见） 项目的一部分。
// src/output/draw.rs - 目标检测结果可视化
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

use ab_glyph::{FontArc, InvalidFont, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_hollow_rect_mut, draw_text_mut},
  rect::Rect,
};
use tracing::debug;

use crate::model::{BoundingBox, Detection};

// 文本渲染常量
pub const PREFERRED_FONT: &str = "arial.ttf";
const LABEL_FONT_SIZE: f32 = 24.0;
const LABEL_OFFSET_Y: i32 = 28;
const OUTLINE_WIDTH: i32 = 3;
const OUTLINE_COLOR: [u8; 3] = [255, 0, 0]; // 红色

static FALLBACK_FONT: &[u8] = include_bytes!("../../assets/font.ttf");

/// 实际使用的字体来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
  Preferred(PathBuf),
  Fallback,
}

/// 标签字体：优先使用可缩放字体文件，不可用时退回内置字体
#[derive(Clone)]
pub struct LabelFont {
  font: FontArc,
  source: FontSource,
}

impl std::fmt::Debug for LabelFont {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LabelFont")
      .field("source", &self.source)
      .finish()
  }
}

impl LabelFont {
  /// 读取首选字体，失败时静默退回内置字体
  pub fn load(preferred: impl AsRef<Path>) -> Result<Self, InvalidFont> {
    let preferred = preferred.as_ref();
    match std::fs::read(preferred) {
      Ok(data) => match FontArc::try_from_vec(data) {
        Ok(font) => {
          debug!("使用字体: {}", preferred.display());
          return Ok(Self {
            font,
            source: FontSource::Preferred(preferred.to_path_buf()),
          });
        }
        Err(e) => debug!("字体 {} 无效: {}", preferred.display(), e),
      },
      Err(e) => debug!("无法读取字体 {}: {}", preferred.display(), e),
    }
    Self::fallback()
  }

  pub fn fallback() -> Result<Self, InvalidFont> {
    debug!("使用内置字体");
    Ok(Self {
      font: FontArc::try_from_slice(FALLBACK_FONT)?,
      source: FontSource::Fallback,
    })
  }

  pub fn source(&self) -> &FontSource {
    &self.source
  }
}

/// 固定样式的边框与标签绘制
#[derive(Debug, Clone)]
pub struct Draw {
  font: LabelFont,
  font_size: f32,
  label_offset_y: i32,
  outline_width: i32,
  outline_color: [u8; 3],
}

impl Draw {
  pub fn new(font: LabelFont) -> Self {
    Self {
      font,
      font_size: LABEL_FONT_SIZE,
      label_offset_y: LABEL_OFFSET_Y,
      outline_width: OUTLINE_WIDTH,
      outline_color: OUTLINE_COLOR,
    }
  }

  pub fn font(&self) -> &LabelFont {
    &self.font
  }

  pub fn outline_color(&self) -> Rgb<u8> {
    Rgb(self.outline_color)
  }

  /// 向内加粗的矩形边框。越界部分直接被裁掉，不做位置修正。
  fn draw_bbox(&self, image: &mut RgbImage, bbox: &BoundingBox) {
    let x_min = bbox.xmin.round() as i32;
    let y_min = bbox.ymin.round() as i32;
    let x_max = bbox.xmax.round() as i32;
    let y_max = bbox.ymax.round() as i32;

    for thickness in 0..self.outline_width {
      let (x0, y0) = (x_min + thickness, y_min + thickness);
      let (x1, y1) = (x_max - thickness, y_max - thickness);
      if x1 < x0 || y1 < y0 {
        break;
      }
      let rect = Rect::at(x0, y0).of_size((x1 - x0 + 1) as u32, (y1 - y0 + 1) as u32);
      draw_hollow_rect_mut(image, rect, self.outline_color());
    }
  }

  /// 标签画在左上角上方
  fn draw_label(&self, image: &mut RgbImage, bbox: &BoundingBox, label: &str) {
    let x = bbox.xmin.round() as i32;
    let y = bbox.ymin.round() as i32 - self.label_offset_y;
    draw_text_mut(
      image,
      self.outline_color(),
      x,
      y,
      PxScale::from(self.font_size),
      &self.font.font,
      label,
    );
  }

  pub fn draw_detection(&self, image: &mut RgbImage, detection: &Detection) {
    self.draw_bbox(image, &detection.bbox);
    self.draw_label(image, &detection.bbox, &detection.label);
  }
}
