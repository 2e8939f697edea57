// 该文件是 Eying （目见） 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
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

use image::{RgbImage, codecs::jpeg::JpegEncoder};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_OUTPUT_PATH: &str = "result/annotated_photo.jpg";
const JPEG_QUALITY: u8 = 75;

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像编码错误: {0}")]
  ImageError(#[from] image::ImageError),
}

/// 固定路径的 JPEG 输出，每次运行覆盖同一个文件
#[derive(Debug, Clone)]
pub struct SaveImageFileOutput {
  path: PathBuf,
  quality: u8,
}

impl Default for SaveImageFileOutput {
  fn default() -> Self {
    Self::new(DEFAULT_OUTPUT_PATH)
  }
}

impl SaveImageFileOutput {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      quality: JPEG_QUALITY,
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn encode(&self, image: &RgbImage) -> Result<Vec<u8>, SaveImageFileError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, self.quality).encode_image(image)?;
    Ok(bytes)
  }

  /// 编码为 JPEG 并写入文件，返回写入的字节
  pub fn save_image(&self, image: &RgbImage) -> Result<Vec<u8>, SaveImageFileError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    let bytes = self.encode(image)?;
    std::fs::write(&self.path, &bytes)?;

    info!("保存图像到文件: {}", self.path.display());

    Ok(bytes)
  }
}
