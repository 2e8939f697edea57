// 该文件是 Eying （目见） 项目的一部分。
// src/input.rs - 图像输入
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

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme};

#[derive(Error, Debug)]
pub enum InputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像解码错误: {0}")]
  ImageLoadError(#[from] image::ImageError),
  #[error("不支持的文件类型: {0}")]
  UnsupportedType(String),
}

/// 允许上传的图像类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
  Jpeg,
  Png,
}

impl UploadKind {
  /// 根据文件扩展名判断（不区分大小写）
  pub fn from_file_name(name: &str) -> Result<Self, InputError> {
    let extension = Path::new(name)
      .extension()
      .and_then(|ext| ext.to_str())
      .map(str::to_ascii_lowercase);
    match extension.as_deref() {
      Some("jpg") | Some("jpeg") => Ok(UploadKind::Jpeg),
      Some("png") => Ok(UploadKind::Png),
      _ => Err(InputError::UnsupportedType(name.to_string())),
    }
  }

  pub fn mime(&self) -> &'static str {
    match self {
      UploadKind::Jpeg => "image/jpeg",
      UploadKind::Png => "image/png",
    }
  }
}

/// 从内存解码图像，透明通道被丢弃
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, InputError> {
  let image = image::load_from_memory(bytes)?;
  debug!("解码图像: {}x{}", image.width(), image.height());
  Ok(image.into_rgb8())
}

pub fn open_image(path: impl AsRef<Path>) -> Result<RgbImage, InputError> {
  let path = path.as_ref();
  let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
  debug!(
    "读取图像 {}: {}x{}",
    path.display(),
    image.width(),
    image.height()
  );
  Ok(image.into_rgb8())
}

/// image:// 地址指定的单张图像
pub struct ImageFileInput {
  path: PathBuf,
  image: Option<RgbImage>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(InputError::SchemeMismatch(url.scheme().to_string()));
    }

    let path = PathBuf::from(url.path());
    let image = open_image(&path)?;

    Ok(ImageFileInput {
      path,
      image: Some(image),
    })
  }
}

impl ImageFileInput {
  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Iterator for ImageFileInput {
  type Item = RgbImage;

  fn next(&mut self) -> Option<Self::Item> {
    self.image.take()
  }
}
