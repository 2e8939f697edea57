// 该文件是 Eying （目见） 项目的一部分。
// src/frame.rs - NCHW 帧定义
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

use image::{RgbImage, imageops::FilterType};

const RGB_CHANNELS: usize = 3;

/// 模型输入帧：NCHW 排布，像素值缩放到 [0, 1]
#[derive(Debug, Clone)]
pub struct RgbNchwFrame {
  width: usize,
  height: usize,
  data: Box<[f32]>,
}

impl RgbNchwFrame {
  /// 将任意尺寸的图像拉伸到模型输入尺寸
  pub fn from_rgb_image(image: &RgbImage, width: u32, height: u32) -> Self {
    let resized;
    let image = if image.dimensions() == (width, height) {
      image
    } else {
      resized = image::imageops::resize(image, width, height, FilterType::Triangle);
      &resized
    };

    let (width, height) = (width as usize, height as usize);
    let plane = width * height;
    let mut data = vec![0f32; RGB_CHANNELS * plane];

    for (x, y, pixel) in image.enumerate_pixels() {
      let idx = (y as usize) * width + (x as usize);
      for c in 0..RGB_CHANNELS {
        data[c * plane + idx] = pixel[c] as f32 / 255.0;
      }
    }

    Self {
      width,
      height,
      data: data.into_boxed_slice(),
    }
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn width(&self) -> usize {
    self.width
  }

  /// [N, C, H, W]
  pub fn shape(&self) -> [usize; 4] {
    [1, RGB_CHANNELS, self.height, self.width]
  }

  pub fn into_data(self) -> Vec<f32> {
    self.data.into_vec()
  }
}
