// 该文件是 Eying （目见） 项目的一部分。
// src/model/yolo26.rs - YOLO26 模型（ONNX Runtime）
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

use std::path::PathBuf;

use image::RgbImage;
use ort::{
  session::{Session, builder::GraphOptimizationLevel},
  value::Tensor,
};
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::RgbNchwFrame,
  model::{
    BoundingBox, BuildModel, DetectResult, Detection, Model,
    labels::{LabelError, LabelSet},
  },
};

const YOLO26_SPLIT_OUTPUTS: usize = 6;
const YOLO26_END2END_ROW: usize = 6;
const YOLO26_CLASS_NUM: usize = 80;
const YOLO26_INPUT_W: f32 = 640.0;
const YOLO26_INPUT_H: f32 = 640.0;
const YOLO26_HEAD_SIZES: [(usize, usize); 3] = [(80, 80), (40, 40), (20, 20)];
const YOLO26_STRIDES: [f32; 3] = [8.0, 16.0, 32.0];
const YOLO26_OBJECT_THRESH: f32 = 0.5;

#[derive(Error, Debug)]
pub enum Yolo26Error {
  #[error("模型加载错误: {0}")]
  ModelLoadError(#[from] std::io::Error),
  #[error("ONNX Runtime 错误: {0}")]
  OrtError(#[from] ort::Error),
  #[error("标签错误: {0}")]
  LabelError(#[from] LabelError),
  #[error("模型输出无效: {0}")]
  InvalidOutput(String),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("URI 参数无效: {0}")]
  InvalidQuery(String),
}

/// 一个输出张量：形状与数据
#[derive(Debug, Clone)]
pub struct OutputTensor {
  pub shape: Vec<i64>,
  pub data: Vec<f32>,
}

pub struct Yolo26 {
  session: Session,
  labels: LabelSet,
  threshold: f32,
}

#[derive(Debug, Clone)]
pub struct Yolo26Builder {
  model_path: PathBuf,
  labels_path: Option<PathBuf>,
  threshold: f32,
}

impl FromUrlWithScheme for Yolo26Builder {
  const SCHEME: &'static str = "yolo26";
}

impl FromUrl for Yolo26Builder {
  type Error = Yolo26Error;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(Yolo26Error::SchemeMismatch(format!(
        "模型路径必须使用 {} 方案, 实际为 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let mut builder = Yolo26Builder {
      model_path: PathBuf::from(url.path()),
      labels_path: None,
      threshold: YOLO26_OBJECT_THRESH,
    };

    for (key, value) in url.query_pairs() {
      match key.as_ref() {
        "threshold" => {
          let threshold = value
            .parse::<f32>()
            .map_err(|e| Yolo26Error::InvalidQuery(format!("threshold={}: {}", value, e)))?;
          builder = builder.threshold(threshold);
        }
        "labels" => builder = builder.labels(value.as_ref()),
        _ => debug!("忽略未知的模型参数: {}={}", key, value),
      }
    }

    Ok(builder)
  }
}

impl Yolo26Builder {
  pub fn new(model_path: impl Into<PathBuf>) -> Self {
    Self {
      model_path: model_path.into(),
      labels_path: None,
      threshold: YOLO26_OBJECT_THRESH,
    }
  }

  pub fn threshold(mut self, threshold: f32) -> Self {
    self.threshold = threshold;
    self
  }

  pub fn labels(mut self, path: impl Into<PathBuf>) -> Self {
    self.labels_path = Some(path.into());
    self
  }
}

impl BuildModel for Yolo26Builder {
  type Model = Yolo26;
  type Error = Yolo26Error;

  fn build(&self) -> Result<Yolo26, Yolo26Error> {
    info!("加载模型文件: {}", self.model_path.display());
    let model_data = std::fs::read(&self.model_path)?;
    debug!(
      "模型文件大小: {:.2} MB",
      model_data.len() as f64 / (1024.0 * 1024.0)
    );

    info!("创建 ONNX Runtime 推理会话");
    let session = Session::builder()
      .map_err(ort::Error::from)?
      .with_optimization_level(GraphOptimizationLevel::Level3)
      .map_err(ort::Error::from)?
      .commit_from_memory(&model_data)
      .map_err(ort::Error::from)?;

    let num_inputs = session.inputs.len();
    let num_outputs = session.outputs.len();
    debug!("模型输入数量: {}", num_inputs);
    debug!("模型输出数量: {}", num_outputs);

    if num_inputs != 1 {
      error!("预期模型输入数量为 1, 实际为 {}", num_inputs);
      return Err(Yolo26Error::InvalidOutput(format!(
        "预期模型输入数量为 1, 实际为 {}",
        num_inputs
      )));
    }
    if num_outputs != 1 && num_outputs != YOLO26_SPLIT_OUTPUTS {
      error!(
        "预期模型输出数量为 1 或 {}, 实际为 {}",
        YOLO26_SPLIT_OUTPUTS, num_outputs
      );
      return Err(Yolo26Error::InvalidOutput(format!(
        "预期模型输出数量为 1 或 {}, 实际为 {}",
        YOLO26_SPLIT_OUTPUTS, num_outputs
      )));
    }

    let labels = match &self.labels_path {
      Some(path) => LabelSet::from_file(path)?,
      None => LabelSet::coco(),
    };
    info!("模型加载完成");

    Ok(Yolo26 {
      session,
      labels,
      threshold: self.threshold,
    })
  }
}

impl Model for Yolo26 {
  type Input = RgbImage;
  type Output = DetectResult;
  type Error = Yolo26Error;

  fn infer(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let (width, height) = input.dimensions();
    debug!("设置模型输入, 原图尺寸 {}x{}", width, height);
    let frame = RgbNchwFrame::from_rgb_image(input, YOLO26_INPUT_W as u32, YOLO26_INPUT_H as u32);
    let tensor = Tensor::from_array((frame.shape(), frame.into_data()))?;

    debug!("执行模型推理");
    let tensors = {
      let outputs = self.session.run(ort::inputs![tensor])?;

      debug!("获取模型输出");
      let mut tensors = Vec::with_capacity(outputs.len());
      for idx in 0..outputs.len() {
        let (shape, data) = outputs[idx].try_extract_tensor::<f32>()?;
        tensors.push(OutputTensor {
          shape: shape.iter().copied().collect(),
          data: data.to_vec(),
        });
      }
      tensors
    };

    let items = postprocess(&tensors, self.threshold)?
      .into_iter()
      .map(|(class_id, score, bbox)| Detection {
        label: self.labels.name(class_id),
        score,
        bbox: BoundingBox::from_normalized(bbox, width, height),
      })
      .collect::<Vec<_>>();

    debug!("检测到 {} 个物体", items.len());
    Ok(DetectResult::from(items))
  }
}

/// 后处理模型输出，返回 (类别, 置信度, 归一化边界框)
pub fn postprocess(
  outputs: &[OutputTensor],
  threshold: f32,
) -> Result<Vec<(u32, f32, [f32; 4])>, Yolo26Error> {
  debug!("后处理模型输出");
  match outputs.len() {
    1 => postprocess_end2end(&outputs[0], threshold),
    YOLO26_SPLIT_OUTPUTS => Ok(postprocess_split_heads(outputs, threshold)),
    n => Err(Yolo26Error::InvalidOutput(format!(
      "不支持的输出数量: {}",
      n
    ))),
  }
}

/// 端到端导出：[1, N, 6]，每行 (x1, y1, x2, y2, score, class)
fn postprocess_end2end(
  output: &OutputTensor,
  threshold: f32,
) -> Result<Vec<(u32, f32, [f32; 4])>, Yolo26Error> {
  if output.shape.last() != Some(&(YOLO26_END2END_ROW as i64))
    || output.data.len() % YOLO26_END2END_ROW != 0
  {
    return Err(Yolo26Error::InvalidOutput(format!(
      "端到端输出形状无效: {:?}",
      output.shape
    )));
  }

  let items = output
    .data
    .chunks_exact(YOLO26_END2END_ROW)
    .filter(|row| row[4] > threshold)
    .map(|row| {
      let xmin = row[0].clamp(0.0, YOLO26_INPUT_W);
      let ymin = row[1].clamp(0.0, YOLO26_INPUT_H);
      let xmax = row[2].clamp(0.0, YOLO26_INPUT_W);
      let ymax = row[3].clamp(0.0, YOLO26_INPUT_H);
      (
        row[5].max(0.0) as u32,
        row[4],
        [
          xmin / YOLO26_INPUT_W,
          ymin / YOLO26_INPUT_H,
          xmax / YOLO26_INPUT_W,
          ymax / YOLO26_INPUT_H,
        ],
      )
    })
    .filter(|(_, _, bbox)| bbox[0] < bbox[2] && bbox[1] < bbox[3])
    .collect();

  Ok(items)
}

/// 根据张量大小匹配回归和分类输出
/// 返回 (reg, cls) 元组，如果大小不匹配则返回 None
fn match_reg_cls_tensors<'a>(
  tensor1: &'a [f32],
  tensor2: &'a [f32],
  reg_expected: usize,
  cls_expected: usize,
  head_idx: usize,
) -> Option<(&'a [f32], &'a [f32])> {
  if tensor1.len() == reg_expected && tensor2.len() == cls_expected {
    Some((tensor1, tensor2))
  } else if tensor1.len() == cls_expected && tensor2.len() == reg_expected {
    debug!("检测头 {}: 输出顺序交换", head_idx);
    Some((tensor2, tensor1))
  } else {
    error!(
      "检测头 {}: 输出大小不匹配 - 张量1: {}, 张量2: {}, 期望回归: {}, 期望分类: {}",
      head_idx,
      tensor1.len(),
      tensor2.len(),
      reg_expected,
      cls_expected
    );
    None
  }
}

fn postprocess_split_heads(outputs: &[OutputTensor], threshold: f32) -> Vec<(u32, f32, [f32; 4])> {
  let mut items = Vec::new();

  for (head_idx, (&(map_h, map_w), stride)) in
    YOLO26_HEAD_SIZES.iter().zip(YOLO26_STRIDES).enumerate()
  {
    let spatial = map_h * map_w;
    let reg_expected = 4 * spatial;
    let cls_expected = YOLO26_CLASS_NUM * spatial;

    let Some((reg, cls)) = match_reg_cls_tensors(
      &outputs[head_idx * 2].data,
      &outputs[head_idx * 2 + 1].data,
      reg_expected,
      cls_expected,
      head_idx,
    ) else {
      continue;
    };

    for h in 0..map_h {
      for w in 0..map_w {
        let idx = h * map_w + w;

        let (score, class_id) = {
          let mut max_logit = f32::MIN;
          let mut cls_idx = 0usize;
          for c in 0..YOLO26_CLASS_NUM {
            let logit = cls[c * spatial + idx];
            if logit > max_logit {
              max_logit = logit;
              cls_idx = c;
            }
          }
          (sigmoid(max_logit), cls_idx as u32)
        };

        if score <= threshold {
          continue;
        }

        let left = reg[idx];
        let top = reg[spatial + idx];
        let right = reg[2 * spatial + idx];
        let bottom = reg[3 * spatial + idx];

        let grid_x = (w as f32) + 0.5;
        let grid_y = (h as f32) + 0.5;

        let xmin = ((grid_x - left) * stride).clamp(0.0, YOLO26_INPUT_W);
        let ymin = ((grid_y - top) * stride).clamp(0.0, YOLO26_INPUT_H);
        let xmax = ((grid_x + right) * stride).clamp(0.0, YOLO26_INPUT_W);
        let ymax = ((grid_y + bottom) * stride).clamp(0.0, YOLO26_INPUT_H);

        if xmin < xmax && ymin < ymax {
          items.push((
            class_id,
            score,
            [
              xmin / YOLO26_INPUT_W,
              ymin / YOLO26_INPUT_H,
              xmax / YOLO26_INPUT_W,
              ymax / YOLO26_INPUT_H,
            ],
          ));
        }
      }
    }
  }

  items
}

fn sigmoid(x: f32) -> f32 {
  1.0 / (1.0 + (-x).exp())
}
