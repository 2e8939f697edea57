// 该文件是 Eying （目见） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use url::Url;

/// Eying 浏览器目标检测演示
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型地址，例如 yolo26:///models/yolo26n.onnx?threshold=0.5
  #[arg(
    long,
    env = "EYING_MODEL",
    default_value = "yolo26:///models/yolo26n.onnx",
    value_name = "MODEL"
  )]
  pub model: Url,

  /// 置信度阈值 (0.0 - 1.0)，覆盖模型地址中的 threshold
  #[arg(long, env = "EYING_THRESHOLD", value_name = "THRESHOLD")]
  pub threshold: Option<f32>,

  /// 类别标签文件（每行一个），默认使用 COCO
  #[arg(long, env = "EYING_LABELS", value_name = "FILE")]
  pub labels: Option<String>,

  /// 首选标签字体，不可用时使用内置字体
  #[arg(long, env = "EYING_FONT", default_value = eying::output::PREFERRED_FONT, value_name = "FILE")]
  pub font: String,

  /// 标注结果输出路径（每次运行覆盖）
  #[arg(long, env = "EYING_OUTPUT", default_value = eying::output::DEFAULT_OUTPUT_PATH, value_name = "FILE")]
  pub output: String,

  /// "Sample Image" 使用的示例图像
  #[arg(long, env = "EYING_SAMPLE", default_value = "photo.jpg", value_name = "FILE")]
  pub sample: String,

  /// 监听地址
  #[arg(long, env = "EYING_LISTEN", default_value = "127.0.0.1:8501", value_name = "ADDR")]
  pub listen: String,

  /// 启动时立即加载模型，而不是等到第一次检测
  #[arg(long, env = "EYING_WARMUP")]
  pub warmup: bool,
}
