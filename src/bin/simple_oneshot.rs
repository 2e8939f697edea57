// 该文件是 Eying （目见） 项目的一部分。
// src/bin/simple_oneshot.rs - 单张图像推理与标注
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

use anyhow::Result;
use clap::Parser;
use url::Url;

use eying::{
  FromUrl,
  detector::Detector,
  input::ImageFileInput,
  model::Yolo26Builder,
  output::{Annotator, DEFAULT_OUTPUT_PATH, PREFERRED_FONT, TerminalReport},
  task::OneShotTask,
};
use tracing::{debug, error, info};

/// 对单张图像运行检测并输出标注结果
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型地址，例如 yolo26:///models/yolo26n.onnx
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入图像，例如 image:///path/photo.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径
  #[arg(long, default_value = DEFAULT_OUTPUT_PATH, value_name = "OUTPUT")]
  pub output: String,
  /// 首选标签字体
  #[arg(long, default_value = PREFERRED_FONT, value_name = "FONT")]
  pub font: String,
}

fn main() -> Result<()> {
  let dotenv = dotenvy::dotenv();
  tracing_subscriber::fmt::init();
  if let Ok(path) = dotenv {
    debug!("读取环境文件: {}", path.display());
  }

  let args = Args::parse();

  info!("模型地址: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let input_image = ImageFileInput::from_url(&args.input)?;
  let mut detector = Detector::new(Yolo26Builder::from_url(&args.model)?);
  let annotator = Annotator::with_paths(&args.font, &args.output)?;

  let mut report = TerminalReport::default();
  for image in input_image {
    let outcome = OneShotTask.run_task(image, &mut detector, &annotator, &mut report)?;
    if let Some(message) = &outcome.error {
      error!("{}", message);
    }
    info!(
      "检测到 {} 个对象, 结果已保存到 {}",
      outcome.detections,
      outcome.annotated.path.display()
    );
  }
  info!("共输出 {} 行置信度", report.lines());

  Ok(())
}
