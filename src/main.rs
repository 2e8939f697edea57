// 该文件是 Eying （目见） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info, warn};

use eying::{
  FromUrl,
  detector::Detector,
  model::Yolo26Builder,
  output::Annotator,
  web::{AppState, Session},
};

#[tokio::main]
async fn main() -> Result<()> {
  // .env 可选，需在初始化日志之前读取以便 RUST_LOG 生效
  let dotenv = dotenvy::dotenv();
  tracing_subscriber::fmt::init();
  match dotenv {
    Ok(path) => debug!("读取环境文件: {}", path.display()),
    Err(e) => debug!("未读取 .env: {}", e),
  }

  let args = args::Args::parse();

  info!("模型地址: {}", args.model);
  info!("首选字体: {}", args.font);
  info!("输出路径: {}", args.output);
  info!("示例图像: {}", args.sample);

  let mut builder = Yolo26Builder::from_url(&args.model)?;
  if let Some(threshold) = args.threshold {
    builder = builder.threshold(threshold);
  }
  if let Some(labels) = &args.labels {
    builder = builder.labels(labels);
  }

  let mut detector = Detector::new(builder);
  if args.warmup {
    // 预热失败不致命，第一次检测时会再次尝试加载
    if let Err(e) = detector.warm_up() {
      warn!("模型预热失败: {}", e);
    }
  }

  let annotator = Annotator::with_paths(&args.font, &args.output)?;
  info!("标签字体: {:?}", annotator.font_source());

  let state = AppState::new(Session::new(detector, annotator, &args.sample));
  eying::web::serve(&args.listen, state).await?;

  Ok(())
}
