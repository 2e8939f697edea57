// 该文件是 Eying （目见） 项目的一部分。
// src/output/confidence.rs - 置信度分级与逐行报告
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

use serde::Serialize;

use crate::model::Detection;

const HIGH_CONFIDENCE: f32 = 0.8;
const MEDIUM_CONFIDENCE: f32 = 0.5;

/// 置信度档位，只用于界面上的置信度条，不画到图像上
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
  High,
  Medium,
  Low,
}

impl ConfidenceTier {
  /// 每档包含下界；NaN 归为 Low
  pub fn from_score(score: f32) -> Self {
    if score >= HIGH_CONFIDENCE {
      ConfidenceTier::High
    } else if score >= MEDIUM_CONFIDENCE {
      ConfidenceTier::Medium
    } else {
      ConfidenceTier::Low
    }
  }

  pub fn color(&self) -> &'static str {
    match self {
      ConfidenceTier::High => "green",
      ConfidenceTier::Medium => "orange",
      ConfidenceTier::Low => "red",
    }
  }

  /// 置信度条长度（像素）
  pub fn bar_length(&self) -> u32 {
    match self {
      ConfidenceTier::High => 80,
      ConfidenceTier::Medium => 60,
      ConfidenceTier::Low => 30,
    }
  }
}

/// 每个检测结果对应的一行置信度显示
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceLine {
  pub label: String,
  pub score: f32,
  pub confidence: String,
  pub tier: ConfidenceTier,
  pub color: &'static str,
  pub bar_length: u32,
}

impl From<&Detection> for ConfidenceLine {
  fn from(detection: &Detection) -> Self {
    let tier = ConfidenceTier::from_score(detection.score);
    Self {
      label: detection.label.clone(),
      score: detection.score,
      confidence: format!("{:.2}", detection.score),
      tier,
      color: tier.color(),
      bar_length: tier.bar_length(),
    }
  }
}

impl std::fmt::Display for ConfidenceLine {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let bar = "#".repeat((self.bar_length / 10) as usize);
    write!(f, "{} : {} {}", self.label, bar, self.confidence)
  }
}

/// 接收置信度行的一方
pub trait ConfidenceReport {
  fn report(&mut self, line: ConfidenceLine);
}

impl ConfidenceReport for Vec<ConfidenceLine> {
  fn report(&mut self, line: ConfidenceLine) {
    self.push(line);
  }
}

impl ConfidenceReport for () {
  fn report(&mut self, _line: ConfidenceLine) {}
}

/// 直接打印到终端
#[derive(Debug, Default)]
pub struct TerminalReport {
  lines: usize,
}

impl TerminalReport {
  pub fn lines(&self) -> usize {
    self.lines
  }
}

impl ConfidenceReport for TerminalReport {
  fn report(&mut self, line: ConfidenceLine) {
    println!("{}", line);
    self.lines += 1;
  }
}
