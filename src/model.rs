// 该文件是 Arcade （冠脉狭窄检测） 项目的一部分。
// src/model.rs - 模型
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

use crate::frame::{AsNhwcFrame, ModelFrame};

/// 判定阈值，严格大于才判为狭窄
pub const DECISION_THRESHOLD: f32 = 0.5;

pub trait Model {
  type Input;
  type Output;
  type Error: std::error::Error + Send + Sync + 'static;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 二分类打分模型：输入 (1, 224, 224, 3) 帧，输出 sigmoid 分数
pub trait Classifier: Model<Input = ModelFrame, Output = f32> + Send + Sync + 'static {}

impl<T> Classifier for T where T: Model<Input = ModelFrame, Output = f32> + Send + Sync + 'static {}

/// 模型期望的输入通道布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputLayout {
  /// 模型内置伪 RGB 适配层，只喂第一个通道
  Gray,
  #[default]
  Rgb,
}

impl InputLayout {
  pub fn from_channels(channels: &str) -> Option<Self> {
    match channels {
      "1" => Some(InputLayout::Gray),
      "3" => Some(InputLayout::Rgb),
      _ => None,
    }
  }

  /// 按布局取出送入运行时的 NHWC 字节
  pub fn input_bytes(self, frame: &ModelFrame) -> Box<[u8]> {
    match self {
      InputLayout::Gray => frame.to_gray().as_nhwc().into(),
      InputLayout::Rgb => frame.as_nhwc().into(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Diagnosis {
  #[serde(rename = "Stenosis (Unhealthy)")]
  Stenosis,
  #[serde(rename = "Structure (Healthy)")]
  Healthy,
}

impl Diagnosis {
  pub fn from_score(score: f32) -> Self {
    if score > DECISION_THRESHOLD {
      Diagnosis::Stenosis
    } else {
      Diagnosis::Healthy
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Diagnosis::Stenosis => "Stenosis (Unhealthy)",
      Diagnosis::Healthy => "Structure (Healthy)",
    }
  }
}

/// 两次前向推理各自的分数
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TtaBreakdown {
  pub original: f32,
  pub flipped: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
  pub diagnosis: Diagnosis,
  pub confidence: f32,
  pub raw_score: f32,
  #[serde(rename = "tta_details")]
  pub tta_breakdown: TtaBreakdown,
}

impl Prediction {
  /// 平均原图与镜像的分数并给出诊断
  pub fn from_tta(original: f32, flipped: f32) -> Self {
    let raw_score = (original + flipped) / 2.0;
    let diagnosis = Diagnosis::from_score(raw_score);
    let confidence = match diagnosis {
      Diagnosis::Stenosis => raw_score,
      Diagnosis::Healthy => 1.0 - raw_score,
    };

    Prediction {
      diagnosis,
      confidence,
      raw_score,
      tta_breakdown: TtaBreakdown { original, flipped },
    }
  }
}

#[cfg(feature = "model_rknn")]
mod rknn;
#[cfg(feature = "model_rknn")]
pub use self::rknn::{RknnClassifier, RknnClassifierBuilder, RknnError};
