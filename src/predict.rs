// 该文件是 Arcade （冠脉狭窄检测） 项目的一部分。
// src/predict.rs - 带测试时增强的推理
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

use std::{fmt::Display, path::Path};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
  frame::ModelFrame,
  input::{self, InputError},
  model::{Classifier, Prediction},
};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum PredictError {
  #[error("模型未加载")]
  ModelNotLoaded,
  #[error("输入图像无效: {0}")]
  Decode(#[source] InputError),
  #[error("推理失败: {0}")]
  Inference(#[source] BoxError),
}

/// 帧形状错误属于张量构造失败，归入推理错误；其余为输入解码错误
impl From<InputError> for PredictError {
  fn from(err: InputError) -> Self {
    match err {
      InputError::Shape(e) => PredictError::inference(e),
      e => PredictError::Decode(e),
    }
  }
}

impl PredictError {
  fn inference<E: Into<BoxError>>(err: E) -> Self {
    PredictError::Inference(err.into())
  }
}

/// 持有模型句柄的推理器
///
/// 启动时构造一次，之后只读共享；没有模型时所有预测返回 [`PredictError::ModelNotLoaded`]。
pub struct Predictor<M> {
  model: Option<M>,
}

impl<M> Predictor<M> {
  pub fn new(model: M) -> Self {
    Predictor { model: Some(model) }
  }

  pub fn unloaded() -> Self {
    Predictor { model: None }
  }

  /// 按路径加载模型，文件不存在或加载失败时返回未加载的推理器
  pub fn load<E, F>(path: &Path, loader: F) -> Self
  where
    E: Display,
    F: FnOnce(&Path) -> Result<M, E>,
  {
    if !path.exists() {
      warn!(
        "模型文件不存在: {}，在提供模型之前预测将不可用",
        path.display()
      );
      return Predictor::unloaded();
    }

    info!("正在加载模型: {}", path.display());
    match loader(path) {
      Ok(model) => {
        info!("模型加载成功");
        Predictor::new(model)
      }
      Err(e) => {
        error!("模型加载失败: {}", e);
        Predictor::unloaded()
      }
    }
  }

  pub fn is_loaded(&self) -> bool {
    self.model.is_some()
  }

  pub fn model(&self) -> Option<&M> {
    self.model.as_ref()
  }
}

impl<M: Classifier> Predictor<M> {
  /// 解码上传的图像并预测
  pub fn predict(&self, image_data: &[u8]) -> Result<Prediction, PredictError> {
    if !self.is_loaded() {
      return Err(PredictError::ModelNotLoaded);
    }
    let frame = input::normalize(image_data)?;
    self.predict_frame(&frame)
  }

  /// 对已归一化的帧做两次前向推理（原图与水平镜像）并取平均
  pub fn predict_frame(&self, frame: &ModelFrame) -> Result<Prediction, PredictError> {
    let model = self.model.as_ref().ok_or(PredictError::ModelNotLoaded)?;

    let original = score(model, frame)?;
    let flipped = score(model, &frame.flip_horizontal())?;
    let prediction = Prediction::from_tta(original, flipped);
    debug!(
      "TTA 分数: 原图 {:.4}, 镜像 {:.4}, 平均 {:.4}",
      original, flipped, prediction.raw_score
    );

    Ok(prediction)
  }
}

fn score<M: Classifier>(model: &M, frame: &ModelFrame) -> Result<f32, PredictError> {
  let score = model.infer(frame).map_err(PredictError::inference)?;
  if !(0.0..=1.0).contains(&score) {
    return Err(PredictError::inference(format!(
      "模型输出 {} 不在 [0, 1] 范围内",
      score
    )));
  }
  Ok(score)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::frame::FrameError;

  #[test]
  fn shape_failures_are_inference_errors() {
    let shape = InputError::Shape(FrameError::LengthMismatch {
      expected: 224 * 224,
      actual: 100,
    });
    assert!(matches!(
      PredictError::from(shape),
      PredictError::Inference(_)
    ));

    let io = InputError::Io(std::io::Error::other("truncated"));
    assert!(matches!(PredictError::from(io), PredictError::Decode(_)));
  }
}
