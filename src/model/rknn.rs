// 该文件是 Arcade （冠脉狭窄检测） 项目的一部分。
// src/model/rknn.rs - RKNN 二分类模型
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

use std::{
  path::{Path, PathBuf},
  sync::mpsc,
  thread,
};

use rknpu::{Context, InitFlags, TensorFormat, TensorType};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::ModelFrame,
  model::{InputLayout, Model},
};

const RKNN_NUM_INPUTS: u32 = 1;
const RKNN_NUM_OUTPUTS: u32 = 1;

#[derive(Error, Debug)]
pub enum RknnError {
  #[error("模型加载错误: {0}")]
  ModelLoadError(#[from] std::io::Error),
  #[error("模型无效: {0}")]
  ModelInvalid(String),
  #[error("RKNN 错误: {0}")]
  RknnError(String),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("推理线程已退出")]
  WorkerGone,
}

impl From<rknpu::Error> for RknnError {
  fn from(err: rknpu::Error) -> Self {
    RknnError::RknnError(err.to_string())
  }
}

impl RknnError {
  pub fn invalid(msg: &str, e: rknpu::Error) -> Self {
    RknnError::ModelInvalid(format!("{}, 错误: {}", msg, e))
  }
}

pub struct RknnClassifierBuilder {
  model_path: PathBuf,
  layout: InputLayout,
}

impl FromUrlWithScheme for RknnClassifierBuilder {
  const SCHEME: &'static str = "rknn";
}

impl FromUrl for RknnClassifierBuilder {
  type Error = RknnError;

  /// `rknn:///models/arcade_model.rknn?channels=1`
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(RknnError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    let mut layout = InputLayout::default();
    for (k, v) in url.query_pairs() {
      if k == "channels" {
        layout = InputLayout::from_channels(&v).ok_or_else(|| {
          RknnError::ModelPathError(format!("不支持的输入通道数: {}", v))
        })?;
      }
    }

    let model_path = urlencoding::decode(url.path())
      .map_err(|e| RknnError::ModelPathError(format!("模型路径不是有效的 UTF-8: {}", e)))?;

    Ok(RknnClassifierBuilder {
      model_path: PathBuf::from(model_path.as_ref()),
      layout,
    })
  }
}

impl RknnClassifierBuilder {
  pub fn model_path(&self) -> &Path {
    &self.model_path
  }

  /// 在独立线程中创建 RKNN 上下文，上下文只在该线程内使用
  pub fn build(self) -> Result<RknnClassifier, RknnError> {
    let (tx, rx) = mpsc::channel::<Request>();
    let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), RknnError>>(1);
    let RknnClassifierBuilder { model_path, layout } = self;

    thread::Builder::new()
      .name("rknn-worker".to_string())
      .spawn(move || {
        let context = match load_context(&model_path, InitFlags::default()) {
          Ok(context) => {
            let _ = ready_tx.send(Ok(()));
            context
          }
          Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
          }
        };

        for request in rx {
          let result = run_once(&context, &request.input);
          if request.reply.send(result).is_err() {
            warn!("推理请求方已放弃等待结果");
          }
        }
        info!("推理线程退出");
      })?;

    ready_rx.recv().map_err(|_| RknnError::WorkerGone)??;
    Ok(RknnClassifier { tx, layout })
  }
}

fn load_context(model_path: &Path, flags: InitFlags) -> Result<Context, RknnError> {
  info!("加载模型文件: {}", model_path.display());
  let model_data = std::fs::read(model_path)?;
  debug!(
    "模型文件大小: {:.2} MB",
    model_data.len() as f64 / (1024.0 * 1024.0)
  );

  info!("创建 RKNN 推理上下文");
  let context = Context::new(&model_data, flags)?;

  match context.sdk_version() {
    Ok(version) => {
      if let Ok(api_ver) = version.api_version() {
        debug!("模型 API 版本: {}", api_ver);
      }
      if let Ok(drv_ver) = version.driver_version() {
        debug!("模型驱动版本: {}", drv_ver);
      }
    }
    Err(e) => {
      error!("查询 SDK 版本失败: {}", e);
      return Err(RknnError::invalid("无法查询 SDK 版本", e));
    }
  }

  let num_inputs = context
    .num_inputs()
    .map_err(|e| RknnError::invalid("无法获取输入数量", e))?;
  let num_outputs = context
    .num_outputs()
    .map_err(|e| RknnError::invalid("无法获取输出数量", e))?;

  if num_inputs != RKNN_NUM_INPUTS || num_outputs != RKNN_NUM_OUTPUTS {
    let msg = format!(
      "预期模型输入/输出数量为 {}/{}, 实际为 {}/{}",
      RKNN_NUM_INPUTS, RKNN_NUM_OUTPUTS, num_inputs, num_outputs
    );
    error!("{}", msg);
    return Err(RknnError::ModelInvalid(msg));
  }

  info!("模型加载完成");
  Ok(context)
}

fn run_once(context: &Context, input: &[u8]) -> Result<f32, RknnError> {
  debug!("设置模型输入");
  context.set_input(0, input, TensorFormat::NHWC, TensorType::UInt8)?;

  debug!("执行模型推理");
  context.run()?;

  let output = context.get_outputs()?;
  let scores = output.get_f32(0)?;
  debug!("模型输出: {:?}", scores);

  scores
    .first()
    .copied()
    .ok_or_else(|| RknnError::ModelInvalid("模型输出为空".to_string()))
}

struct Request {
  input: Box<[u8]>,
  reply: mpsc::Sender<Result<f32, RknnError>>,
}

/// 基于 RKNN 的狭窄二分类模型
///
/// 推理请求经通道发送到持有上下文的工作线程，按到达顺序串行执行。
pub struct RknnClassifier {
  tx: mpsc::Sender<Request>,
  layout: InputLayout,
}

impl Model for RknnClassifier {
  type Input = ModelFrame;
  type Output = f32;
  type Error = RknnError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let input = self.layout.input_bytes(input);
    let (reply, result) = mpsc::channel();
    self
      .tx
      .send(Request { input, reply })
      .map_err(|_| RknnError::WorkerGone)?;
    result.recv().map_err(|_| RknnError::WorkerGone)?
  }
}
