// 该文件是 Arcade （冠脉狭窄检测） 项目的一部分。
// src/server/state.rs - 服务共享状态
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

use std::{sync::Arc, time::Duration};

use crate::predict::Predictor;

/// 服务运行配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
  /// 健康检查中报告的服务名
  pub service_name: String,
  /// 上传请求体上限（字节）
  pub max_upload_bytes: usize,
  /// 模拟重训练耗时
  pub retrain_delay: Duration,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      service_name: "ARCADE AI Diagnostics".to_string(),
      max_upload_bytes: 16 * 1024 * 1024,
      retrain_delay: Duration::from_secs(5),
    }
  }
}

/// 所有请求共享的只读状态，模型在构造前已加载完毕
pub struct AppState<M> {
  pub predictor: Predictor<M>,
  pub config: ServerConfig,
}

impl<M> AppState<M> {
  pub fn new(predictor: Predictor<M>, config: ServerConfig) -> Self {
    Self { predictor, config }
  }
}

pub type SharedState<M> = Arc<AppState<M>>;
