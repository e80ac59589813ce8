// 该文件是 Arcade （冠脉狭窄检测） 项目的一部分。
// src/main.rs - 狭窄检测 HTTP 服务
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

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use url::Url;

use arcade::{
  FromUrl,
  model::{RknnClassifier, RknnClassifierBuilder},
  predict::Predictor,
  server::{self, AppState},
};

fn load_predictor(url: &Url) -> Predictor<RknnClassifier> {
  let builder = match RknnClassifierBuilder::from_url(url) {
    Ok(builder) => builder,
    Err(e) => {
      error!("模型地址无效: {}", e);
      return Predictor::unloaded();
    }
  };

  let path = builder.model_path().to_path_buf();
  Predictor::load(&path, move |_| builder.build())
}

#[tokio::main]
async fn main() -> Result<()> {
  let args = args::Args::parse();

  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
  tracing_subscriber::fmt().with_env_filter(filter).init();

  info!("Arcade 狭窄检测服务 v{}", env!("CARGO_PKG_VERSION"));
  info!("模型地址: {}", args.model);
  info!("监听地址: {}:{}", args.host, args.port);

  // 先加载模型，再开始接受请求
  let model_url = args.model.clone();
  let predictor = tokio::task::spawn_blocking(move || load_predictor(&model_url)).await?;
  let state = Arc::new(AppState::new(predictor, args.server_config()));

  let listener = TcpListener::bind((args.host.as_str(), args.port)).await?;
  server::serve(listener, state).await?;

  info!("服务已退出");
  Ok(())
}
