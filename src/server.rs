// 该文件是 Arcade （冠脉狭窄检测） 项目的一部分。
// src/server.rs - HTTP 服务
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

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::model::Classifier;

mod error;
mod routes;
mod state;

pub use self::error::ApiError;
pub use self::routes::{HealthResponse, RetrainResponse};
pub use self::state::{AppState, ServerConfig, SharedState};

/// 构建路由；传入的状态中模型必须已完成加载
pub fn router<M: Classifier>(state: SharedState<M>) -> Router {
  let body_limit = state.config.max_upload_bytes;

  Router::new()
    .route("/", get(routes::health_check::<M>))
    .route("/predict", post(routes::predict::<M>))
    .route("/retrain", post(routes::retrain::<M>))
    .layer(DefaultBodyLimit::max(body_limit))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// 在给定监听器上提供服务，收到 Ctrl-C 后优雅退出
pub async fn serve<M: Classifier>(
  listener: TcpListener,
  state: SharedState<M>,
) -> std::io::Result<()> {
  if let Ok(addr) = listener.local_addr() {
    info!("服务监听于 http://{}", addr);
  }

  axum::serve(listener, router(state))
    .with_graceful_shutdown(shutdown_signal())
    .await
}

async fn shutdown_signal() {
  match tokio::signal::ctrl_c().await {
    Ok(()) => info!("收到中断信号，准备退出..."),
    Err(e) => {
      warn!("无法监听中断信号: {}", e);
      std::future::pending::<()>().await;
    }
  }
}
